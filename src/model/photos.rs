use std::collections::BTreeSet;

use crate::{
    assets::store::AssetKey,
    foundation::core::normalize_degrees,
    foundation::error::{ForgeError, ForgeResult},
};

/// Stable identity of an [`EditableImage`].
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct ImageId(pub u64);

/// A source photo plus its per-image geometry.
#[derive(Clone, Debug, PartialEq)]
pub struct EditableImage {
    /// Identity of the image.
    pub id: ImageId,
    /// Original file name; its stem names the exported file.
    pub name: String,
    /// Current source pixels.
    pub source: AssetKey,
    /// Baseline restored by reset. Never changes after insertion.
    pub original_source: AssetKey,
    /// Rotation in degrees, always within `[0, 360)`.
    pub rotation_degrees: f64,
    /// Uniform scale about the canvas center.
    pub scale: f64,
}

impl EditableImage {
    /// Whether rotation or scale differ from the identity geometry.
    pub fn has_geometry(&self) -> bool {
        self.rotation_degrees != 0.0 || self.scale != 1.0
    }
}

/// Batch scope chosen by the user. An empty selection means "every image".
///
/// The selection is owned by the caller and passed by reference into photo operations; it is
/// only cleared by [`PhotoSet::remove_selected`], [`PhotoSet::reset_all`] or
/// [`Selection::clear`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Selection {
    ids: BTreeSet<ImageId>,
}

impl Selection {
    /// Create an empty selection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `id` if absent, remove it if present. Returns whether it is now selected.
    pub fn toggle(&mut self, id: ImageId) -> bool {
        if self.ids.remove(&id) {
            false
        } else {
            self.ids.insert(id);
            true
        }
    }

    /// Select `id`.
    pub fn insert(&mut self, id: ImageId) {
        self.ids.insert(id);
    }

    /// Deselect `id`.
    pub fn remove(&mut self, id: ImageId) {
        self.ids.remove(&id);
    }

    /// Whether `id` is selected.
    pub fn contains(&self, id: ImageId) -> bool {
        self.ids.contains(&id)
    }

    /// Number of selected ids.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Whether nothing is selected.
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Select every image in `photos`.
    pub fn select_all(&mut self, photos: &PhotoSet) {
        self.ids.extend(photos.images().iter().map(|img| img.id));
    }

    /// Deselect everything.
    pub fn clear(&mut self) {
        self.ids.clear();
    }

    /// Selected ids in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = ImageId> + '_ {
        self.ids.iter().copied()
    }
}

/// Ordered set of editable photos.
#[derive(Clone, Debug, Default)]
pub struct PhotoSet {
    images: Vec<EditableImage>,
    next_id: u64,
}

impl PhotoSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Images in insertion order.
    pub fn images(&self) -> &[EditableImage] {
        &self.images
    }

    /// Number of images.
    pub fn len(&self) -> usize {
        self.images.len()
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    /// Look up an image by id.
    pub fn get(&self, id: ImageId) -> ForgeResult<&EditableImage> {
        self.images
            .iter()
            .find(|img| img.id == id)
            .ok_or_else(|| unknown(id))
    }

    /// Append a photo with identity geometry.
    pub fn add(&mut self, name: impl Into<String>, source: AssetKey) -> ImageId {
        self.next_id += 1;
        let id = ImageId(self.next_id);
        self.images.push(EditableImage {
            id,
            name: name.into(),
            original_source: source.clone(),
            source,
            rotation_degrees: 0.0,
            scale: 1.0,
        });
        id
    }

    /// Remove a photo and deselect it.
    pub fn remove(&mut self, id: ImageId, selection: &mut Selection) -> ForgeResult<EditableImage> {
        let pos = self
            .images
            .iter()
            .position(|img| img.id == id)
            .ok_or_else(|| unknown(id))?;
        selection.remove(id);
        Ok(self.images.remove(pos))
    }

    /// Remove every selected photo and clear the selection. Returns how many were removed.
    pub fn remove_selected(&mut self, selection: &mut Selection) -> usize {
        let before = self.images.len();
        self.images.retain(|img| !selection.contains(img.id));
        selection.clear();
        before - self.images.len()
    }

    /// Add `delta_degrees` to the rotation, keeping it within `[0, 360)`.
    pub fn rotate(&mut self, id: ImageId, delta_degrees: f64) -> ForgeResult<f64> {
        if !delta_degrees.is_finite() {
            return Err(ForgeError::validation("rotation delta must be finite"));
        }
        let img = self.get_mut(id)?;
        img.rotation_degrees = normalize_degrees(img.rotation_degrees + delta_degrees);
        Ok(img.rotation_degrees)
    }

    /// Set the uniform scale factor; must be finite and > 0.
    pub fn set_scale(&mut self, id: ImageId, scale: f64) -> ForgeResult<()> {
        if !scale.is_finite() || scale <= 0.0 {
            return Err(ForgeError::validation(format!(
                "scale must be finite and > 0, got {scale}"
            )));
        }
        self.get_mut(id)?.scale = scale;
        Ok(())
    }

    /// Point the image at new source pixels; the original baseline is kept.
    pub fn replace_source(&mut self, id: ImageId, source: AssetKey) -> ForgeResult<()> {
        self.get_mut(id)?.source = source;
        Ok(())
    }

    /// Restore the original source and identity geometry.
    pub fn reset(&mut self, id: ImageId) -> ForgeResult<()> {
        reset_image(self.get_mut(id)?);
        Ok(())
    }

    /// Reset every image and clear the selection.
    pub fn reset_all(&mut self, selection: &mut Selection) {
        for img in &mut self.images {
            reset_image(img);
        }
        selection.clear();
    }

    /// Images a batch operation applies to: the selected ones, or all when nothing is selected.
    pub fn targets(&self, selection: &Selection) -> Vec<&EditableImage> {
        self.images
            .iter()
            .filter(|img| selection.is_empty() || selection.contains(img.id))
            .collect()
    }

    fn get_mut(&mut self, id: ImageId) -> ForgeResult<&mut EditableImage> {
        self.images
            .iter_mut()
            .find(|img| img.id == id)
            .ok_or_else(|| unknown(id))
    }
}

fn reset_image(img: &mut EditableImage) {
    img.source = img.original_source.clone();
    img.rotation_degrees = 0.0;
    img.scale = 1.0;
}

fn unknown(id: ImageId) -> ForgeError {
    ForgeError::validation(format!("unknown image id {}", id.0))
}

#[cfg(test)]
#[path = "../../tests/unit/model/photos.rs"]
mod tests;
