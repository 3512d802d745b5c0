use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::{
    assets::store::{AssetStore, PreparedImage},
    batch::runner::validate_count,
    foundation::core::Canvas,
    foundation::error::{ForgeError, ForgeResult},
    foundation::math::Fnv1a64,
    model::{
        layers::LayerStack,
        photos::{EditableImage, PhotoSet, Selection},
    },
    render::{
        composite::composite,
        filter::ColorFilter,
        single::{Geometry, render_single},
        surface::Surface,
    },
    select::weighted,
};

/// Which trait a layer contributed to one item.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SelectionRecord {
    /// Name of the layer at generation time.
    pub layer_name: String,
    /// Display name of the picked trait at generation time.
    pub trait_display_name: String,
}

/// One rendered batch item. Never mutated after production.
#[derive(Clone, Debug, PartialEq)]
pub struct GeneratedItem {
    /// 1-based position in the batch.
    pub index: usize,
    /// Rendered pixels.
    pub surface: Surface,
    /// Per-layer picks in layer order. Empty for edited photos.
    pub selections: Vec<SelectionRecord>,
    /// Source file name for edited photos; `None` for procedural items.
    pub source_name: Option<String>,
}

impl GeneratedItem {
    /// Fingerprint of the trait combination, used to count distinct combinations in a run.
    pub fn combination_fingerprint(&self) -> u64 {
        let mut h = Fnv1a64::new_default();
        h.write_u64(self.selections.len() as u64);
        for s in &self.selections {
            h.write_str(&s.layer_name);
            h.write_str(&s.trait_display_name);
        }
        if let Some(name) = &self.source_name {
            h.write_u8(1);
            h.write_str(name);
        }
        h.finish()
    }
}

/// Produces batch items by 1-based index.
///
/// Producers only read shared state, so items can be produced on several threads at once; each
/// call renders onto its own surface.
pub trait ItemProducer: Sync {
    /// Number of items in the batch.
    fn len(&self) -> usize;

    /// Whether the batch has nothing to produce.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Render item `index` (1-based).
    fn produce(&self, index: usize) -> ForgeResult<GeneratedItem>;
}

fn check_index(index: usize, len: usize) -> ForgeResult<()> {
    if index == 0 || index > len {
        return Err(ForgeError::validation(format!(
            "item index {index} is outside 1..={len}"
        )));
    }
    Ok(())
}

/// Random source for item `index` of a run seeded with `seed`.
///
/// Every item draws from its own ChaCha stream, so the picks of an item do not depend on how many
/// items were produced before it or on which thread.
pub fn item_rng(seed: u64, index: usize) -> ChaCha8Rng {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    rng.set_stream(index as u64);
    rng
}

/// Procedural producer: one weighted pick per layer, then a cover-fit composite.
#[derive(Clone, Debug)]
pub struct TraitComposer<'a> {
    layers: &'a LayerStack,
    assets: &'a AssetStore,
    canvas: Canvas,
    count: usize,
    seed: u64,
}

impl<'a> TraitComposer<'a> {
    /// Producer for `count` items. Fails with `EmptyInput` when no layer has a trait.
    pub fn new(
        layers: &'a LayerStack,
        assets: &'a AssetStore,
        canvas: Canvas,
        count: usize,
        seed: u64,
    ) -> ForgeResult<Self> {
        if layers.is_empty() {
            return Err(ForgeError::empty_input("add layers first"));
        }
        if !layers.has_traits() {
            return Err(ForgeError::empty_input("no layer has any trait"));
        }
        canvas.validate()?;
        validate_count(count)?;
        Ok(Self {
            layers,
            assets,
            canvas,
            count,
            seed,
        })
    }

    /// Output canvas.
    pub fn canvas(&self) -> Canvas {
        self.canvas
    }

    /// Compose the item at `index` without checking it against the batch size.
    pub fn compose(&self, index: usize) -> ForgeResult<GeneratedItem> {
        let mut rng = item_rng(self.seed, index);
        let mut picks = Vec::<Option<&PreparedImage>>::with_capacity(self.layers.len());
        let mut selections = Vec::with_capacity(self.layers.len());

        for layer in self.layers.layers() {
            let Some(picked) = weighted::pick(&layer.traits, &mut rng) else {
                continue;
            };
            tracing::debug!(index, layer = %layer.name, choice = %picked.display_name, "picked");
            selections.push(SelectionRecord {
                layer_name: layer.name.clone(),
                trait_display_name: picked.display_name.clone(),
            });
            match self.assets.get(&picked.image) {
                Ok(img) => picks.push(Some(img)),
                Err(e) => {
                    tracing::warn!(index, layer = %layer.name, error = %e, "layer image skipped");
                    picks.push(None);
                }
            }
        }

        Ok(GeneratedItem {
            index,
            surface: composite(&picks, self.canvas)?,
            selections,
            source_name: None,
        })
    }
}

impl ItemProducer for TraitComposer<'_> {
    fn len(&self) -> usize {
        self.count
    }

    fn produce(&self, index: usize) -> ForgeResult<GeneratedItem> {
        check_index(index, self.count)?;
        self.compose(index)
    }
}

/// Photo-edit producer: the shared filter plus each image's own geometry.
#[derive(Clone, Debug)]
pub struct PhotoProducer<'a> {
    targets: Vec<&'a EditableImage>,
    assets: &'a AssetStore,
    filter: ColorFilter,
}

impl<'a> PhotoProducer<'a> {
    /// Producer over the selected images, or every image when the selection is empty.
    pub fn new(
        photos: &'a PhotoSet,
        selection: &Selection,
        assets: &'a AssetStore,
        filter: ColorFilter,
    ) -> ForgeResult<Self> {
        Self::from_targets(photos.targets(selection), assets, filter)
    }

    /// Producer over an explicit list of images, in order.
    pub fn from_targets(
        targets: Vec<&'a EditableImage>,
        assets: &'a AssetStore,
        filter: ColorFilter,
    ) -> ForgeResult<Self> {
        if targets.is_empty() {
            return Err(ForgeError::empty_input("no images to edit"));
        }
        filter.validate()?;
        Ok(Self {
            targets,
            assets,
            filter,
        })
    }

    /// Images in batch order.
    pub fn targets(&self) -> &[&'a EditableImage] {
        &self.targets
    }
}

impl ItemProducer for PhotoProducer<'_> {
    fn len(&self) -> usize {
        self.targets.len()
    }

    fn produce(&self, index: usize) -> ForgeResult<GeneratedItem> {
        check_index(index, self.targets.len())?;
        let img = self.targets[index - 1];
        let src = self.assets.get(&img.source)?;
        let geometry = Geometry {
            rotation_degrees: img.rotation_degrees,
            scale: img.scale,
        };
        Ok(GeneratedItem {
            index,
            surface: render_single(src, &self.filter, geometry)?,
            selections: Vec::new(),
            source_name: Some(img.name.clone()),
        })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/batch/producer.rs"]
mod tests;
