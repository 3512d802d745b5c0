use serde::{Deserialize, Serialize};

use crate::{
    batch::producer::SelectionRecord,
    foundation::error::{ForgeError, ForgeResult},
};

/// One `{trait_type, value}` pair of a metadata record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    /// Layer name.
    pub trait_type: String,
    /// Trait display name.
    pub value: String,
}

impl From<&SelectionRecord> for Attribute {
    fn from(s: &SelectionRecord) -> Self {
        Self {
            trait_type: s.layer_name.clone(),
            value: s.trait_display_name.clone(),
        }
    }
}

/// Per-item metadata written to `metadata/<name>.json`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataRecord {
    /// Item name built from the name template.
    pub name: String,
    /// Item description.
    pub description: String,
    /// Archive-relative path of the item's image.
    pub image: String,
    /// Picked traits in layer order.
    pub attributes: Vec<Attribute>,
}

/// Metadata of a whole run, in generation order.
///
/// Slots are written once; a `None` slot is an item that was skipped and shows up as `null` in the
/// aggregate index.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ArchiveManifest {
    slots: Vec<Option<MetadataRecord>>,
}

impl ArchiveManifest {
    /// Manifest with `len` unfilled slots.
    pub fn with_len(len: usize) -> Self {
        Self {
            slots: vec![None; len],
        }
    }

    /// Fill slot `index` (1-based). Filling a slot twice is an error.
    pub fn set(&mut self, index: usize, record: MetadataRecord) -> ForgeResult<()> {
        let len = self.slots.len();
        let slot = index
            .checked_sub(1)
            .and_then(|i| self.slots.get_mut(i))
            .ok_or_else(|| {
                ForgeError::packaging(format!("manifest index {index} outside 1..={len}"))
            })?;
        if slot.is_some() {
            return Err(ForgeError::packaging(format!(
                "manifest slot {index} already written"
            )));
        }
        *slot = Some(record);
        Ok(())
    }

    /// Slots in order.
    pub fn slots(&self) -> &[Option<MetadataRecord>] {
        &self.slots
    }

    /// Filled records in order.
    pub fn records(&self) -> impl Iterator<Item = &MetadataRecord> {
        self.slots.iter().flatten()
    }

    /// Pretty-printed aggregate index.
    pub fn index_json(&self) -> ForgeResult<Vec<u8>> {
        serde_json::to_vec_pretty(&self.slots)
            .map_err(|e| ForgeError::packaging(format!("serialize metadata index: {e}")))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/archive/manifest.rs"]
mod tests;
