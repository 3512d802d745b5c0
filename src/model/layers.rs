use crate::{
    archive::naming::strip_extension,
    assets::store::AssetKey,
    foundation::error::{ForgeError, ForgeResult},
};

/// Rarity given to freshly added traits.
pub const DEFAULT_RARITY: f64 = 1.0;

/// Upper bound of the rarity slider.
pub const MAX_RARITY: f64 = 100.0;

/// Stable identity of a [`Layer`] within a [`LayerStack`].
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct LayerId(pub u64);

/// Stable identity of a [`Trait`] within a [`LayerStack`].
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct TraitId(pub u64);

/// One candidate image for a layer.
#[derive(Clone, Debug, PartialEq)]
pub struct Trait {
    /// Identity, unique across the whole stack.
    pub id: TraitId,
    /// File name the trait was created from.
    pub source_name: String,
    /// Label written into metadata attributes.
    pub display_name: String,
    /// Relative selection weight in `[0, 100]`, normalized per layer at pick time.
    pub rarity: f64,
    /// Key of the decoded image in the asset store.
    pub image: AssetKey,
}

/// An ordered compositing slot (back-to-front by position in the stack).
#[derive(Clone, Debug, PartialEq)]
pub struct Layer {
    /// Identity of the layer.
    pub id: LayerId,
    /// Display label, also the metadata `trait_type`.
    pub name: String,
    /// Candidate traits in stored order.
    pub traits: Vec<Trait>,
    /// UI-only expanded/collapsed state.
    pub collapsed: bool,
}

/// Ordered collection of layers.
///
/// All mutation goes through index-addressed operations; the stack never reorders layers on its
/// own and an operation on one layer never touches another layer's traits.
#[derive(Clone, Debug, Default)]
pub struct LayerStack {
    layers: Vec<Layer>,
    next_id: u64,
}

impl LayerStack {
    /// Create an empty stack.
    pub fn new() -> Self {
        Self::default()
    }

    /// Layers in compositing order.
    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    /// Number of layers.
    pub fn len(&self) -> usize {
        self.layers.len()
    }

    /// Whether the stack holds no layers.
    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// Whether at least one layer has a trait to pick from.
    pub fn has_traits(&self) -> bool {
        self.layers.iter().any(|l| !l.traits.is_empty())
    }

    /// Borrow one layer.
    pub fn layer(&self, layer_idx: usize) -> ForgeResult<&Layer> {
        self.layers
            .get(layer_idx)
            .ok_or_else(|| layer_oob(layer_idx, self.layers.len()))
    }

    /// Append a layer named `Layer N`, where `N` is its 1-based position.
    pub fn add_layer(&mut self) -> LayerId {
        let name = format!("Layer {}", self.layers.len() + 1);
        self.add_named_layer(name)
    }

    /// Append a layer with an explicit name.
    pub fn add_named_layer(&mut self, name: impl Into<String>) -> LayerId {
        let id = LayerId(self.alloc_id());
        self.layers.push(Layer {
            id,
            name: name.into(),
            traits: Vec::new(),
            collapsed: false,
        });
        id
    }

    /// Remove and return the layer at `layer_idx`.
    pub fn remove_layer(&mut self, layer_idx: usize) -> ForgeResult<Layer> {
        self.layer(layer_idx)?;
        Ok(self.layers.remove(layer_idx))
    }

    /// Change a layer's display name.
    pub fn rename_layer(&mut self, layer_idx: usize, name: impl Into<String>) -> ForgeResult<()> {
        self.layer_mut(layer_idx)?.name = name.into();
        Ok(())
    }

    /// Flip the collapsed flag and return the new value.
    pub fn toggle_collapsed(&mut self, layer_idx: usize) -> ForgeResult<bool> {
        let layer = self.layer_mut(layer_idx)?;
        layer.collapsed = !layer.collapsed;
        Ok(layer.collapsed)
    }

    /// Append a trait created from a file name.
    ///
    /// The display name is the file name without its last extension; rarity starts at
    /// [`DEFAULT_RARITY`].
    pub fn add_trait(
        &mut self,
        layer_idx: usize,
        source_name: impl Into<String>,
        image: AssetKey,
    ) -> ForgeResult<TraitId> {
        self.layer(layer_idx)?;
        let source_name = source_name.into();
        let id = TraitId(self.alloc_id());
        let display_name = strip_extension(&source_name).to_string();
        self.layers[layer_idx].traits.push(Trait {
            id,
            source_name,
            display_name,
            rarity: DEFAULT_RARITY,
            image,
        });
        Ok(id)
    }

    /// Remove and return trait `trait_idx` of layer `layer_idx`.
    pub fn remove_trait(&mut self, layer_idx: usize, trait_idx: usize) -> ForgeResult<Trait> {
        self.trait_ref(layer_idx, trait_idx)?;
        Ok(self.layers[layer_idx].traits.remove(trait_idx))
    }

    /// Insert a copy of a trait right after it, with a fresh id.
    pub fn duplicate_trait(&mut self, layer_idx: usize, trait_idx: usize) -> ForgeResult<TraitId> {
        let mut copy = self.trait_ref(layer_idx, trait_idx)?.clone();
        copy.id = TraitId(self.alloc_id());
        let id = copy.id;
        self.layers[layer_idx].traits.insert(trait_idx + 1, copy);
        Ok(id)
    }

    /// Move a trait to a new position within the same layer.
    pub fn move_trait(&mut self, layer_idx: usize, from: usize, to: usize) -> ForgeResult<()> {
        let traits = &mut self.layer_mut(layer_idx)?.traits;
        if from >= traits.len() || to >= traits.len() {
            return Err(ForgeError::validation(format!(
                "trait move {from} -> {to} out of range for {} trait(s)",
                traits.len()
            )));
        }
        let t = traits.remove(from);
        traits.insert(to, t);
        Ok(())
    }

    /// Change a trait's metadata label.
    pub fn rename_trait(
        &mut self,
        layer_idx: usize,
        trait_idx: usize,
        display_name: impl Into<String>,
    ) -> ForgeResult<()> {
        self.trait_mut(layer_idx, trait_idx)?.display_name = display_name.into();
        Ok(())
    }

    /// Set a trait's rarity; must be finite and within `[0, MAX_RARITY]`.
    pub fn set_rarity(&mut self, layer_idx: usize, trait_idx: usize, rarity: f64) -> ForgeResult<()> {
        if !rarity.is_finite() || !(0.0..=MAX_RARITY).contains(&rarity) {
            return Err(ForgeError::validation(format!(
                "rarity must be within [0, {MAX_RARITY}], got {rarity}"
            )));
        }
        self.trait_mut(layer_idx, trait_idx)?.rarity = rarity;
        Ok(())
    }

    fn alloc_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn layer_mut(&mut self, layer_idx: usize) -> ForgeResult<&mut Layer> {
        let len = self.layers.len();
        self.layers
            .get_mut(layer_idx)
            .ok_or_else(|| layer_oob(layer_idx, len))
    }

    fn trait_ref(&self, layer_idx: usize, trait_idx: usize) -> ForgeResult<&Trait> {
        let layer = self.layer(layer_idx)?;
        layer
            .traits
            .get(trait_idx)
            .ok_or_else(|| trait_oob(layer_idx, trait_idx, layer.traits.len()))
    }

    fn trait_mut(&mut self, layer_idx: usize, trait_idx: usize) -> ForgeResult<&mut Trait> {
        let layer = self.layer_mut(layer_idx)?;
        let len = layer.traits.len();
        layer
            .traits
            .get_mut(trait_idx)
            .ok_or_else(|| trait_oob(layer_idx, trait_idx, len))
    }
}

fn layer_oob(layer_idx: usize, len: usize) -> ForgeError {
    ForgeError::validation(format!(
        "layer index {layer_idx} out of range for {len} layer(s)"
    ))
}

fn trait_oob(layer_idx: usize, trait_idx: usize, len: usize) -> ForgeError {
    ForgeError::validation(format!(
        "trait index {trait_idx} out of range for layer {layer_idx} with {len} trait(s)"
    ))
}

#[cfg(test)]
#[path = "../../tests/unit/model/layers.rs"]
mod tests;
