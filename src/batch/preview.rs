use crate::{
    assets::store::AssetStore,
    batch::producer::{GeneratedItem, TraitComposer},
    foundation::core::Canvas,
    foundation::error::ForgeResult,
    model::layers::LayerStack,
};

/// Status reported when stepping back has nowhere to go.
pub const NO_PREVIOUS_PREVIEW: &str = "No previous preview.";

/// Append-only history of preview items with a cursor.
///
/// The cursor always points at a stored item once anything has been pushed.
#[derive(Clone, Debug, Default)]
pub struct PreviewHistory {
    items: Vec<GeneratedItem>,
    cursor: Option<usize>,
}

impl PreviewHistory {
    /// Empty history.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `item` and move the cursor onto it.
    pub fn push(&mut self, item: GeneratedItem) -> &GeneratedItem {
        self.items.push(item);
        let last = self.items.len() - 1;
        self.cursor = Some(last);
        &self.items[last]
    }

    /// Move the cursor one item back without touching the history.
    ///
    /// Returns `None`, leaving the cursor where it was, when there is no earlier item.
    pub fn step_back(&mut self) -> Option<&GeneratedItem> {
        let prev = self.cursor?.checked_sub(1)?;
        self.cursor = Some(prev);
        self.items.get(prev)
    }

    /// Item under the cursor.
    pub fn current(&self) -> Option<&GeneratedItem> {
        self.items.get(self.cursor?)
    }

    /// Cursor position, `None` while empty.
    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    /// Number of stored items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether nothing was pushed yet.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Interactive single-shot generation over a fixed layer stack.
#[derive(Debug)]
pub struct PreviewSession<'a> {
    composer: TraitComposer<'a>,
    history: PreviewHistory,
}

impl<'a> PreviewSession<'a> {
    /// Start a session. Fails with `EmptyInput` when no layer has a trait.
    pub fn new(
        layers: &'a LayerStack,
        assets: &'a AssetStore,
        canvas: Canvas,
        seed: u64,
    ) -> ForgeResult<Self> {
        Ok(Self {
            composer: TraitComposer::new(layers, assets, canvas, 1, seed)?,
            history: PreviewHistory::new(),
        })
    }

    /// Generate a fresh item, append it and move the cursor to it.
    pub fn advance(&mut self) -> ForgeResult<&GeneratedItem> {
        let item = self.composer.compose(self.history.len() + 1)?;
        Ok(self.history.push(item))
    }

    /// Show the previous item again without regenerating it.
    pub fn step_back(&mut self) -> Option<&GeneratedItem> {
        self.history.step_back()
    }

    /// The history so far.
    pub fn history(&self) -> &PreviewHistory {
        &self.history
    }
}

#[cfg(test)]
#[path = "../../tests/unit/batch/preview.rs"]
mod tests;
