/// Convenience result type used across layerforge.
pub type ForgeResult<T> = Result<T, ForgeError>;

/// Top-level error taxonomy used by pipeline APIs.
///
/// Per-item kinds (`AssetDecode`, `CompositeGeometry`) are recovered locally by the compositor and
/// the batch runner; only `Packaging` and the caller-facing kinds end a run.
#[derive(thiserror::Error, Debug)]
pub enum ForgeError {
    /// Invalid user-provided parameters or project data.
    #[error("validation error: {0}")]
    Validation(String),

    /// Nothing to work on: no layers, no traits or no images.
    #[error("empty input: {0}")]
    EmptyInput(String),

    /// A source image could not be decoded into pixels.
    #[error("asset decode failure: {0}")]
    AssetDecode(String),

    /// A fit or transform produced degenerate geometry.
    #[error("composite geometry failure: {0}")]
    CompositeGeometry(String),

    /// Encoding images or writing the archive failed.
    #[error("packaging failure: {0}")]
    Packaging(String),

    /// A cancel request was observed between batch steps.
    #[error("batch cancelled after {completed} item(s)")]
    Cancelled {
        /// Items finished before the cancel was observed.
        completed: usize,
    },

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ForgeError {
    /// Build a [`ForgeError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`ForgeError::EmptyInput`] value.
    pub fn empty_input(msg: impl Into<String>) -> Self {
        Self::EmptyInput(msg.into())
    }

    /// Build a [`ForgeError::AssetDecode`] value.
    pub fn asset_decode(msg: impl Into<String>) -> Self {
        Self::AssetDecode(msg.into())
    }

    /// Build a [`ForgeError::CompositeGeometry`] value.
    pub fn geometry(msg: impl Into<String>) -> Self {
        Self::CompositeGeometry(msg.into())
    }

    /// Build a [`ForgeError::Packaging`] value.
    pub fn packaging(msg: impl Into<String>) -> Self {
        Self::Packaging(msg.into())
    }

    /// Whether this error only affects a single batch item.
    pub fn is_item_local(&self) -> bool {
        matches!(self, Self::AssetDecode(_) | Self::CompositeGeometry(_))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
