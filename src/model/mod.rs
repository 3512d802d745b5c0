//! Editable state: the layer stack, the photo set and the project file describing both.

/// Ordered layers of weighted traits.
pub mod layers;
/// Editable photos and the caller-owned selection.
pub mod photos;
/// JSON project configuration.
pub mod project;
