//! CPU raster stages over premultiplied RGBA8 surfaces.

/// Layer compositing with cover/contain fitting.
pub mod composite;
/// Color filter and presets.
pub mod filter;
/// Single-image filter + geometry pipeline.
pub mod single;
/// Owned raster surface and affine image drawing.
pub mod surface;
