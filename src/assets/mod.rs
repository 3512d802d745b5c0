//! Asset IO. Everything is decoded up front so rendering never touches the filesystem.

/// Raster and SVG decoding into premultiplied RGBA8.
pub mod decode;
/// Decoded asset storage keyed by normalized relative path.
pub mod store;
