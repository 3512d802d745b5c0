//! Zip packaging of batch results with per-item metadata and an aggregate index.

/// Metadata records and the aggregate index.
pub mod manifest;
/// Naming rules for items, files and archives.
pub mod naming;
/// Image encoding and zip assembly.
pub mod packager;
