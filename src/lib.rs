//! Layerforge composes layered trait images into generated collections and batch-edits photos,
//! packaging both as zip archives with per-item metadata.
//!
//! # Pipeline overview
//!
//! 1. **Prepare**: decode every referenced image into an [`AssetStore`] (the only IO step)
//! 2. **Pick**: one rarity-weighted [`Trait`] per non-empty layer, seeded per item
//! 3. **Render**: cover-fit [`composite`] of the picks, or [`render_single`] for a photo
//! 4. **Batch**: [`run_batch`] drives the items one step at a time with progress and cancellation
//! 5. **Package**: [`pack`] writes `images/`, `metadata/` and `metadata_index.json` into a zip
//!
//! Design constraints:
//!
//! - **No unsafe**: `unsafe` is forbidden in this crate.
//! - **Deterministic picks**: item `i` of a seeded run is the same sequentially or in parallel.
//! - **No IO in renderers**: external IO is front-loaded in [`AssetStore`].
//! - **Premultiplied RGBA8** end-to-end; encoders unpremultiply or flatten at export.
#![forbid(unsafe_code)]

mod archive;
mod assets;
mod batch;
mod foundation;
mod model;
mod render;
mod select;

pub use archive::manifest::{ArchiveManifest, Attribute, MetadataRecord};
pub use archive::naming::{
    DEFAULT_DESCRIPTION, DEFAULT_NAME_TEMPLATE, EDITED_ARCHIVE_NAME, GENERATED_ARCHIVE_NAME,
    PLACEHOLDER, SELECTED_ARCHIVE_NAME, StemAllocator, build_name, resolve_description,
    strip_extension,
};
pub use archive::packager::{
    ArchiveLayout, DEFAULT_JPG_QUALITY, ExportFormat, ExportOptions, ExportedFile, IMAGES_DIR,
    METADATA_DIR, METADATA_INDEX_FILE, PackOptions, PackedArchive, encode_surface,
    export_selection, export_single, pack,
};
pub use assets::decode::{SvgContext, decode_asset, decode_image, parse_svg, rasterize_svg};
pub use assets::store::{AssetKey, AssetStore, PreparedImage, normalize_rel_path};
pub use batch::preview::{NO_PREVIOUS_PREVIEW, PreviewHistory, PreviewSession};
pub use batch::producer::{
    GeneratedItem, ItemProducer, PhotoProducer, SelectionRecord, TraitComposer, item_rng,
};
pub use batch::runner::{
    BatchEntry, BatchOutput, BatchProgress, BatchRun, BatchThreading, CancelToken,
    DEFAULT_GENERATE_COUNT, MAX_GENERATE_COUNT, RunStats, run_batch, validate_count,
};
pub use foundation::core::{
    Affine, Canvas, DEFAULT_CANVAS_SIDE, MAX_SURFACE_SIDE, Point, Rect, Vec2, normalize_degrees,
};
pub use foundation::error::{ForgeError, ForgeResult};
pub use model::layers::{DEFAULT_RARITY, Layer, LayerId, LayerStack, MAX_RARITY, Trait, TraitId};
pub use model::photos::{EditableImage, ImageId, PhotoSet, Selection};
pub use model::project::{LayerConfig, PhotoConfig, ProjectConfig, TraitConfig};
pub use render::composite::{
    FitMode, MAX_FIT_EXTENT, PremulRgba8, composite, draw_fitted, fit_transform, over,
};
pub use render::filter::{ColorFilter, FilterPreset};
pub use render::single::{Geometry, render_single};
pub use render::surface::Surface;
pub use select::weighted::{pick, pick_at, rarity_weight, total_weight};
