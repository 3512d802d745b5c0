use std::io::{Cursor, Write};

use image::{
    ExtendedColorType, ImageEncoder,
    codecs::{jpeg::JpegEncoder, png::PngEncoder},
};
use serde::{Deserialize, Serialize};
use zip::{CompressionMethod, ZipWriter, write::SimpleFileOptions};

use crate::{
    archive::{
        manifest::{ArchiveManifest, Attribute, MetadataRecord},
        naming::{
            SELECTED_ARCHIVE_NAME, StemAllocator, build_name, resolve_description,
            strip_extension,
        },
    },
    batch::{producer::GeneratedItem, runner::BatchEntry},
    foundation::error::{ForgeError, ForgeResult},
    render::surface::Surface,
};

/// Directory holding item images inside an archive.
pub const IMAGES_DIR: &str = "images";

/// Directory holding per-item metadata inside an archive.
pub const METADATA_DIR: &str = "metadata";

/// Aggregate index at the archive root.
pub const METADATA_INDEX_FILE: &str = "metadata_index.json";

/// Lossy quality used when none is configured.
pub const DEFAULT_JPG_QUALITY: f64 = 0.9;

/// Output image encoding.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    /// Lossless PNG with alpha.
    #[default]
    Png,
    /// Lossy JPEG, flattened over black.
    Jpeg,
}

impl ExportFormat {
    /// File extension without the dot.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
        }
    }
}

/// Encoding settings for exported images.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportOptions {
    /// Image encoding.
    pub format: ExportFormat,
    /// JPEG quality in `[0.5, 1.0]`; ignored for PNG.
    pub jpg_quality: f64,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            format: ExportFormat::Png,
            jpg_quality: DEFAULT_JPG_QUALITY,
        }
    }
}

impl ExportOptions {
    /// Check the quality range.
    pub fn validate(&self) -> ForgeResult<()> {
        if !self.jpg_quality.is_finite() || !(0.5..=1.0).contains(&self.jpg_quality) {
            return Err(ForgeError::validation(format!(
                "jpg_quality must be within [0.5, 1.0], got {}",
                self.jpg_quality
            )));
        }
        Ok(())
    }
}

/// Encode a surface as a standalone image file.
pub fn encode_surface(surface: &Surface, opts: &ExportOptions) -> ForgeResult<Vec<u8>> {
    opts.validate()?;
    let mut buf = Vec::new();
    let (w, h) = (surface.width(), surface.height());
    let encoded = match opts.format {
        ExportFormat::Png => PngEncoder::new(&mut buf).write_image(
            &surface.to_straight_rgba8(),
            w,
            h,
            ExtendedColorType::Rgba8,
        ),
        ExportFormat::Jpeg => {
            let quality = (opts.jpg_quality * 100.0).round() as u8;
            JpegEncoder::new_with_quality(&mut buf, quality).encode(
                &surface.to_flattened_rgb8(),
                w,
                h,
                ExtendedColorType::Rgb8,
            )
        }
    };
    encoded.map_err(|e| ForgeError::packaging(format!("encode {w}x{h} image: {e}")))?;
    Ok(buf)
}

/// How items are named inside an archive.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ArchiveLayout {
    /// Procedural items: `images/<index>.png`, names from the template, trait attributes.
    Generated,
    /// Edited photos: `images/<stem>.<ext>` in the chosen format, the stem as name.
    Edited,
}

/// Settings for [`pack`].
#[derive(Clone, Debug, PartialEq)]
pub struct PackOptions {
    /// Name template; each `#` is followed by the item index.
    pub name_template: String,
    /// Description for every record; blank falls back to a default.
    pub description: String,
    /// Image encoding for the edited layout.
    pub export: ExportOptions,
    /// Naming scheme.
    pub layout: ArchiveLayout,
}

impl PackOptions {
    /// Options for a procedural run.
    pub fn generated(name_template: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name_template: name_template.into(),
            description: description.into(),
            export: ExportOptions::default(),
            layout: ArchiveLayout::Generated,
        }
    }

    /// Options for a photo-edit batch.
    pub fn edited(export: ExportOptions) -> Self {
        Self {
            name_template: String::new(),
            description: String::new(),
            export,
            layout: ArchiveLayout::Edited,
        }
    }

    fn image_options(&self) -> ExportOptions {
        match self.layout {
            ArchiveLayout::Generated => ExportOptions::default(),
            ArchiveLayout::Edited => self.export,
        }
    }
}

/// A packed archive plus the manifest written into it.
#[derive(Clone, Debug)]
pub struct PackedArchive {
    /// Zip bytes.
    pub bytes: Vec<u8>,
    /// Metadata in generation order, with gaps for skipped items.
    pub manifest: ArchiveManifest,
}

/// A single downloadable file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExportedFile {
    /// Suggested file name.
    pub file_name: String,
    /// File contents.
    pub bytes: Vec<u8>,
}

fn photo_stem(item: &GeneratedItem) -> String {
    let stem = item
        .source_name
        .as_deref()
        .map(strip_extension)
        .unwrap_or_default();
    if stem.is_empty() {
        format!("image_{}", item.index)
    } else {
        stem.to_string()
    }
}

fn zip_err(e: impl std::fmt::Display) -> ForgeError {
    ForgeError::packaging(format!("zip: {e}"))
}

/// Package batch entries into a zip archive, in generation order.
///
/// Layout: `images/`, `metadata/` with one record per rendered item, and `metadata_index.json`
/// at the root listing every entry, with `null` where an item was skipped.
#[tracing::instrument(skip(entries, opts), fields(entries = entries.len(), layout = ?opts.layout))]
pub fn pack(entries: &[BatchEntry], opts: &PackOptions) -> ForgeResult<PackedArchive> {
    if entries.iter().all(|e| e.item().is_none()) {
        return Err(ForgeError::empty_input("no rendered items to package"));
    }
    let image_opts = opts.image_options();
    image_opts.validate()?;
    let description = resolve_description(&opts.description);

    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let file_opts = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    zip.add_directory(IMAGES_DIR, file_opts).map_err(zip_err)?;
    zip.add_directory(METADATA_DIR, file_opts).map_err(zip_err)?;

    let mut manifest = ArchiveManifest::with_len(entries.len());
    let mut stems = StemAllocator::new();
    for (pos, entry) in entries.iter().enumerate() {
        let Some(item) = entry.item() else {
            continue;
        };
        let (stem, name) = match opts.layout {
            ArchiveLayout::Generated => (
                item.index.to_string(),
                build_name(&opts.name_template, item.index),
            ),
            ArchiveLayout::Edited => {
                let stem = stems.claim(&photo_stem(item));
                (stem.clone(), stem)
            }
        };

        let image_path = format!("{IMAGES_DIR}/{stem}.{}", image_opts.format.extension());
        let image_bytes = encode_surface(&item.surface, &image_opts)?;
        zip.start_file(image_path.as_str(), file_opts)
            .map_err(zip_err)?;
        zip.write_all(&image_bytes).map_err(zip_err)?;

        let record = MetadataRecord {
            name,
            description: description.to_string(),
            image: image_path,
            attributes: item.selections.iter().map(Attribute::from).collect(),
        };
        let record_json = serde_json::to_vec_pretty(&record)
            .map_err(|e| ForgeError::packaging(format!("serialize metadata {stem}: {e}")))?;
        zip.start_file(format!("{METADATA_DIR}/{stem}.json"), file_opts)
            .map_err(zip_err)?;
        zip.write_all(&record_json).map_err(zip_err)?;

        manifest.set(pos + 1, record)?;
    }

    zip.start_file(METADATA_INDEX_FILE, file_opts)
        .map_err(zip_err)?;
    zip.write_all(&manifest.index_json()?).map_err(zip_err)?;
    let bytes = zip.finish().map_err(zip_err)?.into_inner();

    tracing::info!(bytes = bytes.len(), "archive packed");
    Ok(PackedArchive { bytes, manifest })
}

/// Encode one edited item as `<stem>.<ext>`, without an archive.
pub fn export_single(item: &GeneratedItem, export: &ExportOptions) -> ForgeResult<ExportedFile> {
    Ok(ExportedFile {
        file_name: format!("{}.{}", photo_stem(item), export.format.extension()),
        bytes: encode_surface(&item.surface, export)?,
    })
}

/// "Download selected": a single file when exactly one image was selected, otherwise an archive.
///
/// `entries` holds one entry per selected image, so a skipped image still counts toward the
/// choice; a selection of several images always yields an archive.
pub fn export_selection(entries: &[BatchEntry], export: &ExportOptions) -> ForgeResult<ExportedFile> {
    if let [BatchEntry::Rendered(only)] = entries {
        return export_single(only, export);
    }
    let packed = pack(entries, &PackOptions::edited(*export))?;
    Ok(ExportedFile {
        file_name: SELECTED_ARCHIVE_NAME.to_string(),
        bytes: packed.bytes,
    })
}

#[cfg(test)]
#[path = "../../tests/unit/archive/packager.rs"]
mod tests;
