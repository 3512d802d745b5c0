use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::{Arc, OnceLock},
};

use crate::{
    assets::decode::{SvgContext, decode_asset},
    foundation::error::{ForgeError, ForgeResult},
    model::{layers::LayerStack, photos::PhotoSet},
};

#[derive(Clone, Debug, PartialEq, Eq)]
/// Decoded raster image in premultiplied RGBA8 form.
pub struct PreparedImage {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Pixel bytes in row-major premultiplied RGBA8.
    pub rgba8_premul: Arc<Vec<u8>>,
}

impl PreparedImage {
    /// Wrap an existing premultiplied buffer, checking its length.
    pub fn from_premul(width: u32, height: u32, rgba8_premul: Vec<u8>) -> ForgeResult<Self> {
        let expected = (width as usize)
            .checked_mul(height as usize)
            .and_then(|v| v.checked_mul(4))
            .ok_or_else(|| ForgeError::validation("image buffer size overflow"))?;
        if width == 0 || height == 0 || rgba8_premul.len() != expected {
            return Err(ForgeError::validation(format!(
                "premultiplied buffer of {} bytes does not match {width}x{height}",
                rgba8_premul.len()
            )));
        }
        Ok(Self {
            width,
            height,
            rgba8_premul: Arc::new(rgba8_premul),
        })
    }
}

/// Normalized identity of an asset: a relative path or an in-memory name.
#[derive(
    Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(transparent)]
pub struct AssetKey(String);

impl AssetKey {
    /// Wrap a key verbatim.
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Build a key from a relative path, normalizing separators and rejecting escapes.
    pub fn from_rel_path(source: &str) -> ForgeResult<Self> {
        normalize_rel_path(source).map(Self)
    }

    /// Borrow the key string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Last path segment of the key.
    pub fn file_name(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or(&self.0)
    }
}

impl std::fmt::Display for AssetKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Decoded assets keyed by [`AssetKey`].
///
/// IO and decoding are front-loaded here so render stages stay IO-free. A failed decode is kept
/// as a recorded failure instead of aborting preparation: the compositor skips that layer and the
/// photo batch skips that item.
#[derive(Clone, Debug)]
pub struct AssetStore {
    root: PathBuf,
    entries: HashMap<AssetKey, Result<PreparedImage, String>>,
    svg: OnceLock<SvgContext>,
}

impl AssetStore {
    /// Empty store resolving relative paths against `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            entries: HashMap::new(),
            svg: OnceLock::new(),
        }
    }

    /// Decode every trait image referenced by `layers`.
    pub fn prepare_layers(root: impl Into<PathBuf>, layers: &LayerStack) -> Self {
        let mut out = Self::new(root);
        for layer in layers.layers() {
            for t in &layer.traits {
                out.load(&t.image);
            }
        }
        out
    }

    /// Decode the current and original source of every photo in `photos`.
    pub fn prepare_photos(root: impl Into<PathBuf>, photos: &PhotoSet) -> Self {
        let mut out = Self::new(root);
        for img in photos.images() {
            out.load(&img.source);
            out.load(&img.original_source);
        }
        out
    }

    /// Font database and resource directory for SVG assets, built on first use.
    pub fn svg_context(&self) -> &SvgContext {
        self.svg.get_or_init(|| SvgContext::new(&self.root))
    }

    /// Read and decode `key` from disk unless already present. Returns whether it decoded.
    pub fn load(&mut self, key: &AssetKey) -> bool {
        if let Some(entry) = self.entries.get(key) {
            return entry.is_ok();
        }
        let path = self.root.join(Path::new(key.as_str()));
        let entry = std::fs::read(&path)
            .map_err(|e| ForgeError::asset_decode(format!("read '{}': {e}", path.display())))
            .and_then(|bytes| decode_asset(key.as_str(), &bytes, || self.svg_context()));
        self.record(key.clone(), entry)
    }

    /// Decode in-memory bytes under `key`, replacing any previous entry. Returns whether it decoded.
    pub fn insert_bytes(&mut self, key: AssetKey, bytes: &[u8]) -> bool {
        let entry = decode_asset(key.as_str(), bytes, || self.svg_context());
        self.record(key, entry)
    }

    /// Store an already decoded image under `key`.
    pub fn insert_image(&mut self, key: AssetKey, image: PreparedImage) {
        self.entries.insert(key, Ok(image));
    }

    /// Borrow a decoded image.
    pub fn get(&self, key: &AssetKey) -> ForgeResult<&PreparedImage> {
        match self.entries.get(key) {
            Some(Ok(img)) => Ok(img),
            Some(Err(msg)) => Err(ForgeError::asset_decode(format!("'{key}': {msg}"))),
            None => Err(ForgeError::asset_decode(format!("'{key}' was never loaded"))),
        }
    }

    /// Keys whose decode failed, with the failure message.
    pub fn failures(&self) -> impl Iterator<Item = (&AssetKey, &str)> {
        self.entries
            .iter()
            .filter_map(|(k, v)| v.as_ref().err().map(|msg| (k, msg.as_str())))
    }

    /// Number of entries, decoded or failed.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the store holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn record(&mut self, key: AssetKey, entry: ForgeResult<PreparedImage>) -> bool {
        let ok = entry.is_ok();
        let entry = entry.map_err(|e| {
            tracing::warn!(asset = %key, error = %e, "asset failed to decode");
            e.to_string()
        });
        self.entries.insert(key, entry);
        ok
    }
}

/// Normalize a relative asset path: forward slashes, no `.` segments, no `..`, not absolute.
pub fn normalize_rel_path(source: &str) -> ForgeResult<String> {
    let s = source.replace('\\', "/");
    if s.starts_with('/') {
        return Err(ForgeError::validation("asset paths must be relative"));
    }
    if s.trim().is_empty() {
        return Err(ForgeError::validation("asset path must be non-empty"));
    }

    let mut out = Vec::<&str>::new();
    for part in s.split('/') {
        if part.is_empty() || part == "." {
            continue;
        }
        if part == ".." {
            return Err(ForgeError::validation("asset paths must not contain '..'"));
        }
        out.push(part);
    }

    if out.is_empty() {
        return Err(ForgeError::validation("asset path must contain a file name"));
    }

    Ok(out.join("/"))
}

#[cfg(test)]
#[path = "../../tests/unit/assets/store.rs"]
mod tests;
