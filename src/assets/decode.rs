use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use crate::{
    assets::store::PreparedImage,
    foundation::core::MAX_SURFACE_SIDE,
    foundation::error::{ForgeError, ForgeResult},
    foundation::math::premultiply_rgba8_in_place,
};

/// Decode raster bytes (any format the `image` crate recognizes) into premultiplied RGBA8.
pub fn decode_image(bytes: &[u8]) -> ForgeResult<PreparedImage> {
    let dyn_img = image::load_from_memory(bytes)
        .map_err(|e| ForgeError::asset_decode(format!("decode image from memory: {e}")))?;
    let rgba = dyn_img.to_rgba8();
    let (width, height) = rgba.dimensions();
    check_dimensions(width, height)?;

    let mut rgba8_premul = rgba.into_raw();
    premultiply_rgba8_in_place(&mut rgba8_premul);

    Ok(PreparedImage {
        width,
        height,
        rgba8_premul: Arc::new(rgba8_premul),
    })
}

/// Fonts and the resource directory used when parsing SVG assets.
///
/// Building one loads every system font, so a store builds it once and shares it.
#[derive(Clone)]
pub struct SvgContext {
    fontdb: Arc<usvg::fontdb::Database>,
    resources_dir: Option<PathBuf>,
}

impl SvgContext {
    /// System fonts plus font files found in `root` and `root/fonts`; `<image href>` resolves
    /// against `root`.
    pub fn new(root: &Path) -> Self {
        let mut db = usvg::fontdb::Database::new();
        db.load_system_fonts();
        load_fonts_from_dir(&mut db, root);
        load_fonts_from_dir(&mut db, &root.join("fonts"));
        tracing::debug!(faces = db.len(), root = %root.display(), "svg font database ready");
        Self {
            fontdb: Arc::new(db),
            resources_dir: Some(root.to_path_buf()),
        }
    }

    /// Number of font faces available to SVG text.
    pub fn face_count(&self) -> usize {
        self.fontdb.len()
    }

    fn options(&self) -> usvg::Options<'static> {
        usvg::Options {
            resources_dir: self.resources_dir.clone(),
            fontdb: Arc::clone(&self.fontdb),
            font_resolver: font_resolver(),
            ..Default::default()
        }
    }
}

impl std::fmt::Debug for SvgContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SvgContext")
            .field("faces", &self.fontdb.len())
            .field("resources_dir", &self.resources_dir)
            .finish()
    }
}

fn load_fonts_from_dir(db: &mut usvg::fontdb::Database, dir: &Path) {
    let Ok(rd) = std::fs::read_dir(dir) else {
        return;
    };
    for path in rd.flatten().map(|e| e.path()) {
        let is_font = path.extension().and_then(|s| s.to_str()).is_some_and(|ext| {
            ["ttf", "otf", "ttc"]
                .iter()
                .any(|f| ext.eq_ignore_ascii_case(f))
        });
        if is_font && path.is_file() && db.load_font_file(&path).is_err() {
            tracing::warn!(font = %path.display(), "font file skipped");
        }
    }
}

/// Requested families first, then generic ones, then any face at all.
fn font_resolver() -> usvg::FontResolver<'static> {
    use usvg::fontdb::{Family, Query, Stretch, Style, Weight};

    usvg::FontResolver {
        select_font: Box::new(|font, fontdb| {
            let mut families: Vec<Family<'_>> = font
                .families()
                .iter()
                .map(|family| match family {
                    usvg::FontFamily::Serif => Family::Serif,
                    usvg::FontFamily::SansSerif => Family::SansSerif,
                    usvg::FontFamily::Cursive => Family::Cursive,
                    usvg::FontFamily::Fantasy => Family::Fantasy,
                    usvg::FontFamily::Monospace => Family::Monospace,
                    usvg::FontFamily::Named(s) => Family::Name(s),
                })
                .collect();
            families.extend([Family::SansSerif, Family::Serif, Family::Monospace]);

            let style = match font.style() {
                usvg::FontStyle::Normal => Style::Normal,
                usvg::FontStyle::Italic => Style::Italic,
                usvg::FontStyle::Oblique => Style::Oblique,
            };
            let query = Query {
                families: &families,
                weight: Weight(font.weight()),
                stretch: Stretch::Normal,
                style,
            };
            fontdb
                .query(&query)
                .or_else(|| fontdb.faces().next().map(|f| f.id))
        }),
        select_fallback: usvg::FontResolver::default_fallback_selector(),
    }
}

/// Parse SVG bytes into a `usvg` tree, resolving fonts and resources through `ctx`.
pub fn parse_svg(bytes: &[u8], ctx: &SvgContext) -> ForgeResult<usvg::Tree> {
    usvg::Tree::from_data(bytes, &ctx.options())
        .map_err(|e| ForgeError::asset_decode(format!("parse svg tree: {e}")))
}

/// Rasterize an SVG tree at its intrinsic size.
pub fn rasterize_svg(tree: &usvg::Tree) -> ForgeResult<PreparedImage> {
    fn to_px(v: f32) -> ForgeResult<u32> {
        if !v.is_finite() || v <= 0.0 {
            return Err(ForgeError::asset_decode("svg has invalid width/height"));
        }
        Ok((v.ceil() as u32).max(1))
    }

    let size = tree.size();
    let width = to_px(size.width())?;
    let height = to_px(size.height())?;
    check_dimensions(width, height)?;

    let mut pixmap = resvg::tiny_skia::Pixmap::new(width, height)
        .ok_or_else(|| ForgeError::asset_decode("failed to allocate svg pixmap"))?;
    let sx = (width as f32) / size.width();
    let sy = (height as f32) / size.height();
    resvg::render(
        tree,
        resvg::tiny_skia::Transform::from_scale(sx, sy),
        &mut pixmap.as_mut(),
    );

    // tiny-skia pixmaps are already premultiplied RGBA8.
    Ok(PreparedImage {
        width,
        height,
        rgba8_premul: Arc::new(pixmap.data().to_vec()),
    })
}

/// Decode an asset, dispatching on the file extension of `name`.
///
/// `svg` is only called for `.svg` names, so raster-only callers never load fonts.
pub fn decode_asset<'a>(
    name: &str,
    bytes: &[u8],
    svg: impl FnOnce() -> &'a SvgContext,
) -> ForgeResult<PreparedImage> {
    if is_svg_name(name) {
        rasterize_svg(&parse_svg(bytes, svg())?)
    } else {
        decode_image(bytes)
    }
}

fn is_svg_name(name: &str) -> bool {
    name.rsplit_once('.')
        .is_some_and(|(_, ext)| ext.eq_ignore_ascii_case("svg"))
}

fn check_dimensions(width: u32, height: u32) -> ForgeResult<()> {
    if width == 0 || height == 0 {
        return Err(ForgeError::asset_decode("image has zero width or height"));
    }
    if width > MAX_SURFACE_SIDE || height > MAX_SURFACE_SIDE {
        return Err(ForgeError::asset_decode(format!(
            "image {width}x{height} exceeds {MAX_SURFACE_SIDE}x{MAX_SURFACE_SIDE}"
        )));
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/assets/decode.rs"]
mod tests;
