use crate::{
    assets::store::PreparedImage,
    foundation::core::{Affine, Canvas, Vec2},
    foundation::error::{ForgeError, ForgeResult},
    foundation::math::mul_div255_u8,
    render::surface::Surface,
};

pub type PremulRgba8 = [u8; 4];

/// Scaled image extents beyond this many pixels count as degenerate cover geometry.
pub const MAX_FIT_EXTENT: f64 = 16_777_216.0;

/// Premultiplied source-over. Opaque sources replace the destination outright.
pub fn over(dst: PremulRgba8, src: PremulRgba8) -> PremulRgba8 {
    match src[3] {
        0 => return dst,
        255 => return src,
        _ => {}
    }

    let inv = 255u16 - u16::from(src[3]);
    let mut out = [0u8; 4];
    for i in 0..4 {
        out[i] = src[i].saturating_add(mul_div255_u8(u16::from(dst[i]), inv));
    }
    out
}

/// How an image is fitted into the canvas box.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FitMode {
    /// Fill the box, center-cropping the overflow.
    Cover,
    /// Fit entirely inside the box, centered, possibly leaving empty space.
    Contain,
}

/// Transform placing an `img_w`x`img_h` image into `canvas` with the given fit.
pub fn fit_transform(img_w: u32, img_h: u32, canvas: Canvas, mode: FitMode) -> ForgeResult<Affine> {
    if img_w == 0 || img_h == 0 {
        return Err(ForgeError::geometry("cannot fit an image with a zero side"));
    }
    let (cw, ch) = (f64::from(canvas.width), f64::from(canvas.height));
    let (iw, ih) = (f64::from(img_w), f64::from(img_h));
    let wr = cw / iw;
    let hr = ch / ih;
    let scale = match mode {
        FitMode::Cover => wr.max(hr),
        FitMode::Contain => wr.min(hr),
    };

    let (w, h) = (iw * scale, ih * scale);
    if !scale.is_finite() || scale <= 0.0 || w > MAX_FIT_EXTENT || h > MAX_FIT_EXTENT {
        return Err(ForgeError::geometry(format!(
            "{mode:?} fit of {img_w}x{img_h} into {}x{} yields scale {scale}",
            canvas.width, canvas.height
        )));
    }

    let offset = Vec2::new((cw - w) / 2.0, (ch - h) / 2.0);
    Ok(Affine::translate(offset) * Affine::scale(scale))
}

/// Draw `img` cover-fitted onto `surface`, falling back to contain fitting on geometry failure.
///
/// Returns the fit that was actually used.
pub fn draw_fitted(surface: &mut Surface, img: &PreparedImage) -> ForgeResult<FitMode> {
    let canvas = Canvas {
        width: surface.width(),
        height: surface.height(),
    };
    let cover = fit_transform(img.width, img.height, canvas, FitMode::Cover)
        .and_then(|xform| surface.draw_image(img, xform));
    match cover {
        Ok(()) => Ok(FitMode::Cover),
        Err(ForgeError::CompositeGeometry(reason)) => {
            tracing::debug!(%reason, "cover fit failed, retrying with contain");
            let xform = fit_transform(img.width, img.height, canvas, FitMode::Contain)?;
            surface.draw_image(img, xform)?;
            Ok(FitMode::Contain)
        }
        Err(e) => Err(e),
    }
}

/// Composite layer images back-to-front onto a fresh `canvas`-sized surface.
///
/// `None` entries (layers without a pick) draw nothing. A layer whose geometry fails even with the
/// contain fallback is skipped.
pub fn composite(layers: &[Option<&PreparedImage>], canvas: Canvas) -> ForgeResult<Surface> {
    let mut surface = Surface::new(canvas.width, canvas.height)?;
    for (slot, img) in layers.iter().enumerate() {
        let Some(img) = img else {
            continue;
        };
        if let Err(e) = draw_fitted(&mut surface, img) {
            if !e.is_item_local() {
                return Err(e);
            }
            tracing::warn!(slot, error = %e, "layer skipped during composite");
        }
    }
    Ok(surface)
}

#[cfg(test)]
#[path = "../../tests/unit/render/composite.rs"]
mod tests;
