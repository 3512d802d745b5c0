use crate::{
    assets::store::PreparedImage,
    foundation::core::{Affine, Canvas, normalize_degrees},
    foundation::error::{ForgeError, ForgeResult},
    render::{filter::ColorFilter, surface::Surface},
};

/// Per-image rotation and scale, pivoting on the image center.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Geometry {
    /// Clockwise rotation in degrees; normalized into `[0, 360)` before use.
    pub rotation_degrees: f64,
    /// Uniform scale factor; must be positive.
    pub scale: f64,
}

impl Default for Geometry {
    fn default() -> Self {
        Self {
            rotation_degrees: 0.0,
            scale: 1.0,
        }
    }
}

impl Geometry {
    /// Whether drawing needs anything beyond a plain copy at the origin.
    pub fn is_identity(&self) -> bool {
        normalize_degrees(self.rotation_degrees) == 0.0 && self.scale == 1.0
    }

    /// Transform drawing a `width`x`height` image into a same-sized surface.
    ///
    /// `T(center) * R * S * T(-size/2)`. Quarter turns use exact sin/cos so that opposite
    /// rotations cancel pixel for pixel.
    pub fn to_affine(&self, width: u32, height: u32) -> ForgeResult<Affine> {
        if self.is_identity() {
            return Ok(Affine::IDENTITY);
        }
        if !self.scale.is_finite() || self.scale <= 0.0 {
            return Err(ForgeError::geometry(format!(
                "scale must be finite and > 0, got {}",
                self.scale
            )));
        }
        let half = Canvas { width, height }.center().to_vec2();
        Ok(Affine::translate(half)
            * rotation(normalize_degrees(self.rotation_degrees))
            * Affine::scale(self.scale)
            * Affine::translate(-half))
    }
}

fn rotation(deg: f64) -> Affine {
    let quarter = deg / 90.0;
    let (sin, cos) = if quarter.fract() == 0.0 {
        match quarter as u8 {
            0 => (0.0, 1.0),
            1 => (1.0, 0.0),
            2 => (0.0, -1.0),
            _ => (-1.0, 0.0),
        }
    } else {
        deg.to_radians().sin_cos()
    };
    Affine::new([cos, sin, -sin, cos, 0.0, 0.0])
}

/// Render one source image with the shared filter and its own geometry.
///
/// The output keeps the source's native dimensions; content rotated or scaled past the edges is
/// cropped and uncovered pixels stay transparent.
#[tracing::instrument(skip(src, filter), fields(w = src.width, h = src.height))]
pub fn render_single(
    src: &PreparedImage,
    filter: &ColorFilter,
    geometry: Geometry,
) -> ForgeResult<Surface> {
    let mut surface = Surface::new(src.width, src.height)?;
    let xform = geometry.to_affine(src.width, src.height)?;
    surface.draw_image(src, xform)?;
    if !filter.is_identity() {
        surface.apply_filter(filter);
    }
    Ok(surface)
}

#[cfg(test)]
#[path = "../../tests/unit/render/single.rs"]
mod tests;
