use crate::foundation::error::{ForgeError, ForgeResult};

pub use kurbo::{Affine, Point, Rect, Vec2};

/// Side length of the procedural output raster.
pub const DEFAULT_CANVAS_SIDE: u32 = 1024;

/// Largest accepted surface side, in pixels.
pub const MAX_SURFACE_SIDE: u32 = 16_384;

/// Output raster dimensions shared by every item of a procedural run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Canvas {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Default for Canvas {
    fn default() -> Self {
        Self {
            width: DEFAULT_CANVAS_SIDE,
            height: DEFAULT_CANVAS_SIDE,
        }
    }
}

impl Canvas {
    /// Build a validated canvas.
    pub fn new(width: u32, height: u32) -> ForgeResult<Self> {
        let canvas = Self { width, height };
        canvas.validate()?;
        Ok(canvas)
    }

    /// Check that both sides are within `1..=MAX_SURFACE_SIDE`.
    pub fn validate(self) -> ForgeResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(ForgeError::validation("canvas width/height must be > 0"));
        }
        if self.width > MAX_SURFACE_SIDE || self.height > MAX_SURFACE_SIDE {
            return Err(ForgeError::validation(format!(
                "canvas {}x{} exceeds {MAX_SURFACE_SIDE}x{MAX_SURFACE_SIDE}",
                self.width, self.height
            )));
        }
        Ok(())
    }

    /// Byte length of a premultiplied RGBA8 buffer of this size.
    pub fn rgba8_len(self) -> ForgeResult<usize> {
        (self.width as usize)
            .checked_mul(self.height as usize)
            .and_then(|v| v.checked_mul(4))
            .ok_or_else(|| ForgeError::validation("canvas buffer size overflow"))
    }

    /// Canvas center in pixel space.
    pub fn center(self) -> Point {
        Point::new(f64::from(self.width) / 2.0, f64::from(self.height) / 2.0)
    }
}

/// Normalize an angle in degrees into `[0, 360)`.
///
/// Non-finite input maps to `0`.
pub fn normalize_degrees(deg: f64) -> f64 {
    if !deg.is_finite() {
        return 0.0;
    }
    let out = ((deg % 360.0) + 360.0) % 360.0;
    // -0.0 and 360.0 (from tiny negative inputs) both collapse to 0.
    if out == 0.0 || out >= 360.0 { 0.0 } else { out }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
