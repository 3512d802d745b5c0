use crate::{
    assets::store::PreparedImage,
    foundation::core::{Affine, Canvas, Point, Rect},
    foundation::error::{ForgeError, ForgeResult},
    foundation::math::unpremultiply_px,
    render::{composite::over, filter::ColorFilter},
};

/// Transforms whose area scale is below this are treated as degenerate.
const MIN_DETERMINANT: f64 = 1e-12;

/// Exclusively owned premultiplied RGBA8 raster.
///
/// One surface backs exactly one in-flight item; parallel renders allocate one per worker.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Surface {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl Surface {
    /// Allocate a fully transparent surface.
    pub fn new(width: u32, height: u32) -> ForgeResult<Self> {
        let len = Canvas::new(width, height)?.rgba8_len()?;
        Ok(Self {
            width,
            height,
            data: vec![0; len],
        })
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Row-major premultiplied RGBA8 bytes.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Premultiplied pixel at `(x, y)`, if inside the surface.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = ((y as usize) * (self.width as usize) + (x as usize)) * 4;
        Some([
            self.data[idx],
            self.data[idx + 1],
            self.data[idx + 2],
            self.data[idx + 3],
        ])
    }

    /// Draw `img` mapped into surface space by `xform`, compositing source-over.
    ///
    /// Every destination pixel center is mapped back into image space and sampled bilinearly;
    /// centers falling outside the image are left untouched.
    pub fn draw_image(&mut self, img: &PreparedImage, xform: Affine) -> ForgeResult<()> {
        if !xform.is_finite() {
            return Err(ForgeError::geometry("draw transform is not finite"));
        }
        let det = xform.determinant();
        if det.abs() < MIN_DETERMINANT {
            return Err(ForgeError::geometry(format!(
                "draw transform is degenerate (determinant {det:e})"
            )));
        }

        let (iw, ih) = (f64::from(img.width), f64::from(img.height));
        let bbox = xform.transform_rect_bbox(Rect::new(0.0, 0.0, iw, ih));
        let x0 = bbox.x0.floor().max(0.0);
        let y0 = bbox.y0.floor().max(0.0);
        let x1 = bbox.x1.ceil().min(f64::from(self.width));
        let y1 = bbox.y1.ceil().min(f64::from(self.height));
        if x0 >= x1 || y0 >= y1 {
            return Ok(());
        }

        let inv = xform.inverse();
        let stride = self.width as usize;
        for y in (y0 as u32)..(y1 as u32) {
            for x in (x0 as u32)..(x1 as u32) {
                let p = inv * Point::new(f64::from(x) + 0.5, f64::from(y) + 0.5);
                if p.x < 0.0 || p.y < 0.0 || p.x >= iw || p.y >= ih {
                    continue;
                }
                let src = sample_bilinear(img, p.x - 0.5, p.y - 0.5);
                if src[3] == 0 {
                    continue;
                }
                let idx = ((y as usize) * stride + (x as usize)) * 4;
                let dst = [
                    self.data[idx],
                    self.data[idx + 1],
                    self.data[idx + 2],
                    self.data[idx + 3],
                ];
                self.data[idx..idx + 4].copy_from_slice(&over(dst, src));
            }
        }
        Ok(())
    }

    /// Apply a color filter to every pixel in place.
    pub fn apply_filter(&mut self, filter: &ColorFilter) {
        filter.apply_in_place(&mut self.data);
    }

    /// Straight-alpha RGBA8 copy, as expected by PNG encoders.
    pub fn to_straight_rgba8(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.data.len());
        for px in self.data.chunks_exact(4) {
            out.extend_from_slice(&unpremultiply_px([px[0], px[1], px[2], px[3]]));
        }
        out
    }

    /// RGB8 flattened over black. Premultiplied color channels are exactly that.
    pub fn to_flattened_rgb8(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.data.len() / 4 * 3);
        for px in self.data.chunks_exact(4) {
            out.extend_from_slice(&px[0..3]);
        }
        out
    }

    /// Reinterpret the surface as a source image for a further render pass.
    pub fn into_image(self) -> PreparedImage {
        PreparedImage {
            width: self.width,
            height: self.height,
            rgba8_premul: std::sync::Arc::new(self.data),
        }
    }
}

fn sample_bilinear(img: &PreparedImage, u: f64, v: f64) -> [u8; 4] {
    let (w, h) = (i64::from(img.width), i64::from(img.height));
    let fx = u.floor();
    let fy = v.floor();
    let tx = u - fx;
    let ty = v - fy;
    let (x0, y0) = (fx as i64, fy as i64);

    let px = |x: i64, y: i64| -> [f64; 4] {
        let x = x.clamp(0, w - 1) as usize;
        let y = y.clamp(0, h - 1) as usize;
        let idx = (y * img.width as usize + x) * 4;
        let p = &img.rgba8_premul[idx..idx + 4];
        [
            f64::from(p[0]),
            f64::from(p[1]),
            f64::from(p[2]),
            f64::from(p[3]),
        ]
    };

    let a = px(x0, y0);
    let b = px(x0 + 1, y0);
    let c = px(x0, y0 + 1);
    let d = px(x0 + 1, y0 + 1);

    let mut out = [0u8; 4];
    for i in 0..4 {
        let top = a[i] + (b[i] - a[i]) * tx;
        let bottom = c[i] + (d[i] - c[i]) * tx;
        out[i] = (top + (bottom - top) * ty).round().clamp(0.0, 255.0) as u8;
    }
    // Keep the premultiplied invariant (color <= alpha) after rounding.
    let alpha = out[3];
    for c in &mut out[..3] {
        *c = (*c).min(alpha);
    }
    out
}

#[cfg(test)]
#[path = "../../tests/unit/render/surface.rs"]
mod tests;
