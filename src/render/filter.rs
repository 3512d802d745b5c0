//! Global color adjustment shared by every image of a photo batch.
//!
//! The four primitives follow the CSS filter-effects definitions (`brightness`, `contrast`,
//! `saturate`, `hue-rotate`) and are applied in that order on straight-alpha color, each clamped
//! to `[0, 1]`, so exports match what a browser preview shows.

use crate::{
    foundation::error::{ForgeError, ForgeResult},
    foundation::math::{premultiply_rgba8_in_place, unpremultiply_px},
};

/// Color filter parameters.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ColorFilter {
    /// Linear multiplier, `[0.5, 2]`.
    pub brightness: f64,
    /// Contrast around mid-gray, `[0.5, 2]`.
    pub contrast: f64,
    /// Saturation, `[0, 3]`; `0` is grayscale.
    pub saturation: f64,
    /// Hue rotation in degrees, `[0, 360]`.
    pub hue_degrees: f64,
}

impl Default for ColorFilter {
    fn default() -> Self {
        Self {
            brightness: 1.0,
            contrast: 1.0,
            saturation: 1.0,
            hue_degrees: 0.0,
        }
    }
}

/// Named shortcuts that set all four filter parameters at once.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum FilterPreset {
    /// Gentle lift of brightness, contrast and saturation.
    Auto,
    /// Black and white.
    Bw,
    /// Slightly faded, warm shift.
    Vintage,
    /// Punchy saturation with a warm hue shift.
    Tang,
}

impl FilterPreset {
    /// The filter this preset stands for.
    pub fn filter(self) -> ColorFilter {
        let (brightness, contrast, saturation, hue_degrees) = match self {
            Self::Auto => (1.05, 1.08, 1.12, 0.0),
            Self::Bw => (1.0, 1.05, 0.0, 0.0),
            Self::Vintage => (0.98, 0.95, 0.85, 5.0),
            Self::Tang => (1.04, 1.06, 1.35, 18.0),
        };
        ColorFilter {
            brightness,
            contrast,
            saturation,
            hue_degrees,
        }
    }
}

impl ColorFilter {
    /// Overwrite all four parameters with `preset`.
    pub fn apply_preset(&mut self, preset: FilterPreset) {
        *self = preset.filter();
    }

    /// Check every parameter against its accepted range.
    pub fn validate(&self) -> ForgeResult<()> {
        for (name, value, lo, hi) in [
            ("brightness", self.brightness, 0.5, 2.0),
            ("contrast", self.contrast, 0.5, 2.0),
            ("saturation", self.saturation, 0.0, 3.0),
            ("hue_degrees", self.hue_degrees, 0.0, 360.0),
        ] {
            if !value.is_finite() || value < lo || value > hi {
                return Err(ForgeError::validation(format!(
                    "filter {name} must be within [{lo}, {hi}], got {value}"
                )));
            }
        }
        Ok(())
    }

    /// Whether applying the filter leaves pixels unchanged.
    pub fn is_identity(&self) -> bool {
        self.brightness == 1.0
            && self.contrast == 1.0
            && self.saturation == 1.0
            && self.hue_degrees % 360.0 == 0.0
    }

    /// Apply the filter to a premultiplied RGBA8 buffer.
    pub fn apply_in_place(&self, rgba8_premul: &mut [u8]) {
        if self.is_identity() {
            return;
        }
        let saturate = saturate_matrix(self.saturation);
        let hue = hue_rotate_matrix(self.hue_degrees);

        for px in rgba8_premul.chunks_exact_mut(4) {
            if px[3] == 0 {
                continue;
            }
            let straight = unpremultiply_px([px[0], px[1], px[2], px[3]]);
            let mut c = [
                f64::from(straight[0]) / 255.0,
                f64::from(straight[1]) / 255.0,
                f64::from(straight[2]) / 255.0,
            ];

            for v in &mut c {
                *v = (*v * self.brightness).clamp(0.0, 1.0);
            }
            for v in &mut c {
                *v = ((*v - 0.5) * self.contrast + 0.5).clamp(0.0, 1.0);
            }
            c = mul3(&saturate, c);
            c = mul3(&hue, c);

            for (dst, v) in px.iter_mut().zip(c) {
                *dst = (v * 255.0).round() as u8;
            }
        }
        premultiply_rgba8_in_place(rgba8_premul);
    }
}

type Mat3 = [[f64; 3]; 3];

fn mul3(m: &Mat3, c: [f64; 3]) -> [f64; 3] {
    let mut out = [0.0; 3];
    for (o, row) in out.iter_mut().zip(m) {
        *o = (row[0] * c[0] + row[1] * c[1] + row[2] * c[2]).clamp(0.0, 1.0);
    }
    out
}

fn saturate_matrix(s: f64) -> Mat3 {
    [
        [0.213 + 0.787 * s, 0.715 - 0.715 * s, 0.072 - 0.072 * s],
        [0.213 - 0.213 * s, 0.715 + 0.285 * s, 0.072 - 0.072 * s],
        [0.213 - 0.213 * s, 0.715 - 0.715 * s, 0.072 + 0.928 * s],
    ]
}

fn hue_rotate_matrix(deg: f64) -> Mat3 {
    let (sin, cos) = deg.to_radians().sin_cos();
    [
        [
            0.213 + cos * 0.787 - sin * 0.213,
            0.715 - cos * 0.715 - sin * 0.715,
            0.072 - cos * 0.072 + sin * 0.928,
        ],
        [
            0.213 - cos * 0.213 + sin * 0.143,
            0.715 + cos * 0.285 + sin * 0.140,
            0.072 - cos * 0.072 - sin * 0.283,
        ],
        [
            0.213 - cos * 0.213 - sin * 0.787,
            0.715 - cos * 0.715 + sin * 0.715,
            0.072 + cos * 0.928 + sin * 0.072,
        ],
    ]
}

#[cfg(test)]
#[path = "../../tests/unit/render/filter.rs"]
mod tests;
