//! Static per-pixel edge features consumed by the link cost model.
//!
//! All features are computed once per raster:
//! - intensity normalized to `[0, 1]` over the finite samples,
//! - Scharr gradient and its inverted, max-normalized magnitude cost,
//! - 4-neighbor Laplacian and its zero crossings,
//! - edge tangent `normalize(gy, -gx)` used by the direction term.
//!
//! Flat regions end up with the maximum gradient cost and no zero crossings,
//! so the search avoids drifting through uniform areas.

use lw_core::{BorderMode, Direction, Image, Pixel, Raster, Vec2f};

use crate::kernels::{laplacian4, scharr, smooth_binomial3};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SmoothKind {
    #[default]
    None,
    Binomial3,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct FeatureConfig {
    pub smooth: SmoothKind,
    pub border: BorderMode,
    /// Gradient magnitudes at or below this are treated as zero when
    /// normalizing.
    pub flat_epsilon: f32,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            smooth: SmoothKind::None,
            border: BorderMode::Clamp,
            flat_epsilon: 1e-6,
        }
    }
}

#[derive(Debug, Clone)]
pub struct FeatureField {
    intensity: Image<f32>,
    gx: Image<f32>,
    gy: Image<f32>,
    magnitude: Image<f32>,
    gradient_cost: Image<f32>,
    laplacian: Image<f32>,
    zero_crossing: Image<u8>,
    max_magnitude: f32,
}

pub fn compute_features(raster: &Raster, cfg: &FeatureConfig) -> FeatureField {
    let mut intensity = normalize_intensity(raster.image());
    if cfg.smooth == SmoothKind::Binomial3 {
        intensity = smooth_binomial3(&intensity, cfg.border);
    }

    let (gx, gy, magnitude) = scharr(&intensity, cfg.border);
    let laplacian = laplacian4(&intensity, cfg.border);

    let max_magnitude = magnitude
        .data()
        .iter()
        .copied()
        .filter(|v| v.is_finite())
        .fold(0.0f32, f32::max);

    let mut gradient_cost = Image::new_fill(raster.width(), raster.height(), 1.0f32);
    if max_magnitude > cfg.flat_epsilon {
        for (c, &m) in gradient_cost.data_mut().iter_mut().zip(magnitude.data()) {
            *c = (1.0 - m / max_magnitude).clamp(0.0, 1.0);
        }
    }

    let zero_crossing = zero_crossings(&intensity, &laplacian);

    FeatureField {
        intensity,
        gx,
        gy,
        magnitude,
        gradient_cost,
        laplacian,
        zero_crossing,
        max_magnitude: if max_magnitude > cfg.flat_epsilon {
            max_magnitude
        } else {
            0.0
        },
    }
}

fn normalize_intensity(src: &Image<f32>) -> Image<f32> {
    let mut min_v = f32::INFINITY;
    let mut max_v = f32::NEG_INFINITY;
    for &v in src.data().iter().filter(|v| v.is_finite()) {
        min_v = min_v.min(v);
        max_v = max_v.max(v);
    }

    let range = max_v - min_v;

    let mut out = src.clone();
    for v in out.data_mut() {
        if v.is_finite() {
            *v = if range > 0.0 {
                ((*v - min_v) / range).clamp(0.0, 1.0)
            } else {
                0.0
            };
        } else {
            *v = f32::NAN;
        }
    }
    out
}

/// A pixel owns a crossing when an 8-neighbor has the opposite strict sign
/// and a magnitude at least as large as its own.
fn zero_crossings(intensity: &Image<f32>, laplacian: &Image<f32>) -> Image<u8> {
    let (w, h) = (laplacian.width(), laplacian.height());
    let mut out = Image::new_fill(w, h, 0u8);
    let lap = laplacian.data();
    let valid = intensity.data();

    for idx in 0..w * h {
        let l = lap[idx];
        if l == 0.0 || !valid[idx].is_finite() {
            continue;
        }

        let p = Pixel::from_index(idx, w);
        let crossing = Direction::ALL.into_iter().any(|d| {
            let Some(q) = p.neighbor(d, w, h) else {
                return false;
            };
            let qi = q.index(w);
            let lq = lap[qi];
            valid[qi].is_finite() && l * lq < 0.0 && l.abs() <= lq.abs()
        });

        if crossing {
            out.data_mut()[idx] = 1;
        }
    }
    out
}

impl FeatureField {
    pub fn width(&self) -> usize {
        self.intensity.width()
    }

    pub fn height(&self) -> usize {
        self.intensity.height()
    }

    /// `false` for no-data pixels.
    pub fn is_valid(&self, p: Pixel) -> bool {
        self.intensity.at(p).is_finite()
    }

    /// Normalized intensity in `[0, 1]`, NaN for no-data.
    pub fn intensity(&self, p: Pixel) -> f32 {
        *self.intensity.at(p)
    }

    pub fn gradient(&self, p: Pixel) -> Vec2f {
        Vec2f {
            x: *self.gx.at(p),
            y: *self.gy.at(p),
        }
    }

    pub fn magnitude(&self, p: Pixel) -> f32 {
        *self.magnitude.at(p)
    }

    /// Magnitude divided by the raster maximum, `0` on flat rasters.
    pub fn relative_magnitude(&self, p: Pixel) -> f32 {
        if self.max_magnitude > 0.0 {
            (self.magnitude(p) / self.max_magnitude).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }

    pub fn max_magnitude(&self) -> f32 {
        self.max_magnitude
    }

    /// `1 - relative magnitude`; `1` everywhere on flat rasters.
    pub fn gradient_cost(&self, p: Pixel) -> f32 {
        *self.gradient_cost.at(p)
    }

    pub fn laplacian(&self, p: Pixel) -> f32 {
        *self.laplacian.at(p)
    }

    pub fn is_zero_crossing(&self, p: Pixel) -> bool {
        *self.zero_crossing.at(p) != 0
    }

    /// `0` on a zero crossing, `1` elsewhere.
    pub fn zero_crossing_cost(&self, p: Pixel) -> f32 {
        if self.is_zero_crossing(p) { 0.0 } else { 1.0 }
    }

    /// Unit vector perpendicular to the gradient, zero on flat pixels.
    pub fn edge_tangent(&self, p: Pixel) -> Vec2f {
        let g = self.gradient(p);
        Vec2f { x: g.y, y: -g.x }.normalize()
    }

    pub fn intensity_image(&self) -> &Image<f32> {
        &self.intensity
    }

    pub fn magnitude_image(&self) -> &Image<f32> {
        &self.magnitude
    }

    pub fn gradient_cost_image(&self) -> &Image<f32> {
        &self.gradient_cost
    }

    pub fn laplacian_image(&self) -> &Image<f32> {
        &self.laplacian
    }

    pub fn zero_crossing_image(&self) -> &Image<u8> {
        &self.zero_crossing
    }
}
