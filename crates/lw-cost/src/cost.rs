//! Directed link costs.
//!
//! `static = wZ * fZ(q) + wG * fG(q) + wD * fD(p, q)` where `fZ` is the
//! Laplacian zero-crossing cost, `fG` the inverted gradient magnitude and
//! `fD` the gradient-direction smoothness term
//! `2 / (3 pi) * (acos(D'(p) . L) + acos(L . D'(q)))`, with `L` the unit link
//! vector oriented so that `D'(p) . L >= 0`.
//!
//! The trained part looks up `q`'s relative gradient magnitude and intensity
//! in the session's [`FeatureWeights`] maps. Both parts are blended by the
//! session weights and clipped to `[0, 1]`.

use core::f32::consts::PI;
use std::sync::Arc;

use lw_core::{Direction, Error, LinkCost, Pixel};
use lw_edge::FeatureField;

use crate::train::FeatureWeights;

const NOT_COMPUTED: f32 = f32::NAN;
const BLOCKED: f32 = f32::INFINITY;

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct CostWeights {
    pub zero_crossing: f32,
    pub gradient: f32,
    pub direction: f32,
    pub trained_gradient: f32,
    pub trained_intensity: f32,
}

impl Default for CostWeights {
    fn default() -> Self {
        Self {
            zero_crossing: 0.43,
            gradient: 0.43,
            direction: 0.14,
            trained_gradient: 0.5,
            trained_intensity: 0.5,
        }
    }
}

impl CostWeights {
    /// Checks the weights and rescales each group to sum to one.
    pub fn normalized(&self) -> Result<Self, Error> {
        let all = [
            self.zero_crossing,
            self.gradient,
            self.direction,
            self.trained_gradient,
            self.trained_intensity,
        ];
        if all.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err(Error::InvalidConfig(
                "cost weights must be finite and non-negative",
            ));
        }

        let static_sum = self.zero_crossing + self.gradient + self.direction;
        if static_sum <= 0.0 {
            return Err(Error::InvalidConfig("static cost weights sum to zero"));
        }
        let trained_sum = self.trained_gradient + self.trained_intensity;
        if trained_sum <= 0.0 {
            return Err(Error::InvalidConfig("trained cost weights sum to zero"));
        }

        Ok(Self {
            zero_crossing: self.zero_crossing / static_sum,
            gradient: self.gradient / static_sum,
            direction: self.direction / static_sum,
            trained_gradient: self.trained_gradient / trained_sum,
            trained_intensity: self.trained_intensity / trained_sum,
        })
    }
}

/// Gradient-direction term for the step `p -> q` along `dir`, in `[0, 1]`.
pub fn direction_cost(features: &FeatureField, p: Pixel, q: Pixel, dir: Direction) -> f32 {
    let dp_vec = features.edge_tangent(p);
    let dq_vec = features.edge_tangent(q);

    let mut link = dir.unit();
    if dp_vec.dot(link) < 0.0 {
        link = link * -1.0;
    }

    let dp = dp_vec.dot(link).clamp(-1.0, 1.0);
    let dq = link.dot(dq_vec).clamp(-1.0, 1.0);
    (2.0 / (3.0 * PI)) * (dp.acos() + dq.acos())
}

/// Link cost source for one tracing session.
///
/// Features and weights are frozen for the lifetime of the model, so every
/// directed link is computed at most once.
#[derive(Debug, Clone)]
pub struct CostModel {
    features: Arc<FeatureField>,
    static_weights: CostWeights,
    weights: FeatureWeights,
    cache: Vec<f32>,
    computed: usize,
}

impl CostModel {
    pub fn new(
        features: Arc<FeatureField>,
        static_weights: &CostWeights,
        weights: FeatureWeights,
    ) -> Result<Self, Error> {
        let static_weights = static_weights.normalized()?;
        let links = features
            .width()
            .checked_mul(features.height())
            .and_then(|n| n.checked_mul(8))
            .ok_or(Error::InvalidConfig("raster too large for link cache"))?;

        Ok(Self {
            features,
            static_weights,
            weights,
            cache: vec![NOT_COMPUTED; links],
            computed: 0,
        })
    }

    pub fn features(&self) -> &FeatureField {
        &self.features
    }

    pub fn weights(&self) -> &FeatureWeights {
        &self.weights
    }

    /// Number of directed links evaluated so far.
    pub fn cached_links(&self) -> usize {
        self.computed
    }

    pub fn static_cost(&self, p: Pixel, q: Pixel, dir: Direction) -> f32 {
        let f = &*self.features;
        let w = &self.static_weights;
        w.zero_crossing * f.zero_crossing_cost(q)
            + w.gradient * f.gradient_cost(q)
            + w.direction * direction_cost(f, p, q, dir)
    }

    /// Trained cost of entering `q`; zero for neutral weights.
    pub fn dynamic_cost(&self, q: Pixel) -> f32 {
        let (Some(grad_map), Some(int_map)) =
            (&self.weights.gradient_map, &self.weights.intensity_map)
        else {
            return 0.0;
        };

        let f = &*self.features;
        let w = &self.static_weights;
        w.trained_gradient * grad_map.lookup(f.relative_magnitude(q))
            + w.trained_intensity * int_map.lookup(f.intensity(q))
    }

    fn compute(&self, p: Pixel, dir: Direction) -> Option<f32> {
        let f = &*self.features;
        let q = p.neighbor(dir, f.width(), f.height())?;
        if !f.is_valid(p) || !f.is_valid(q) {
            return None;
        }

        let cost = self.weights.static_weight * self.static_cost(p, q, dir)
            + self.weights.dynamic_weight * self.dynamic_cost(q);
        Some(cost.clamp(0.0, 1.0))
    }
}

impl LinkCost for CostModel {
    fn dimensions(&self) -> (usize, usize) {
        (self.features.width(), self.features.height())
    }

    fn link_cost(&mut self, from: Pixel, dir: Direction) -> Option<f32> {
        let (w, h) = self.dimensions();
        if from.x >= w || from.y >= h {
            return None;
        }

        let slot = from.index(w) * 8 + dir.index();
        let cached = self.cache[slot];
        if !cached.is_nan() {
            return (cached != BLOCKED).then_some(cached);
        }

        let cost = self.compute(from, dir);
        self.cache[slot] = cost.unwrap_or(BLOCKED);
        self.computed += 1;
        cost
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use lw_core::{Direction, LinkCost, Pixel, Raster};
    use lw_edge::{FeatureConfig, compute_features};

    use super::{CostModel, CostWeights, direction_cost};
    use crate::train::{FeatureWeights, TrainerConfig, train};

    fn model_for(raster: &Raster) -> CostModel {
        let features = Arc::new(compute_features(raster, &FeatureConfig::default()));
        CostModel::new(features, &CostWeights::default(), FeatureWeights::neutral())
            .expect("valid weights")
    }

    #[test]
    fn uniform_raster_has_constant_link_costs() {
        let raster = Raster::from_vec(5, 5, vec![3.0; 25]).expect("valid raster");
        let mut model = model_for(&raster);

        let expected = 0.43 + 0.43 + 0.14 * (2.0 / 3.0);
        for y in 0..5 {
            for x in 0..5 {
                for d in Direction::ALL {
                    if let Some(c) = model.link_cost(Pixel::new(x, y), d) {
                        assert!((c - expected).abs() < 1e-5, "cost {c} at ({x}, {y}) {d:?}");
                    }
                }
            }
        }
    }

    #[test]
    fn links_are_cached_once() {
        let raster = Raster::from_u8(4, 4, &[0, 0, 9, 9].repeat(4)).expect("valid raster");
        let mut model = model_for(&raster);

        let p = Pixel::new(1, 1);
        let first = model.link_cost(p, Direction::E);
        assert_eq!(model.cached_links(), 1);
        let second = model.link_cost(p, Direction::E);
        assert_eq!(first, second);
        assert_eq!(model.cached_links(), 1);

        assert_eq!(model.link_cost(Pixel::new(3, 0), Direction::E), None);
        assert_eq!(model.link_cost(Pixel::new(3, 0), Direction::E), None);
        assert_eq!(model.cached_links(), 2);
    }

    #[test]
    fn no_data_pixels_block_links() {
        let mut data = vec![1.0f32; 9];
        data[4] = f32::NAN;
        let raster = Raster::from_vec(3, 3, data).expect("valid raster");
        let mut model = model_for(&raster);

        assert_eq!(model.link_cost(Pixel::new(0, 0), Direction::SE), None);
        assert_eq!(model.link_cost(Pixel::new(1, 1), Direction::W), None);
        assert!(model.link_cost(Pixel::new(0, 0), Direction::E).is_some());
    }

    #[test]
    fn direction_term_prefers_links_along_the_edge() {
        let mut data = vec![0u8; 36];
        for y in 0..6 {
            for x in 3..6 {
                data[y * 6 + x] = 200;
            }
        }
        let raster = Raster::from_u8(6, 6, &data).expect("valid raster");
        let features = compute_features(&raster, &FeatureConfig::default());

        let p = Pixel::new(3, 2);
        let along = direction_cost(&features, p, Pixel::new(3, 3), Direction::S);
        let across = direction_cost(&features, p, Pixel::new(4, 2), Direction::E);
        assert!(along.abs() < 1e-6);
        assert!((across - 2.0 / 3.0).abs() < 1e-5);
    }

    #[test]
    fn trained_costs_stay_in_unit_range() {
        let mut data = vec![0u8; 49];
        for i in 0..7 {
            data[i * 7 + i] = 255;
        }
        let raster = Raster::from_u8(7, 7, &data).expect("valid raster");
        let features = Arc::new(compute_features(&raster, &FeatureConfig::default()));
        let weights = train(&features, Pixel::new(0, 0), &[], &TrainerConfig::default());
        assert!(weights.is_trained());

        let mut model =
            CostModel::new(features, &CostWeights::default(), weights).expect("valid weights");
        for y in 0..7 {
            for x in 0..7 {
                for d in Direction::ALL {
                    if let Some(c) = model.link_cost(Pixel::new(x, y), d) {
                        assert!((0.0..=1.0).contains(&c));
                    }
                }
            }
        }

        // Entering the ridge is cheaper than stepping off it.
        let on = model.link_cost(Pixel::new(1, 1), Direction::SE).expect("on ridge");
        let off = model.link_cost(Pixel::new(1, 1), Direction::E).expect("off ridge");
        assert!(on < off);
    }

    #[test]
    fn weight_validation() {
        let bad = CostWeights {
            gradient: f32::NAN,
            ..CostWeights::default()
        };
        assert!(bad.normalized().is_err());

        let zero = CostWeights {
            zero_crossing: 0.0,
            gradient: 0.0,
            direction: 0.0,
            ..CostWeights::default()
        };
        assert!(zero.normalized().is_err());

        let w = CostWeights {
            zero_crossing: 2.0,
            gradient: 2.0,
            direction: 0.0,
            trained_gradient: 1.0,
            trained_intensity: 3.0,
        }
        .normalized()
        .expect("valid weights");
        assert_eq!(w.zero_crossing, 0.5);
        assert_eq!(w.trained_intensity, 0.75);
    }
}
