//! Seed-local training of the dynamic cost bias.
//!
//! Samples come from one of two places:
//! - the tail of the previously anchored segment, when it is long enough,
//! - otherwise the window around the seed, keeping pixels whose intensity is
//!   close to the seed's (the edge the user clicked on).
//!
//! Sampled relative gradient magnitudes and intensities are binned. A bin's
//! trained cost is `1 - count / max_count`, so feature values seen often
//! along the followed edge become cheap. A flat window falls back to neutral
//! weights.

use log::debug;
use lw_core::{Error, Pixel};
use lw_edge::FeatureField;

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct TrainerConfig {
    pub window_radius: usize,
    pub intensity_tolerance: f32,
    /// Windows whose strongest gradient stays below this are flat.
    pub flat_gradient: f32,
    pub bins: usize,
    pub training_length: usize,
    pub min_segment_samples: usize,
    pub static_weight: f32,
    pub dynamic_weight: f32,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            window_radius: 2,
            intensity_tolerance: 0.1,
            flat_gradient: 0.5,
            bins: 32,
            training_length: 32,
            min_segment_samples: 8,
            static_weight: 0.3,
            dynamic_weight: 0.7,
        }
    }
}

impl TrainerConfig {
    pub fn validate(&self) -> Result<(), Error> {
        if self.bins == 0 {
            return Err(Error::InvalidConfig("trainer bins must be positive"));
        }
        if self.training_length == 0 {
            return Err(Error::InvalidConfig("training length must be positive"));
        }
        let weights = [
            self.intensity_tolerance,
            self.flat_gradient,
            self.static_weight,
            self.dynamic_weight,
        ];
        if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err(Error::InvalidConfig(
                "trainer thresholds and weights must be finite and non-negative",
            ));
        }
        if self.static_weight + self.dynamic_weight <= 0.0 {
            return Err(Error::InvalidConfig("trained blend weights sum to zero"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrainingSource {
    Neutral,
    Neighborhood,
    Segment,
}

/// Per-bin trained cost over a feature normalized to `[0, 1]`.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainedMap {
    costs: Vec<f32>,
}

impl TrainedMap {
    fn from_samples(values: impl Iterator<Item = f32>, bins: usize) -> Option<Self> {
        if bins == 0 {
            return None;
        }
        let mut counts = vec![0u32; bins];
        for v in values.filter(|v| v.is_finite()) {
            counts[bin_of(v, bins)] += 1;
        }

        let max_count = counts.iter().copied().max().unwrap_or(0);
        if max_count == 0 {
            return None;
        }

        let costs = counts
            .iter()
            .map(|&c| 1.0 - c as f32 / max_count as f32)
            .collect();
        Some(Self { costs })
    }

    pub fn bins(&self) -> usize {
        self.costs.len()
    }

    pub fn lookup(&self, value: f32) -> f32 {
        if !value.is_finite() {
            return 1.0;
        }
        self.costs[bin_of(value, self.costs.len())]
    }
}

fn bin_of(value: f32, bins: usize) -> usize {
    ((value.clamp(0.0, 1.0) * bins as f32) as usize).min(bins - 1)
}

/// Blend between static features and the trained bias.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureWeights {
    pub static_weight: f32,
    pub dynamic_weight: f32,
    pub gradient_map: Option<TrainedMap>,
    pub intensity_map: Option<TrainedMap>,
    pub source: TrainingSource,
}

impl FeatureWeights {
    pub fn neutral() -> Self {
        Self {
            static_weight: 1.0,
            dynamic_weight: 0.0,
            gradient_map: None,
            intensity_map: None,
            source: TrainingSource::Neutral,
        }
    }

    pub fn is_trained(&self) -> bool {
        self.source != TrainingSource::Neutral
    }
}

impl Default for FeatureWeights {
    fn default() -> Self {
        Self::neutral()
    }
}

/// Trains the dynamic weighting for a session rooted at `seed`.
///
/// `segment` is the previously anchored path ending at `seed`, or empty for
/// the first seed of a stroke.
pub fn train(
    features: &FeatureField,
    seed: Pixel,
    segment: &[Pixel],
    cfg: &TrainerConfig,
) -> FeatureWeights {
    if !features.is_valid(seed) {
        debug!("trainer: seed ({}, {}) is no-data, using neutral weights", seed.x, seed.y);
        return FeatureWeights::neutral();
    }

    let window = window_pixels(features, seed, cfg.window_radius);
    let strongest = window
        .iter()
        .map(|&p| features.magnitude(p))
        .fold(0.0f32, f32::max);
    if strongest < cfg.flat_gradient {
        debug!(
            "trainer: flat neighborhood around ({}, {}) (max gradient {strongest:.3}), using neutral weights",
            seed.x, seed.y
        );
        return FeatureWeights::neutral();
    }

    let (samples, source) = if segment.len() >= cfg.min_segment_samples {
        let start = segment.len().saturating_sub(cfg.training_length);
        let tail: Vec<Pixel> = segment[start..]
            .iter()
            .copied()
            .filter(|&p| features.is_valid(p))
            .collect();
        (tail, TrainingSource::Segment)
    } else {
        let seed_intensity = features.intensity(seed);
        let near: Vec<Pixel> = window
            .into_iter()
            .filter(|&p| (features.intensity(p) - seed_intensity).abs() <= cfg.intensity_tolerance)
            .collect();
        (near, TrainingSource::Neighborhood)
    };

    let gradient_map = TrainedMap::from_samples(
        samples.iter().map(|&p| features.relative_magnitude(p)),
        cfg.bins,
    );
    let intensity_map =
        TrainedMap::from_samples(samples.iter().map(|&p| features.intensity(p)), cfg.bins);

    if gradient_map.is_none() || intensity_map.is_none() {
        debug!("trainer: no usable samples near ({}, {}), using neutral weights", seed.x, seed.y);
        return FeatureWeights::neutral();
    }

    debug!(
        "trainer: trained on {} samples ({source:?}) around ({}, {})",
        samples.len(),
        seed.x,
        seed.y
    );

    FeatureWeights {
        static_weight: cfg.static_weight,
        dynamic_weight: cfg.dynamic_weight,
        gradient_map,
        intensity_map,
        source,
    }
}

fn window_pixels(features: &FeatureField, center: Pixel, radius: usize) -> Vec<Pixel> {
    let x0 = center.x.saturating_sub(radius);
    let y0 = center.y.saturating_sub(radius);
    let x1 = center.x.saturating_add(radius).min(features.width() - 1);
    let y1 = center.y.saturating_add(radius).min(features.height() - 1);

    let mut out = Vec::with_capacity((x1 - x0 + 1) * (y1 - y0 + 1));
    for y in y0..=y1 {
        for x in x0..=x1 {
            let p = Pixel::new(x, y);
            if features.is_valid(p) {
                out.push(p);
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use lw_core::{Pixel, Raster};
    use lw_edge::{FeatureConfig, compute_features};

    use super::{TrainerConfig, TrainingSource, train};

    fn diagonal_features(n: usize) -> lw_edge::FeatureField {
        let mut data = vec![0u8; n * n];
        for i in 0..n {
            data[i * n + i] = 255;
        }
        let raster = Raster::from_u8(n, n, &data).expect("valid raster");
        compute_features(&raster, &FeatureConfig::default())
    }

    #[test_log::test]
    fn flat_neighborhood_falls_back_to_neutral() {
        let raster = Raster::from_vec(8, 8, vec![7.0; 64]).expect("valid raster");
        let features = compute_features(&raster, &FeatureConfig::default());

        let w = train(&features, Pixel::new(3, 3), &[], &TrainerConfig::default());
        assert_eq!(w.source, TrainingSource::Neutral);
        assert!(!w.is_trained());
        assert_eq!(w.static_weight, 1.0);
        assert_eq!(w.dynamic_weight, 0.0);
    }

    #[test_log::test]
    fn neighborhood_training_favors_the_clicked_ridge() {
        let features = diagonal_features(5);
        let w = train(&features, Pixel::new(0, 0), &[], &TrainerConfig::default());

        assert_eq!(w.source, TrainingSource::Neighborhood);
        assert_eq!(w.static_weight, 0.3);
        assert_eq!(w.dynamic_weight, 0.7);

        let intensity = w.intensity_map.as_ref().expect("trained intensity");
        assert_eq!(intensity.bins(), 32);
        assert_eq!(intensity.lookup(1.0), 0.0);
        assert_eq!(intensity.lookup(0.0), 1.0);

        // Samples are (0,0), (1,1), (2,2): two flat ridge pixels and one corner.
        let gradient = w.gradient_map.as_ref().expect("trained gradient");
        assert_eq!(gradient.lookup(0.0), 0.0);
        assert_eq!(
            gradient.lookup(features.relative_magnitude(Pixel::new(0, 0))),
            0.5
        );
        assert_eq!(gradient.lookup(0.5), 1.0);
    }

    #[test]
    fn long_segments_are_preferred_over_the_window() {
        let features = diagonal_features(12);
        let segment: Vec<Pixel> = (0..10).map(|i| Pixel::new(i, i)).collect();

        let w = train(&features, Pixel::new(9, 9), &segment, &TrainerConfig::default());
        assert_eq!(w.source, TrainingSource::Segment);

        let short = &segment[6..];
        let w = train(&features, Pixel::new(9, 9), short, &TrainerConfig::default());
        assert_eq!(w.source, TrainingSource::Neighborhood);
    }

    #[test]
    fn config_validation_rejects_bad_values() {
        let cfg = TrainerConfig {
            bins: 0,
            ..TrainerConfig::default()
        };
        assert!(cfg.validate().is_err());

        let cfg = TrainerConfig {
            static_weight: -0.1,
            ..TrainerConfig::default()
        };
        assert!(cfg.validate().is_err());

        assert!(TrainerConfig::default().validate().is_ok());
    }

    #[test]
    fn unvalidated_extremes_do_not_panic() {
        let features = diagonal_features(5);

        let wide = TrainerConfig {
            window_radius: usize::MAX,
            ..TrainerConfig::default()
        };
        let w = train(&features, Pixel::new(2, 2), &[], &wide);
        assert!(w.is_trained());

        let no_bins = TrainerConfig {
            bins: 0,
            ..TrainerConfig::default()
        };
        let w = train(&features, Pixel::new(0, 0), &[], &no_bins);
        assert_eq!(w.source, TrainingSource::Neutral);
        assert!(!w.is_trained());
    }
}
