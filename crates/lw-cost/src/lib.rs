//! Link cost model and seed-local training for live-wire tracing.
//!
//! [`CostModel`] turns a [`lw_edge::FeatureField`] into directed costs in
//! `[0, 1]` between a pixel and each of its 8 neighbors. Lower cost means
//! stronger evidence that the link runs along an edge. [`train`] derives the
//! per-session [`FeatureWeights`] from samples near the seed.

pub mod cost;
pub mod train;

pub use cost::{CostModel, CostWeights, direction_cost};
pub use train::{FeatureWeights, TrainedMap, TrainerConfig, TrainingSource, train};
