//! Umbrella crate for the live-wire workspace.
//!
//! Re-exports the core primitives, feature extraction, the cost model and the
//! tracing engine, and adds JSON loading for [`EngineConfig`].
//!
//! ```no_run
//! use livewire::{EngineConfig, LiveWire, Raster};
//!
//! # fn main() -> Result<(), livewire::Error> {
//! let raster = Raster::from_u8(4, 4, &[0; 16])?;
//! let mut lw = LiveWire::load_raster(raster, EngineConfig::default())?;
//! lw.seed(0, 0)?;
//! let preview = lw.preview(3, 3)?;
//! assert_eq!(preview.len(), 4);
//! # Ok(())
//! # }
//! ```

pub mod config;

pub use config::{ConfigError, from_json, load_config};
pub use lw_core::*;
pub use lw_cost::{
    CostModel, CostWeights, FeatureWeights, TrainedMap, TrainerConfig, TrainingSource,
    direction_cost, train,
};
pub use lw_edge::{FeatureConfig, FeatureField, SmoothKind, compute_features};
pub use lw_wire::*;
