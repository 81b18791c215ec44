//! Incremental minimum-cost path search and stroke building.
//!
//! [`PathSearch`] grows a Dijkstra tree from one seed in bounded batches and
//! exposes the finalized parent links. [`StrokeBuilder`] stitches frozen
//! segments into one polyline. [`LiveWire`] ties both to a raster, a cost
//! model and the seed/anchor/close interaction.

pub mod engine;
mod frontier;
pub mod search;
pub mod stroke;

pub use engine::{AnchorOutcome, EngineConfig, LiveWire, Session};
pub use search::{Finalized, ParentEntry, ParentMap, PathSearch, SearchState};
pub use stroke::{Stroke, StrokeBuilder, StrokeState, join_segments, within_tolerance};
