//! Foundational primitives for live-wire boundary tracing.
//!
//! ## Coordinates
//! Pixels are addressed by integer `(x, y)` with `y` growing downward. Images
//! are dense and row-major; borrowed [`ImageView`]s may carry an element stride
//! larger than their width so padded caller buffers can be read directly.
//!
//! ## Neighborhood
//! The tracing graph is 8-connected. [`Direction`] enumerates neighbors
//! counter-clockwise starting east.
//!
//! ## Border Modes
//! Kernel reads outside the raster are mapped with clamp or reflect-101.

mod border;
mod error;
mod geom;
mod image;
mod link;
mod raster;

pub use border::{BorderMode, map_index};
pub use error::Error;
pub use geom::{Direction, Pixel, Vec2f};
pub use image::{Image, ImageView};
pub use link::LinkCost;
pub use raster::Raster;
