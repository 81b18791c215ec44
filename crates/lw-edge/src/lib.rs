//! Per-pixel edge features for live-wire tracing.
//!
//! Coordinates follow pixel-center convention: sample `(x, y)` sits at the
//! center of pixel `(x, y)`.
//!
//! [`compute_features`] runs once per raster and produces a [`FeatureField`]
//! holding normalized intensity, Scharr gradients, the Laplacian and its zero
//! crossings. The cost model reads these lazily while the path search runs.

pub mod features;
pub mod kernels;

pub use features::{FeatureConfig, FeatureField, SmoothKind, compute_features};
pub use kernels::{laplacian4, scharr, smooth_binomial3};
