#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Spherical-earth geometry for hotspot analysis.
//!
//! Provides Haversine distances, bounding boxes, the dense n x n spatial
//! weight matrix consumed by the Gi* statistic, and the adaptive distance
//! threshold used when the caller does not pick one. The O(n^2) loops check
//! a [`CancelToken`] once per row and run on `rayon` when the `parallel`
//! feature is enabled.

pub mod cancel;
pub mod geodesy;
pub mod maybe_rayon;
pub mod threshold;
pub mod weights;

use thiserror::Error;

pub use cancel::CancelToken;
pub use geodesy::{LatLng, haversine_km};
pub use threshold::adaptive_threshold;
pub use weights::{SpatialWeightMatrix, WeightPolicy};

/// Errors that can interrupt a spatial computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SpatialError {
    /// The caller cancelled the [`CancelToken`].
    #[error("Computation cancelled")]
    Cancelled,

    /// The [`CancelToken`] deadline passed before the computation finished.
    #[error("Computation exceeded its deadline")]
    DeadlineExceeded,
}
