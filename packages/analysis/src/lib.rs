#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Combined spatial hotspot analysis.
//!
//! [`analyze`] normalizes caller records into [`Point`]s, then runs kernel
//! density estimation and Getis-Ord Gi* over them independently (side by
//! side when the `parallel` feature is on) and returns both results with
//! the normalized points. Nothing is cached between calls.

pub mod aggregate;
pub mod export;
pub mod normalize;

use crime_hotspot_analysis_models::{AnalysisOptions, AnalysisResult, Point, RawPoint};
use crime_hotspot_gi_star::{GiStarError, GiStarOptions};
use crime_hotspot_kde::{KdeError, KdeOptions};
use crime_hotspot_spatial::maybe_rayon::join;
use crime_hotspot_spatial::{SpatialError, adaptive_threshold};
use thiserror::Error;

pub use aggregate::aggregate_by_location;
pub use crime_hotspot_spatial::CancelToken;
pub use export::{gi_star_to_geojson, kde_to_geojson};
pub use normalize::normalize_points;

/// Errors that can occur during an analysis run.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// An input record has no latitude or longitude.
    #[error("Record {index} is missing `{field}`")]
    MissingCoordinate {
        /// Position of the record in the input.
        index: usize,
        field: &'static str,
    },

    /// An input record has a `NaN` or infinite coordinate.
    #[error("Record {index} has non-finite coordinates ({lat}, {lng})")]
    NonFiniteCoordinate { index: usize, lat: f64, lng: f64 },

    #[error("Density estimation failed: {0}")]
    Kde(#[from] KdeError),

    #[error("Hotspot analysis failed: {0}")]
    GiStar(#[from] GiStarError),

    #[error(transparent)]
    Interrupted(#[from] SpatialError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

fn kde_options(points: &[Point], options: &AnalysisOptions) -> KdeOptions {
    KdeOptions {
        bandwidth: options.kde_bandwidth,
        resolution: options.kde_resolution,
        kernel: options.kernel,
        bounds: options.kde_bounds,
        weights: options
            .kde_weight_by_value
            .then(|| points.iter().map(|p| p.value).collect()),
    }
}

const fn gi_star_options(options: &AnalysisOptions) -> GiStarOptions {
    GiStarOptions {
        distance_threshold: options.gi_distance_threshold,
        weight_type: options.gi_weight_type,
        inverse_distance_power: options.gi_inverse_distance_power,
    }
}

/// Runs the full analysis with no cancellation.
///
/// # Errors
///
/// Returns [`AnalysisError`] if a record has missing or non-finite
/// coordinates.
pub fn analyze(
    records: &[RawPoint],
    options: &AnalysisOptions,
) -> Result<AnalysisResult, AnalysisError> {
    analyze_with_cancel(records, options, &CancelToken::new())
}

/// Runs the full analysis, aborting once `cancel` is cancelled or expires.
///
/// # Errors
///
/// * [`AnalysisError::MissingCoordinate`] /
///   [`AnalysisError::NonFiniteCoordinate`] for malformed records
/// * [`AnalysisError::Kde`] / [`AnalysisError::GiStar`] if `cancel` fires
///   mid-computation
pub fn analyze_with_cancel(
    records: &[RawPoint],
    options: &AnalysisOptions,
    cancel: &CancelToken,
) -> Result<AnalysisResult, AnalysisError> {
    let points = normalize_points(records)?;
    log::debug!("Analyzing {} points with {options:?}", points.len());

    let kde_options = kde_options(&points, options);
    let gi_options = gi_star_options(options);

    let (kde, gi_star) = join(
        || crime_hotspot_kde::estimate(&points, &kde_options, cancel),
        || crime_hotspot_gi_star::analyze(&points, &gi_options, cancel),
    );
    let kde = kde?;
    let gi_star = gi_star?;

    log::info!(
        "Analyzed {} points: {} grid cells, {} hotspots, {} coldspots",
        points.len(),
        kde.grid.len(),
        gi_star.summary.total_hotspots,
        gi_star.summary.total_coldspots,
    );

    Ok(AnalysisResult {
        kde,
        gi_star,
        points,
    })
}

/// The Gi* distance threshold that would be chosen for `records` when none
/// is configured.
///
/// # Errors
///
/// Returns [`AnalysisError`] for malformed records or if `cancel` fires.
pub fn suggested_threshold(
    records: &[RawPoint],
    cancel: &CancelToken,
) -> Result<f64, AnalysisError> {
    let points = normalize_points(records)?;
    Ok(adaptive_threshold(&points, cancel)?)
}
