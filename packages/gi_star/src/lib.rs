#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Getis-Ord Gi* local hotspot statistic.
//!
//! For each point `i` with weight row `w[i]`, global mean `X` and
//! population standard deviation `S`:
//!
//! ```text
//! numerator   = sum(w_ij * x_j) - X * sum(w_ij)
//! variance    = max(0, (n * sum(w_ij^2) - sum(w_ij)^2) / (n - 1))
//! z           = numerator / (S * sqrt(variance))   (0 if the denominator is 0)
//! ```
//!
//! The point itself is part of its own neighborhood (`w_ii = 1`). Fewer than
//! three points, or values with no variance, produce all-"Not Significant"
//! output instead of an error.

use crime_hotspot_analysis_models::{
    AnalysisSummary, Classification, GiStarAnalysis, GiStarResult, Point, WeightType,
};
use crime_hotspot_spatial::maybe_rayon::*;
use crime_hotspot_spatial::{
    CancelToken, SpatialError, SpatialWeightMatrix, WeightPolicy, adaptive_threshold,
};
use crime_hotspot_stats::{mean, population_std_dev, two_tailed_p_value};
use thiserror::Error;

/// Smallest point count for which the statistic is computed.
pub const MIN_POINTS: usize = 3;

/// Errors from [`analyze`].
#[derive(Debug, Error)]
pub enum GiStarError {
    #[error(transparent)]
    Interrupted(#[from] SpatialError),
}

/// Gi* parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GiStarOptions {
    /// Neighbor distance in km. `None`, `0`, or a negative or non-finite
    /// value uses [`adaptive_threshold`].
    pub distance_threshold: Option<f64>,
    pub weight_type: WeightType,
    /// Exponent for [`WeightType::InverseDistance`].
    pub inverse_distance_power: f64,
}

impl Default for GiStarOptions {
    fn default() -> Self {
        Self {
            distance_threshold: None,
            weight_type: WeightType::Binary,
            inverse_distance_power: 1.0,
        }
    }
}

/// Row sums for one point's neighborhood.
#[derive(Debug, Clone, Copy)]
struct RowSums {
    sum_w: f64,
    sum_w2: f64,
    sum_wx: f64,
}

impl RowSums {
    fn of(row: &[f64], values: &[f64]) -> Self {
        row.iter().zip(values).fold(
            Self {
                sum_w: 0.0,
                sum_w2: 0.0,
                sum_wx: 0.0,
            },
            |acc, (&w, &x)| Self {
                sum_w: acc.sum_w + w,
                sum_w2: w.mul_add(w, acc.sum_w2),
                sum_wx: w.mul_add(x, acc.sum_wx),
            },
        )
    }

    #[allow(clippy::cast_precision_loss)]
    fn z_score(self, n: usize, global_mean: f64, global_std_dev: f64) -> f64 {
        let n = n as f64;
        let numerator = global_mean.mul_add(-self.sum_w, self.sum_wx);
        let variance = (n.mul_add(self.sum_w2, -(self.sum_w * self.sum_w)) / (n - 1.0)).max(0.0);
        let denominator = global_std_dev * variance.sqrt();

        if denominator > 0.0 {
            numerator / denominator
        } else {
            0.0
        }
    }
}

/// Builds a full result from a z-score.
fn classify(point: Point, z_score: f64, neighbors_count: usize, sums: RowSums) -> GiStarResult {
    let classification = Classification::from_z_score(z_score);
    GiStarResult {
        point,
        z_score,
        p_value: two_tailed_p_value(z_score),
        classification,
        confidence_level: classification.confidence_level(),
        is_hotspot: classification.is_hotspot(),
        is_coldspot: classification.is_coldspot(),
        neighbors_count,
        sum_wij: sums.sum_w,
        sum_wij_xj: sums.sum_wx,
    }
}

/// Every point "Not Significant", with the global parameters filled in
/// where they exist.
fn trivial(points: &[Point], global_mean: f64, global_std_dev: f64) -> GiStarAnalysis {
    let results: Vec<GiStarResult> = points
        .iter()
        .cloned()
        .map(GiStarResult::not_significant)
        .collect();
    let summary = AnalysisSummary::tally(&results, 0.0, global_mean, global_std_dev);
    GiStarAnalysis { results, summary }
}

/// Whether `std_dev` is zero relative to the magnitude of the values.
///
/// Identical non-integral values can leave a rounding residue in the
/// standard deviation, which would otherwise be amplified into a
/// meaningless z-score. The test has no absolute floor, since z is
/// invariant under scaling the values.
fn has_no_variance(global_mean: f64, global_std_dev: f64) -> bool {
    global_std_dev <= f64::EPSILON * global_mean.abs()
}

/// Runs Gi* over `points`, using each point's `value` as the attribute.
///
/// Results are in input order and the summary tiers partition them.
///
/// # Errors
///
/// Returns [`GiStarError::Interrupted`] if `cancel` fires while the
/// threshold, weight matrix, or row sums are being computed.
pub fn analyze(
    points: &[Point],
    options: &GiStarOptions,
    cancel: &CancelToken,
) -> Result<GiStarAnalysis, GiStarError> {
    let n = points.len();
    let values: Vec<f64> = points.iter().map(|p| p.value).collect();
    let global_mean = mean(&values).unwrap_or(0.0);
    let global_std_dev = population_std_dev(&values).unwrap_or(0.0);

    if n < MIN_POINTS {
        log::warn!("Gi* needs at least {MIN_POINTS} points, got {n}; nothing is significant");
        return Ok(trivial(points, global_mean, global_std_dev));
    }
    if has_no_variance(global_mean, global_std_dev) {
        log::info!("Gi* values have no variance (all {global_mean}); nothing is significant");
        return Ok(trivial(points, global_mean, 0.0));
    }

    let threshold = match options.distance_threshold {
        Some(t) if t.is_finite() && t > 0.0 => t,
        Some(t) if t.is_nan() || t.abs() > 0.0 => {
            log::warn!("Ignoring invalid distance threshold {t}, using adaptive threshold");
            adaptive_threshold(points, cancel)?
        }
        _ => adaptive_threshold(points, cancel)?,
    };

    let policy = WeightPolicy::from_weight_type(options.weight_type, options.inverse_distance_power);
    let weights = SpatialWeightMatrix::build(points, threshold, policy, cancel)?;

    let rows: Vec<(RowSums, usize)> = (0..n)
        .into_par_iter()
        .map(|i| -> Result<(RowSums, usize), SpatialError> {
            cancel.check()?;
            Ok((RowSums::of(weights.row(i), &values), weights.neighbor_count(i)))
        })
        .collect::<Result<_, _>>()?;

    let results: Vec<GiStarResult> = points
        .iter()
        .cloned()
        .zip(rows)
        .map(|(point, (sums, neighbors_count))| {
            let z_score = sums.z_score(n, global_mean, global_std_dev);
            classify(point, z_score, neighbors_count, sums)
        })
        .collect();

    let summary = AnalysisSummary::tally(&results, threshold, global_mean, global_std_dev);

    log::debug!(
        "Gi* over {n} points at {threshold:.3} km: {} hotspots, {} coldspots",
        summary.total_hotspots,
        summary.total_coldspots,
    );

    Ok(GiStarAnalysis { results, summary })
}
