#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Kernel density estimation over a regular lat/lng grid.
//!
//! Every grid node sums `weight * K(distance, h)` over all points, so the
//! cost is `O(cells * n)`. Grid rows are independent and are evaluated in
//! parallel when the `parallel` feature is on, with a cancellation check
//! between rows.

pub mod bandwidth;
pub mod grid;
pub mod kernel;

use crime_hotspot_analysis_models::{Bounds, Kernel, KdeResult};
use crime_hotspot_spatial::maybe_rayon::*;
use crime_hotspot_spatial::{CancelToken, LatLng, SpatialError};
use thiserror::Error;

pub use bandwidth::silverman_bandwidth;
pub use grid::{generate_grid, padded_bounds};

/// Default grid cells per axis for standalone density runs.
pub const DEFAULT_RESOLUTION: u32 = 50;

/// Largest grid cells per axis. Higher resolutions are lowered to this,
/// which caps the grid at about four million cells.
pub const MAX_RESOLUTION: u32 = 2000;

/// Errors from [`estimate`].
#[derive(Debug, Error)]
pub enum KdeError {
    #[error(transparent)]
    Interrupted(#[from] SpatialError),

    #[error("Got {weights} weights for {points} points")]
    WeightCountMismatch { weights: usize, points: usize },
}

/// Density estimation parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct KdeOptions {
    /// Bandwidth in km. `None`, or a non-positive or non-finite value, uses
    /// [`silverman_bandwidth`].
    pub bandwidth: Option<f64>,
    /// Grid cells per axis. `0` is treated as `1`, and anything above
    /// [`MAX_RESOLUTION`] as [`MAX_RESOLUTION`].
    pub resolution: u32,
    pub kernel: Kernel,
    /// Grid bounds. `None` pads the points' bounding box by
    /// [`grid::BOUNDS_PADDING_DEGREES`].
    pub bounds: Option<Bounds>,
    /// Per-point weights, parallel to the point slice. `None` weighs every
    /// point `1`.
    pub weights: Option<Vec<f64>>,
}

impl Default for KdeOptions {
    fn default() -> Self {
        Self {
            bandwidth: None,
            resolution: DEFAULT_RESOLUTION,
            kernel: Kernel::default(),
            bounds: None,
            weights: None,
        }
    }
}

/// Evaluates the density surface of `points`.
///
/// With no points and no explicit bounds there is nothing to span, and an
/// empty grid is returned. With explicit bounds but no points every cell is
/// zero.
///
/// # Errors
///
/// * [`KdeError::WeightCountMismatch`] if `options.weights` is not the same
///   length as `points`
/// * [`KdeError::Interrupted`] if `cancel` has fired before the grid is
///   allocated or fires before every row is done
pub fn estimate<P: LatLng + Sync>(
    points: &[P],
    options: &KdeOptions,
    cancel: &CancelToken,
) -> Result<KdeResult, KdeError> {
    if let Some(weights) = &options.weights
        && weights.len() != points.len()
    {
        return Err(KdeError::WeightCountMismatch {
            weights: weights.len(),
            points: points.len(),
        });
    }

    let resolution = options.resolution.clamp(1, MAX_RESOLUTION);
    if resolution < options.resolution {
        log::warn!(
            "Resolution {} exceeds {MAX_RESOLUTION}, lowering it",
            options.resolution
        );
    }
    cancel.check()?;
    let Some(bounds) = options.bounds.or_else(|| padded_bounds(points)) else {
        log::debug!("No points and no bounds, returning empty density grid");
        return Ok(KdeResult::empty(resolution));
    };

    let bandwidth = match options.bandwidth {
        Some(h) if h.is_finite() && h > 0.0 => h,
        Some(h) => {
            log::warn!("Ignoring invalid bandwidth {h}, using Silverman's rule");
            silverman_bandwidth(points)
        }
        None => silverman_bandwidth(points),
    };

    let weights = options.weights.as_deref();
    let kind = options.kernel;
    let side = resolution as usize + 1;
    let mut grid = generate_grid(&bounds, resolution);

    grid.par_chunks_mut(side)
        .try_for_each(|row| -> Result<(), SpatialError> {
            cancel.check()?;
            for cell in row {
                cell.density = points
                    .iter()
                    .enumerate()
                    .map(|(k, point)| {
                        let weight = weights.map_or(1.0, |w| w[k]);
                        weight * kernel::evaluate(kind, cell.distance_km(point), bandwidth)
                    })
                    .sum();
            }
            Ok(())
        })?;

    let max_density = grid
        .iter()
        .map(|c| c.density)
        .fold(f64::NEG_INFINITY, f64::max);
    let min_density = grid
        .iter()
        .map(|c| c.density)
        .fold(f64::INFINITY, f64::min);

    if max_density > 0.0 {
        for cell in &mut grid {
            cell.normalized_density = cell.density / max_density;
        }
    }

    log::debug!(
        "Evaluated {} cells over {} points ({kind}, bandwidth {bandwidth:.3} km, max density {max_density:.6})",
        grid.len(),
        points.len(),
    );

    Ok(KdeResult {
        grid,
        max_density,
        min_density,
        bandwidth,
        bounds: Some(bounds),
        resolution,
    })
}

#[cfg(test)]
mod tests {
    use crime_hotspot_analysis_models::Point;

    use super::*;

    fn cluster() -> Vec<Point> {
        vec![
            Point::new(0, 13.80, 100.50, 10.0),
            Point::new(1, 13.801, 100.501, 10.0),
            Point::new(2, 13.802, 100.499, 10.0),
            Point::new(3, 13.85, 100.55, 1.0),
        ]
    }

    fn run(points: &[Point], options: &KdeOptions) -> KdeResult {
        estimate(points, options, &CancelToken::new()).unwrap()
    }

    #[test]
    fn normalized_density_is_bounded_and_peaks_at_one() {
        let result = run(
            &cluster(),
            &KdeOptions {
                resolution: 20,
                ..KdeOptions::default()
            },
        );

        assert_eq!(result.grid.len(), 21 * 21);
        assert!(result.max_density > 0.0);
        assert!(
            result
                .grid
                .iter()
                .all(|c| (0.0..=1.0).contains(&c.normalized_density))
        );
        assert!(
            result
                .grid
                .iter()
                .any(|c| (c.normalized_density - 1.0).abs() < f64::EPSILON)
        );
        assert!(result.min_density <= result.max_density);
    }

    #[test]
    fn default_bounds_pad_the_points() {
        let result = run(&cluster(), &KdeOptions::default());
        let bounds = result.bounds.unwrap();
        assert!((bounds.min_lat - 13.70).abs() < 1e-9);
        assert!((bounds.max_lat - 13.95).abs() < 1e-9);
        assert!((bounds.min_lng - 100.399).abs() < 1e-9);
        assert!((bounds.max_lng - 100.65).abs() < 1e-9);
        assert_eq!(result.resolution, DEFAULT_RESOLUTION);
    }

    #[test]
    fn densest_cell_is_near_the_cluster() {
        let result = run(
            &cluster(),
            &KdeOptions {
                bandwidth: Some(0.5),
                resolution: 50,
                ..KdeOptions::default()
            },
        );
        let peak = result
            .grid
            .iter()
            .find(|c| (c.normalized_density - 1.0).abs() < f64::EPSILON)
            .unwrap();
        assert!(peak.distance_km(&cluster()[1]) < 1.0);
    }

    #[test]
    fn explicit_bandwidth_is_used_and_invalid_falls_back() {
        let points = cluster();
        let explicit = run(
            &points,
            &KdeOptions {
                bandwidth: Some(2.5),
                ..KdeOptions::default()
            },
        );
        assert!((explicit.bandwidth - 2.5).abs() < f64::EPSILON);

        let fallback = run(
            &points,
            &KdeOptions {
                bandwidth: Some(-1.0),
                ..KdeOptions::default()
            },
        );
        assert!((fallback.bandwidth - silverman_bandwidth(&points)).abs() < f64::EPSILON);
    }

    #[test]
    fn epanechnikov_leaves_far_cells_empty() {
        let bounds = Bounds {
            min_lat: 13.0,
            max_lat: 15.0,
            min_lng: 100.0,
            max_lng: 102.0,
        };
        let result = run(
            &cluster(),
            &KdeOptions {
                bandwidth: Some(1.0),
                resolution: 10,
                kernel: Kernel::Epanechnikov,
                bounds: Some(bounds),
                weights: None,
            },
        );
        let corner = &result.grid[result.grid.len() - 1];
        assert!(corner.density.abs() < f64::EPSILON);
        assert!(result.min_density.abs() < f64::EPSILON);
    }

    #[test]
    fn weights_scale_contributions() {
        let points = vec![Point::new(0, 0.0, 0.0, 1.0)];
        let base = KdeOptions {
            bandwidth: Some(1.0),
            resolution: 4,
            ..KdeOptions::default()
        };
        let unweighted = run(&points, &base);
        let weighted = run(
            &points,
            &KdeOptions {
                weights: Some(vec![3.0]),
                ..base
            },
        );
        for (a, b) in unweighted.grid.iter().zip(&weighted.grid) {
            assert!((b.density - 3.0 * a.density).abs() < 1e-12);
            assert!((b.normalized_density - a.normalized_density).abs() < 1e-12);
        }
    }

    #[test]
    fn zero_weights_give_zero_normalized_density() {
        let points = cluster();
        let result = run(
            &points,
            &KdeOptions {
                weights: Some(vec![0.0; points.len()]),
                resolution: 5,
                ..KdeOptions::default()
            },
        );
        assert!(result.max_density.abs() < f64::EPSILON);
        assert!(result.grid.iter().all(|c| c.normalized_density.abs() < f64::EPSILON));
    }

    #[test]
    fn mismatched_weights_are_rejected() {
        let err = estimate(
            &cluster(),
            &KdeOptions {
                weights: Some(vec![1.0]),
                ..KdeOptions::default()
            },
            &CancelToken::new(),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            KdeError::WeightCountMismatch {
                weights: 1,
                points: 4
            }
        ));
    }

    #[test]
    fn empty_input_without_bounds_yields_empty_grid() {
        let result = run(&Vec::<Point>::new(), &KdeOptions::default());
        assert!(result.grid.is_empty());
        assert!(result.bounds.is_none());
    }

    #[test]
    fn empty_input_with_bounds_yields_zero_grid() {
        let bounds = Bounds {
            min_lat: 0.0,
            max_lat: 1.0,
            min_lng: 0.0,
            max_lng: 1.0,
        };
        let result = run(
            &Vec::<Point>::new(),
            &KdeOptions {
                bounds: Some(bounds),
                resolution: 3,
                ..KdeOptions::default()
            },
        );
        assert_eq!(result.grid.len(), 16);
        assert!(result.grid.iter().all(|c| c.density.abs() < f64::EPSILON));
        assert!((result.bandwidth - bandwidth::FALLBACK_BANDWIDTH_KM).abs() < f64::EPSILON);
    }

    #[test]
    fn zero_resolution_is_raised_to_one() {
        let result = run(
            &cluster(),
            &KdeOptions {
                resolution: 0,
                ..KdeOptions::default()
            },
        );
        assert_eq!(result.resolution, 1);
        assert_eq!(result.grid.len(), 4);
    }

    #[test]
    fn oversized_resolution_is_capped() {
        let result = run(
            &Vec::<Point>::new(),
            &KdeOptions {
                resolution: u32::MAX,
                ..KdeOptions::default()
            },
        );
        assert_eq!(result.resolution, MAX_RESOLUTION);
    }

    #[test]
    fn cancelled_token_stops_before_grid_allocation() {
        let cancel = CancelToken::new();
        cancel.cancel();
        let err = estimate(
            &cluster(),
            &KdeOptions {
                resolution: u32::MAX,
                ..KdeOptions::default()
            },
            &cancel,
        )
        .unwrap_err();
        assert!(matches!(err, KdeError::Interrupted(SpatialError::Cancelled)));
    }

    #[test]
    fn cancellation_interrupts_estimation() {
        let cancel = CancelToken::new();
        cancel.cancel();
        let err = estimate(&cluster(), &KdeOptions::default(), &cancel).unwrap_err();
        assert!(matches!(err, KdeError::Interrupted(SpatialError::Cancelled)));
    }
}
