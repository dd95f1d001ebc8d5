//! Adaptive Gi* distance threshold.
//!
//! When the caller does not choose a neighborhood distance, one is derived
//! from the point pattern: two and a half times the average nearest-neighbor
//! distance, capped at a quarter of the study-area diagonal and at 15 km,
//! and never below 1 km. The constants are empirical crime-analysis
//! defaults, not derived values, and are exposed so callers can see what
//! was applied.

use rstar::{AABB, PointDistance, RTree, RTreeObject};

use crate::geodesy::{LatLng, bounding_box, diagonal_km};
use crate::maybe_rayon::*;
use crate::{CancelToken, SpatialError};

/// Multiplier applied to the average nearest-neighbor distance.
pub const NEAREST_NEIGHBOR_MULTIPLIER: f64 = 2.5;
/// Lower bound on the adaptive threshold, in km.
pub const MIN_THRESHOLD_KM: f64 = 1.0;
/// Hard upper bound on the adaptive threshold, in km.
pub const MAX_THRESHOLD_KM: f64 = 15.0;
/// Fraction of the bounding-box diagonal the threshold may not exceed.
pub const DIAGONAL_FRACTION: f64 = 0.25;
/// Threshold used when there are fewer than two points to measure.
pub const SPARSE_THRESHOLD_KM: f64 = 10.0;

/// A point on the unit sphere tagged with its input index.
struct IndexedUnitVector {
    xyz: [f64; 3],
    index: usize,
}

impl RTreeObject for IndexedUnitVector {
    type Envelope = AABB<[f64; 3]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.xyz)
    }
}

impl PointDistance for IndexedUnitVector {
    fn distance_2(&self, point: &[f64; 3]) -> f64 {
        self.xyz
            .iter()
            .zip(point)
            .map(|(a, b)| (a - b) * (a - b))
            .sum()
    }
}

/// Distance in km from each point to its nearest other point.
///
/// Points are indexed in an R-tree on the unit sphere, where chord order
/// equals great-circle order, and the winning neighbor is then measured with
/// Haversine. A point with no measurable neighbor (a lone point, or one with
/// non-finite coordinates) gets `f64::INFINITY`.
///
/// # Errors
///
/// Returns [`SpatialError`] if `cancel` fires mid-scan.
pub fn nearest_neighbor_distances<P: LatLng + Sync>(
    points: &[P],
    cancel: &CancelToken,
) -> Result<Vec<f64>, SpatialError> {
    let is_finite = |p: &P| p.lat().is_finite() && p.lng().is_finite();

    let tree = RTree::bulk_load(
        points
            .iter()
            .enumerate()
            .filter(|&(_, p)| is_finite(p))
            .map(|(index, p)| IndexedUnitVector {
                xyz: p.unit_vector(),
                index,
            })
            .collect(),
    );

    (0..points.len())
        .into_par_iter()
        .map(|i| -> Result<f64, SpatialError> {
            cancel.check()?;
            let origin = &points[i];
            if !is_finite(origin) {
                return Ok(f64::INFINITY);
            }
            Ok(tree
                .nearest_neighbor_iter(&origin.unit_vector())
                .find(|candidate| candidate.index != i)
                .map_or(f64::INFINITY, |nearest| {
                    origin.distance_km(&points[nearest.index])
                }))
        })
        .collect()
}

/// Mean nearest-neighbor distance over all points, in km.
///
/// Points without a neighbor contribute nothing to the sum but still count
/// toward `n`. Returns `None` for an empty slice.
///
/// # Errors
///
/// Returns [`SpatialError`] if `cancel` fires mid-scan.
#[allow(clippy::cast_precision_loss)]
pub fn average_nearest_neighbor_km<P: LatLng + Sync>(
    points: &[P],
    cancel: &CancelToken,
) -> Result<Option<f64>, SpatialError> {
    if points.is_empty() {
        return Ok(None);
    }
    let total: f64 = nearest_neighbor_distances(points, cancel)?
        .into_iter()
        .filter(|d| d.is_finite())
        .sum();
    Ok(Some(total / points.len() as f64))
}

/// Combines the two pattern measurements into a threshold.
///
/// `min(avg_nn * 2.5, diagonal / 4, 15)`, then raised to at least 1. The
/// floor is applied last, so it wins when the diagonal cap is below 1 km.
#[must_use]
pub fn clamp_threshold(avg_nearest_neighbor_km: f64, diagonal_km: f64) -> f64 {
    (avg_nearest_neighbor_km * NEAREST_NEIGHBOR_MULTIPLIER)
        .min(diagonal_km * DIAGONAL_FRACTION)
        .min(MAX_THRESHOLD_KM)
        .max(MIN_THRESHOLD_KM)
}

/// Picks a Gi* neighborhood distance in km from the point pattern.
///
/// Fewer than two points yields [`SPARSE_THRESHOLD_KM`].
///
/// # Errors
///
/// Returns [`SpatialError`] if `cancel` fires mid-scan.
pub fn adaptive_threshold<P: LatLng + Sync>(
    points: &[P],
    cancel: &CancelToken,
) -> Result<f64, SpatialError> {
    if points.len() < 2 {
        return Ok(SPARSE_THRESHOLD_KM);
    }

    let avg_nn = average_nearest_neighbor_km(points, cancel)?.unwrap_or(0.0);
    let diagonal = bounding_box(points).map_or(0.0, |b| diagonal_km(&b));
    let threshold = clamp_threshold(avg_nn, diagonal);

    log::debug!(
        "Adaptive threshold: avg nearest neighbor {avg_nn:.3} km, diagonal {diagonal:.3} km -> {threshold:.3} km"
    );

    Ok(threshold)
}
