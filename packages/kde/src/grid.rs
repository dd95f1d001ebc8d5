//! Regular evaluation grid over a bounding box.

use crime_hotspot_analysis_models::{Bounds, GridCell};
use crime_hotspot_spatial::LatLng;
use crime_hotspot_spatial::geodesy::bounding_box;

/// Degrees of padding added around the points when no bounds are given, so
/// the surface is not truncated at the outermost points.
pub const BOUNDS_PADDING_DEGREES: f64 = 0.1;

/// Bounding box of `points` grown by [`BOUNDS_PADDING_DEGREES`].
#[must_use]
pub fn padded_bounds<P: LatLng>(points: &[P]) -> Option<Bounds> {
    bounding_box(points).map(|b| b.padded(BOUNDS_PADDING_DEGREES))
}

/// `(resolution + 1) x (resolution + 1)` zero-density cells spanning
/// `bounds` linearly, row-major with rows along latitude.
///
/// Row `0` is `min_lat`, column `0` is `min_lng`, and the last row/column
/// sits on the max edge.
#[must_use]
pub fn generate_grid(bounds: &Bounds, resolution: u32) -> Vec<GridCell> {
    let steps = f64::from(resolution);
    let lat_step = (bounds.max_lat - bounds.min_lat) / steps;
    let lng_step = (bounds.max_lng - bounds.min_lng) / steps;

    (0..=resolution)
        .flat_map(|row| {
            (0..=resolution).map(move |col| GridCell {
                lat: f64::from(row).mul_add(lat_step, bounds.min_lat),
                lng: f64::from(col).mul_add(lng_step, bounds.min_lng),
                row,
                col,
                density: 0.0,
                normalized_density: 0.0,
            })
        })
        .collect()
}
