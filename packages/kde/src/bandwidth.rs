//! Default bandwidth selection.

use crime_hotspot_spatial::LatLng;
use crime_hotspot_stats::population_std_dev;

/// Silverman's rule-of-thumb constant.
pub const SILVERMAN_FACTOR: f64 = 1.06;
/// Approximate kilometers per degree used to turn a degree spread into km.
pub const KM_PER_DEGREE: f64 = 111.0;
/// Bandwidth in km when the rule cannot be applied.
pub const FALLBACK_BANDWIDTH_KM: f64 = 1.0;

/// Silverman's rule of thumb adapted to geographic coordinates:
/// `1.06 * avg(std(lat), std(lng)) * n^(-1/5) * 111`.
///
/// Fewer than two points yields [`FALLBACK_BANDWIDTH_KM`], and so does a
/// degenerate spread (all points coincident) that would give a zero or
/// non-finite bandwidth.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn silverman_bandwidth<P: LatLng>(points: &[P]) -> f64 {
    if points.len() < 2 {
        return FALLBACK_BANDWIDTH_KM;
    }

    let lats: Vec<f64> = points.iter().map(LatLng::lat).collect();
    let lngs: Vec<f64> = points.iter().map(LatLng::lng).collect();
    let (Some(std_lat), Some(std_lng)) = (population_std_dev(&lats), population_std_dev(&lngs))
    else {
        return FALLBACK_BANDWIDTH_KM;
    };

    let avg_std = (std_lat + std_lng) / 2.0;
    let n = points.len() as f64;
    let h = SILVERMAN_FACTOR * avg_std * n.powf(-0.2) * KM_PER_DEGREE;

    if h.is_finite() && h > 0.0 {
        h
    } else {
        log::warn!("Degenerate point spread (bandwidth {h}), using {FALLBACK_BANDWIDTH_KM} km");
        FALLBACK_BANDWIDTH_KM
    }
}
