//! Great-circle distance on a spherical earth.

use crime_hotspot_analysis_models::{Bounds, GridCell, Point};
use geo::{BoundingRect, MultiPoint};

/// Mean earth radius used for every distance in the engine.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Haversine distance in kilometers between two decimal-degree coordinates.
///
/// Symmetric, and zero for identical inputs. `NaN` inputs yield `NaN`.
#[must_use]
pub fn haversine_km(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lng = (lng2 - lng1).to_radians();

    let sin_lat = (d_lat / 2.0).sin();
    let sin_lng = (d_lng / 2.0).sin();
    let a = (lat1.to_radians().cos() * lat2.to_radians().cos())
        .mul_add(sin_lng * sin_lng, sin_lat * sin_lat);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_KM * c
}

/// Anything with a decimal-degree position.
pub trait LatLng {
    fn lat(&self) -> f64;
    fn lng(&self) -> f64;

    /// Haversine distance to `other` in kilometers.
    fn distance_km<O: LatLng + ?Sized>(&self, other: &O) -> f64 {
        haversine_km(self.lat(), self.lng(), other.lat(), other.lng())
    }

    /// Position on the unit sphere. Euclidean (chord) distance between unit
    /// vectors is monotonic in great-circle distance, so nearest-neighbor
    /// order in this space matches Haversine order.
    fn unit_vector(&self) -> [f64; 3] {
        let (lat, lng) = (self.lat().to_radians(), self.lng().to_radians());
        [lat.cos() * lng.cos(), lat.cos() * lng.sin(), lat.sin()]
    }
}

impl LatLng for Point {
    fn lat(&self) -> f64 {
        self.lat
    }

    fn lng(&self) -> f64 {
        self.lng
    }
}

impl LatLng for GridCell {
    fn lat(&self) -> f64 {
        self.lat
    }

    fn lng(&self) -> f64 {
        self.lng
    }
}

/// `geo` points are `(x, y) = (lng, lat)`.
impl LatLng for geo::Point<f64> {
    fn lat(&self) -> f64 {
        self.y()
    }

    fn lng(&self) -> f64 {
        self.x()
    }
}

/// Tight lat/lng bounding box of `points`, or `None` if there are none.
#[must_use]
pub fn bounding_box<P: LatLng>(points: &[P]) -> Option<Bounds> {
    let multi: MultiPoint<f64> = points
        .iter()
        .map(|p| geo::Point::new(p.lng(), p.lat()))
        .collect::<Vec<_>>()
        .into();

    multi.bounding_rect().map(|rect| Bounds {
        min_lat: rect.min().y,
        max_lat: rect.max().y,
        min_lng: rect.min().x,
        max_lng: rect.max().x,
    })
}

/// Distance from the south-west to the north-east corner of `bounds`.
#[must_use]
pub fn diagonal_km(bounds: &Bounds) -> f64 {
    haversine_km(bounds.min_lat, bounds.min_lng, bounds.max_lat, bounds.max_lng)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(lat: f64, lng: f64) -> Point {
        Point::new(0, lat, lng, 1.0)
    }

    #[test]
    fn distance_to_self_is_zero() {
        for (lat, lng) in [(0.0, 0.0), (13.8, 100.5), (-33.9, 151.2), (89.9, -179.9)] {
            assert!(haversine_km(lat, lng, lat, lng).abs() < f64::EPSILON);
        }
    }

    #[test]
    fn distance_is_symmetric() {
        let pairs = [
            ((13.80, 100.50), (14.50, 101.20)),
            ((41.8781, -87.6298), (40.7128, -74.0060)),
            ((-33.9, 151.2), (51.5, -0.12)),
        ];
        for ((a_lat, a_lng), (b_lat, b_lng)) in pairs {
            let ab = haversine_km(a_lat, a_lng, b_lat, b_lng);
            let ba = haversine_km(b_lat, b_lng, a_lat, a_lng);
            assert!((ab - ba).abs() < 1e-9);
        }
    }

    #[test]
    fn one_degree_of_latitude_is_about_111_km() {
        let d = haversine_km(0.0, 0.0, 1.0, 0.0);
        assert!((d - 111.194_926_6).abs() < 1e-6, "got {d}");
    }

    #[test]
    fn clustered_points_are_about_150_meters_apart() {
        let d = p(13.80, 100.50).distance_km(&p(13.801, 100.501));
        assert!((d - 0.155).abs() < 0.001, "got {d}");
    }

    #[test]
    fn nan_propagates() {
        assert!(haversine_km(f64::NAN, 0.0, 1.0, 1.0).is_nan());
    }

    #[test]
    fn geo_points_use_x_as_longitude() {
        let g = geo::Point::new(100.5, 13.8);
        assert!(g.distance_km(&p(13.8, 100.5)).abs() < f64::EPSILON);
    }

    #[test]
    fn bounding_box_spans_extremes() {
        let points = [p(13.8, 100.5), p(14.51, 101.21), p(13.802, 100.499)];
        let bounds = bounding_box(&points).unwrap();
        assert!((bounds.min_lat - 13.8).abs() < f64::EPSILON);
        assert!((bounds.max_lat - 14.51).abs() < f64::EPSILON);
        assert!((bounds.min_lng - 100.499).abs() < f64::EPSILON);
        assert!((bounds.max_lng - 101.21).abs() < f64::EPSILON);
    }

    #[test]
    fn bounding_box_of_nothing_is_none() {
        assert!(bounding_box::<Point>(&[]).is_none());
    }

    #[test]
    fn unit_vectors_have_unit_length() {
        let v = p(47.6, -122.3).unit_vector();
        let len = v.iter().map(|c| c * c).sum::<f64>().sqrt();
        assert!((len - 1.0).abs() < 1e-12);
    }
}
