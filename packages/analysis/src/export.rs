//! `GeoJSON` views of analysis output for map layers.

use crime_hotspot_analysis_models::{GiStarResult, GridCell, KdeResult, PointId};
use geojson::feature::Id;
use geojson::{Feature, FeatureCollection, Geometry, JsonObject};
use serde_json::Value;

use crate::AnalysisError;

/// Property carrying the tier's display color as `#rrggbb`.
pub const COLOR_PROPERTY: &str = "color";

fn point_geometry(lat: f64, lng: f64) -> Geometry {
    Geometry::new(geojson::Value::from(&geo::Point::new(lng, lat)))
}

fn feature_id(id: &PointId) -> Id {
    match id {
        PointId::Index(i) => Id::Number((*i).into()),
        PointId::Text(s) => Id::String(s.clone()),
        PointId::Other(Value::Number(n)) => Id::Number(n.clone()),
        PointId::Other(other) => Id::String(other.to_string()),
    }
}

fn to_object<T: serde::Serialize>(value: &T) -> Result<JsonObject, AnalysisError> {
    match serde_json::to_value(value)? {
        Value::Object(map) => Ok(map),
        _ => Ok(JsonObject::new()),
    }
}

fn collection(features: Vec<Feature>) -> FeatureCollection {
    FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    }
}

/// One Point feature per Gi* result, with every result field (and the
/// point's passthrough fields) as properties plus [`COLOR_PROPERTY`].
///
/// # Errors
///
/// Returns [`AnalysisError::Serialization`] if a passthrough field cannot
/// be serialized.
pub fn gi_star_to_geojson(results: &[GiStarResult]) -> Result<FeatureCollection, AnalysisError> {
    let features = results
        .iter()
        .map(|result| {
            let mut properties = to_object(result)?;
            properties.insert(
                COLOR_PROPERTY.to_string(),
                Value::from(result.classification.hex_color()),
            );
            Ok(Feature {
                bbox: None,
                geometry: Some(point_geometry(result.point.lat, result.point.lng)),
                id: Some(feature_id(&result.point.id)),
                properties: Some(properties),
                foreign_members: None,
            })
        })
        .collect::<Result<Vec<_>, AnalysisError>>()?;

    Ok(collection(features))
}

fn cell_feature(cell: &GridCell) -> Result<Feature, AnalysisError> {
    Ok(Feature {
        bbox: None,
        geometry: Some(point_geometry(cell.lat, cell.lng)),
        id: None,
        properties: Some(to_object(cell)?),
        foreign_members: None,
    })
}

/// One Point feature per grid cell whose normalized density is at least
/// `min_normalized_density`. Pass `0.0` to export the whole grid.
///
/// # Errors
///
/// Returns [`AnalysisError::Serialization`] if a cell cannot be
/// serialized.
pub fn kde_to_geojson(
    kde: &KdeResult,
    min_normalized_density: f64,
) -> Result<FeatureCollection, AnalysisError> {
    let features = kde
        .grid
        .iter()
        .filter(|cell| cell.normalized_density >= min_normalized_density)
        .map(cell_feature)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(collection(features))
}

#[cfg(test)]
mod tests {
    use crime_hotspot_analysis_models::{Classification, Point};
    use serde_json::json;

    use super::*;

    fn hotspot(id: u64) -> GiStarResult {
        GiStarResult {
            z_score: 3.0,
            classification: Classification::Hotspot99,
            confidence_level: 99,
            is_hotspot: true,
            ..GiStarResult::not_significant(Point::new(id, 13.8, 100.5, 4.0))
        }
    }

    #[test]
    fn hotspot_features_carry_position_and_color() {
        let collection = gi_star_to_geojson(&[hotspot(3)]).unwrap();
        let json = serde_json::to_value(&collection).unwrap();
        let feature = &json["features"][0];

        assert_eq!(json["type"], "FeatureCollection");
        assert_eq!(feature["id"], json!(3));
        assert_eq!(feature["geometry"]["type"], "Point");
        assert_eq!(feature["geometry"]["coordinates"], json!([100.5, 13.8]));
        assert_eq!(feature["properties"]["zScore"], json!(3.0));
        assert_eq!(feature["properties"]["value"], json!(4.0));
        assert_eq!(
            feature["properties"][COLOR_PROPERTY],
            json!(Classification::Hotspot99.hex_color())
        );
    }

    #[test]
    fn non_index_ids_become_valid_feature_ids() {
        let with_id = |id| {
            let mut result = hotspot(0);
            result.point.id = id;
            result
        };
        let collection = gi_star_to_geojson(&[
            with_id(PointId::Other(json!(-7))),
            with_id(PointId::Other(json!({"lot": 2}))),
        ])
        .unwrap();
        let json = serde_json::to_value(&collection).unwrap();

        assert_eq!(json["features"][0]["id"], json!(-7));
        assert_eq!(json["features"][1]["id"], json!(r#"{"lot":2}"#));
    }

    #[test]
    fn density_features_can_skip_low_cells() {
        let cell = |normalized_density| GridCell {
            lat: 1.0,
            lng: 2.0,
            row: 0,
            col: 0,
            density: normalized_density,
            normalized_density,
        };
        let kde = KdeResult {
            grid: vec![cell(0.1), cell(0.5), cell(1.0)],
            max_density: 1.0,
            min_density: 0.1,
            bandwidth: 1.0,
            bounds: None,
            resolution: 1,
        };

        assert_eq!(kde_to_geojson(&kde, 0.0).unwrap().features.len(), 3);
        let dense = kde_to_geojson(&kde, 0.5).unwrap();
        assert_eq!(dense.features.len(), 2);
        let properties = dense.features[0].properties.as_ref().unwrap();
        assert_eq!(properties["normalizedDensity"], json!(0.5));
    }
}
