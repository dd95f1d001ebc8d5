//! Loading point records and analysis options from disk.
//!
//! Points come from a JSON array of objects or from a CSV file with a
//! header row. CSV columns named `lat`/`Latitude`, `lng`/`Longitude`,
//! `id`, `value`, and `intensity` are interpreted, every other column is
//! passed through as a string.

use std::io::Read;
use std::path::Path;

use crime_hotspot_analysis_models::{AnalysisOptions, RawPoint};
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum InputError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("Invalid JSON points: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid CSV points: {0}")]
    Csv(#[from] csv::Error),

    #[error("Invalid options file: {0}")]
    Toml(#[from] toml::de::Error),
}

fn read_to_string(path: &Path) -> Result<String, InputError> {
    std::fs::read_to_string(path).map_err(|source| InputError::Io {
        path: path.display().to_string(),
        source,
    })
}

fn is_csv(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"))
}

/// Loads records from `path`, choosing CSV or JSON by extension.
///
/// # Errors
///
/// Returns [`InputError`] if the file cannot be read or parsed.
pub fn load_points(path: &Path) -> Result<Vec<RawPoint>, InputError> {
    let contents = read_to_string(path)?;
    let records = if is_csv(path) {
        parse_csv(contents.as_bytes())?
    } else {
        serde_json::from_str(&contents)?
    };
    log::info!("Loaded {} records from {}", records.len(), path.display());
    Ok(records)
}

/// Loads [`AnalysisOptions`] from a TOML file. Missing keys keep their
/// defaults.
///
/// # Errors
///
/// Returns [`InputError`] if the file cannot be read or parsed.
pub fn load_options(path: &Path) -> Result<AnalysisOptions, InputError> {
    Ok(toml::from_str(&read_to_string(path)?)?)
}

fn number(field: &str) -> Option<Value> {
    field
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .map(Value::from)
}

fn coordinate(field: &str) -> Option<f64> {
    field.trim().parse().ok()
}

fn id(field: &str) -> Option<Value> {
    let field = field.trim();
    if field.is_empty() {
        return None;
    }
    Some(
        field
            .parse::<u64>()
            .map_or_else(|_| Value::from(field), Value::from),
    )
}

/// Parses CSV records with a header row.
///
/// # Errors
///
/// Returns [`InputError::Csv`] on malformed CSV.
pub fn parse_csv(reader: impl Read) -> Result<Vec<RawPoint>, InputError> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
    let headers = reader.headers()?.clone();

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row?;
        let mut raw = RawPoint::default();

        for (header, field) in headers.iter().zip(row.iter()) {
            match header {
                "lat" | "Latitude" => raw.lat = coordinate(field),
                "lng" | "Longitude" => raw.lng = coordinate(field),
                "id" => raw.id = id(field),
                "value" => raw.value = number(field),
                "intensity" => raw.intensity = number(field),
                other => {
                    raw.properties
                        .insert(other.to_string(), Value::from(field));
                }
            }
        }
        records.push(raw);
    }

    Ok(records)
}

#[cfg(test)]
mod tests {
    use crime_hotspot_analysis_models::{Kernel, WeightType};
    use serde_json::json;

    use super::*;

    #[test]
    fn csv_columns_map_onto_records() {
        let csv = "\
id,Latitude,Longitude,value,district
7,13.8,100.5,3,north
loc-2,13.9,100.6,,south
";
        let records = parse_csv(csv.as_bytes()).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, Some(json!(7)));
        assert_eq!(records[0].lat, Some(13.8));
        assert_eq!(records[0].lng, Some(100.5));
        assert_eq!(records[0].value, Some(json!(3.0)));
        assert_eq!(records[0].properties["district"], json!("north"));

        assert_eq!(records[1].id, Some(json!("loc-2")));
        assert_eq!(records[1].value, None);
    }

    #[test]
    fn unparseable_coordinates_are_left_missing() {
        let records = parse_csv("lat,lng\nnorth,100.5\n".as_bytes()).unwrap();
        assert_eq!(records[0].lat, None);
        assert_eq!(records[0].lng, Some(100.5));
    }

    #[test]
    fn options_parse_from_camel_case_toml() {
        let options: AnalysisOptions = toml::from_str(
            r#"
kdeResolution = 80
kdeBandwidth = 25.0
giWeightType = "inverse_distance"
giInverseDistancePower = 2.0
kernel = "epanechnikov"
"#,
        )
        .unwrap();

        assert_eq!(options.kde_resolution, 80);
        assert_eq!(options.kde_bandwidth, Some(25.0));
        assert_eq!(options.gi_weight_type, WeightType::InverseDistance);
        assert!((options.gi_inverse_distance_power - 2.0).abs() < f64::EPSILON);
        assert_eq!(options.kernel, Kernel::Epanechnikov);
        assert!(options.kde_weight_by_value);
        assert_eq!(options.gi_distance_threshold, None);
    }

    #[test]
    fn csv_extension_is_case_insensitive() {
        assert!(is_csv(Path::new("points.CSV")));
        assert!(!is_csv(Path::new("points.json")));
    }
}
