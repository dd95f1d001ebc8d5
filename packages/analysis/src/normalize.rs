//! Turns loosely typed input records into [`Point`]s.

use crime_hotspot_analysis_models::{Point, PointId, RawPoint};
use serde_json::Value;

use crate::AnalysisError;

/// Attribute value used when a record carries neither a usable `value` nor
/// a usable `intensity`.
pub const DEFAULT_VALUE: f64 = 1.0;

/// A finite, non-negative JSON number, or `None` for anything else.
fn usable_number(value: Option<&Value>) -> Option<f64> {
    value
        .and_then(Value::as_f64)
        .filter(|v| v.is_finite() && *v >= 0.0)
}

/// The attribute value of a record: `value`, else `intensity`, else
/// [`DEFAULT_VALUE`]. Strings, booleans, nulls, and negative numbers are
/// skipped.
#[must_use]
pub fn record_value(raw: &RawPoint) -> f64 {
    usable_number(raw.value.as_ref())
        .or_else(|| usable_number(raw.intensity.as_ref()))
        .unwrap_or(DEFAULT_VALUE)
}

fn point_id(id: Option<&Value>, index: usize) -> PointId {
    match id {
        None | Some(Value::Null) => PointId::Index(index as u64),
        Some(Value::String(s)) => PointId::Text(s.clone()),
        Some(other) => other
            .as_u64()
            .map_or_else(|| PointId::Other(other.clone()), PointId::Index),
    }
}

/// Coordinates of the record at `index`, rejecting missing or non-finite
/// values.
///
/// # Errors
///
/// * [`AnalysisError::MissingCoordinate`] if `lat` or `lng` is absent
/// * [`AnalysisError::NonFiniteCoordinate`] if either is `NaN` or infinite
pub fn coordinates(raw: &RawPoint, index: usize) -> Result<(f64, f64), AnalysisError> {
    let lat = raw.lat.ok_or(AnalysisError::MissingCoordinate {
        index,
        field: "lat",
    })?;
    let lng = raw.lng.ok_or(AnalysisError::MissingCoordinate {
        index,
        field: "lng",
    })?;

    if !lat.is_finite() || !lng.is_finite() {
        return Err(AnalysisError::NonFiniteCoordinate { index, lat, lng });
    }

    Ok((lat, lng))
}

/// Normalizes one record.
///
/// The id defaults to `index`. Passthrough fields are copied, and a
/// supplied `intensity` is kept among them.
///
/// # Errors
///
/// See [`coordinates`].
pub fn normalize_point(raw: &RawPoint, index: usize) -> Result<Point, AnalysisError> {
    let (lat, lng) = coordinates(raw, index)?;

    let mut properties = raw.properties.clone();
    if let Some(intensity) = &raw.intensity {
        properties.insert("intensity".to_string(), intensity.clone());
    }

    Ok(Point {
        id: point_id(raw.id.as_ref(), index),
        lat,
        lng,
        value: record_value(raw),
        properties,
    })
}

/// Normalizes every record, preserving order. The input is not modified.
///
/// # Errors
///
/// Fails on the first record with missing or non-finite coordinates.
pub fn normalize_points(records: &[RawPoint]) -> Result<Vec<Point>, AnalysisError> {
    records
        .iter()
        .enumerate()
        .map(|(index, raw)| normalize_point(raw, index))
        .collect()
}
