//! Groups raw records that share a location into weighted points.

use std::collections::HashMap;

use crime_hotspot_analysis_models::RawPoint;
use serde_json::Value;

use crate::AnalysisError;
use crate::normalize::{coordinates, record_value};

/// Decimal places two coordinates must agree to (about 11 m of latitude).
pub const LOCATION_KEY_DECIMALS: usize = 4;

/// Property holding how many records were merged into an aggregated point.
pub const MEMBER_COUNT_PROPERTY: &str = "memberCount";

fn location_key(lat: f64, lng: f64) -> String {
    format!("{lat:.prec$},{lng:.prec$}", prec = LOCATION_KEY_DECIMALS)
}

/// Merges records whose coordinates agree to [`LOCATION_KEY_DECIMALS`]
/// places.
///
/// Each group keeps its first record's id, coordinates, and passthrough
/// fields. Its `value` becomes the sum of the members' values (each
/// resolved as in normalization, so a bare record counts `1`) and
/// [`MEMBER_COUNT_PROPERTY`] records the group size. Groups are returned in
/// order of first appearance.
///
/// # Errors
///
/// Fails on the first record with missing or non-finite coordinates.
pub fn aggregate_by_location(records: &[RawPoint]) -> Result<Vec<RawPoint>, AnalysisError> {
    let mut groups: Vec<(RawPoint, f64, u64)> = Vec::new();
    let mut by_key: HashMap<String, usize> = HashMap::new();

    for (index, raw) in records.iter().enumerate() {
        let (lat, lng) = coordinates(raw, index)?;
        let value = record_value(raw);

        match by_key.get(&location_key(lat, lng)) {
            Some(&slot) => {
                let (_, total, count) = &mut groups[slot];
                *total += value;
                *count += 1;
            }
            None => {
                by_key.insert(location_key(lat, lng), groups.len());
                groups.push((raw.clone(), value, 1));
            }
        }
    }

    log::debug!(
        "Aggregated {} records into {} locations",
        records.len(),
        groups.len()
    );

    Ok(groups
        .into_iter()
        .map(|(mut first, total, count)| {
            first.value = Some(Value::from(total));
            first
                .properties
                .insert(MEMBER_COUNT_PROPERTY.to_string(), Value::from(count));
            first
        })
        .collect())
}
