#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Input and output types for the spatial hotspot engine.
//!
//! Callers hand the engine [`RawPoint`]s (loosely typed records with
//! coordinates and an optional attribute value), and receive an
//! [`AnalysisResult`] holding the kernel density grid, per-point Gi*
//! results, and the normalized [`Point`]s both were computed from. All types
//! serialize with camelCase keys so they can be handed straight to a
//! mapping front-end.

pub mod classification;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use strum_macros::{AsRefStr, Display, EnumString};

pub use classification::Classification;

/// Identifier of a point, carried through from the caller's record.
///
/// Records without an id get their position in the input list. Ids that are
/// neither unsigned integers nor strings are kept as supplied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PointId {
    /// Numeric id (or the input index when none was supplied).
    Index(u64),
    Text(String),
    /// Negative or fractional numbers, booleans, arrays, and objects.
    Other(Value),
}

impl std::fmt::Display for PointId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Index(i) => write!(f, "{i}"),
            Self::Text(s) => f.write_str(s),
            Self::Other(v) => write!(f, "{v}"),
        }
    }
}

/// An input record as supplied by the data-aggregation layer.
///
/// Only the coordinates are required. `value` may be missing or
/// non-numeric, in which case normalization falls back to `intensity` and
/// then to `1`. Every other key is kept in [`Self::properties`] and passed
/// through untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawPoint {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    #[serde(default, alias = "Latitude", skip_serializing_if = "Option::is_none")]
    pub lat: Option<f64>,
    #[serde(default, alias = "Longitude", skip_serializing_if = "Option::is_none")]
    pub lng: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intensity: Option<Value>,
    /// Passthrough fields.
    #[serde(flatten)]
    pub properties: Map<String, Value>,
}

impl RawPoint {
    /// Convenience constructor for a record with coordinates and a value.
    #[must_use]
    pub fn new(lat: f64, lng: f64, value: f64) -> Self {
        Self {
            lat: Some(lat),
            lng: Some(lng),
            value: Some(Value::from(value)),
            ..Self::default()
        }
    }

    /// Sets the record id.
    #[must_use]
    pub fn with_id(mut self, id: impl Into<Value>) -> Self {
        self.id = Some(id.into());
        self
    }
}

/// A normalized observation: decimal-degree coordinates plus a numeric
/// attribute intensity (e.g. incident count).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Point {
    pub id: PointId,
    pub lat: f64,
    pub lng: f64,
    pub value: f64,
    /// Passthrough fields from the input record.
    #[serde(flatten, default)]
    pub properties: Map<String, Value>,
}

impl Point {
    #[must_use]
    pub fn new(id: u64, lat: f64, lng: f64, value: f64) -> Self {
        Self {
            id: PointId::Index(id),
            lat,
            lng,
            value,
            properties: Map::new(),
        }
    }
}

/// A latitude/longitude bounding box in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bounds {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lng: f64,
    pub max_lng: f64,
}

impl Bounds {
    /// Grows the box by `degrees` on every side.
    #[must_use]
    pub fn padded(self, degrees: f64) -> Self {
        Self {
            min_lat: self.min_lat - degrees,
            max_lat: self.max_lat + degrees,
            min_lng: self.min_lng - degrees,
            max_lng: self.max_lng + degrees,
        }
    }

    #[must_use]
    pub fn contains(&self, lat: f64, lng: f64) -> bool {
        (self.min_lat..=self.max_lat).contains(&lat) && (self.min_lng..=self.max_lng).contains(&lng)
    }
}

/// Smoothing kernel used by the density estimator.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Kernel {
    /// Unbounded support, smooth falloff.
    #[default]
    Gaussian,
    /// Compact support: zero beyond one bandwidth.
    Epanechnikov,
}

/// Neighbor weighting policy for the spatial weight matrix.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
pub enum WeightType {
    /// `1` within the distance threshold, `0` beyond it.
    #[default]
    #[serde(alias = "fixed_distance")]
    #[strum(to_string = "binary", serialize = "fixed_distance")]
    Binary,
    /// `1 / d^power` within the distance threshold, `0` beyond it.
    #[strum(to_string = "inverse_distance")]
    InverseDistance,
}

/// One evaluation node of the density surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GridCell {
    pub lat: f64,
    pub lng: f64,
    pub row: u32,
    pub col: u32,
    /// Raw kernel-weighted sum.
    pub density: f64,
    /// `density / max_density` over the grid, in `[0, 1]`.
    pub normalized_density: f64,
}

/// Output of the kernel density estimator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KdeResult {
    /// `(resolution + 1)^2` cells in row-major order.
    pub grid: Vec<GridCell>,
    pub max_density: f64,
    pub min_density: f64,
    /// Bandwidth in kilometers actually used.
    pub bandwidth: f64,
    /// Bounds the grid spans, `None` when there was nothing to evaluate.
    pub bounds: Option<Bounds>,
    pub resolution: u32,
}

impl KdeResult {
    /// A result with no grid, used when there are no points and no
    /// explicit bounds.
    #[must_use]
    pub const fn empty(resolution: u32) -> Self {
        Self {
            grid: Vec::new(),
            max_density: 0.0,
            min_density: 0.0,
            bandwidth: 0.0,
            bounds: None,
            resolution,
        }
    }

    /// Normalized densities as a `(resolution + 1) x (resolution + 1)`
    /// matrix indexed `[row][col]`, for contouring.
    ///
    /// Cells missing from the grid read as `0`.
    #[must_use]
    pub fn density_matrix(&self) -> Vec<Vec<f64>> {
        let side = self.resolution as usize + 1;
        let mut matrix = vec![vec![0.0; side]; side];
        for cell in &self.grid {
            if let Some(slot) = matrix
                .get_mut(cell.row as usize)
                .and_then(|row| row.get_mut(cell.col as usize))
            {
                *slot = cell.normalized_density;
            }
        }
        matrix
    }
}

/// Gi* output for one point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GiStarResult {
    #[serde(flatten)]
    pub point: Point,
    pub z_score: f64,
    pub p_value: f64,
    pub classification: Classification,
    pub confidence_level: u8,
    pub is_hotspot: bool,
    pub is_coldspot: bool,
    /// Neighbors within the threshold, excluding the point itself.
    pub neighbors_count: usize,
    pub sum_wij: f64,
    pub sum_wij_xj: f64,
}

impl GiStarResult {
    /// A zero z-score, not-significant result with no neighborhood data.
    #[must_use]
    pub fn not_significant(point: Point) -> Self {
        Self {
            point,
            z_score: 0.0,
            p_value: 1.0,
            classification: Classification::NotSignificant,
            confidence_level: 0,
            is_hotspot: false,
            is_coldspot: false,
            neighbors_count: 0,
            sum_wij: 0.0,
            sum_wij_xj: 0.0,
        }
    }
}

/// Tier counts and the global parameters of a Gi* run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisSummary {
    pub hotspots_99: usize,
    pub hotspots_95: usize,
    pub hotspots_90: usize,
    pub coldspots_90: usize,
    pub coldspots_95: usize,
    pub coldspots_99: usize,
    pub not_significant: usize,
    pub total_hotspots: usize,
    pub total_coldspots: usize,
    /// Distance threshold in km; `0` when no weight matrix was built.
    pub distance_threshold: f64,
    pub global_mean: f64,
    pub global_std_dev: f64,
}

impl AnalysisSummary {
    /// Tallies results by their classification. Each result is counted in
    /// exactly one tier.
    #[must_use]
    pub fn tally(
        results: &[GiStarResult],
        distance_threshold: f64,
        global_mean: f64,
        global_std_dev: f64,
    ) -> Self {
        let mut summary = Self {
            hotspots_99: 0,
            hotspots_95: 0,
            hotspots_90: 0,
            coldspots_90: 0,
            coldspots_95: 0,
            coldspots_99: 0,
            not_significant: 0,
            total_hotspots: 0,
            total_coldspots: 0,
            distance_threshold,
            global_mean,
            global_std_dev,
        };

        for result in results {
            match result.classification {
                Classification::Hotspot99 => summary.hotspots_99 += 1,
                Classification::Hotspot95 => summary.hotspots_95 += 1,
                Classification::Hotspot90 => summary.hotspots_90 += 1,
                Classification::NotSignificant => summary.not_significant += 1,
                Classification::Coldspot90 => summary.coldspots_90 += 1,
                Classification::Coldspot95 => summary.coldspots_95 += 1,
                Classification::Coldspot99 => summary.coldspots_99 += 1,
            }
        }
        summary.total_hotspots = summary.hotspots_99 + summary.hotspots_95 + summary.hotspots_90;
        summary.total_coldspots =
            summary.coldspots_99 + summary.coldspots_95 + summary.coldspots_90;

        summary
    }

    /// Sum of all seven tier counts. Always equals the number of results
    /// tallied.
    #[must_use]
    pub const fn tier_total(&self) -> usize {
        self.total_hotspots + self.total_coldspots + self.not_significant
    }
}

/// Gi* results plus their summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GiStarAnalysis {
    pub results: Vec<GiStarResult>,
    pub summary: AnalysisSummary,
}

/// Knobs for a combined analysis run.
///
/// Every field has a default, so an empty JSON object or TOML file is a
/// valid configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AnalysisOptions {
    /// Grid cells per axis; the grid has `resolution + 1` nodes per side.
    pub kde_resolution: u32,
    /// Bandwidth in km. `None` uses Silverman's rule.
    pub kde_bandwidth: Option<f64>,
    /// Grid bounds. `None` pads the points' bounding box.
    pub kde_bounds: Option<Bounds>,
    /// Weight each point's kernel contribution by its `value`.
    pub kde_weight_by_value: bool,
    pub kernel: Kernel,
    /// Gi* neighbor distance in km. `None` or `0` uses the adaptive
    /// threshold.
    pub gi_distance_threshold: Option<f64>,
    pub gi_weight_type: WeightType,
    /// Exponent for [`WeightType::InverseDistance`].
    pub gi_inverse_distance_power: f64,
}

/// Default KDE grid resolution for combined runs.
pub const DEFAULT_KDE_RESOLUTION: u32 = 40;

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            kde_resolution: DEFAULT_KDE_RESOLUTION,
            kde_bandwidth: None,
            kde_bounds: None,
            kde_weight_by_value: true,
            kernel: Kernel::Gaussian,
            gi_distance_threshold: None,
            gi_weight_type: WeightType::Binary,
            gi_inverse_distance_power: 1.0,
        }
    }
}

/// Combined output of one analysis call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub kde: KdeResult,
    pub gi_star: GiStarAnalysis,
    pub points: Vec<Point>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result_with(z: f64) -> GiStarResult {
        let classification = Classification::from_z_score(z);
        GiStarResult {
            z_score: z,
            classification,
            confidence_level: classification.confidence_level(),
            is_hotspot: classification.is_hotspot(),
            is_coldspot: classification.is_coldspot(),
            ..GiStarResult::not_significant(Point::new(0, 0.0, 0.0, 1.0))
        }
    }

    #[test]
    fn summary_partitions_every_result() {
        let zs = [3.0, 2.0, 1.7, 0.0, 0.5, -1.7, -2.0, -3.0, -2.58, 2.58];
        let results: Vec<_> = zs.iter().map(|z| result_with(*z)).collect();
        let summary = AnalysisSummary::tally(&results, 1.0, 0.0, 1.0);

        assert_eq!(summary.hotspots_99, 2);
        assert_eq!(summary.hotspots_95, 1);
        assert_eq!(summary.hotspots_90, 1);
        assert_eq!(summary.not_significant, 2);
        assert_eq!(summary.coldspots_90, 1);
        assert_eq!(summary.coldspots_95, 1);
        assert_eq!(summary.coldspots_99, 2);
        assert_eq!(summary.total_hotspots, 4);
        assert_eq!(summary.total_coldspots, 4);
        assert_eq!(summary.tier_total(), zs.len());
    }

    #[test]
    fn raw_point_accepts_capitalized_coordinate_aliases() {
        let raw: RawPoint =
            serde_json::from_str(r#"{"Latitude": 13.8, "Longitude": 100.5, "caseCount": 3}"#)
                .unwrap();
        assert_eq!(raw.lat, Some(13.8));
        assert_eq!(raw.lng, Some(100.5));
        assert_eq!(raw.properties.get("caseCount"), Some(&Value::from(3)));
    }

    #[test]
    fn gi_star_result_flattens_point_fields() {
        let mut point = Point::new(7, 1.0, 2.0, 3.0);
        point
            .properties
            .insert("district".to_string(), Value::from("north"));
        let json = serde_json::to_value(GiStarResult::not_significant(point)).unwrap();

        assert_eq!(json["id"], Value::from(7));
        assert_eq!(json["lat"], Value::from(1.0));
        assert_eq!(json["district"], Value::from("north"));
        assert_eq!(json["zScore"], Value::from(0.0));
        assert_eq!(json["classification"], Value::from("Not Significant"));
        assert_eq!(json["neighborsCount"], Value::from(0));
    }

    #[test]
    fn options_default_from_empty_object() {
        let options: AnalysisOptions = serde_json::from_str("{}").unwrap();
        assert_eq!(options, AnalysisOptions::default());
        assert_eq!(options.kde_resolution, DEFAULT_KDE_RESOLUTION);
    }

    #[test]
    fn weight_type_accepts_fixed_distance_alias() {
        let options: AnalysisOptions =
            serde_json::from_str(r#"{"giWeightType": "fixed_distance"}"#).unwrap();
        assert_eq!(options.gi_weight_type, WeightType::Binary);
        assert_eq!("fixed_distance".parse::<WeightType>().unwrap(), WeightType::Binary);
        assert_eq!(WeightType::InverseDistance.to_string(), "inverse_distance");
        assert_eq!("epanechnikov".parse::<Kernel>().unwrap(), Kernel::Epanechnikov);
    }

    #[test]
    fn density_matrix_places_cells_by_row_and_col() {
        let cell = |row, col, normalized_density| GridCell {
            lat: 0.0,
            lng: 0.0,
            row,
            col,
            density: normalized_density,
            normalized_density,
        };
        let kde = KdeResult {
            grid: vec![cell(0, 0, 0.25), cell(0, 1, 0.5), cell(1, 0, 0.75), cell(1, 1, 1.0)],
            max_density: 1.0,
            min_density: 0.25,
            bandwidth: 1.0,
            bounds: None,
            resolution: 1,
        };
        assert_eq!(kde.density_matrix(), vec![vec![0.25, 0.5], vec![0.75, 1.0]]);
    }

    #[test]
    fn padded_bounds_grow_on_every_side() {
        let bounds = Bounds {
            min_lat: 1.0,
            max_lat: 2.0,
            min_lng: 3.0,
            max_lng: 4.0,
        }
        .padded(0.5);
        assert!((bounds.min_lat - 0.5).abs() < f64::EPSILON);
        assert!((bounds.max_lng - 4.5).abs() < f64::EPSILON);
        assert!(bounds.contains(2.4, 3.0));
        assert!(!bounds.contains(2.6, 3.0));
    }
}
