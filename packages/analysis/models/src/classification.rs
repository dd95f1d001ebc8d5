//! Gi* significance tiers.
//!
//! The z-score cut-offs are the conventional two-tailed critical values for
//! 90/95/99% confidence. They are empirical crime-analysis defaults rather
//! than derived quantities, so they live here as named constants.

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Minimum z-score for a 99% confidence hotspot.
pub const HOTSPOT_99_Z: f64 = 2.58;
/// Minimum z-score for a 95% confidence hotspot.
pub const HOTSPOT_95_Z: f64 = 1.96;
/// Minimum z-score for a 90% confidence hotspot.
pub const HOTSPOT_90_Z: f64 = 1.65;
/// Maximum z-score for a 90% confidence coldspot.
pub const COLDSPOT_90_Z: f64 = -1.65;
/// Maximum z-score for a 95% confidence coldspot.
pub const COLDSPOT_95_Z: f64 = -1.96;
/// Maximum z-score for a 99% confidence coldspot.
pub const COLDSPOT_99_Z: f64 = -2.58;

/// Significance tier of a single Gi* z-score.
///
/// Variants are ordered from the hottest tier to the coldest.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
pub enum Classification {
    /// `z >= 2.58`
    #[serde(rename = "Hotspot (99% Confidence)")]
    #[strum(serialize = "Hotspot (99% Confidence)")]
    Hotspot99,
    /// `1.96 <= z < 2.58`
    #[serde(rename = "Hotspot (95% Confidence)")]
    #[strum(serialize = "Hotspot (95% Confidence)")]
    Hotspot95,
    /// `1.65 <= z < 1.96`
    #[serde(rename = "Hotspot (90% Confidence)")]
    #[strum(serialize = "Hotspot (90% Confidence)")]
    Hotspot90,
    /// `-1.65 < z < 1.65`
    #[serde(rename = "Not Significant")]
    #[strum(serialize = "Not Significant")]
    NotSignificant,
    /// `-1.96 < z <= -1.65`
    #[serde(rename = "Coldspot (90% Confidence)")]
    #[strum(serialize = "Coldspot (90% Confidence)")]
    Coldspot90,
    /// `-2.58 < z <= -1.96`
    #[serde(rename = "Coldspot (95% Confidence)")]
    #[strum(serialize = "Coldspot (95% Confidence)")]
    Coldspot95,
    /// `z <= -2.58`
    #[serde(rename = "Coldspot (99% Confidence)")]
    #[strum(serialize = "Coldspot (99% Confidence)")]
    Coldspot99,
}

impl Classification {
    /// Every tier, hottest first.
    pub const ALL: &[Self] = &[
        Self::Hotspot99,
        Self::Hotspot95,
        Self::Hotspot90,
        Self::NotSignificant,
        Self::Coldspot90,
        Self::Coldspot95,
        Self::Coldspot99,
    ];

    /// Classifies a z-score. The ranges are non-overlapping, so every
    /// finite score lands in exactly one tier. `NaN` is not significant.
    #[must_use]
    pub fn from_z_score(z: f64) -> Self {
        if z >= HOTSPOT_99_Z {
            Self::Hotspot99
        } else if z >= HOTSPOT_95_Z {
            Self::Hotspot95
        } else if z >= HOTSPOT_90_Z {
            Self::Hotspot90
        } else if z <= COLDSPOT_99_Z {
            Self::Coldspot99
        } else if z <= COLDSPOT_95_Z {
            Self::Coldspot95
        } else if z <= COLDSPOT_90_Z {
            Self::Coldspot90
        } else {
            Self::NotSignificant
        }
    }

    /// Confidence percentage: 0, 90, 95 or 99.
    #[must_use]
    pub const fn confidence_level(self) -> u8 {
        match self {
            Self::Hotspot99 | Self::Coldspot99 => 99,
            Self::Hotspot95 | Self::Coldspot95 => 95,
            Self::Hotspot90 | Self::Coldspot90 => 90,
            Self::NotSignificant => 0,
        }
    }

    #[must_use]
    pub const fn is_hotspot(self) -> bool {
        matches!(self, Self::Hotspot99 | Self::Hotspot95 | Self::Hotspot90)
    }

    #[must_use]
    pub const fn is_coldspot(self) -> bool {
        matches!(self, Self::Coldspot99 | Self::Coldspot95 | Self::Coldspot90)
    }

    /// Long label, e.g. `"Hotspot (99% Confidence)"`.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Hotspot99 => "Hotspot (99% Confidence)",
            Self::Hotspot95 => "Hotspot (95% Confidence)",
            Self::Hotspot90 => "Hotspot (90% Confidence)",
            Self::NotSignificant => "Not Significant",
            Self::Coldspot90 => "Coldspot (90% Confidence)",
            Self::Coldspot95 => "Coldspot (95% Confidence)",
            Self::Coldspot99 => "Coldspot (99% Confidence)",
        }
    }

    /// Compact legend label, e.g. `"Hotspot (99% CI)"`.
    #[must_use]
    pub const fn short_label(self) -> &'static str {
        match self {
            Self::Hotspot99 => "Hotspot (99% CI)",
            Self::Hotspot95 => "Hotspot (95% CI)",
            Self::Hotspot90 => "Hotspot (90% CI)",
            Self::NotSignificant => "Not Significant",
            Self::Coldspot90 => "Coldspot (90% CI)",
            Self::Coldspot95 => "Coldspot (95% CI)",
            Self::Coldspot99 => "Coldspot (99% CI)",
        }
    }

    /// Display color for the tier as `(r, g, b)`.
    ///
    /// Hotspots run dark red -> red -> orange, coldspots dark blue -> blue
    /// -> light blue, and non-significant points are grey.
    #[must_use]
    pub const fn rgb(self) -> (u8, u8, u8) {
        match self {
            Self::Hotspot99 => (139, 0, 0),
            Self::Hotspot95 => (220, 38, 38),
            Self::Hotspot90 => (251, 146, 60),
            Self::NotSignificant => (156, 163, 175),
            Self::Coldspot90 => (147, 197, 253),
            Self::Coldspot95 => (59, 130, 246),
            Self::Coldspot99 => (30, 58, 138),
        }
    }

    /// [`Self::rgb`] as a `#rrggbb` string.
    #[must_use]
    pub fn hex_color(self) -> String {
        let (r, g, b) = self.rgb();
        format!("#{r:02x}{g:02x}{b:02x}")
    }
}
