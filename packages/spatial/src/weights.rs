//! Dense spatial weight matrix for the Gi* statistic.
//!
//! The matrix is stored as a single row-major buffer indexed by point
//! position. Rows are independent and are filled in parallel when the
//! `parallel` feature is on.

use crime_hotspot_analysis_models::WeightType;

use crate::geodesy::LatLng;
use crate::maybe_rayon::*;
use crate::{CancelToken, SpatialError};

/// How a pairwise distance becomes a weight.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WeightPolicy {
    /// `1` if `d <= threshold`, else `0`.
    Binary,
    /// `1 / d^power` if `0 < d <= threshold`, else `0`.
    InverseDistance {
        power: f64,
    },
}

impl WeightPolicy {
    #[must_use]
    pub const fn from_weight_type(weight_type: WeightType, power: f64) -> Self {
        match weight_type {
            WeightType::Binary => Self::Binary,
            WeightType::InverseDistance => Self::InverseDistance { power },
        }
    }

    /// Weight between two distinct points `distance_km` apart.
    #[must_use]
    pub fn weight(self, distance_km: f64, threshold_km: f64) -> f64 {
        match self {
            Self::Binary => {
                if distance_km <= threshold_km {
                    1.0
                } else {
                    0.0
                }
            }
            Self::InverseDistance { power } => {
                if distance_km > 0.0 && distance_km <= threshold_km {
                    1.0 / distance_km.powf(power)
                } else {
                    0.0
                }
            }
        }
    }
}

/// `n x n` neighbor weights with `w[i][i] == 1`.
#[derive(Debug, Clone, PartialEq)]
pub struct SpatialWeightMatrix {
    n: usize,
    data: Vec<f64>,
}

/// Weight every point assigns to itself.
pub const SELF_WEIGHT: f64 = 1.0;

impl SpatialWeightMatrix {
    /// Builds the matrix from pairwise Haversine distances.
    ///
    /// The diagonal is set to [`SELF_WEIGHT`] directly rather than derived
    /// from the zero self-distance.
    ///
    /// # Errors
    ///
    /// Returns [`SpatialError`] if `cancel` fires before every row is built.
    pub fn build<P: LatLng + Sync>(
        points: &[P],
        threshold_km: f64,
        policy: WeightPolicy,
        cancel: &CancelToken,
    ) -> Result<Self, SpatialError> {
        let n = points.len();
        let mut data = vec![0.0; n * n];

        if n > 0 {
            data.par_chunks_mut(n)
                .enumerate()
                .try_for_each(|(i, row)| -> Result<(), SpatialError> {
                    cancel.check()?;
                    let origin = &points[i];
                    for (j, slot) in row.iter_mut().enumerate() {
                        *slot = if i == j {
                            SELF_WEIGHT
                        } else {
                            policy.weight(origin.distance_km(&points[j]), threshold_km)
                        };
                    }
                    Ok(())
                })?;
        }

        log::debug!("Built {n}x{n} spatial weight matrix ({policy:?}, threshold {threshold_km:.3} km)");

        Ok(Self { n, data })
    }

    /// Number of points (rows and columns).
    #[must_use]
    pub const fn len(&self) -> usize {
        self.n
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.n == 0
    }

    /// Weight of `j` in `i`'s neighborhood.
    ///
    /// # Panics
    ///
    /// Panics if either index is out of bounds.
    #[must_use]
    pub fn get(&self, i: usize, j: usize) -> f64 {
        assert!(i < self.n && j < self.n, "index ({i}, {j}) out of bounds");
        self.data[i * self.n + j]
    }

    /// Row `i` as a contiguous slice.
    #[must_use]
    pub fn row(&self, i: usize) -> &[f64] {
        &self.data[i * self.n..(i + 1) * self.n]
    }

    /// Iterates rows in index order.
    pub fn rows(&self) -> impl Iterator<Item = &[f64]> {
        // `chunks(0)` panics, and an empty matrix has no rows anyway.
        self.data.chunks(self.n.max(1))
    }

    /// Number of points `j != i` with a positive weight in row `i`.
    #[must_use]
    pub fn neighbor_count(&self, i: usize) -> usize {
        self.row(i)
            .iter()
            .enumerate()
            .filter(|&(j, w)| j != i && *w > 0.0)
            .count()
    }
}
