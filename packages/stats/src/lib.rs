#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Statistical primitives for hotspot analysis.
//!
//! Population mean and standard deviation over attribute values, and a
//! two-tailed normal p-value computed from the Abramowitz & Stegun
//! rational approximation of the error function (formula 7.1.26).
//!
//! The approximation has a maximum absolute error of `1.5e-7` on `erf`, so
//! every p-value returned here is within `1.5e-7` of the exact two-tailed
//! normal tail probability. Callers must not rely on more precision than
//! that. In particular `two_tailed_p_value(0.0)` is `1 - 1e-9`, not exactly
//! `1`.

/// Maximum absolute error of [`erf`] and therefore of
/// [`two_tailed_p_value`].
pub const ERF_MAX_ABS_ERROR: f64 = 1.5e-7;

const A1: f64 = 0.254_829_592;
const A2: f64 = -0.284_496_736;
const A3: f64 = 1.421_413_741;
const A4: f64 = -1.453_152_027;
const A5: f64 = 1.061_405_429;
const P: f64 = 0.327_591_1;

/// Arithmetic mean, or `None` for an empty slice.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Population standard deviation (divides by `n`, not `n - 1`), or `None`
/// for an empty slice.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn population_std_dev(values: &[f64]) -> Option<f64> {
    let avg = mean(values)?;
    let variance = values
        .iter()
        .map(|v| {
            let d = v - avg;
            d * d
        })
        .sum::<f64>()
        / values.len() as f64;
    Some(variance.sqrt())
}

/// Error function, Abramowitz & Stegun 7.1.26.
///
/// Odd-symmetric; accurate to [`ERF_MAX_ABS_ERROR`].
#[must_use]
pub fn erf(x: f64) -> f64 {
    let sign = if x < 0.0 { -1.0 } else { 1.0 };
    let x = x.abs();

    let t = 1.0 / P.mul_add(x, 1.0);
    let poly = A5
        .mul_add(t, A4)
        .mul_add(t, A3)
        .mul_add(t, A2)
        .mul_add(t, A1)
        * t;

    sign * poly.mul_add(-(-x * x).exp(), 1.0)
}

/// Two-tailed p-value for a standard normal z-score:
/// `1 - erf(|z| / sqrt(2))`.
///
/// Strictly decreasing in `|z|`. `NaN` propagates.
#[must_use]
pub fn two_tailed_p_value(z: f64) -> f64 {
    1.0 - erf(z.abs() / std::f64::consts::SQRT_2)
}
