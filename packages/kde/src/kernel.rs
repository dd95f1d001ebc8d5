//! Kernel functions. Both take a distance and a bandwidth in the same unit
//! (kilometers) and integrate to one over the line.

use crime_hotspot_analysis_models::Kernel;

/// `1 / (h * sqrt(2 * pi)) * exp(-(d / h)^2 / 2)`
#[must_use]
pub fn gaussian(distance: f64, bandwidth: f64) -> f64 {
    let u = distance / bandwidth;
    (1.0 / (bandwidth * (2.0 * std::f64::consts::PI).sqrt())) * (-0.5 * u * u).exp()
}

/// `3/4 * (1 - u^2) / h` for `|u| <= 1`, else `0`.
#[must_use]
pub fn epanechnikov(distance: f64, bandwidth: f64) -> f64 {
    let u = distance / bandwidth;
    if u.abs() <= 1.0 {
        0.75 * u.mul_add(-u, 1.0) / bandwidth
    } else {
        0.0
    }
}

/// Evaluates `kernel` at `distance`.
#[must_use]
pub fn evaluate(kernel: Kernel, distance: f64, bandwidth: f64) -> f64 {
    match kernel {
        Kernel::Gaussian => gaussian(distance, bandwidth),
        Kernel::Epanechnikov => epanechnikov(distance, bandwidth),
    }
}
