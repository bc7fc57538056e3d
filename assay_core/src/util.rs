//! Small numeric helpers for assay_core.

/// Quantize to one decimal place, rounding to nearest.
#[inline]
pub fn round1(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}

/// Quantize to two decimal places, rounding to nearest.
#[inline]
pub fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}
