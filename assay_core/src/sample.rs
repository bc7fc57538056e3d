//! Synthetic sensor sample generation.
//!
//! The waveform below is a display stand-in, not a physical model: it
//! produces a plausible-looking trace for the UI and gives the classifier
//! something to average. A production build replaces this module with real
//! ADC ingestion from the reader.

use assay_traits::Entropy;
use serde::Serialize;

use crate::util::{round1, round2};

/// One instantaneous sensor reading. Transient: produced by the stream,
/// consumed by the classifier, never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Sample {
    /// Wall-clock epoch milliseconds at emission time.
    pub timestamp_ms: i64,
    /// Instantaneous cell current, µA, two decimals.
    pub current_ua: f64,
    /// Cell temperature, °C, one decimal.
    pub temperature_c: f64,
    /// Unrounded synthetic value.
    pub raw_value: f64,
    /// `raw_value` quantized to one decimal; the classifier averages this.
    pub processed_value: f64,
}

/// Sine carrier parameters for the synthetic trace.
const BASE_LEVEL: f64 = 85.0;
const BASE_AMPLITUDE: f64 = 15.0;
const BASE_ANGULAR_STEP: f64 = 0.3;
/// Additive noise bound: uniform in [-NOISE_SPAN/2, +NOISE_SPAN/2].
const NOISE_SPAN: f64 = 8.0;

/// Produce the sample for step index `step`.
///
/// Pure over its inputs: identical (step, timestamp, entropy draws) yield
/// an identical sample. Draw order is noise, current, temperature.
pub fn synthesize(step: u64, timestamp_ms: i64, entropy: &dyn Entropy) -> Sample {
    let base = BASE_LEVEL + BASE_AMPLITUDE * (BASE_ANGULAR_STEP * step as f64).sin();
    let raw_value = base + entropy.uniform(-NOISE_SPAN / 2.0, NOISE_SPAN / 2.0);
    Sample {
        timestamp_ms,
        current_ua: round2(entropy.uniform(1.0, 1.5)),
        temperature_c: round1(entropy.uniform(36.0, 37.0)),
        raw_value,
        processed_value: round1(raw_value),
    }
}
