//! Reduce a sample batch into a classified measurement.

use serde::Serialize;

use crate::error::{Result, SessionError};
use crate::reference::ReferenceRange;
use crate::sample::Sample;
use crate::util::round1;

/// Clinical severity of a measurement relative to its reference range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Normal,
    Warning,
    Critical,
}

/// Final measurement handed to the caller. Immutable once produced; the
/// session keeps no history.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Measurement {
    /// Batch mean of `processed_value`, one decimal.
    pub value: f64,
    pub unit: &'static str,
    pub status: Severity,
    /// The range the status was judged against.
    pub reference: ReferenceRange,
}

/// Critical thresholds sit at min × 0.8 and max × 1.2; everything between
/// those and the normal range is warning, so a borderline reading never
/// jumps straight to critical.
const CRITICAL_LOW_FACTOR: f64 = 0.8;
const CRITICAL_HIGH_FACTOR: f64 = 1.2;

/// Average a non-empty batch and classify it against `range`.
pub fn classify(samples: &[Sample], range: ReferenceRange) -> Result<Measurement> {
    if samples.is_empty() {
        return Err(eyre::Report::new(SessionError::EmptyBatch));
    }

    let sum: f64 = samples.iter().map(|s| s.processed_value).sum();
    let value = round1(sum / samples.len() as f64);

    let status = if value >= range.min && value <= range.max {
        Severity::Normal
    } else if value < range.min * CRITICAL_LOW_FACTOR || value > range.max * CRITICAL_HIGH_FACTOR {
        Severity::Critical
    } else {
        Severity::Warning
    };

    Ok(Measurement {
        value,
        unit: range.unit,
        status,
        reference: range,
    })
}
