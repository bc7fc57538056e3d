#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Measurement device session manager (hardware simulated).
//!
//! This crate owns the one structured subsystem of the product: the
//! session that discovers a reader, connects to it, detects an inserted
//! test cartridge, streams synthetic sensor samples, and reduces them into
//! a classified measurement.
//!
//! ## Architecture
//!
//! - **Registry**: in-memory catalog answering scan queries (`registry`)
//! - **Session**: the connect → detect → stream → result state machine
//!   with connection/data/error fan-out (`session`, `stream`, `observers`)
//! - **Generator**: synthetic waveform stand-in for ADC ingestion
//!   (`sample`)
//! - **Classifier**: batch average against per-analyte reference ranges
//!   (`classify`, `reference`)
//!
//! ## Simulation seams
//!
//! Every latency, failure roll, and random attribute goes through the
//! `assay_traits::Clock` / `assay_traits::Entropy` abstractions, so tests
//! inject an instant clock and scripted draws instead of depending on real
//! timing or randomness.

// Module declarations
pub mod cartridge;
pub mod classify;
pub mod device;
pub mod error;
pub mod mocks;
pub mod observers;
pub mod reference;
pub mod registry;
pub mod sample;
pub mod session;
pub mod util;

mod stream;

pub use cartridge::{Analyte, Cartridge};
pub use classify::{Measurement, Severity, classify};
pub use device::{Device, DeviceStatus, Medium};
pub use error::{BuildError, SessionError};
pub use observers::Subscription;
pub use reference::ReferenceRange;
pub use registry::DeviceRegistry;
pub use sample::{Sample, synthesize};
pub use session::{Phase, Session, SessionBuilder};
