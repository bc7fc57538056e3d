#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Config schemas for the reader session manager.
//!
//! - `Config` and sub-structs are deserialized from TOML and validated.
//! - Latency windows and failure probabilities drive the hardware
//!   simulation; the catalog lists the reader profiles discovery returns.
use serde::Deserialize;

/// Latency window and failure injection for device discovery.
#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(default)]
pub struct ScanCfg {
    /// Lower bound of the simulated discovery latency (ms)
    pub min_latency_ms: u64,
    /// Upper bound of the simulated discovery latency (ms)
    pub max_latency_ms: u64,
    /// Probability a scan fails outright. 0 disables; testing hook only.
    pub failure_probability: f64,
}

impl Default for ScanCfg {
    fn default() -> Self {
        Self {
            min_latency_ms: 2000,
            max_latency_ms: 3000,
            failure_probability: 0.0,
        }
    }
}

/// Latency window and failure probability for device connection.
#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(default)]
pub struct ConnectCfg {
    pub min_latency_ms: u64,
    pub max_latency_ms: u64,
    /// Probability a connection attempt fails after the latency elapses.
    pub failure_probability: f64,
}

impl Default for ConnectCfg {
    fn default() -> Self {
        Self {
            min_latency_ms: 2000,
            max_latency_ms: 3500,
            failure_probability: 0.10,
        }
    }
}

/// Latency window and failure probability for cartridge detection.
#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(default)]
pub struct DetectCfg {
    pub min_latency_ms: u64,
    pub max_latency_ms: u64,
    /// Probability detection fails. 0 matches the reference behavior.
    pub failure_probability: f64,
}

impl Default for DetectCfg {
    fn default() -> Self {
        Self {
            min_latency_ms: 1500,
            max_latency_ms: 2500,
            failure_probability: 0.0,
        }
    }
}

/// Sample stream pacing.
#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(default)]
pub struct StreamCfg {
    /// Default emission interval when the caller does not supply one (ms)
    pub interval_ms: u64,
}

impl Default for StreamCfg {
    fn default() -> Self {
        Self { interval_ms: 200 }
    }
}

/// Connection medium a reader advertises.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MediumCfg {
    Ble,
    Nfc,
}

/// One discoverable reader profile. Battery and signal are drawn uniformly
/// from the inclusive bounds on every scan, so repeated scans re-randomize.
#[derive(Debug, Deserialize, Clone)]
pub struct DeviceProfile {
    pub id: String,
    pub name: String,
    pub serial: String,
    pub firmware: String,
    #[serde(default = "default_medium")]
    pub medium: MediumCfg,
    #[serde(default = "default_battery_min")]
    pub battery_min: u8,
    #[serde(default = "default_battery_max")]
    pub battery_max: u8,
    #[serde(default = "default_signal_min")]
    pub signal_min: u8,
    #[serde(default = "default_signal_max")]
    pub signal_max: u8,
}

fn default_medium() -> MediumCfg {
    MediumCfg::Ble
}
fn default_battery_min() -> u8 {
    40
}
fn default_battery_max() -> u8 {
    100
}
fn default_signal_min() -> u8 {
    60
}
fn default_signal_max() -> u8 {
    100
}

/// Two-reader catalog used when no `[[catalog]]` entries are configured.
pub fn default_catalog() -> Vec<DeviceProfile> {
    vec![
        DeviceProfile {
            id: "asy-001".into(),
            name: "Reader-Alpha".into(),
            serial: "ASY-2026-A001".into(),
            firmware: "v2.3.1".into(),
            medium: MediumCfg::Ble,
            battery_min: 85,
            battery_max: 100,
            signal_min: 80,
            signal_max: 100,
        },
        DeviceProfile {
            id: "asy-002".into(),
            name: "Reader-Beta".into(),
            serial: "ASY-2026-B002".into(),
            firmware: "v2.3.0".into(),
            medium: MediumCfg::Ble,
            battery_min: 40,
            battery_max: 60,
            signal_min: 60,
            signal_max: 80,
        },
    ]
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub scan: ScanCfg,
    pub connect: ConnectCfg,
    pub detect: DetectCfg,
    pub stream: StreamCfg,
    /// Discoverable readers; empty means "use the built-in catalog".
    pub catalog: Vec<DeviceProfile>,
}

pub fn load_toml(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(s)
}

fn check_window(name: &str, min: u64, max: u64) -> eyre::Result<()> {
    if min > max {
        eyre::bail!("{name}: min_latency_ms must be <= max_latency_ms");
    }
    if max > 60_000 {
        eyre::bail!("{name}: max_latency_ms is unreasonably large (>60s)");
    }
    Ok(())
}

fn check_probability(name: &str, p: f64) -> eyre::Result<()> {
    if !p.is_finite() || !(0.0..=1.0).contains(&p) {
        eyre::bail!("{name}: failure_probability must be in [0.0, 1.0]");
    }
    Ok(())
}

impl Config {
    pub fn validate(&self) -> eyre::Result<()> {
        check_window("scan", self.scan.min_latency_ms, self.scan.max_latency_ms)?;
        check_window(
            "connect",
            self.connect.min_latency_ms,
            self.connect.max_latency_ms,
        )?;
        check_window(
            "detect",
            self.detect.min_latency_ms,
            self.detect.max_latency_ms,
        )?;
        check_probability("scan", self.scan.failure_probability)?;
        check_probability("connect", self.connect.failure_probability)?;
        check_probability("detect", self.detect.failure_probability)?;

        if self.stream.interval_ms == 0 {
            eyre::bail!("stream.interval_ms must be >= 1");
        }
        if self.stream.interval_ms > 60_000 {
            eyre::bail!("stream.interval_ms is unreasonably large (>60s)");
        }

        let mut seen = std::collections::HashSet::new();
        for p in &self.catalog {
            if p.id.is_empty() {
                eyre::bail!("catalog: device id must be non-empty");
            }
            if !seen.insert(p.id.as_str()) {
                eyre::bail!("catalog: duplicate device id '{}'", p.id);
            }
            if p.battery_min > p.battery_max || p.battery_max > 100 {
                eyre::bail!("catalog '{}': battery bounds must satisfy min <= max <= 100", p.id);
            }
            if p.signal_min > p.signal_max || p.signal_max > 100 {
                eyre::bail!("catalog '{}': signal bounds must satisfy min <= max <= 100", p.id);
            }
        }
        Ok(())
    }

    /// Catalog with the built-in profiles substituted when none were given.
    pub fn effective_catalog(&self) -> Vec<DeviceProfile> {
        if self.catalog.is_empty() {
            default_catalog()
        } else {
            self.catalog.clone()
        }
    }
}
