//! Reader device identity and connection state.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Connection medium a reader advertises.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Medium {
    /// Short-range wireless link.
    Ble,
    /// Proximity tag read.
    Nfc,
}

impl From<assay_config::MediumCfg> for Medium {
    fn from(m: assay_config::MediumCfg) -> Self {
        match m {
            assay_config::MediumCfg::Ble => Medium::Ble,
            assay_config::MediumCfg::Nfc => Medium::Nfc,
        }
    }
}

/// Device lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceStatus {
    Disconnected,
    Connecting,
    Connected,
    Error,
}

/// A measurement reader as seen by the session.
///
/// Battery and signal are percentages (0–100) re-randomized on every scan.
/// `last_sync` stays `None` until the device has completed a connect in
/// this process.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Device {
    pub id: String,
    pub name: String,
    pub serial: String,
    pub firmware: String,
    pub medium: Medium,
    pub battery: u8,
    pub signal: u8,
    pub status: DeviceStatus,
    pub last_sync: Option<DateTime<Utc>>,
}

impl Device {
    /// True when the device is usable for cartridge detection and streaming.
    #[inline]
    pub fn is_connected(&self) -> bool {
        self.status == DeviceStatus::Connected
    }
}
