//! In-memory catalog of discoverable readers.
//!
//! Discovery is simulated: a bounded random latency followed by one
//! freshly randomized [`Device`] per catalog profile. The latency and the
//! optional failure injection both go through the injected clock/entropy
//! seams, so tests run it deterministically and instantly.

use std::sync::Arc;
use std::time::Duration;

use assay_config::{DeviceProfile, ScanCfg};
use assay_traits::{Clock, Entropy};

use crate::device::{Device, DeviceStatus};
use crate::error::SessionError;

pub struct DeviceRegistry {
    catalog: Vec<DeviceProfile>,
    cfg: ScanCfg,
    clock: Arc<dyn Clock + Send + Sync>,
    entropy: Arc<dyn Entropy + Send + Sync>,
}

impl DeviceRegistry {
    pub fn new(
        catalog: Vec<DeviceProfile>,
        cfg: ScanCfg,
        clock: Arc<dyn Clock + Send + Sync>,
        entropy: Arc<dyn Entropy + Send + Sync>,
    ) -> Self {
        Self {
            catalog,
            cfg,
            clock,
            entropy,
        }
    }

    /// Simulated discovery pass.
    ///
    /// Sleeps a uniform draw from the configured latency window (clamped
    /// to `timeout`), then reports every catalog profile as a
    /// `Disconnected` device with re-randomized battery/signal. No side
    /// effects; repeated scans re-randomize.
    pub fn scan(&self, timeout: Duration) -> Result<Vec<Device>, SessionError> {
        let latency_ms = self
            .entropy
            .uniform_u64(self.cfg.min_latency_ms, self.cfg.max_latency_ms)
            .min(timeout.as_millis() as u64);
        tracing::debug!(latency_ms, "device scan started");
        self.clock.sleep(Duration::from_millis(latency_ms));

        if self.entropy.chance(self.cfg.failure_probability) {
            tracing::warn!("device scan failed (injected)");
            return Err(SessionError::Connection("device scan failed".into()));
        }

        let devices: Vec<Device> = self.catalog.iter().map(|p| self.materialize(p)).collect();
        tracing::info!(count = devices.len(), "device scan finished");
        Ok(devices)
    }

    /// Catalog lookup backing `connect`; unknown ids are rejected there.
    pub fn find(&self, device_id: &str) -> Option<&DeviceProfile> {
        self.catalog.iter().find(|p| p.id == device_id)
    }

    /// Instantiate a profile with fresh battery/signal draws.
    pub(crate) fn materialize(&self, profile: &DeviceProfile) -> Device {
        let battery = self
            .entropy
            .uniform_u64(u64::from(profile.battery_min), u64::from(profile.battery_max))
            as u8;
        let signal = self
            .entropy
            .uniform_u64(u64::from(profile.signal_min), u64::from(profile.signal_max))
            as u8;
        Device {
            id: profile.id.clone(),
            name: profile.name.clone(),
            serial: profile.serial.clone(),
            firmware: profile.firmware.clone(),
            medium: profile.medium.into(),
            battery,
            signal,
            status: DeviceStatus::Disconnected,
            last_sync: None,
        }
    }
}
