//! The measurement session state machine.
//!
//! A [`Session`] owns one active device slot and one active cartridge
//! slot. All transitions commit under a single internal mutex; the handle
//! is cheaply clonable so a second logical caller (a UI cancel button, a
//! test) can issue `disconnect` while `connect` is still in flight. A
//! generation counter, bumped by every disconnect, discards stale
//! completions of in-flight operations instead of letting them win.
//!
//! Long operations (`connect`, `detect_cartridge`) block the calling
//! thread for a simulated latency drawn through the injected clock and
//! entropy seams; subscribers on other threads keep receiving unrelated
//! events meanwhile because emission never holds the state lock.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use assay_config::{Config, DeviceProfile};
use assay_traits::{Clock, Entropy, MonotonicClock, SystemEntropy};
use chrono::Utc;

use crate::cartridge::Cartridge;
use crate::classify::{Measurement, classify};
use crate::device::{Device, DeviceStatus};
use crate::error::{BuildError, Result, SessionError};
use crate::observers::{CallbackList, Subscription};
use crate::registry::DeviceRegistry;
use crate::sample::Sample;
use crate::stream::StreamHandle;

/// Where the session currently sits in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Scanning,
    Connecting,
    /// Device attached, no cartridge yet.
    Connected,
    CartridgeDetecting,
    /// Device and cartridge both attached; streaming may start.
    Ready,
    Streaming,
    /// A connect or detection attempt failed; retry or disconnect.
    Error,
}

struct Inner {
    phase: Phase,
    device: Option<Device>,
    cartridge: Option<Cartridge>,
    /// Bumped by every disconnect; in-flight operations compare their
    /// snapshot against it before committing.
    generation: u64,
    stream: Option<StreamHandle>,
}

impl Inner {
    /// Tear down the active session: cancel in-flight operations, detach
    /// the stream handle and device for the caller to finish outside the
    /// lock (join + broadcast must not run under it).
    fn begin_disconnect(&mut self) -> (Option<StreamHandle>, Option<Device>) {
        self.generation += 1;
        let stream = self.stream.take();
        let mut device = self.device.take();
        if let Some(d) = device.as_mut() {
            d.status = DeviceStatus::Disconnected;
        }
        self.cartridge = None;
        self.phase = Phase::Idle;
        (stream, device)
    }
}

struct Shared {
    state: Mutex<Inner>,
    connection_subs: CallbackList<Device>,
    data_subs: CallbackList<Sample>,
    error_subs: CallbackList<SessionError>,
    registry: DeviceRegistry,
    cfg: Config,
    clock: Arc<dyn Clock + Send + Sync>,
    entropy: Arc<dyn Entropy + Send + Sync>,
}

/// Clonable handle to one measurement session.
#[derive(Clone)]
pub struct Session {
    shared: Arc<Shared>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let st = self.state();
        f.debug_struct("Session")
            .field("phase", &st.phase)
            .field("device", &st.device.as_ref().map(|d| d.id.as_str()))
            .field("cartridge", &st.cartridge.as_ref().map(|c| c.id.as_str()))
            .finish()
    }
}

impl Session {
    /// Start building a session.
    pub fn builder() -> SessionBuilder {
        SessionBuilder::default()
    }

    fn state(&self) -> MutexGuard<'_, Inner> {
        self.shared
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn err<T>(e: SessionError) -> Result<T> {
        Err(eyre::Report::new(e))
    }

    /// Simulated discovery pass over the registry catalog.
    ///
    /// Never touches the device/cartridge slots; an active session is
    /// unaffected by a concurrent scan.
    pub fn scan_for_devices(&self, timeout: Duration) -> Result<Vec<Device>> {
        let was_idle = {
            let mut st = self.state();
            let idle = st.phase == Phase::Idle;
            if idle {
                st.phase = Phase::Scanning;
            }
            idle
        };

        let result = self.shared.registry.scan(timeout);

        {
            let mut st = self.state();
            // Another caller may have moved the phase on; only restore our
            // own transient marker.
            if was_idle && st.phase == Phase::Scanning {
                st.phase = Phase::Idle;
            }
        }

        match result {
            Ok(devices) => Ok(devices),
            Err(err) => {
                self.shared.error_subs.emit(&err);
                Self::err(err)
            }
        }
    }

    /// Connect to a discovered device.
    ///
    /// Valid from `Idle`, `Error`, or while connected to a *different*
    /// device (the old one is disconnected first, with broadcast).
    /// Simulates connection latency and fails with
    /// [`SessionError::Connection`] at the configured probability; the
    /// failure is broadcast to error subscribers as well as returned.
    /// A `disconnect` issued mid-flight discards the stale outcome and the
    /// caller gets [`SessionError::Canceled`].
    pub fn connect(&self, device_id: &str) -> Result<Device> {
        let Some(profile) = self.shared.registry.find(device_id).cloned() else {
            let err = SessionError::Connection(format!("unknown device '{device_id}'"));
            tracing::warn!(device = %device_id, "connect rejected: not in catalog");
            self.shared.error_subs.emit(&err);
            return Self::err(err);
        };

        let (generation, old_stream, old_device) = {
            let mut st = self.state();
            if matches!(st.phase, Phase::Connecting | Phase::CartridgeDetecting) {
                return Self::err(SessionError::Precondition(
                    "another operation is in flight",
                ));
            }
            if let Some(d) = &st.device {
                if d.id == device_id && d.is_connected() {
                    return Self::err(SessionError::Precondition(
                        "already connected to this device",
                    ));
                }
            }
            // Switching readers tears the old session down first.
            let (old_stream, old_device) = if st.device.is_some() {
                st.begin_disconnect()
            } else {
                (None, None)
            };
            st.phase = Phase::Connecting;
            (st.generation, old_stream, old_device)
        };
        if let Some(stream) = old_stream {
            stream.stop();
        }
        if let Some(d) = &old_device {
            tracing::info!(device = %d.id, "device disconnected (switching readers)");
            self.shared.connection_subs.emit(d);
        }

        let cfg = self.shared.cfg.connect;
        let latency_ms = self
            .shared
            .entropy
            .uniform_u64(cfg.min_latency_ms, cfg.max_latency_ms);
        tracing::debug!(device = %device_id, latency_ms, "connecting");
        self.shared.clock.sleep(Duration::from_millis(latency_ms));
        let failed = self.shared.entropy.chance(cfg.failure_probability);

        let mut st = self.state();
        if st.generation != generation {
            tracing::debug!(device = %device_id, "stale connect outcome discarded");
            return Self::err(SessionError::Canceled);
        }
        if failed {
            // Never leave a half-populated slot behind a failure.
            st.device = None;
            st.phase = Phase::Error;
            drop(st);
            let err = SessionError::Connection("connection attempt failed, retry".into());
            tracing::warn!(device = %device_id, "connect failed (simulated)");
            self.shared.error_subs.emit(&err);
            return Self::err(err);
        }

        let mut device = self.shared.registry.materialize(&profile);
        device.status = DeviceStatus::Connected;
        device.last_sync = Some(Utc::now());
        st.device = Some(device.clone());
        st.phase = if st.cartridge.is_some() {
            Phase::Ready
        } else {
            Phase::Connected
        };
        drop(st);

        tracing::info!(device = %device.id, name = %device.name, "device connected");
        self.shared.connection_subs.emit(&device);
        Ok(device)
    }

    /// Wait for a cartridge insertion on the connected device.
    ///
    /// Mints a fresh cartridge after a simulated detection latency
    /// (clamped to `timeout`). An already-inserted cartridge is replaced
    /// and its remaining uses discarded.
    pub fn detect_cartridge(&self, timeout: Duration) -> Result<Cartridge> {
        let generation = {
            let mut st = self.state();
            if matches!(st.phase, Phase::Connecting | Phase::CartridgeDetecting) {
                return Self::err(SessionError::Precondition(
                    "another operation is in flight",
                ));
            }
            if st.stream.is_some() {
                return Self::err(SessionError::Precondition(
                    "stop the stream before swapping cartridges",
                ));
            }
            if !st.device.as_ref().is_some_and(Device::is_connected) {
                return Self::err(SessionError::Precondition("connected device required"));
            }
            st.phase = Phase::CartridgeDetecting;
            st.generation
        };

        let cfg = self.shared.cfg.detect;
        let latency_ms = self
            .shared
            .entropy
            .uniform_u64(cfg.min_latency_ms, cfg.max_latency_ms)
            .min(timeout.as_millis() as u64);
        tracing::debug!(latency_ms, "cartridge detection started");
        self.shared.clock.sleep(Duration::from_millis(latency_ms));
        let failed = self.shared.entropy.chance(cfg.failure_probability);

        let mut st = self.state();
        if st.generation != generation {
            tracing::debug!("stale cartridge detection discarded");
            return Self::err(SessionError::Canceled);
        }
        if failed {
            // Device stays attached; a retry is immediately valid.
            st.phase = Phase::Error;
            drop(st);
            let err = SessionError::Connection("cartridge detection failed".into());
            tracing::warn!("cartridge detection failed (simulated)");
            self.shared.error_subs.emit(&err);
            return Self::err(err);
        }

        let cartridge = Cartridge::mint(self.shared.entropy.as_ref(), Utc::now());
        if let Some(old) = &st.cartridge {
            tracing::info!(old = %old.id, new = %cartridge.id, "replacing inserted cartridge");
        }
        st.cartridge = Some(cartridge.clone());
        st.phase = Phase::Ready;
        drop(st);

        tracing::info!(cartridge = %cartridge.id, kind = ?cartridge.kind, "cartridge detected");
        Ok(cartridge)
    }

    /// Start emitting samples at the configured default interval.
    pub fn start_stream(&self) -> Result<()> {
        self.start_stream_with_interval(Duration::from_millis(self.shared.cfg.stream.interval_ms))
    }

    /// Start emitting one sample per `interval` to all data subscribers.
    ///
    /// Requires a connected device and a non-depleted cartridge; consumes
    /// one cartridge use. Calling while already streaming is a no-op `Ok`
    /// — a second emitter is never spawned.
    pub fn start_stream_with_interval(&self, interval: Duration) -> Result<()> {
        if interval.is_zero() {
            return Self::err(SessionError::Precondition("stream interval must be non-zero"));
        }

        let mut st = self.state();
        if st.stream.is_some() {
            tracing::debug!("stream already running; start ignored");
            return Ok(());
        }
        if !st.device.as_ref().is_some_and(Device::is_connected) {
            return Self::err(SessionError::Precondition(
                "device and cartridge both required",
            ));
        }
        match st.cartridge.as_mut() {
            None => {
                return Self::err(SessionError::Precondition(
                    "device and cartridge both required",
                ));
            }
            Some(c) if c.is_depleted() => return Self::err(SessionError::CartridgeDepleted),
            Some(c) => c.uses_remaining -= 1,
        }

        st.stream = Some(StreamHandle::spawn(
            interval,
            self.shared.clock.clone(),
            self.shared.entropy.clone(),
            self.shared.data_subs.clone(),
        ));
        st.phase = Phase::Streaming;
        tracing::info!(interval_ms = interval.as_millis() as u64, "sensor stream started");
        Ok(())
    }

    /// Cancel the periodic emission. No sample is delivered after this
    /// returns. No-op when not streaming; safe to call repeatedly.
    pub fn stop_stream(&self) {
        let handle = {
            let mut st = self.state();
            let handle = st.stream.take();
            if handle.is_some() && st.phase == Phase::Streaming {
                st.phase = Phase::Ready;
            }
            handle
        };
        if let Some(handle) = handle {
            handle.stop();
            tracing::info!("sensor stream stopped");
        }
    }

    /// Stop any stream, clear both slots, and return to `Idle`.
    ///
    /// Always bumps the generation counter, so an in-flight `connect` or
    /// `detect_cartridge` resolves as [`SessionError::Canceled`] instead
    /// of resurrecting the session. Safe to call when nothing is
    /// connected.
    pub fn disconnect(&self) {
        let (stream, device) = {
            let mut st = self.state();
            st.begin_disconnect()
        };
        if let Some(handle) = stream {
            handle.stop();
        }
        if let Some(device) = device {
            tracing::info!(device = %device.id, "device disconnected");
            self.shared.connection_subs.emit(&device);
        }
    }

    /// Reduce a collected batch against the inserted cartridge's
    /// reference range.
    pub fn calculate_result(&self, samples: &[Sample]) -> Result<Measurement> {
        let kind = {
            let st = self.state();
            match &st.cartridge {
                Some(c) => c.kind,
                None => return Self::err(SessionError::NoCartridge),
            }
        };
        classify(samples, kind.reference())
    }

    /// Register a connection-event callback (connects and disconnects).
    pub fn on_connection(&self, cb: impl Fn(&Device) + Send + Sync + 'static) -> Subscription {
        self.shared.connection_subs.subscribe(cb)
    }

    /// Register a per-sample data callback.
    pub fn on_data(&self, cb: impl Fn(&Sample) + Send + Sync + 'static) -> Subscription {
        self.shared.data_subs.subscribe(cb)
    }

    /// Register an error callback (recoverable failures only).
    pub fn on_error(&self, cb: impl Fn(&SessionError) + Send + Sync + 'static) -> Subscription {
        self.shared.error_subs.subscribe(cb)
    }

    pub fn connected_device(&self) -> Option<Device> {
        self.state().device.clone()
    }

    pub fn inserted_cartridge(&self) -> Option<Cartridge> {
        self.state().cartridge.clone()
    }

    pub fn is_connected(&self) -> bool {
        self.state()
            .device
            .as_ref()
            .is_some_and(Device::is_connected)
    }

    pub fn is_streaming(&self) -> bool {
        self.state().stream.is_some()
    }

    pub fn phase(&self) -> Phase {
        self.state().phase
    }
}

/// Builder for [`Session`]. All fields are optional; `build()` validates
/// the config and falls back to the real clock and an OS-seeded entropy
/// source.
#[derive(Default)]
pub struct SessionBuilder {
    config: Option<Config>,
    catalog: Option<Vec<DeviceProfile>>,
    clock: Option<Arc<dyn Clock + Send + Sync>>,
    entropy: Option<Arc<dyn Entropy + Send + Sync>>,
}

impl SessionBuilder {
    pub fn with_config(mut self, config: Config) -> Self {
        self.config = Some(config);
        self
    }

    /// Override the discoverable catalog. An empty list reverts to the
    /// built-in profiles.
    pub fn with_catalog(mut self, catalog: Vec<DeviceProfile>) -> Self {
        self.catalog = Some(catalog);
        self
    }

    /// Provide a custom clock; defaults to `MonotonicClock`.
    pub fn with_clock(mut self, clock: Arc<dyn Clock + Send + Sync>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Provide a custom entropy source; defaults to OS-seeded entropy.
    pub fn with_entropy(mut self, entropy: Arc<dyn Entropy + Send + Sync>) -> Self {
        self.entropy = Some(entropy);
        self
    }

    pub fn build(self) -> Result<Session> {
        let mut config = self.config.unwrap_or_default();
        if let Some(catalog) = self.catalog {
            config.catalog = catalog;
        }
        if let Err(e) = config.validate() {
            return Err(eyre::Report::new(BuildError::InvalidConfig(e.to_string())));
        }
        let catalog = config.effective_catalog();

        let clock: Arc<dyn Clock + Send + Sync> = self
            .clock
            .unwrap_or_else(|| Arc::new(MonotonicClock::new()));
        let entropy: Arc<dyn Entropy + Send + Sync> = self
            .entropy
            .unwrap_or_else(|| Arc::new(SystemEntropy::new()));

        let registry = DeviceRegistry::new(catalog, config.scan, clock.clone(), entropy.clone());

        Ok(Session {
            shared: Arc::new(Shared {
                state: Mutex::new(Inner {
                    phase: Phase::Idle,
                    device: None,
                    cartridge: None,
                    generation: 0,
                    stream: None,
                }),
                connection_subs: CallbackList::new(),
                data_subs: CallbackList::new(),
                error_subs: CallbackList::new(),
                registry,
                cfg: config,
                clock,
                entropy,
            }),
        })
    }
}
