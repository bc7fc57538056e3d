//! Test and helper doubles for assay_core.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Condvar, Mutex, PoisonError};
use std::time::{Duration, Instant};

use assay_traits::{Clock, Entropy};

/// Clock whose `sleep` returns immediately; collapses simulated latencies
/// so connect/detect tests finish instantly.
#[derive(Debug, Default, Clone, Copy)]
pub struct InstantClock;

impl Clock for InstantClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn sleep(&self, _d: Duration) {}
}

#[derive(Debug, Default)]
struct Gate {
    open: bool,
    sleepers: usize,
}

/// Clock whose `sleep` parks the caller until the gate is opened.
///
/// Makes in-flight-operation races deterministic: park a `connect` inside
/// its simulated latency, run the racing call, then `open()` the gate.
#[derive(Debug, Default)]
pub struct GateClock {
    gate: Mutex<Gate>,
    cv: Condvar,
}

impl GateClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Release every current and future sleeper.
    pub fn open(&self) {
        let mut g = self.gate.lock().unwrap_or_else(PoisonError::into_inner);
        g.open = true;
        self.cv.notify_all();
    }

    /// Re-arm the gate so later sleepers park again.
    pub fn close(&self) {
        let mut g = self.gate.lock().unwrap_or_else(PoisonError::into_inner);
        g.open = false;
    }

    /// Block until at least one thread is parked in `sleep`.
    pub fn wait_for_sleeper(&self) {
        let mut g = self.gate.lock().unwrap_or_else(PoisonError::into_inner);
        while g.sleepers == 0 && !g.open {
            g = self.cv.wait(g).unwrap_or_else(PoisonError::into_inner);
        }
    }
}

impl Clock for GateClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn sleep(&self, _d: Duration) {
        let mut g = self.gate.lock().unwrap_or_else(PoisonError::into_inner);
        if g.open {
            return;
        }
        g.sleepers += 1;
        self.cv.notify_all();
        while !g.open {
            g = self.cv.wait(g).unwrap_or_else(PoisonError::into_inner);
        }
        g.sleepers -= 1;
    }
}

/// Entropy source replaying a fixed unit-interval script, cycling when
/// exhausted. Lets a test steer exactly one draw (e.g. the connect failure
/// roll) while leaving the rest plausible.
pub struct ScriptedEntropy {
    script: Vec<f64>,
    cursor: AtomicUsize,
}

impl ScriptedEntropy {
    /// Values must lie in `[0, 1)`.
    pub fn new(script: impl Into<Vec<f64>>) -> Self {
        let script = script.into();
        assert!(!script.is_empty(), "script must be non-empty");
        Self {
            script,
            cursor: AtomicUsize::new(0),
        }
    }

    /// Every draw returns `v`.
    pub fn constant(v: f64) -> Self {
        Self::new([v])
    }
}

impl Entropy for ScriptedEntropy {
    fn next_unit(&self) -> f64 {
        let i = self.cursor.fetch_add(1, Ordering::Relaxed);
        self.script[i % self.script.len()]
    }
}
