//! Background sample emitter.
//!
//! Spawns a thread that synthesizes one [`Sample`] per interval and fans
//! it out to the data subscribers. The thread shuts down via an atomic
//! flag checked before and after each paced sleep, and is joined on
//! `stop`/`Drop` — after either returns, no further emission can occur.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use assay_traits::{Clock, Entropy};
use chrono::Utc;

use crate::observers::CallbackList;
use crate::sample::{Sample, synthesize};

pub(crate) struct StreamHandle {
    shutdown: Arc<AtomicBool>,
    join_handle: Option<std::thread::JoinHandle<()>>,
}

impl StreamHandle {
    pub(crate) fn spawn(
        interval: Duration,
        clock: Arc<dyn Clock + Send + Sync>,
        entropy: Arc<dyn Entropy + Send + Sync>,
        subscribers: CallbackList<Sample>,
    ) -> Self {
        let shutdown = Arc::new(AtomicBool::new(false));
        let shutdown_flag = shutdown.clone();

        let join_handle = std::thread::spawn(move || {
            let mut step: u64 = 0;
            loop {
                if shutdown_flag.load(Ordering::Relaxed) {
                    tracing::debug!("stream thread received shutdown signal");
                    break;
                }

                let sample = synthesize(step, Utc::now().timestamp_millis(), entropy.as_ref());
                subscribers.emit(&sample);
                step = step.saturating_add(1);

                // Check shutdown before sleep to avoid unnecessary delay
                if shutdown_flag.load(Ordering::Relaxed) {
                    break;
                }
                clock.sleep(interval);
            }
            tracing::trace!(steps = step, "stream thread exiting cleanly");
        });

        Self {
            shutdown,
            join_handle: Some(join_handle),
        }
    }

    /// Signal shutdown and join. Blocks at most one interval.
    pub(crate) fn stop(mut self) {
        self.shutdown_and_join();
    }

    fn shutdown_and_join(&mut self) {
        self.shutdown.store(true, Ordering::Relaxed);
        if let Some(handle) = self.join_handle.take() {
            match handle.join() {
                Ok(()) => {
                    tracing::trace!("stream thread joined successfully");
                }
                Err(e) => {
                    // Thread panicked; log but don't propagate (we may be in Drop)
                    tracing::warn!(?e, "stream thread panicked during shutdown");
                }
            }
        }
    }
}

impl Drop for StreamHandle {
    fn drop(&mut self) {
        self.shutdown_and_join();
    }
}
