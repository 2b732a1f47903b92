//! Background sensor sampling.
//!
//! Spawns a thread that owns the `Sensor`, keeps only the newest reading in a
//! one-slot channel, and tracks the last-ok timestamp for stall detection. The
//! `Sampler` itself implements `Sensor`, so a `ScaleReader` or a calibration
//! capture can consume it unchanged.
//!
//! Each `Sampler` owns exactly one thread, shut down and joined on drop.
use crossbeam_channel as xch;
use scale_traits::{BoxError, Clock, Sensor};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{Duration, Instant};

use crate::error::{ScaleError, SensorFault};

pub struct Sampler {
    rx: xch::Receiver<i32>,
    last_ok: Arc<AtomicU64>,
    epoch: Instant,
    shutdown: Arc<AtomicBool>,
    join_handle: Option<std::thread::JoinHandle<()>>,
}

impl Sampler {
    /// Paced sampler: one read every `period`.
    pub fn spawn<S, C>(sensor: S, period: Duration, timeout: Duration, clock: C) -> Self
    where
        S: Sensor + Send + 'static,
        C: Clock + Send + Sync + 'static,
    {
        Self::start(sensor, Some(period), timeout, clock)
    }

    /// Event-driven sampler: the sensor's own blocking read sets the pace.
    pub fn spawn_event<S, C>(sensor: S, timeout: Duration, clock: C) -> Self
    where
        S: Sensor + Send + 'static,
        C: Clock + Send + Sync + 'static,
    {
        Self::start(sensor, None, timeout, clock)
    }

    fn start<S, C>(mut sensor: S, period: Option<Duration>, timeout: Duration, clock: C) -> Self
    where
        S: Sensor + Send + 'static,
        C: Clock + Send + Sync + 'static,
    {
        let (tx, rx) = xch::bounded(1);
        let stale = rx.clone();
        let shutdown = Arc::new(AtomicBool::new(false));
        let shutdown_clone = shutdown.clone();
        let last_ok = Arc::new(AtomicU64::new(0));
        let last_ok_clone = last_ok.clone();
        let epoch = clock.now();

        let join_handle = std::thread::spawn(move || {
            let mut failures: u64 = 0;
            loop {
                if shutdown_clone.load(Ordering::Relaxed) {
                    tracing::debug!("sampler thread received shutdown signal");
                    break;
                }

                match sensor.read(timeout) {
                    Ok(v) => {
                        // Evict an unread older value so the slot holds the newest.
                        while stale.try_recv().is_ok() {}
                        // The thread holds a receiver too, so the send never sees a
                        // disconnect; shutdown comes through the flag.
                        if tx.try_send(v).is_ok() {
                            last_ok_clone.store(clock.ms_since(epoch), Ordering::Relaxed);
                        }
                    }
                    Err(e) => {
                        failures += 1;
                        tracing::debug!(failures, error = %e, "sampler read failed");
                    }
                }

                if shutdown_clone.load(Ordering::Relaxed) {
                    break;
                }
                if let Some(p) = period {
                    clock.sleep(p);
                }
            }
            tracing::trace!("sampler thread exiting cleanly");
        });

        Self {
            rx,
            last_ok,
            epoch,
            shutdown,
            join_handle: Some(join_handle),
        }
    }

    /// Most recent sample, if one arrived since the last call.
    pub fn latest(&self) -> Option<i32> {
        self.rx.try_iter().last()
    }

    /// Milliseconds since the last good sample, relative to the sampler epoch.
    pub fn stalled_for(&self, now_ms: u64) -> u64 {
        now_ms.saturating_sub(self.last_ok.load(Ordering::Relaxed))
    }

    /// Stall time measured against the real monotonic clock.
    pub fn stalled_for_now(&self) -> u64 {
        let dur = Instant::now().saturating_duration_since(self.epoch);
        let now_ms = u64::try_from(dur.as_millis()).unwrap_or(u64::MAX);
        now_ms.saturating_sub(self.last_ok.load(Ordering::Relaxed))
    }
}

impl Sensor for Sampler {
    /// Wait up to `timeout` for a sample from the background thread.
    ///
    /// A waiting sample is at most one read period old.
    fn read(&mut self, timeout: Duration) -> Result<i32, BoxError> {
        match self.rx.recv_timeout(timeout) {
            Ok(v) => Ok(v),
            Err(xch::RecvTimeoutError::Timeout) => {
                Err(Box::new(ScaleError::SampleUnavailable(SensorFault::Timeout)))
            }
            Err(xch::RecvTimeoutError::Disconnected) => Err(Box::new(
                ScaleError::SampleUnavailable(SensorFault::Other("sampler stopped".into())),
            )),
        }
    }
}

impl Drop for Sampler {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::Relaxed);

        // The thread exits at its next flag check, at worst after one sensor timeout.
        if let Some(handle) = self.join_handle.take() {
            match handle.join() {
                Ok(()) => tracing::trace!("sampler thread joined"),
                Err(e) => tracing::warn!(?e, "sampler thread panicked during shutdown"),
            }
        }
    }
}
