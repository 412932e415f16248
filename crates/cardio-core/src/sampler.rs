//! Deadline-driven acquisition worker.
//!
//! The sampler targets `t0 + n·period` for every sample index `n` rather
//! than `previous + period`, so transient oversleeps do not accumulate.
//! When the observed lag exceeds the resync threshold the index is
//! recomputed from the wall clock and the missed samples are dropped, never
//! back-filled.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::{info, warn};

use crate::config::AcquisitionConfig;
use crate::data::{monotonic_micros, Sample};
use crate::ring_buffer::CircularBuffer;
use crate::source::DataSource;

/// Lag beyond which the sampler resynchronizes its sample index.
const RESYNC_THRESHOLD: Duration = Duration::from_millis(10);

/// Minimum spacing between repeated warnings from the hot loop.
const WARN_INTERVAL: Duration = Duration::from_secs(1);

/// Once-per-interval gate for warnings emitted from the sampling loop.
struct WarnLimiter {
    last: Option<Instant>,
}

impl WarnLimiter {
    fn new() -> Self {
        Self { last: None }
    }

    fn ready(&mut self) -> bool {
        let now = Instant::now();
        match self.last {
            Some(last) if now.duration_since(last) < WARN_INTERVAL => false,
            _ => {
                self.last = Some(now);
                true
            }
        }
    }
}

/// Acquisition worker producing one sample per period.
///
/// Owns its data source for the lifetime of the run. On exit it flips the
/// shared `running` flag false and shuts down the raw buffer, which wakes
/// the analyzer into its drain path.
pub struct Sampler {
    source: Box<dyn DataSource>,
    buffer: Arc<CircularBuffer<Sample>>,
    period: Duration,
    duration: Duration,
    running: Arc<AtomicBool>,
    shutdown: Arc<AtomicBool>,
}

impl Sampler {
    pub fn new(
        source: Box<dyn DataSource>,
        buffer: Arc<CircularBuffer<Sample>>,
        config: &AcquisitionConfig,
        running: Arc<AtomicBool>,
        shutdown: Arc<AtomicBool>,
    ) -> Self {
        Self {
            source,
            buffer,
            period: config.sample_rate.period(),
            duration: config.duration,
            running,
            shutdown,
        }
    }

    /// Spawn the acquisition thread.
    pub fn spawn(self) -> JoinHandle<()> {
        thread::Builder::new()
            .name("sampler".into())
            .spawn(move || self.run())
            .expect("failed to spawn sampler thread")
    }

    fn run(mut self) {
        self.running.store(true, Ordering::SeqCst);
        info!(
            period_us = self.period.as_micros() as u64,
            duration_s = self.duration.as_secs(),
            "acquisition started"
        );

        let t0 = Instant::now();
        let end = t0 + self.duration;
        let period_ns = self.period.as_nanos() as u64;
        let mut index: u64 = 0;
        let mut pushed: u64 = 0;
        let mut resyncs: u64 = 0;
        let mut read_warn = WarnLimiter::new();
        let mut lag_warn = WarnLimiter::new();

        loop {
            if Instant::now() >= end || self.shutdown.load(Ordering::SeqCst) {
                break;
            }

            index += 1;
            let deadline = t0 + Duration::from_nanos(period_ns * index);
            let now = Instant::now();
            if deadline > now {
                thread::sleep(deadline - now);
            }

            if self.shutdown.load(Ordering::SeqCst) {
                break;
            }

            match self.source.read_voltage() {
                Some(voltage) => {
                    self.buffer.push(Sample::new(voltage, monotonic_micros()));
                    pushed += 1;
                }
                None => {
                    if read_warn.ready() {
                        warn!("voltage read failed, skipping sample");
                    }
                    continue;
                }
            }

            let lag = Instant::now().saturating_duration_since(deadline);
            if lag > RESYNC_THRESHOLD {
                if lag_warn.ready() {
                    warn!(
                        lag_us = lag.as_micros() as u64,
                        "sampling fell behind, resynchronizing"
                    );
                }
                index = Instant::now().duration_since(t0).as_nanos() as u64 / period_ns;
                resyncs += 1;
            }
        }

        self.running.store(false, Ordering::SeqCst);
        self.buffer.shutdown();
        info!(samples = pushed, resyncs, "acquisition finished");
    }
}
