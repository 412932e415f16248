//! Run coordinator.
//!
//! Sequences Start → Run → Drain: validates the data source, opens the
//! record files, starts the four workers, then polls until the sampler
//! finishes its duration or an external shutdown is requested. The drain is
//! ordered and lossless: join the sampler (which shuts the raw buffer),
//! join the analyzer (which drains and shuts the classified buffer), stop
//! the persister (which drains and closes the files), then hand the
//! finished files to a connected client before stopping the server.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{error, info};

use cardio_core::{
    AcquisitionConfig, Analyzer, BeatDetector, CardioError, CircularBuffer, DataSource,
    DetectorConfig, Sample, Sampler,
};
use cardio_server::TcpFileServer;
use cardio_storage::RecordWriter;

/// Poll interval of the coordinator's run loop.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

pub struct Application {
    config: AcquisitionConfig,
    source: Box<dyn DataSource>,
    server: Option<TcpFileServer>,
    shutdown: Arc<AtomicBool>,
}

impl Application {
    /// Assemble a run from an already-bound server (hardware deployments
    /// only) and an already-constructed data source.
    pub fn new(
        config: AcquisitionConfig,
        source: Box<dyn DataSource>,
        server: Option<TcpFileServer>,
        shutdown: Arc<AtomicBool>,
    ) -> Self {
        Self {
            config,
            source,
            server,
            shutdown,
        }
    }

    /// Execute one full acquisition run.
    pub fn run(mut self) -> Result<()> {
        if !self.source.available() {
            return Err(CardioError::SourceUnavailable.into());
        }

        let capacity = self.config.buffer_capacity();
        let raw = Arc::new(CircularBuffer::<Sample>::new(capacity));
        let classified = Arc::new(CircularBuffer::<Sample>::new(capacity));

        let writer = RecordWriter::create(Arc::clone(&classified), &self.config)
            .context("failed to create record files")?;

        info!(
            rate = self.config.sample_rate.hz(),
            duration_s = self.config.duration.as_secs(),
            capacity,
            "starting acquisition run"
        );

        if let Some(server) = self.server.as_mut() {
            server.run();
        }

        let running = Arc::new(AtomicBool::new(true));
        let sampler_handle = Sampler::new(
            self.source,
            Arc::clone(&raw),
            &self.config,
            Arc::clone(&running),
            Arc::clone(&self.shutdown),
        )
        .spawn();

        let detector = BeatDetector::new(DetectorConfig::from_config(&self.config));
        let analyzer_handle =
            Analyzer::new(Arc::clone(&raw), Arc::clone(&classified), detector).spawn();

        let persister = writer.spawn();

        while running.load(Ordering::SeqCst) && !self.shutdown.load(Ordering::SeqCst) {
            thread::sleep(POLL_INTERVAL);
        }

        if self.shutdown.load(Ordering::SeqCst) {
            info!("shutdown requested, draining pipeline");
        }

        if sampler_handle.join().is_err() {
            error!("sampler thread panicked");
        }
        if analyzer_handle.join().is_err() {
            error!("analyzer thread panicked");
        }
        persister.stop();

        if let Some(server) = self.server.as_mut() {
            server.send_available_files();
            server.stop();
        }

        info!("run complete");
        Ok(())
    }
}
