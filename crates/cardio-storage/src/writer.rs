//! Persister worker.
//!
//! Drains the classified buffer into a binary/CSV file pair on a fixed wake
//! interval, in bounded non-blocking batches, flushing after every batch so
//! a crash loses at most one batch. On stop, everything still queued is
//! drained with blocking consumes before the files close, so no sample that
//! was handed to the persister is ever lost.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use chrono::Local;
use tracing::{error, info, warn};

use cardio_core::{AcquisitionConfig, CircularBuffer, Sample, VoltageRange};

use crate::error::{Result, StorageError};
use crate::record::{csv_line, SampleRecord, CSV_HEADER, RECORD_SIZE};

/// Samples consumed per wake at most.
const MAX_BATCH: usize = 100;

/// Writes every classified sample to the binary and text record files.
///
/// A stream that fails is reported once and closed; the writer keeps
/// serving the surviving stream. When both streams are gone, batches are
/// dropped with a warning so the upstream buffer cannot fill up.
pub struct RecordWriter {
    buffer: Arc<CircularBuffer<Sample>>,
    range: VoltageRange,
    interval: Duration,
    bin_path: PathBuf,
    csv_path: PathBuf,
    bin: Option<BufWriter<File>>,
    csv: Option<BufWriter<File>>,
    first_timestamp_us: Option<i64>,
    samples_written: u64,
    bytes_written: u64,
}

impl RecordWriter {
    /// Create the timestamped record file pair under the configured output
    /// directory, creating the directory if missing, and write the CSV
    /// header. Fatal on any failure.
    pub fn create(
        buffer: Arc<CircularBuffer<Sample>>,
        config: &AcquisitionConfig,
    ) -> Result<Self> {
        fs::create_dir_all(&config.output_dir).map_err(|source| StorageError::CreateDir {
            path: config.output_dir.clone(),
            source,
        })?;

        let stamp = Local::now().format("%Y%m%d_%H%M%S");
        let bin_path = config
            .output_dir
            .join(format!("{}_{}.bin", config.base_name, stamp));
        let csv_path = config
            .output_dir
            .join(format!("{}_{}.csv", config.base_name, stamp));

        let bin = File::create(&bin_path).map_err(|source| StorageError::OpenFile {
            path: bin_path.clone(),
            source,
        })?;
        let csv = File::create(&csv_path).map_err(|source| StorageError::OpenFile {
            path: csv_path.clone(),
            source,
        })?;

        let mut csv = BufWriter::new(csv);
        writeln!(csv, "{CSV_HEADER}")?;
        csv.flush()?;

        info!(
            bin = %bin_path.display(),
            csv = %csv_path.display(),
            "record files created"
        );

        Ok(Self {
            buffer,
            range: config.voltage_range,
            interval: config.write_interval,
            bin_path,
            csv_path,
            bin: Some(BufWriter::new(bin)),
            csv: Some(csv),
            first_timestamp_us: None,
            samples_written: 0,
            bytes_written: 0,
        })
    }

    pub fn bin_path(&self) -> &Path {
        &self.bin_path
    }

    pub fn csv_path(&self) -> &Path {
        &self.csv_path
    }

    /// Spawn the writer thread.
    pub fn spawn(self) -> PersistHandle {
        let stop = Arc::new(AtomicBool::new(false));
        let thread_stop = Arc::clone(&stop);
        let handle = thread::Builder::new()
            .name("persister".into())
            .spawn(move || self.run(thread_stop))
            .expect("failed to spawn persister thread");
        PersistHandle { stop, handle }
    }

    fn run(mut self, stop: Arc<AtomicBool>) {
        info!("persister started");

        let mut next = Instant::now() + self.interval;
        while !stop.load(Ordering::SeqCst) {
            let now = Instant::now();
            if next > now {
                thread::sleep(next - now);
            }
            self.write_batch();
            next += self.interval;
        }

        // Drain what is still queued; consume blocks until the analyzer has
        // shut the buffer down and it is empty.
        while let Some(sample) = self.buffer.consume() {
            self.write_sample(&sample);
        }
        self.flush();

        info!(
            samples = self.samples_written,
            bytes = self.bytes_written,
            "record files closed"
        );
    }

    fn write_batch(&mut self) {
        if self.bin.is_none() && self.csv.is_none() {
            let mut dropped = 0;
            while dropped < MAX_BATCH && self.buffer.try_consume().is_some() {
                dropped += 1;
            }
            if dropped > 0 {
                warn!(dropped, "both record streams failed, dropping samples");
            }
            return;
        }

        let mut count = 0;
        while count < MAX_BATCH {
            match self.buffer.try_consume() {
                Some(sample) => {
                    self.write_sample(&sample);
                    count += 1;
                }
                None => break,
            }
        }
        if count > 0 {
            self.flush();
        }
    }

    fn write_sample(&mut self, sample: &Sample) {
        let first = *self.first_timestamp_us.get_or_insert(sample.timestamp_us);

        if let Some(bin) = self.bin.as_mut() {
            let record = SampleRecord::from_sample(sample, self.range);
            match bin.write_all(&record.encode()) {
                Ok(()) => self.bytes_written += RECORD_SIZE as u64,
                Err(error) => {
                    error!(path = %self.bin_path.display(), %error, "binary write failed, closing stream");
                    self.bin = None;
                }
            }
        }

        if let Some(csv) = self.csv.as_mut() {
            let relative = sample.timestamp_us.saturating_sub(first).max(0) as u64;
            let line = csv_line(relative, sample.voltage, sample.wave);
            match csv.write_all(line.as_bytes()) {
                Ok(()) => self.bytes_written += line.len() as u64,
                Err(error) => {
                    error!(path = %self.csv_path.display(), %error, "CSV write failed, closing stream");
                    self.csv = None;
                }
            }
        }

        self.samples_written += 1;
    }

    fn flush(&mut self) {
        if let Some(bin) = self.bin.as_mut() {
            if let Err(error) = bin.flush() {
                error!(path = %self.bin_path.display(), %error, "binary flush failed, closing stream");
                self.bin = None;
            }
        }
        if let Some(csv) = self.csv.as_mut() {
            if let Err(error) = csv.flush() {
                error!(path = %self.csv_path.display(), %error, "CSV flush failed, closing stream");
                self.csv = None;
            }
        }
    }
}

/// Handle to a running persister thread.
pub struct PersistHandle {
    stop: Arc<AtomicBool>,
    handle: JoinHandle<()>,
}

impl PersistHandle {
    /// Stop the writer. Remaining queued samples are written before the
    /// files close; requires the classified buffer to have been shut down.
    pub fn stop(self) {
        self.stop.store(true, Ordering::SeqCst);
        if self.handle.join().is_err() {
            error!("persister thread panicked");
        }
    }
}
