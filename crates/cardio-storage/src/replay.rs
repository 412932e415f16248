//! File replay data source.
//!
//! Loads a previously recorded binary file into memory at construction and
//! serves one voltage per read. In loop mode playback wraps back to the
//! first sample; otherwise the source reports unavailable once exhausted.
//! Pacing is the sampler's job, the source never sleeps.

use std::fs;
use std::path::Path;

use tracing::info;

use cardio_core::{DataSource, VoltageRange};

use crate::error::{Result, StorageError};
use crate::record::{SampleRecord, RECORD_SIZE};

pub struct FileSource {
    voltages: Vec<f64>,
    index: usize,
    loop_playback: bool,
}

impl FileSource {
    /// Load every complete record from `path`, reconstructing voltages for
    /// `range`. A trailing partial record is ignored.
    pub fn load(path: &Path, range: VoltageRange, loop_playback: bool) -> Result<Self> {
        let bytes = fs::read(path).map_err(|source| StorageError::OpenFile {
            path: path.to_path_buf(),
            source,
        })?;

        let mut voltages = Vec::with_capacity(bytes.len() / RECORD_SIZE);
        for chunk in bytes.chunks_exact(RECORD_SIZE) {
            let mut record = [0u8; RECORD_SIZE];
            record.copy_from_slice(chunk);
            voltages.push(SampleRecord::decode(&record).voltage(range));
        }

        if voltages.is_empty() {
            return Err(StorageError::EmptyReplay {
                path: path.to_path_buf(),
            });
        }

        info!(
            samples = voltages.len(),
            path = %path.display(),
            loop_playback,
            "replay file loaded"
        );

        Ok(Self {
            voltages,
            index: 0,
            loop_playback,
        })
    }

    /// Number of samples loaded from the file.
    pub fn total_samples(&self) -> usize {
        self.voltages.len()
    }
}

impl DataSource for FileSource {
    fn read_voltage(&mut self) -> Option<f64> {
        if self.index >= self.voltages.len() {
            if !self.loop_playback {
                return None;
            }
            self.index = 0;
        }
        let voltage = self.voltages[self.index];
        self.index += 1;
        Some(voltage)
    }

    fn available(&self) -> bool {
        self.loop_playback || self.index < self.voltages.len()
    }
}
