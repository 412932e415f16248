//! Analyzer worker connecting the raw and classified buffers.
//!
//! Blocks on the raw buffer, feeds each sample through the detector (and an
//! optional band filter), and forwards every sample whose classification is
//! final. When the raw buffer signals empty-after-shutdown the detector is
//! finalized and the classified buffer shut down in turn, which unblocks
//! the persister's drain.

use std::sync::Arc;
use std::thread::{self, JoinHandle};

use tracing::info;

use crate::data::Sample;
use crate::detector::BeatDetector;
use crate::filter::EcgBandFilter;
use crate::ring_buffer::CircularBuffer;

pub struct Analyzer {
    raw: Arc<CircularBuffer<Sample>>,
    classified: Arc<CircularBuffer<Sample>>,
    detector: BeatDetector,
    prefilter: Option<EcgBandFilter>,
}

impl Analyzer {
    pub fn new(
        raw: Arc<CircularBuffer<Sample>>,
        classified: Arc<CircularBuffer<Sample>>,
        detector: BeatDetector,
    ) -> Self {
        Self {
            raw,
            classified,
            detector,
            prefilter: None,
        }
    }

    /// Filter the raw signal ahead of detection.
    pub fn with_prefilter(mut self, filter: EcgBandFilter) -> Self {
        self.prefilter = Some(filter);
        self
    }

    /// Spawn the analysis thread.
    pub fn spawn(self) -> JoinHandle<()> {
        thread::Builder::new()
            .name("analyzer".into())
            .spawn(move || self.run())
            .expect("failed to spawn analyzer thread")
    }

    fn run(mut self) {
        info!("analyzer started");

        let mut first = true;
        while let Some(mut sample) = self.raw.consume() {
            if let Some(filter) = &mut self.prefilter {
                if first {
                    filter.prime(sample.voltage);
                    first = false;
                }
                sample.voltage = filter.process(sample.voltage);
            }
            for classified in self.detector.push(sample) {
                self.classified.push(classified);
            }
        }

        // Raw buffer drained and shut down: flush the held window.
        for classified in self.detector.finish() {
            self.classified.push(classified);
        }
        self.classified.shutdown();

        info!(
            beats = self.detector.beats_detected(),
            "analyzer finished"
        );
    }
}
