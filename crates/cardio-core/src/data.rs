//! Sample data model shared across the pipeline.

use std::sync::OnceLock;
use std::time::Instant;

/// PQRST classification carried by every sample.
///
/// A sample starts as [`WaveType::Normal`] and is reclassified at most once
/// by the analyzer. The R peak dominates: where wave positions collide, an
/// R assignment replaces any other tag, while the other waves only ever
/// claim still-unclassified samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WaveType {
    #[default]
    Normal,
    P,
    Q,
    R,
    S,
    T,
}

impl WaveType {
    /// Single-character tag used by the text record format.
    pub fn tag(self) -> char {
        match self {
            WaveType::Normal => 'N',
            WaveType::P => 'P',
            WaveType::Q => 'Q',
            WaveType::R => 'R',
            WaveType::S => 'S',
            WaveType::T => 'T',
        }
    }

    /// Inverse of [`WaveType::tag`].
    pub fn from_tag(tag: char) -> Option<Self> {
        match tag {
            'N' => Some(WaveType::Normal),
            'P' => Some(WaveType::P),
            'Q' => Some(WaveType::Q),
            'R' => Some(WaveType::R),
            'S' => Some(WaveType::S),
            'T' => Some(WaveType::T),
            _ => None,
        }
    }
}

/// One acquired voltage reading.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    /// Physical value in volts.
    pub voltage: f64,
    /// Microseconds on the process monotonic clock, see [`monotonic_micros`].
    pub timestamp_us: i64,
    /// Classification tag, set by the analyzer.
    pub wave: WaveType,
}

impl Sample {
    /// Create an unclassified sample.
    pub fn new(voltage: f64, timestamp_us: i64) -> Self {
        Self {
            voltage,
            timestamp_us,
            wave: WaveType::Normal,
        }
    }
}

/// Microseconds elapsed on a process-wide monotonic clock.
///
/// The epoch is fixed at the first call, so timestamps taken anywhere in the
/// process are mutually comparable and strictly nondecreasing.
pub fn monotonic_micros() -> i64 {
    static EPOCH: OnceLock<Instant> = OnceLock::new();
    EPOCH.get_or_init(Instant::now).elapsed().as_micros() as i64
}
