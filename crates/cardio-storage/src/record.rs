//! On-disk record formats.
//!
//! The binary format is a headerless sequence of 10-byte little-endian
//! records:
//!
//! ```text
//! offset 0  int16  raw_value      voltage × 32768 / range, clamped
//! offset 2  int64  timestamp_us   microseconds on the monotonic clock
//! ```
//!
//! The text format is UTF-8 CSV with the header line
//! `timestamp_us,voltage,classification`; its timestamps are relative to
//! the first written sample.

use cardio_core::{Sample, VoltageRange, WaveType};

/// Size of one binary record in bytes.
pub const RECORD_SIZE: usize = 10;

/// CSV header line (without the trailing newline).
pub const CSV_HEADER: &str = "timestamp_us,voltage,classification";

/// One binary record: the raw converter value and its timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampleRecord {
    pub raw_value: i16,
    pub timestamp_us: i64,
}

impl SampleRecord {
    /// Quantize a sample to the signed 16-bit full scale of `range`.
    pub fn from_sample(sample: &Sample, range: VoltageRange) -> Self {
        let scaled = sample.voltage * 32768.0 / range.volts();
        Self {
            raw_value: scaled.clamp(f64::from(i16::MIN), f64::from(i16::MAX)) as i16,
            timestamp_us: sample.timestamp_us,
        }
    }

    /// Reconstruct the physical voltage for `range`.
    ///
    /// The divisor is 32768: the full scale of a signed 16-bit conversion.
    pub fn voltage(&self, range: VoltageRange) -> f64 {
        f64::from(self.raw_value) * range.volts() / 32768.0
    }

    /// Encode as the 10-byte little-endian wire form.
    pub fn encode(&self) -> [u8; RECORD_SIZE] {
        let mut bytes = [0u8; RECORD_SIZE];
        bytes[..2].copy_from_slice(&self.raw_value.to_le_bytes());
        bytes[2..].copy_from_slice(&self.timestamp_us.to_le_bytes());
        bytes
    }

    /// Decode from the 10-byte little-endian wire form.
    pub fn decode(bytes: &[u8; RECORD_SIZE]) -> Self {
        let raw_value = i16::from_le_bytes([bytes[0], bytes[1]]);
        let mut ts = [0u8; 8];
        ts.copy_from_slice(&bytes[2..]);
        Self {
            raw_value,
            timestamp_us: i64::from_le_bytes(ts),
        }
    }
}

/// Format one CSV data line. `relative_us` is the delta from the first
/// written sample; the voltage is printed with six decimals.
pub fn csv_line(relative_us: u64, voltage: f64, wave: WaveType) -> String {
    format!("{},{:.6},{}\n", relative_us, voltage, wave.tag())
}
