//! Data-source contract shared by hardware and replay inputs.

/// A source of voltage readings for the sampler.
///
/// Implementations never sleep; pacing is entirely the sampler's job. The
/// two production variants are the ADS1115 hardware driver and the binary
/// record replay source.
pub trait DataSource: Send {
    /// Read the next voltage in volts.
    ///
    /// Returns `None` when a read fails or the source is exhausted; the
    /// sampler logs and skips the sample, it never aborts on a failed read.
    fn read_voltage(&mut self) -> Option<f64>;

    /// Whether the source is initialized and able to produce data.
    fn available(&self) -> bool;
}
