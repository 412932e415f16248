//! Acquisition configuration.
//!
//! The configuration is assembled once at startup through the builder and is
//! immutable afterwards. Sample rate and voltage range are constrained to
//! the options the ADS1115 converter actually supports.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::{CardioError, Result};

/// Sample rates supported by the ADS1115 data-rate field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleRate {
    Sps8,
    Sps16,
    Sps32,
    Sps64,
    Sps128,
    Sps250,
    Sps475,
    Sps860,
}

impl SampleRate {
    /// Samples per second.
    pub fn hz(self) -> u32 {
        match self {
            SampleRate::Sps8 => 8,
            SampleRate::Sps16 => 16,
            SampleRate::Sps32 => 32,
            SampleRate::Sps64 => 64,
            SampleRate::Sps128 => 128,
            SampleRate::Sps250 => 250,
            SampleRate::Sps475 => 475,
            SampleRate::Sps860 => 860,
        }
    }

    /// Nominal inter-sample period.
    pub fn period(self) -> Duration {
        Duration::from_nanos(1_000_000_000 / u64::from(self.hz()))
    }

    /// Look up a rate by its samples-per-second value.
    pub fn from_hz(hz: u32) -> Option<Self> {
        match hz {
            8 => Some(SampleRate::Sps8),
            16 => Some(SampleRate::Sps16),
            32 => Some(SampleRate::Sps32),
            64 => Some(SampleRate::Sps64),
            128 => Some(SampleRate::Sps128),
            250 => Some(SampleRate::Sps250),
            475 => Some(SampleRate::Sps475),
            860 => Some(SampleRate::Sps860),
            _ => None,
        }
    }
}

/// Full-scale input ranges selectable through the ADS1115 PGA.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoltageRange {
    Fsr6V144,
    Fsr4V096,
    Fsr2V048,
    Fsr1V024,
    Fsr0V512,
    Fsr0V256,
}

impl VoltageRange {
    /// Full-scale magnitude in volts. Inputs span `±volts()`.
    pub fn volts(self) -> f64 {
        match self {
            VoltageRange::Fsr6V144 => 6.144,
            VoltageRange::Fsr4V096 => 4.096,
            VoltageRange::Fsr2V048 => 2.048,
            VoltageRange::Fsr1V024 => 1.024,
            VoltageRange::Fsr0V512 => 0.512,
            VoltageRange::Fsr0V256 => 0.256,
        }
    }
}

/// Immutable settings for one acquisition run.
#[derive(Debug, Clone)]
pub struct AcquisitionConfig {
    /// ADC sample rate.
    pub sample_rate: SampleRate,
    /// ADC programmable-gain full-scale range.
    pub voltage_range: VoltageRange,
    /// Total acquisition duration.
    pub duration: Duration,
    /// Wake interval of the record writer.
    pub write_interval: Duration,
    /// Minimum voltage a local maximum must exceed to count as an R peak.
    /// This is a sensitivity setting, not a physical constant.
    pub r_threshold: f64,
    /// Directory the record files are written to.
    pub output_dir: PathBuf,
    /// Base name of the record file pair.
    pub base_name: String,
    /// TCP port of the end-of-run file server.
    pub server_port: u16,
}

impl Default for AcquisitionConfig {
    fn default() -> Self {
        Self {
            sample_rate: SampleRate::Sps475,
            voltage_range: VoltageRange::Fsr4V096,
            duration: Duration::from_secs(60),
            write_interval: Duration::from_millis(200),
            r_threshold: 2.5,
            output_dir: PathBuf::from("data/processed"),
            base_name: "cardiac_data".to_string(),
            server_port: 8080,
        }
    }
}

impl AcquisitionConfig {
    /// Create a builder seeded with the defaults.
    pub fn builder() -> AcquisitionConfigBuilder {
        AcquisitionConfigBuilder::default()
    }

    /// Capacity of each pipeline buffer: one slot per expected sample.
    pub fn buffer_capacity(&self) -> usize {
        let capacity = f64::from(self.sample_rate.hz()) * self.duration.as_secs_f64();
        (capacity.ceil() as usize).max(1)
    }

    /// Validate cross-field constraints.
    pub fn validate(&self) -> Result<()> {
        if self.duration.is_zero() {
            return Err(CardioError::InvalidConfig {
                message: "acquisition duration must be greater than zero".to_string(),
            });
        }
        if self.write_interval.is_zero() {
            return Err(CardioError::InvalidConfig {
                message: "write interval must be greater than zero".to_string(),
            });
        }
        if self.r_threshold <= 0.0 {
            return Err(CardioError::InvalidConfig {
                message: format!("R threshold must be positive, got {}", self.r_threshold),
            });
        }
        if self.r_threshold > self.voltage_range.volts() {
            return Err(CardioError::InvalidConfig {
                message: format!(
                    "R threshold {} V exceeds the ±{} V input range",
                    self.r_threshold,
                    self.voltage_range.volts()
                ),
            });
        }
        if self.base_name.is_empty() {
            return Err(CardioError::InvalidConfig {
                message: "base file name must not be empty".to_string(),
            });
        }
        Ok(())
    }
}

/// Builder for [`AcquisitionConfig`].
#[derive(Debug, Default)]
pub struct AcquisitionConfigBuilder {
    config: AcquisitionConfig,
}

impl AcquisitionConfigBuilder {
    pub fn sample_rate(mut self, rate: SampleRate) -> Self {
        self.config.sample_rate = rate;
        self
    }

    pub fn voltage_range(mut self, range: VoltageRange) -> Self {
        self.config.voltage_range = range;
        self
    }

    pub fn duration(mut self, duration: Duration) -> Self {
        self.config.duration = duration;
        self
    }

    pub fn write_interval(mut self, interval: Duration) -> Self {
        self.config.write_interval = interval;
        self
    }

    pub fn r_threshold(mut self, volts: f64) -> Self {
        self.config.r_threshold = volts;
        self
    }

    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.output_dir = dir.into();
        self
    }

    pub fn base_name(mut self, name: impl Into<String>) -> Self {
        self.config.base_name = name.into();
        self
    }

    pub fn server_port(mut self, port: u16) -> Self {
        self.config.server_port = port;
        self
    }

    /// Validate and return the finished configuration.
    pub fn build(self) -> Result<AcquisitionConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
