//! ADS1115 driver core and its [`DataSource`] implementation.

use embedded_hal::i2c::I2c;
use tracing::{debug, info, warn};

use cardio_core::{DataSource, SampleRate, VoltageRange};

use crate::error::{Ads1115Error, Result};
use crate::registers::{config_word, Address, Mode, Mux, Register};

/// ADS1115 over any blocking I²C bus.
///
/// Configured for continuous conversion on a single-ended input; each
/// [`Ads1115::read_voltage`] returns the latest converted value. The
/// device's registers are big-endian on the wire, the driver performs the
/// byte ordering itself.
pub struct Ads1115<I2C> {
    i2c: I2C,
    address: u8,
    config: u16,
    range: VoltageRange,
    initialized: bool,
}

impl<I2C: I2c> Ads1115<I2C> {
    /// Create a driver for the converter at `address`, configured for
    /// single-ended AIN0 continuous conversion at the given rate and range.
    pub fn new(i2c: I2C, address: Address, rate: SampleRate, range: VoltageRange) -> Self {
        Self {
            i2c,
            address: address.value(),
            config: config_word(Mux::A0Gnd, range, rate, Mode::Continuous),
            range,
            initialized: false,
        }
    }

    /// Write the configuration word and start continuous conversion.
    pub fn init(&mut self) -> Result<()> {
        self.write_register(Register::Config, self.config)?;
        self.initialized = true;
        info!(
            address = self.address,
            config = self.config,
            range_v = self.range.volts(),
            "ADS1115 initialized"
        );
        Ok(())
    }

    /// Full-scale range the PGA is configured for.
    pub fn voltage_range(&self) -> VoltageRange {
        self.range
    }

    /// Read the latest raw conversion value.
    pub fn read_raw(&mut self) -> Result<i16> {
        if !self.initialized {
            return Err(Ads1115Error::NotInitialized);
        }
        Ok(self.read_register(Register::Conversion)? as i16)
    }

    /// Read the latest conversion as a physical voltage.
    ///
    /// `voltage = raw × range / 32768`, the full scale of a signed 16-bit
    /// conversion.
    pub fn read_voltage(&mut self) -> Result<f64> {
        let raw = self.read_raw()?;
        Ok(f64::from(raw) * self.range.volts() / 32768.0)
    }

    fn write_register(&mut self, register: Register, value: u16) -> Result<()> {
        let bytes = value.to_be_bytes();
        debug!(register = register.value(), value, "register write");
        self.i2c
            .write(self.address, &[register.value(), bytes[0], bytes[1]])
            .map_err(|e| Ads1115Error::Transfer {
                register: register.value(),
                message: format!("{e:?}"),
            })
    }

    fn read_register(&mut self, register: Register) -> Result<u16> {
        let mut bytes = [0u8; 2];
        self.i2c
            .write_read(self.address, &[register.value()], &mut bytes)
            .map_err(|e| Ads1115Error::Transfer {
                register: register.value(),
                message: format!("{e:?}"),
            })?;
        Ok(u16::from_be_bytes(bytes))
    }
}

impl<I2C: I2c + Send> DataSource for Ads1115<I2C> {
    fn read_voltage(&mut self) -> Option<f64> {
        match Ads1115::read_voltage(self) {
            Ok(voltage) => Some(voltage),
            Err(error) => {
                warn!(%error, "ADC read failed");
                None
            }
        }
    }

    fn available(&self) -> bool {
        self.initialized
    }
}
