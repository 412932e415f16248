//! ADS1115 driver.
//!
//! Texas Instruments ADS1115: 16-bit delta-sigma ADC with an I²C interface,
//! four-input multiplexer, programmable gain amplifier and eight data
//! rates. The driver is generic over any [`embedded_hal::i2c::I2c`] bus, so
//! the same code runs against `linux-embedded-hal`'s `I2cdev` on the target
//! board and against a mock bus in tests.
//!
//! All four device registers are 16 bits wide and are transferred
//! most-significant-byte first on the wire; the register module owns the
//! bit layout of the configuration word.

pub mod driver;
pub mod error;
pub mod registers;

pub use driver::Ads1115;
pub use error::{Ads1115Error, Result};
pub use registers::{Address, ComparatorQueue, Mode, Mux, Register};
