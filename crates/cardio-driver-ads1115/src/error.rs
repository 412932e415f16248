//! Error types for the ADS1115 driver.

use thiserror::Error;

/// Result type alias for driver operations.
pub type Result<T> = std::result::Result<T, Ads1115Error>;

/// Errors that can occur when talking to the converter.
#[derive(Error, Debug)]
pub enum Ads1115Error {
    /// An I²C transfer failed.
    #[error("I2C transfer failed at register 0x{register:02X}: {message}")]
    Transfer { register: u8, message: String },

    /// The device was used before a successful `init`.
    #[error("ADS1115 not initialized, call init() first")]
    NotInitialized,
}
