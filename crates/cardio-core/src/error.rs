//! Error types for the core pipeline.

use thiserror::Error;

/// Result type alias for core pipeline operations.
pub type Result<T> = std::result::Result<T, CardioError>;

/// Errors raised while configuring or starting the pipeline.
///
/// Runtime workers never return errors across thread boundaries; transient
/// failures (a missed voltage read, a late sample) are logged and survived.
/// Everything here is fatal at startup.
#[derive(Error, Debug)]
pub enum CardioError {
    /// The configured data source reported itself unavailable.
    #[error("data source is not available")]
    SourceUnavailable,

    /// A configuration value failed validation.
    #[error("invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// A filter design was not realizable at the configured sample rate.
    #[error("invalid filter design: {message}")]
    InvalidFilter { message: String },
}
