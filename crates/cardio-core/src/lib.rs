//! Core of the cardiac monitoring pipeline.
//!
//! This crate holds everything the acquisition pipeline shares between
//! workers: the sample data model, the circular buffers that connect the
//! workers, the acquisition configuration, the data-source contract, the
//! streaming PQRST detector and the deadline-driven sampler.
//!
//! # Architecture
//!
//! ```text
//! DataSource → Sampler → CircularBuffer (raw)
//!                             ↓
//!                         Analyzer (PQRST detection)
//!                             ↓
//!                        CircularBuffer (classified) → persister
//! ```
//!
//! Data flow is strictly linear. Each buffer is shared by exactly one
//! producer and one consumer; the sampler owns its data source and the
//! analyzer owns its sliding window.

pub mod analyzer;
pub mod config;
pub mod data;
pub mod detector;
pub mod error;
pub mod filter;
pub mod ring_buffer;
pub mod sampler;
pub mod source;

pub use analyzer::Analyzer;
pub use config::{AcquisitionConfig, SampleRate, VoltageRange};
pub use data::{monotonic_micros, Sample, WaveType};
pub use detector::{BeatDetector, DetectorConfig};
pub use error::{CardioError, Result};
pub use filter::{EcgBandFilter, NotchFilter};
pub use ring_buffer::CircularBuffer;
pub use sampler::Sampler;
pub use source::DataSource;
