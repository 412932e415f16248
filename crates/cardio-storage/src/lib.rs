//! Storage layer of the cardiac monitoring system.
//!
//! Defines the on-disk record formats, the persister worker that drains the
//! classified buffer into a binary/CSV file pair, and the replay source
//! that feeds a previously recorded binary file back into the pipeline.

pub mod error;
pub mod record;
pub mod replay;
pub mod writer;

pub use error::{Result, StorageError};
pub use record::SampleRecord;
pub use replay::FileSource;
pub use writer::{PersistHandle, RecordWriter};
