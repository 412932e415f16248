//! End-of-run TCP file handoff.
//!
//! A minimal single-client server: it listens for the whole run, keeps at
//! most one client attached, and when the coordinator signals end-of-run it
//! streams every produced record file to the attached client and closes the
//! connection. Text preamble, binary payloads:
//!
//! ```text
//! FILES <N>\n
//! FILE <name> <length>\n
//! <length raw bytes>
//! ...
//! ```
//!
//! No authentication, no resume, no concurrent clients.

pub mod error;
pub mod file_server;

pub use error::{Result, ServerError};
pub use file_server::TcpFileServer;
