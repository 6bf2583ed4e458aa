//! HTTP API module.
//!
//! Upload/download shell around the extraction pipeline, plus the log
//! stream every pipeline step writes to.

pub mod logs;
pub mod server;
pub mod types;

pub use logs::*;
pub use server::{router, start_server, OUTPUT_FILE};
pub use types::*;
