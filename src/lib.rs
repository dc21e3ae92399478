//! # logger-pipe
//!
//! Run a shell command, mirror its output into a logger while it runs,
//! and return only the streams you ask for.
//!
//! Two independent selectors control a call: which stream(s) are returned
//! (`returns`) and which are logged (`logging`). An optional timeout
//! interrupts the command, salvages any leftover output and reports the
//! timeout after logging a diagnostic.
//!
//! ## Features
//!
//! - **Real-time logging**: lines reach the log as the command prints them
//! - **Stream selection**: stdout, stderr, both or none, per axis
//! - **Timeouts**: SIGINT on expiry, bounded salvage of remaining output
//! - **Pluggable sinks**: `tracing` out of the box, or any [`LogSink`]
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::time::Duration;
//! use logger_pipe::{execute, ExecutionOptions, OutputSelector};
//! use logger_pipe::sink::TracingSink;
//!
//! #[tokio::main]
//! async fn main() -> logger_pipe::Result<()> {
//!     logger_pipe::logging::try_init(None).ok();
//!
//!     let options = ExecutionOptions::builder()
//!         .returns(OutputSelector::Stdout)
//!         .logging(OutputSelector::Both)
//!         .timeout(Duration::from_secs(30))
//!         .build()?;
//!
//!     let output = execute(TracingSink, "uname -a", options).await?;
//!     println!("{}", output.unwrap_or_default());
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod execution;
pub mod logging;
pub mod sink;

// Re-export commonly used types
pub use error::{LoggerPipeError, Result};
pub use execution::{
    execute, execute_blocking, CommandExecutor, ExecutionOptions, LineBuffer, OutputSelector,
};
pub use sink::{LogSink, MemorySink, TracingSink};
