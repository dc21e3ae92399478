//! Command execution engine.
//!
//! This module runs one shell command per call:
//! - Returns/logging selectors are resolved into shell redirection
//! - Output is drained line by line and mirrored into a [`LogSink`](crate::sink::LogSink)
//! - An optional deadline interrupts the command and salvages leftover output
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//! use logger_pipe::execution::{execute, ExecutionOptions, OutputSelector};
//! use logger_pipe::sink::TracingSink;
//!
//! # async fn run() -> logger_pipe::Result<()> {
//! let options = ExecutionOptions::builder()
//!     .returns(OutputSelector::Stdout)
//!     .logging(OutputSelector::Both)
//!     .timeout(Duration::from_secs(60))
//!     .build()?;
//!
//! let output = execute(TracingSink, "cargo --version", options).await?;
//! println!("{}", output.unwrap_or_default());
//! # Ok(())
//! # }
//! ```

mod executor;
mod options;
mod plan;
mod result;
mod selector;
mod state;

pub use executor::{
    execute, execute_blocking, CommandExecutor, SALVAGE_GRACE, SALVAGE_PLACEHOLDER,
};
pub use options::{ExecutionOptions, ExecutionOptionsBuilder, DEFAULT_SHELL};
pub use plan::{PreparedRedirection, RedirectionPlan, SideCapture, Stream, Wiring};
pub use result::LineBuffer;
pub use selector::OutputSelector;
pub use state::SupervisorState;
