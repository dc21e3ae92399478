//! Log sinks that receive the messages produced while a command runs.
//!
//! The execution engine only needs three leveled entry points. Any type
//! implementing [`LogSink`] can be plugged in; two implementations ship
//! with the crate:
//!
//! - [`TracingSink`] forwards every message to `tracing`.
//! - [`MemorySink`] records messages in order, which is handy for tests
//!   and for callers that want to inspect the log afterwards.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

/// Target used for events emitted by [`TracingSink`].
pub const COMMAND_TARGET: &str = "logger_pipe::command";

/// Severity of a sink message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Level {
    Debug,
    Info,
    Error,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Debug => write!(f, "DEBUG"),
            Self::Info => write!(f, "INFO"),
            Self::Error => write!(f, "ERROR"),
        }
    }
}

/// Receiver of leveled text messages.
///
/// Implementations must tolerate interleaved calls from concurrent
/// executions.
pub trait LogSink: Send + Sync {
    /// Log an informational message.
    fn info(&self, message: &str);

    /// Log a debug message. Mirrored command output arrives here.
    fn debug(&self, message: &str);

    /// Log an error message.
    fn error(&self, message: &str);
}

impl<S: LogSink + ?Sized> LogSink for &S {
    fn info(&self, message: &str) {
        (**self).info(message)
    }

    fn debug(&self, message: &str) {
        (**self).debug(message)
    }

    fn error(&self, message: &str) {
        (**self).error(message)
    }
}

impl<S: LogSink + ?Sized> LogSink for Arc<S> {
    fn info(&self, message: &str) {
        (**self).info(message)
    }

    fn debug(&self, message: &str) {
        (**self).debug(message)
    }

    fn error(&self, message: &str) {
        (**self).error(message)
    }
}

/// Sink that emits `tracing` events under [`COMMAND_TARGET`].
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn info(&self, message: &str) {
        tracing::info!(target: COMMAND_TARGET, "{}", message);
    }

    fn debug(&self, message: &str) {
        tracing::debug!(target: COMMAND_TARGET, "{}", message);
    }

    fn error(&self, message: &str) {
        tracing::error!(target: COMMAND_TARGET, "{}", message);
    }
}

/// A single recorded message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub level: Level,
    pub message: String,
}

/// Sink that keeps every message in memory, in arrival order.
#[derive(Debug, Default)]
pub struct MemorySink {
    entries: Mutex<Vec<Entry>>,
}

impl MemorySink {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    // A panic while holding the lock cannot leave a half-written entry.
    fn lock(&self) -> MutexGuard<'_, Vec<Entry>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn push(&self, level: Level, message: &str) {
        self.lock().push(Entry {
            level,
            message: message.to_string(),
        });
    }

    /// Snapshot of all recorded entries.
    pub fn entries(&self) -> Vec<Entry> {
        self.lock().clone()
    }

    /// Recorded messages without their levels.
    pub fn messages(&self) -> Vec<String> {
        self.lock().iter().map(|e| e.message.clone()).collect()
    }

    /// Every message split into individual lines, in order.
    ///
    /// Multi-line messages such as side-capture blocks contribute one
    /// item per line.
    pub fn lines(&self) -> Vec<String> {
        self.lock()
            .iter()
            .flat_map(|e| e.message.lines().map(str::to_string).collect::<Vec<_>>())
            .collect()
    }

    /// Whether any logged line is exactly `line`.
    pub fn contains_line(&self, line: &str) -> bool {
        self.lines().iter().any(|l| l == line)
    }

    /// Whether any message contains `needle`.
    pub fn contains(&self, needle: &str) -> bool {
        self.lock().iter().any(|e| e.message.contains(needle))
    }

    /// Number of recorded messages.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Drop every recorded entry.
    pub fn clear(&self) {
        self.lock().clear();
    }
}

impl LogSink for MemorySink {
    fn info(&self, message: &str) {
        self.push(Level::Info, message);
    }

    fn debug(&self, message: &str) {
        self.push(Level::Debug, message);
    }

    fn error(&self, message: &str) {
        self.push(Level::Error, message);
    }
}
