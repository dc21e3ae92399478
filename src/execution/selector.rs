//! Output stream selection.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::LoggerPipeError;

/// Which of the child's output streams an option refers to.
///
/// The same type drives both the returns axis and the logging axis of
/// [`ExecutionOptions`](super::ExecutionOptions).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputSelector {
    /// Neither stream.
    None,
    /// Standard output only.
    Stdout,
    /// Standard error only.
    Stderr,
    /// Both streams, merged in emission order.
    Both,
}

impl OutputSelector {
    /// All selector values.
    pub const ALL: [OutputSelector; 4] = [Self::None, Self::Stdout, Self::Stderr, Self::Both];

    /// Name used in configuration and on the command line.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Stdout => "stdout",
            Self::Stderr => "stderr",
            Self::Both => "both",
        }
    }

    /// Whether this selects exactly one stream.
    pub fn is_single(&self) -> bool {
        matches!(self, Self::Stdout | Self::Stderr)
    }
}

impl fmt::Display for OutputSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputSelector {
    type Err = LoggerPipeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" => Ok(Self::None),
            "stdout" => Ok(Self::Stdout),
            "stderr" => Ok(Self::Stderr),
            "both" => Ok(Self::Both),
            _ => Err(LoggerPipeError::InvalidConfiguration(format!(
                "unknown output selector '{}' (expected none, stdout, stderr or both)",
                s
            ))),
        }
    }
}
