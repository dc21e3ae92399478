//! Resolution of returns/logging selectors into shell redirection.
//!
//! The child is always read through a single pipe: the shell's standard
//! output. Everything the caller wants returned or mirrored in real time
//! has to be routed into that pipe with plain shell redirection. When the
//! two axes pick different single streams, the stream that only needs
//! logging is diverted into a temporary side-capture file and logged as a
//! block once the child has exited.

use std::fmt;
use std::path::Path;

use tempfile::TempPath;

use super::selector::OutputSelector;
use crate::error::LoggerPipeError;
use crate::Result;

/// One of the child's two output streams.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stream {
    Stdout,
    Stderr,
}

impl fmt::Display for Stream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stdout => f.write_str("stdout"),
            Self::Stderr => f.write_str("stderr"),
        }
    }
}

/// How the shell wires stdout/stderr relative to the pipe we read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wiring {
    /// Nothing reaches the pipe.
    DiscardAll,
    /// Stdout reaches the pipe, stderr is discarded.
    StdoutOnly,
    /// Stderr reaches the pipe, stdout is discarded.
    StderrOnly,
    /// Both streams reach the pipe, interleaved.
    Merged,
    /// Stdout reaches the pipe, stderr goes to the side file.
    StdoutWithStderrSide,
    /// Stderr reaches the pipe, stdout goes to the side file.
    StderrWithStdoutSide,
}

impl Wiring {
    /// Stream diverted into a side-capture file, if any.
    pub fn side_stream(&self) -> Option<Stream> {
        match self {
            Self::StdoutWithStderrSide => Some(Stream::Stderr),
            Self::StderrWithStdoutSide => Some(Stream::Stdout),
            _ => None,
        }
    }

    fn redirection(&self, side_path: Option<&Path>) -> String {
        let side = side_path
            .map(|p| shell_quote(&p.to_string_lossy()))
            .unwrap_or_else(|| "/dev/null".to_string());
        match self {
            Self::DiscardAll => ">/dev/null 2>&1".to_string(),
            Self::StdoutOnly => "2>/dev/null".to_string(),
            Self::StderrOnly => "2>&1 >/dev/null".to_string(),
            Self::Merged => "2>&1".to_string(),
            Self::StdoutWithStderrSide => format!("2>{}", side),
            Self::StderrWithStdoutSide => format!("2>&1 >{}", side),
        }
    }
}

/// Redirection derived from a (returns, logging) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RedirectionPlan {
    wiring: Wiring,
    log_realtime: bool,
}

impl RedirectionPlan {
    /// Validate the pair and derive its plan.
    ///
    /// `returns = both` cannot be combined with single-stream logging:
    /// the merged pipe offers no way to mirror one substream in real time
    /// while still returning both.
    pub fn resolve(returns: OutputSelector, logging: OutputSelector) -> Result<Self> {
        use OutputSelector::*;

        let (wiring, log_realtime) = match (returns, logging) {
            (None, None) => (Wiring::DiscardAll, false),
            (None, Stdout) => (Wiring::StdoutOnly, true),
            (None, Stderr) => (Wiring::StderrOnly, true),
            (None, Both) => (Wiring::Merged, true),
            (Stdout, None) => (Wiring::StdoutOnly, false),
            (Stdout, Stdout) => (Wiring::StdoutOnly, true),
            (Stdout, Stderr) => (Wiring::StdoutWithStderrSide, false),
            (Stdout, Both) => (Wiring::StdoutWithStderrSide, true),
            (Stderr, None) => (Wiring::StderrOnly, false),
            (Stderr, Stdout) => (Wiring::StderrWithStdoutSide, false),
            (Stderr, Stderr) => (Wiring::StderrOnly, true),
            (Stderr, Both) => (Wiring::StderrWithStdoutSide, true),
            (Both, None) => (Wiring::Merged, false),
            (Both, Both) => (Wiring::Merged, true),
            (Both, Stdout) | (Both, Stderr) => {
                return Err(LoggerPipeError::InvalidConfiguration(format!(
                    "returns={} cannot be combined with logging={}",
                    returns, logging
                )))
            }
        };

        Ok(Self {
            wiring,
            log_realtime,
        })
    }

    /// The wiring this plan uses.
    pub fn wiring(&self) -> Wiring {
        self.wiring
    }

    /// Whether lines read from the pipe are mirrored to the log as they arrive.
    pub fn log_realtime(&self) -> bool {
        self.log_realtime
    }

    /// Stream that must be captured through a side file.
    pub fn side_stream(&self) -> Option<Stream> {
        self.wiring.side_stream()
    }

    /// Create the side-capture file (if needed) and render the redirection.
    pub fn prepare(&self) -> Result<PreparedRedirection> {
        let side = self.side_stream().map(SideCapture::create).transpose()?;
        let redirection = self.wiring.redirection(side.as_ref().map(SideCapture::path));
        Ok(PreparedRedirection { redirection, side })
    }
}

impl Default for RedirectionPlan {
    /// Plan for returns=stdout, logging=both.
    fn default() -> Self {
        Self {
            wiring: Wiring::StdoutWithStderrSide,
            log_realtime: true,
        }
    }
}

/// A plan made concrete for one invocation.
#[derive(Debug)]
pub struct PreparedRedirection {
    /// Redirection appended to the command.
    pub redirection: String,
    /// Side-capture file owned by this invocation.
    pub side: Option<SideCapture>,
}

/// Temporary file receiving the stream that is logged only after exit.
///
/// The file handle is closed right after creation so the child can open
/// the path itself. The file is removed when this value is dropped.
#[derive(Debug)]
pub struct SideCapture {
    stream: Stream,
    path: TempPath,
}

impl SideCapture {
    /// Create a uniquely named, empty capture file.
    pub fn create(stream: Stream) -> Result<Self> {
        let path = tempfile::Builder::new()
            .prefix("logger-pipe-")
            .suffix(".log")
            .tempfile()?
            .into_temp_path();
        Ok(Self { stream, path })
    }

    /// Stream redirected into this file.
    pub fn stream(&self) -> Stream {
        self.stream
    }

    /// Location of the file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the captured content as a framed log block.
    ///
    /// Returns `None` when the stream produced nothing.
    pub async fn read_block(&self) -> Result<Option<String>> {
        let bytes = tokio::fs::read(&self.path).await?;
        let content = String::from_utf8_lossy(&bytes);
        let content = content.trim_end_matches('\n');
        if content.is_empty() {
            return Ok(None);
        }
        Ok(Some(format!(
            "---- begin {stream} ----\n{content}\n---- end {stream} ----",
            stream = self.stream
        )))
    }
}

/// Quote `s` for a POSIX shell.
pub(crate) fn shell_quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', "'\\''"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use OutputSelector::*;

    fn plan(returns: OutputSelector, logging: OutputSelector) -> RedirectionPlan {
        RedirectionPlan::resolve(returns, logging).unwrap()
    }

    #[test]
    fn test_rejected_pairs() {
        for logging in [Stdout, Stderr] {
            let err = RedirectionPlan::resolve(Both, logging).unwrap_err();
            assert!(matches!(err, LoggerPipeError::InvalidConfiguration(_)));
        }
    }

    #[test]
    fn test_every_other_pair_is_valid() {
        let mut valid = 0;
        for returns in OutputSelector::ALL {
            for logging in OutputSelector::ALL {
                if RedirectionPlan::resolve(returns, logging).is_ok() {
                    valid += 1;
                }
            }
        }
        assert_eq!(valid, 14);
    }

    #[test]
    fn test_default_plan_matches_default_selectors() {
        assert_eq!(RedirectionPlan::default(), plan(Stdout, Both));
    }

    #[test]
    fn test_realtime_logging_flags() {
        assert!(!plan(None, None).log_realtime());
        assert!(plan(None, Stderr).log_realtime());
        assert!(!plan(Stdout, Stderr).log_realtime());
        assert!(plan(Stdout, Both).log_realtime());
        assert!(!plan(Stderr, Stdout).log_realtime());
        assert!(plan(Stderr, Both).log_realtime());
        assert!(!plan(Both, None).log_realtime());
        assert!(plan(Both, Both).log_realtime());
    }

    #[test]
    fn test_side_streams() {
        assert_eq!(plan(Stdout, Stderr).side_stream(), Some(Stream::Stderr));
        assert_eq!(plan(Stdout, Both).side_stream(), Some(Stream::Stderr));
        assert_eq!(plan(Stderr, Stdout).side_stream(), Some(Stream::Stdout));
        assert_eq!(plan(Stderr, Both).side_stream(), Some(Stream::Stdout));
        assert_eq!(plan(Stdout, Stdout).side_stream(), Option::None);
        assert_eq!(plan(None, Both).side_stream(), Option::None);
    }

    #[test]
    fn test_pure_redirections() {
        let rendered = |r, l| plan(r, l).prepare().unwrap().redirection;
        assert_eq!(rendered(None, None), ">/dev/null 2>&1");
        assert_eq!(rendered(None, Stdout), "2>/dev/null");
        assert_eq!(rendered(None, Stderr), "2>&1 >/dev/null");
        assert_eq!(rendered(Both, Both), "2>&1");
        assert_eq!(rendered(Stderr, Stderr), "2>&1 >/dev/null");
    }

    #[test]
    fn test_prepare_creates_side_file() {
        let prepared = plan(Stdout, Both).prepare().unwrap();
        let side = prepared.side.as_ref().unwrap();
        assert_eq!(side.stream(), Stream::Stderr);
        assert!(side.path().exists());
        assert!(prepared.redirection.starts_with("2>'"));
        assert!(prepared
            .redirection
            .contains(&*side.path().to_string_lossy()));
    }

    #[test]
    fn test_side_file_removed_on_drop() {
        let prepared = plan(Stderr, Stdout).prepare().unwrap();
        let path = prepared.side.as_ref().unwrap().path().to_path_buf();
        assert!(prepared.redirection.starts_with("2>&1 >'"));
        assert!(path.exists());
        drop(prepared);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_read_block_frames_content() {
        let side = SideCapture::create(Stream::Stderr).unwrap();
        std::fs::write(side.path(), "bar\nqux\n").unwrap();

        let block = side.read_block().await.unwrap().unwrap();
        assert_eq!(block, "---- begin stderr ----\nbar\nqux\n---- end stderr ----");
    }

    #[test]
    fn test_read_block_empty() {
        let side = SideCapture::create(Stream::Stdout).unwrap();
        let block = tokio_test::block_on(side.read_block()).unwrap();
        assert!(block.is_none());
    }

    #[test]
    fn test_shell_quote() {
        assert_eq!(shell_quote("/tmp/a b"), "'/tmp/a b'");
        assert_eq!(shell_quote("it's"), "'it'\\''s'");
    }
}
