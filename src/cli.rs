//! Command-line interface for logger-pipe.
//!
//! Uses lexopt for minimal binary size overhead.

use std::ffi::OsString;
use std::path::PathBuf;
use std::time::Duration;

use crate::execution::OutputSelector;

/// Command-line arguments.
#[derive(Debug, Clone, Default)]
pub struct Args {
    /// Execution timeout.
    pub timeout: Option<Duration>,
    /// Log the command without running it.
    pub dry_run: bool,
    /// Stream(s) printed on success.
    pub returns: Option<OutputSelector>,
    /// Stream(s) mirrored into the log.
    pub logging: Option<OutputSelector>,
    /// Shell used to run the command.
    pub shell: Option<PathBuf>,
    /// Path to configuration file.
    pub config: Option<PathBuf>,
    /// Log level (error, warn, info, debug, trace).
    pub log_level: Option<String>,
    /// Command words, joined with spaces before execution.
    pub command: Vec<String>,
    /// Show version and exit.
    pub version: bool,
    /// Show help and exit.
    pub help: bool,
}

impl Args {
    /// The command line to hand to the shell.
    pub fn command_line(&self) -> Option<String> {
        if self.command.is_empty() {
            None
        } else {
            Some(self.command.join(" "))
        }
    }
}

/// Parse command-line arguments.
pub fn parse_args() -> Result<Args, ArgsError> {
    parse_args_from(std::env::args_os())
}

/// Parse arguments from an iterator (for testing).
///
/// Everything from the first positional argument on belongs to the
/// command, including words that look like options.
pub fn parse_args_from<I>(args: I) -> Result<Args, ArgsError>
where
    I: IntoIterator<Item = OsString>,
{
    use lexopt::prelude::*;

    let mut result = Args::default();
    let mut parser = lexopt::Parser::from_iter(args);

    while let Some(arg) = parser.next()? {
        match arg {
            Short('h') | Long("help") => {
                result.help = true;
            }
            Short('V') | Long("version") => {
                result.version = true;
            }
            Short('t') | Long("timeout") => {
                let value: String = parser.value()?.parse()?;
                result.timeout = Some(parse_timeout(&value)?);
            }
            Short('n') | Long("dry-run") => {
                result.dry_run = true;
            }
            Short('r') | Long("returns") => {
                let value: String = parser.value()?.parse()?;
                result.returns = Some(
                    value
                        .parse()
                        .map_err(|_| ArgsError::InvalidValue("returns", value))?,
                );
            }
            Short('L') | Long("logging") => {
                let value: String = parser.value()?.parse()?;
                result.logging = Some(
                    value
                        .parse()
                        .map_err(|_| ArgsError::InvalidValue("logging", value))?,
                );
            }
            Short('s') | Long("shell") => {
                result.shell = Some(parser.value()?.parse()?);
            }
            Short('c') | Long("config") => {
                result.config = Some(parser.value()?.parse()?);
            }
            Short('l') | Long("log-level") => {
                result.log_level = Some(parser.value()?.parse()?);
            }
            Value(val) => {
                result.command.push(os_to_string(val)?);
                for rest in parser.raw_args()? {
                    result.command.push(os_to_string(rest)?);
                }
            }
            _ => return Err(arg.unexpected().into()),
        }
    }

    Ok(result)
}

fn parse_timeout(value: &str) -> Result<Duration, ArgsError> {
    match value.parse::<f64>() {
        Ok(secs) if secs.is_finite() && secs > 0.0 => Ok(Duration::from_secs_f64(secs)),
        _ => Err(ArgsError::InvalidValue("timeout", value.to_string())),
    }
}

fn os_to_string(value: OsString) -> Result<String, ArgsError> {
    value
        .into_string()
        .map_err(|v| ArgsError::InvalidValue("command", v.to_string_lossy().into()))
}

/// Print help message.
pub fn print_help() {
    let version = env!("CARGO_PKG_VERSION");
    println!(
        r#"logger-pipe {version}
Run a shell command, mirror its output into the log and print the selected streams

USAGE:
    logger-pipe [OPTIONS] [--] <COMMAND>...

OPTIONS:
    -t, --timeout <SECS>    Kill the command after SECS seconds
    -n, --dry-run           Log the command without running it
    -r, --returns <SEL>     Stream(s) to print: none, stdout, stderr, both [default: stdout]
    -L, --logging <SEL>     Stream(s) to log: none, stdout, stderr, both [default: both]
    -s, --shell <PATH>      Shell used to run the command [default: /bin/sh]
    -c, --config <FILE>     Path to configuration file (JSON)
    -l, --log-level <LVL>   Log level (error, warn, info, debug, trace)
    -h, --help              Print help
    -V, --version           Print version

ENVIRONMENT VARIABLES:
    LOGGER_PIPE_TIMEOUT     Timeout in seconds (overrides config)
    LOGGER_PIPE_RETURNS     Returned stream(s) (overrides config)
    LOGGER_PIPE_LOGGING     Logged stream(s) (overrides config)
    LOGGER_PIPE_SHELL       Shell program (overrides config)
    LOGGER_PIPE_LOG_LEVEL   Log level (overrides config)
    RUST_LOG                Alternative log level setting

EXIT STATUS:
    0    command succeeded
    N    command failed with exit code N (1 if killed by a signal)
    2    invalid arguments or configuration
    124  command timed out

EXAMPLES:
    # Run with stdout returned and both streams logged
    logger-pipe -- make test

    # Give up after 30 seconds
    logger-pipe -t 30 -- ./long-job.sh

    # Return the merged output, log nothing
    logger-pipe -r both -L none -- ./build.sh
"#
    );
}

/// Print version.
pub fn print_version() {
    println!("logger-pipe {}", env!("CARGO_PKG_VERSION"));
}

/// Argument parsing errors.
#[derive(Debug)]
pub enum ArgsError {
    /// Lexopt parsing error.
    Lexopt(lexopt::Error),
    /// Invalid argument value.
    InvalidValue(&'static str, String),
}

impl std::fmt::Display for ArgsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Lexopt(e) => write!(f, "{}", e),
            Self::InvalidValue(name, value) => {
                write!(f, "invalid value for --{}: '{}'", name, value)
            }
        }
    }
}

impl std::error::Error for ArgsError {}

impl From<lexopt::Error> for ArgsError {
    fn from(e: lexopt::Error) -> Self {
        Self::Lexopt(e)
    }
}
