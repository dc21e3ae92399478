//! Configuration management for logger-pipe.
//!
//! Configuration is loaded with the following priority (highest to lowest):
//! 1. Command-line arguments
//! 2. Environment variables
//! 3. Configuration file (JSON)
//! 4. Default values

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::cli::Args;
use crate::error::LoggerPipeError;
use crate::execution::{ExecutionOptions, OutputSelector, DEFAULT_SHELL};
use crate::logging::DEFAULT_FILTER;

/// Application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Execution configuration.
    pub execution: ExecutionSection,
    /// Logging configuration.
    pub logging: LoggingSection,
}

/// Execution configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutionSection {
    /// Timeout in seconds; absent means no deadline.
    pub timeout_secs: Option<f64>,
    /// Log the command without running it.
    pub dry_run: bool,
    /// Returned stream(s).
    pub returns: OutputSelector,
    /// Logged stream(s).
    pub logging: OutputSelector,
    /// Shell program.
    pub shell: PathBuf,
}

impl Default for ExecutionSection {
    fn default() -> Self {
        Self {
            timeout_secs: None,
            dry_run: false,
            returns: OutputSelector::Stdout,
            logging: OutputSelector::Both,
            shell: PathBuf::from(DEFAULT_SHELL),
        }
    }
}

/// Logging configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Log filter (error, warn, info, debug, trace or a full directive).
    pub level: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: DEFAULT_FILTER.to_string(),
        }
    }
}

impl Config {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::Io)?;
        serde_json::from_str(&content).map_err(ConfigError::Json)
    }

    /// Apply environment variable overrides.
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        self.apply_env_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary variable lookup (for testing).
    pub fn apply_env_from<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(timeout) = lookup("LOGGER_PIPE_TIMEOUT") {
            let secs = timeout
                .parse::<f64>()
                .map_err(|_| ConfigError::InvalidValue("LOGGER_PIPE_TIMEOUT", timeout))?;
            self.execution.timeout_secs = Some(secs);
        }

        if let Some(returns) = lookup("LOGGER_PIPE_RETURNS") {
            self.execution.returns = returns
                .parse()
                .map_err(|_| ConfigError::InvalidValue("LOGGER_PIPE_RETURNS", returns))?;
        }

        if let Some(logging) = lookup("LOGGER_PIPE_LOGGING") {
            self.execution.logging = logging
                .parse()
                .map_err(|_| ConfigError::InvalidValue("LOGGER_PIPE_LOGGING", logging))?;
        }

        if let Some(shell) = lookup("LOGGER_PIPE_SHELL") {
            if !shell.is_empty() {
                self.execution.shell = PathBuf::from(shell);
            }
        }

        if let Some(level) = lookup("LOGGER_PIPE_LOG_LEVEL") {
            self.logging.level = level;
        } else if let Some(level) = lookup("RUST_LOG") {
            self.logging.level = level;
        }

        Ok(())
    }

    /// Apply CLI argument overrides.
    pub fn apply_args(&mut self, args: &Args) {
        if let Some(timeout) = args.timeout {
            self.execution.timeout_secs = Some(timeout.as_secs_f64());
        }

        if args.dry_run {
            self.execution.dry_run = true;
        }

        if let Some(returns) = args.returns {
            self.execution.returns = returns;
        }

        if let Some(logging) = args.logging {
            self.execution.logging = logging;
        }

        if let Some(ref shell) = args.shell {
            self.execution.shell = shell.clone();
        }

        if let Some(ref level) = args.log_level {
            self.logging.level = level.clone();
        }
    }

    /// Load configuration with full priority chain.
    ///
    /// Priority: CLI args > env vars > config file > defaults
    pub fn load(args: &Args) -> Result<Self, ConfigError> {
        let mut config = match args.config {
            Some(ref path) => Config::from_file(path)?,
            None => Config::default(),
        };

        config.apply_env()?;
        config.apply_args(args);

        Ok(config)
    }

    /// Validate into [`ExecutionOptions`].
    pub fn to_options(&self) -> Result<ExecutionOptions, ConfigError> {
        let timeout = match self.execution.timeout_secs {
            None => None,
            Some(secs) if secs.is_finite() && secs > 0.0 => Some(Duration::from_secs_f64(secs)),
            Some(secs) => return Err(ConfigError::InvalidTimeout(secs)),
        };

        ExecutionOptions::builder()
            .maybe_timeout(timeout)
            .dry_run(self.execution.dry_run)
            .returns(self.execution.returns)
            .logging(self.execution.logging)
            .shell(self.execution.shell.clone())
            .build()
            .map_err(ConfigError::Options)
    }

    /// Get the log level filter string.
    pub fn log_filter(&self) -> &str {
        &self.logging.level
    }
}

/// Configuration errors.
#[derive(Debug)]
pub enum ConfigError {
    /// IO error reading config file.
    Io(std::io::Error),
    /// JSON parsing error.
    Json(serde_json::Error),
    /// Environment variable with an unusable value.
    InvalidValue(&'static str, String),
    /// Timeout that is not a positive number of seconds.
    InvalidTimeout(f64),
    /// Rejected execution options.
    Options(LoggerPipeError),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "failed to read config file: {}", e),
            Self::Json(e) => write!(f, "failed to parse config file: {}", e),
            Self::InvalidValue(name, value) => write!(f, "invalid value for {}: '{}'", name, value),
            Self::InvalidTimeout(secs) => write!(f, "invalid timeout: {} seconds", secs),
            Self::Options(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for ConfigError {}
