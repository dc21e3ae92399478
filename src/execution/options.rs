//! Execution options.

use std::path::PathBuf;
use std::time::Duration;

use super::plan::RedirectionPlan;
use super::selector::OutputSelector;
use crate::Result;

/// Shell used when none is configured.
pub const DEFAULT_SHELL: &str = "/bin/sh";

/// Validated options for a single execution.
///
/// Construction goes through [`ExecutionOptions::new`] or
/// [`ExecutionOptionsBuilder::build`], both of which reject invalid
/// returns/logging pairs, so an existing value always has a plan.
#[derive(Debug, Clone)]
pub struct ExecutionOptions {
    timeout: Option<Duration>,
    dry_run: bool,
    returns: OutputSelector,
    logging: OutputSelector,
    shell: PathBuf,
    plan: RedirectionPlan,
}

impl ExecutionOptions {
    /// Options with the given selectors and no timeout.
    pub fn new(returns: OutputSelector, logging: OutputSelector) -> Result<Self> {
        Self::builder().returns(returns).logging(logging).build()
    }

    /// Options from textual selectors, e.g. values read from a config file.
    pub fn from_strs(returns: &str, logging: &str) -> Result<Self> {
        Self::new(returns.parse()?, logging.parse()?)
    }

    /// Start building options from the defaults.
    pub fn builder() -> ExecutionOptionsBuilder {
        ExecutionOptionsBuilder::new()
    }

    /// Maximum execution time.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Whether the command is only logged, never run.
    pub fn dry_run(&self) -> bool {
        self.dry_run
    }

    /// Which stream(s) are returned.
    pub fn returns(&self) -> OutputSelector {
        self.returns
    }

    /// Which stream(s) are mirrored into the log.
    pub fn logging(&self) -> OutputSelector {
        self.logging
    }

    /// Shell program the command is passed to.
    pub fn shell(&self) -> &PathBuf {
        &self.shell
    }

    /// Redirection plan derived from the selectors.
    pub fn plan(&self) -> &RedirectionPlan {
        &self.plan
    }

    /// Copy of these options with a different timeout.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Copy of these options with dry-run toggled.
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }
}

impl Default for ExecutionOptions {
    /// Return stdout, log both streams, no timeout.
    fn default() -> Self {
        Self {
            timeout: None,
            dry_run: false,
            returns: OutputSelector::Stdout,
            logging: OutputSelector::Both,
            shell: PathBuf::from(DEFAULT_SHELL),
            plan: RedirectionPlan::default(),
        }
    }
}

/// Builder for [`ExecutionOptions`] with fluent API.
#[derive(Debug, Clone)]
pub struct ExecutionOptionsBuilder {
    timeout: Option<Duration>,
    dry_run: bool,
    returns: OutputSelector,
    logging: OutputSelector,
    shell: PathBuf,
}

impl Default for ExecutionOptionsBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ExecutionOptionsBuilder {
    /// Create a builder holding the default options.
    pub fn new() -> Self {
        Self {
            timeout: None,
            dry_run: false,
            returns: OutputSelector::Stdout,
            logging: OutputSelector::Both,
            shell: PathBuf::from(DEFAULT_SHELL),
        }
    }

    /// Set the execution timeout.
    pub fn timeout(mut self, duration: Duration) -> Self {
        self.timeout = Some(duration);
        self
    }

    /// Set or clear the execution timeout.
    pub fn maybe_timeout(mut self, duration: Option<Duration>) -> Self {
        self.timeout = duration;
        self
    }

    /// Only log the command instead of running it.
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Select the returned stream(s).
    pub fn returns(mut self, returns: OutputSelector) -> Self {
        self.returns = returns;
        self
    }

    /// Select the logged stream(s).
    pub fn logging(mut self, logging: OutputSelector) -> Self {
        self.logging = logging;
        self
    }

    /// Use a different shell program.
    pub fn shell(mut self, shell: impl Into<PathBuf>) -> Self {
        self.shell = shell.into();
        self
    }

    /// Validate the selectors and build the options.
    pub fn build(self) -> Result<ExecutionOptions> {
        let plan = RedirectionPlan::resolve(self.returns, self.logging)?;
        Ok(ExecutionOptions {
            timeout: self.timeout,
            dry_run: self.dry_run,
            returns: self.returns,
            logging: self.logging,
            shell: self.shell,
            plan,
        })
    }
}
