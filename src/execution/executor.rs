//! Command execution engine.

use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::process::{Child, ChildStdout, Command};
use tracing::{debug, warn};

use super::options::ExecutionOptions;
use super::plan::SideCapture;
use super::result::{decode_line, LineBuffer};
use super::selector::OutputSelector;
use super::state::SupervisorState;
use crate::error::LoggerPipeError;
use crate::sink::LogSink;
use crate::Result;

/// Grace period for reading leftover output after a timeout.
///
/// Independent of the execution timeout.
pub const SALVAGE_GRACE: Duration = Duration::from_secs(10);

/// Logged in place of salvaged output when the salvage read fails.
pub const SALVAGE_PLACEHOLDER: &str = "<failure to get result>";

/// Runs one shell command, mirroring its output into a [`LogSink`].
pub struct CommandExecutor<S> {
    sink: S,
    command: String,
    options: ExecutionOptions,
}

impl<S: LogSink> CommandExecutor<S> {
    /// Create an executor for `command`.
    pub fn new(sink: S, command: impl Into<String>, options: ExecutionOptions) -> Self {
        Self {
            sink,
            command: command.into(),
            options,
        }
    }

    /// The command text passed to the shell.
    pub fn command(&self) -> &str {
        &self.command
    }

    /// Options this executor runs with.
    pub fn options(&self) -> &ExecutionOptions {
        &self.options
    }

    /// Run the command to completion.
    ///
    /// Returns the selected output on exit code 0 (`None` when nothing is
    /// returned or on a dry run). A non-zero exit yields
    /// [`LoggerPipeError::CommandFailure`], an expired deadline
    /// [`LoggerPipeError::DeadlineExceeded`]; both are logged first.
    pub async fn execute(&self) -> Result<Option<String>> {
        if self.options.dry_run() {
            self.sink.info(&format!("dry run: {}", self.command));
            return Ok(None);
        }

        // Owns the side-capture file until every exit path below is done.
        let prepared = self.options.plan().prepare()?;

        self.sink.info(&format!("executing: {}", self.command));
        let mut child = self.spawn(&prepared.redirection)?;
        let pid = child.id();
        let stdout = child.stdout.take().ok_or_else(|| {
            LoggerPipeError::Io(std::io::Error::other("child stdout was not captured"))
        })?;

        let mut drainer = Drainer::new(stdout, self.options.plan().log_realtime());
        let mut state = SupervisorState::Running;

        let status = match self.options.timeout() {
            None => drainer.run_to_exit(&self.sink, &mut child).await?,
            Some(limit) => {
                let raced =
                    tokio::time::timeout(limit, drainer.run_to_exit(&self.sink, &mut child)).await;
                match raced {
                    Ok(status) => status?,
                    Err(_) => {
                        let moved = state.transition_to(SupervisorState::TimedOut);
                        debug_assert!(moved, "timeout fired outside Running");
                        let terminal = self.handle_timeout(limit, pid, drainer).await;
                        let moved = state.transition_to(terminal);
                        debug_assert!(
                            moved && state.is_terminal(),
                            "bad salvage outcome {terminal:?}"
                        );
                        debug!(?state, command = %self.command, "execution timed out");
                        return Err(LoggerPipeError::DeadlineExceeded {
                            command: self.command.clone(),
                            timeout: limit,
                        });
                    }
                }
            }
        };
        let moved = state.transition_to(SupervisorState::Completed);
        debug_assert!(moved && state.is_terminal());
        debug!(?state, ?status, "execution completed");

        if let Some(side) = prepared.side.as_ref() {
            self.log_side_capture(side).await;
        }

        self.classify(status, drainer.into_buffer())
    }

    fn spawn(&self, redirection: &str) -> Result<Child> {
        // The group lets the redirection cover a whole command list.
        let script = format!("{{ {}\n}} {}", self.command, redirection);

        let mut command = Command::new(self.options.shell());
        command
            .arg("-c")
            .arg(&script)
            .stdin(Stdio::null())
            .stdout(Stdio::piped());

        #[cfg(unix)]
        command.process_group(0);

        let child = command.spawn().map_err(LoggerPipeError::Spawn)?;
        debug!(pid = ?child.id(), %redirection, "spawned shell");
        Ok(child)
    }

    async fn log_side_capture(&self, side: &SideCapture) {
        match side.read_block().await {
            Ok(Some(block)) => self.sink.debug(&block),
            Ok(None) => {}
            Err(e) => warn!(stream = %side.stream(), error = %e, "failed to read side capture"),
        }
    }

    fn classify(&self, status: ExitStatus, buffer: LineBuffer) -> Result<Option<String>> {
        if status.success() {
            self.sink.info(&format!("SUCCESS: {}", self.command));
            return Ok(match self.options.returns() {
                OutputSelector::None => None,
                _ => Some(buffer.joined()),
            });
        }

        let message = format!("FAILURE: {}", self.command);
        self.sink.error(&message);
        Err(LoggerPipeError::CommandFailure {
            message,
            lines: buffer.into_lines(),
            exit_code: status.code(),
        })
    }

    /// Signal the child, salvage what is left in the pipe and log the
    /// diagnostic. Returns the terminal supervisor state.
    async fn handle_timeout(
        &self,
        limit: Duration,
        pid: Option<u32>,
        drainer: Drainer,
    ) -> SupervisorState {
        let pid_text = pid.map_or_else(|| "?".to_string(), |p| p.to_string());
        self.sink.error(&format!(
            "[deadline exceeded after {:?}] now killing process {}: {}",
            limit, pid_text, self.command
        ));

        if let Err(e) = interrupt(pid) {
            self.sink.error(&format!("[signal failed] {}", e));
        }

        let buffered = drainer.buffer().trimmed();
        let (terminal, salvaged) = match tokio::time::timeout(SALVAGE_GRACE, drainer.salvage()).await
        {
            Ok(Ok(rest)) => (SupervisorState::Salvaged, rest),
            Ok(Err(e)) => {
                self.sink
                    .error(&format!("failure to get result [I/O error] {}", e));
                (SupervisorState::SalvageFailed, SALVAGE_PLACEHOLDER.to_string())
            }
            Err(_) => {
                self.sink.error(&format!(
                    "failure to get result [salvage read timed out after {:?}]",
                    SALVAGE_GRACE
                ));
                (SupervisorState::SalvageFailed, SALVAGE_PLACEHOLDER.to_string())
            }
        };

        self.sink.error(&format!(
            "EXECUTION Timeout: {}\n{}\n[result]: {}",
            self.command, buffered, salvaged
        ));
        terminal
    }
}

/// Reads the child's pipe line by line into a [`LineBuffer`].
struct Drainer {
    reader: BufReader<ChildStdout>,
    // Bytes of a line still in progress; kept across cancellation.
    pending: Vec<u8>,
    buffer: LineBuffer,
    log_realtime: bool,
}

impl Drainer {
    fn new(stdout: ChildStdout, log_realtime: bool) -> Self {
        Self {
            reader: BufReader::new(stdout),
            pending: Vec::new(),
            buffer: LineBuffer::new(),
            log_realtime,
        }
    }

    /// Drain until end of stream, then reap the child.
    ///
    /// `read_until` keeps partial bytes in `pending`, so dropping this
    /// future at the deadline loses nothing already read.
    async fn run_to_exit<S: LogSink>(
        &mut self,
        sink: &S,
        child: &mut Child,
    ) -> Result<ExitStatus> {
        loop {
            let n = self.reader.read_until(b'\n', &mut self.pending).await?;
            if n == 0 && self.pending.is_empty() {
                break;
            }
            let line = decode_line(&self.pending);
            self.pending.clear();
            if self.log_realtime {
                sink.debug(&line);
            }
            self.buffer.push(line);
            if n == 0 {
                break;
            }
        }
        Ok(child.wait().await?)
    }

    fn buffer(&self) -> &LineBuffer {
        &self.buffer
    }

    fn into_buffer(self) -> LineBuffer {
        self.buffer
    }

    /// Read whatever is left: a partial line plus the rest of the pipe.
    async fn salvage(mut self) -> std::io::Result<String> {
        let mut rest = std::mem::take(&mut self.pending);
        self.reader.read_to_end(&mut rest).await?;
        Ok(String::from_utf8_lossy(&rest).trim().to_string())
    }
}

/// Send SIGINT to the child's process group.
#[cfg(unix)]
fn interrupt(pid: Option<u32>) -> std::io::Result<()> {
    use nix::sys::signal::{killpg, Signal};
    use nix::unistd::Pid;

    let pid = pid.ok_or_else(|| std::io::Error::other("process already reaped"))?;
    let pgid = i32::try_from(pid)
        .map_err(|_| std::io::Error::other(format!("pid {} out of range", pid)))?;
    killpg(Pid::from_raw(pgid), Signal::SIGINT)?;
    Ok(())
}

#[cfg(not(unix))]
fn interrupt(_pid: Option<u32>) -> std::io::Result<()> {
    Err(std::io::Error::other(
        "interrupting a process is only supported on unix",
    ))
}

/// Run `command` with `options`, logging into `sink`.
pub async fn execute<S: LogSink>(
    sink: S,
    command: &str,
    options: ExecutionOptions,
) -> Result<Option<String>> {
    CommandExecutor::new(sink, command, options).execute().await
}

/// Blocking variant of [`execute`] for callers without a runtime.
///
/// Must not be called from within an async context.
pub fn execute_blocking<S: LogSink>(
    sink: S,
    command: &str,
    options: ExecutionOptions,
) -> Result<Option<String>> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    runtime.block_on(execute(sink, command, options))
}
