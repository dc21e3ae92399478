//! Execution integration tests.
//!
//! These tests run real shell commands through the engine and check both
//! the returned output and what reached the log.

#![cfg(unix)]

use std::sync::Arc;
use std::time::{Duration, Instant};

use logger_pipe::execution::{ExecutionOptions, SALVAGE_GRACE, SALVAGE_PLACEHOLDER};
use logger_pipe::sink::{Level, MemorySink};
use logger_pipe::{execute, LoggerPipeError};

/// Prints `foo` and `baz` on stdout with `bar` on stderr in between.
fn fixture(exit_code: i32) -> String {
    format!("echo foo; echo bar >&2; echo baz; exit {}", exit_code)
}

fn options(returns: &str, logging: &str) -> ExecutionOptions {
    ExecutionOptions::from_strs(returns, logging).unwrap()
}

// ============================================================================
// Returns / Logging Matrix
// ============================================================================

struct Expectation {
    returns: &'static str,
    logging: &'static str,
    output: Option<&'static str>,
    foo: bool,
    bar: bool,
    baz: bool,
}

const fn expect(
    returns: &'static str,
    logging: &'static str,
    output: Option<&'static str>,
    logged: (bool, bool, bool),
) -> Expectation {
    Expectation {
        returns,
        logging,
        output,
        foo: logged.0,
        bar: logged.1,
        baz: logged.2,
    }
}

const MATRIX: [Expectation; 14] = [
    expect("none", "none", None, (false, false, false)),
    expect("none", "stdout", None, (true, false, true)),
    expect("none", "stderr", None, (false, true, false)),
    expect("none", "both", None, (true, true, true)),
    expect("stdout", "none", Some("foo\nbaz\n"), (false, false, false)),
    expect("stdout", "stdout", Some("foo\nbaz\n"), (true, false, true)),
    expect("stdout", "stderr", Some("foo\nbaz\n"), (false, true, false)),
    expect("stdout", "both", Some("foo\nbaz\n"), (true, true, true)),
    expect("stderr", "none", Some("bar\n"), (false, false, false)),
    expect("stderr", "stdout", Some("bar\n"), (true, false, true)),
    expect("stderr", "stderr", Some("bar\n"), (false, true, false)),
    expect("stderr", "both", Some("bar\n"), (true, true, true)),
    expect("both", "none", Some("foo\nbar\nbaz\n"), (false, false, false)),
    expect("both", "both", Some("foo\nbar\nbaz\n"), (true, true, true)),
];

#[tokio::test]
async fn test_returns_and_logging_matrix() {
    for case in &MATRIX {
        let sink = MemorySink::new();
        let result = execute(&sink, &fixture(0), options(case.returns, case.logging))
            .await
            .unwrap_or_else(|e| panic!("{}/{}: {}", case.returns, case.logging, e));

        let label = format!("returns={} logging={}", case.returns, case.logging);
        assert_eq!(result.as_deref(), case.output, "{}", label);
        assert_eq!(sink.contains_line("foo"), case.foo, "{} foo", label);
        assert_eq!(sink.contains_line("bar"), case.bar, "{} bar", label);
        assert_eq!(sink.contains_line("baz"), case.baz, "{} baz", label);
    }
}

#[tokio::test]
async fn test_failure_keeps_stderr_in_log_for_every_pair() {
    for case in MATRIX.iter().filter(|c| c.bar) {
        let sink = MemorySink::new();
        let err = execute(&sink, &fixture(1), options(case.returns, case.logging))
            .await
            .unwrap_err();

        assert!(matches!(err, LoggerPipeError::CommandFailure { .. }));
        assert!(
            sink.contains_line("bar"),
            "returns={} logging={}",
            case.returns,
            case.logging
        );
    }
}

#[test]
fn test_invalid_combinations_are_rejected_up_front() {
    for (returns, logging) in [
        ("wrong", "none"),
        ("none", "wrong"),
        ("both", "stdout"),
        ("both", "stderr"),
    ] {
        let err = ExecutionOptions::from_strs(returns, logging).unwrap_err();
        assert!(
            matches!(err, LoggerPipeError::InvalidConfiguration(_)),
            "{}/{}",
            returns,
            logging
        );
    }
}

#[tokio::test]
async fn test_side_capture_is_logged_after_realtime_lines() {
    let sink = MemorySink::new();
    execute(&sink, &fixture(0), ExecutionOptions::default())
        .await
        .unwrap();

    let lines = sink.lines();
    let position = |needle: &str| lines.iter().position(|l| l == needle).unwrap();
    assert!(position("foo") < position("baz"));
    assert!(position("baz") < position("---- begin stderr ----"));
    assert!(position("---- begin stderr ----") < position("bar"));
    assert!(position("bar") < position("---- end stderr ----"));
    assert!(position("---- end stderr ----") < position(&format!("SUCCESS: {}", fixture(0))));
}

// ============================================================================
// Success / Failure
// ============================================================================

#[tokio::test]
async fn test_success_returns_stdout_and_logs_in_order() {
    let cmd = "echo 'Foo: 1'; sleep 1; echo 'Bar: 2'";
    let sink = MemorySink::new();
    let result = execute(&sink, cmd, ExecutionOptions::default())
        .await
        .unwrap()
        .unwrap();

    let lines: Vec<_> = result.lines().collect();
    assert_eq!(lines, vec!["Foo: 1", "Bar: 2"]);

    let messages = sink.messages();
    assert_eq!(messages.len(), 4);
    assert_eq!(messages[0], format!("executing: {}", cmd));
    assert_eq!(messages[1], "Foo: 1");
    assert_eq!(messages[2], "Bar: 2");
    assert_eq!(messages[3], format!("SUCCESS: {}", cmd));
}

#[tokio::test]
async fn test_mirrored_lines_are_debug_level() {
    let sink = MemorySink::new();
    execute(&sink, "echo hi", ExecutionOptions::default())
        .await
        .unwrap();

    let entries = sink.entries();
    assert_eq!(entries[0].level, Level::Info);
    assert_eq!(entries[1].level, Level::Debug);
    assert_eq!(entries[2].level, Level::Info);
}

#[tokio::test]
async fn test_failure_carries_buffer() {
    let cmd = "echo 'Foo: 1'; exit 1";
    let sink = MemorySink::new();
    let err = execute(&sink, cmd, ExecutionOptions::default())
        .await
        .unwrap_err();

    let lines = err.lines().unwrap();
    assert!(lines[0].starts_with("Foo: "));

    let entries = sink.entries();
    assert_eq!(entries[0].message, format!("executing: {}", cmd));
    assert_eq!(entries[1].message, "Foo: 1");
    assert_eq!(entries[2].message, format!("FAILURE: {}", cmd));
    assert_eq!(entries[2].level, Level::Error);
}

#[tokio::test]
async fn test_returns_none_still_fails_on_error() {
    let sink = MemorySink::new();
    let err = execute(&sink, "exit 4", options("none", "none"))
        .await
        .unwrap_err();

    match err {
        LoggerPipeError::CommandFailure { exit_code, lines, .. } => {
            assert_eq!(exit_code, Some(4));
            assert!(lines.is_empty());
        }
        other => panic!("unexpected error: {other}"),
    }
}

// ============================================================================
// Timeout
// ============================================================================

#[tokio::test]
async fn test_timeout_raises_deadline_exceeded() {
    let cmd = "echo 'Foo: 1'; sleep 10; echo 'Bar: 2'";
    let sink = MemorySink::new();
    let opts = ExecutionOptions::default().with_timeout(Some(Duration::from_secs(3)));

    let started = Instant::now();
    let err = execute(&sink, cmd, opts).await.unwrap_err();

    assert!(err.is_timeout());
    assert!(started.elapsed() < Duration::from_secs(9));

    let messages = sink.messages();
    assert_eq!(messages[0], format!("executing: {}", cmd));
    assert_eq!(messages[1], "Foo: 1");
    assert!(messages[2].contains("now killing process"));
    assert!(messages.iter().any(|m| m.contains("EXECUTION Timeout")));
    assert!(!sink.contains_line("Bar: 2"));
}

#[tokio::test]
async fn test_timeout_salvages_late_output() {
    // The ignored SIGINT is inherited by sleep, so the pipe stays open
    // until the command finishes on its own.
    let cmd = "trap '' INT; echo first; sleep 2; echo second";
    let sink = MemorySink::new();
    let opts = ExecutionOptions::default().with_timeout(Some(Duration::from_millis(500)));

    let err = execute(&sink, cmd, opts).await.unwrap_err();
    assert!(err.is_timeout());

    let diagnostic = sink
        .messages()
        .into_iter()
        .find(|m| m.starts_with("EXECUTION Timeout"))
        .unwrap();
    assert_eq!(
        diagnostic,
        format!("EXECUTION Timeout: {}\nfirst\n[result]: second", cmd)
    );
    assert!(!sink.contains(SALVAGE_PLACEHOLDER));
}

#[tokio::test]
async fn test_timeout_salvage_gives_up_after_grace() {
    // The pipe outlives the grace period, so nothing can be salvaged.
    let cmd = "trap '' INT; echo first; sleep 13";
    let sink = MemorySink::new();
    let opts = ExecutionOptions::default().with_timeout(Some(Duration::from_millis(500)));

    let start = Instant::now();
    let err = execute(&sink, cmd, opts).await.unwrap_err();
    let elapsed = start.elapsed();

    assert!(err.is_timeout());
    assert!(elapsed >= SALVAGE_GRACE);
    assert!(elapsed < Duration::from_secs(13));

    let entries = sink.entries();
    let gave_up = entries
        .iter()
        .position(|e| {
            e.message
                .starts_with("failure to get result [salvage read timed out after 10s]")
        })
        .unwrap();
    assert_eq!(entries[gave_up].level, Level::Error);

    let last = entries.last().unwrap();
    assert_eq!(gave_up + 1, entries.len() - 1);
    assert_eq!(last.level, Level::Error);
    assert_eq!(
        last.message,
        format!("EXECUTION Timeout: {}\nfirst\n[result]: {}", cmd, SALVAGE_PLACEHOLDER)
    );
}

#[tokio::test]
async fn test_no_timeout_runs_to_completion() {
    let sink = MemorySink::new();
    let result = execute(&sink, "sleep 1; echo done", ExecutionOptions::default())
        .await
        .unwrap();
    assert_eq!(result.as_deref(), Some("done\n"));
}

// ============================================================================
// Dry Run / Repeatability
// ============================================================================

#[tokio::test]
async fn test_dry_run_spawns_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let marker = dir.path().join("marker");
    let cmd = format!("touch '{}'", marker.display());

    for (returns, logging) in [("stdout", "both"), ("none", "none"), ("both", "both")] {
        let sink = MemorySink::new();
        let opts = options(returns, logging).with_dry_run(true);
        let result = execute(&sink, &cmd, opts).await.unwrap();

        assert!(result.is_none());
        assert_eq!(sink.messages(), vec![format!("dry run: {}", cmd)]);
    }
    assert!(!marker.exists());
}

#[tokio::test]
async fn test_repeated_runs_are_identical() {
    let first_sink = MemorySink::new();
    let second_sink = MemorySink::new();

    let first = execute(&first_sink, &fixture(0), ExecutionOptions::default())
        .await
        .unwrap();
    let second = execute(&second_sink, &fixture(0), ExecutionOptions::default())
        .await
        .unwrap();

    assert_eq!(first, second);
    assert_eq!(first_sink.len(), second_sink.len());
}

#[tokio::test]
async fn test_concurrent_runs_share_a_sink() {
    let sink = Arc::new(MemorySink::new());
    let (a, b) = tokio::join!(
        execute(sink.clone(), "echo a", ExecutionOptions::default()),
        execute(sink.clone(), "echo b", ExecutionOptions::default()),
    );

    assert_eq!(a.unwrap().as_deref(), Some("a\n"));
    assert_eq!(b.unwrap().as_deref(), Some("b\n"));
    assert_eq!(sink.len(), 6);
}

#[test]
fn test_blocking_entry_point() {
    let sink = MemorySink::new();
    let result = logger_pipe::execute_blocking(&sink, &fixture(0), options("both", "none")).unwrap();
    assert_eq!(result.as_deref(), Some("foo\nbar\nbaz\n"));
    assert_eq!(sink.len(), 2);
}

// ============================================================================
// Side-Capture Cleanup
// ============================================================================

#[cfg(target_os = "linux")]
mod cleanup {
    use super::*;
    use std::path::Path;

    // stderr of the group points at the side file while the command runs.
    const SHOW_SIDE: &str = "readlink /proc/self/fd/2";

    #[tokio::test]
    async fn test_side_file_removed_after_success() {
        let sink = MemorySink::new();
        let out = execute(&sink, SHOW_SIDE, ExecutionOptions::default())
            .await
            .unwrap()
            .unwrap();

        let path = out.trim();
        assert!(path.contains("logger-pipe-"));
        assert!(!Path::new(path).exists());
    }

    #[tokio::test]
    async fn test_side_file_removed_after_failure() {
        let sink = MemorySink::new();
        let cmd = format!("{}; exit 1", SHOW_SIDE);
        let err = execute(&sink, &cmd, ExecutionOptions::default())
            .await
            .unwrap_err();

        let path = err.lines().unwrap()[0].clone();
        assert!(path.contains("logger-pipe-"));
        assert!(!Path::new(&path).exists());
    }

    #[tokio::test]
    async fn test_side_file_removed_after_timeout() {
        let sink = MemorySink::new();
        let cmd = format!("{}; sleep 10", SHOW_SIDE);
        let opts = ExecutionOptions::default().with_timeout(Some(Duration::from_millis(500)));
        let err = execute(&sink, &cmd, opts).await.unwrap_err();

        assert!(err.is_timeout());
        let path = sink.messages()[1].clone();
        assert!(path.contains("logger-pipe-"));
        assert!(!Path::new(&path).exists());
    }
}
