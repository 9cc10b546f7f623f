//! Integration tests for deadline handling and heavy output on both pipes.

#![cfg(unix)]

use proc_runner::{CommandSpec, ProcessError, ProcessRunner, TokioProcessRunner};
use std::path::Path;
use std::time::{Duration, Instant};

fn sh(script: &str) -> CommandSpec {
    CommandSpec::new("sh").arg("-c").arg(script)
}

fn pid_alive(pid: &str) -> bool {
    // Zombies count as gone: an orphan is reaped by whoever adopted it.
    if let Ok(stat) = std::fs::read_to_string(format!("/proc/{pid}/stat")) {
        return stat
            .rsplit(')')
            .next()
            .map(|rest| !rest.trim_start().starts_with('Z'))
            .unwrap_or(true);
    }
    if Path::new("/proc/self").exists() {
        return false;
    }
    std::process::Command::new("kill")
        .args(["-0", pid])
        .stderr(std::process::Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

/// Poll until `pid` is gone or `within` elapses.
async fn gone_within(pid: &str, within: Duration) -> bool {
    let start = Instant::now();
    while start.elapsed() < within {
        if !pid_alive(pid) {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    !pid_alive(pid)
}

fn read_pid(path: &Path) -> String {
    std::fs::read_to_string(path)
        .expect("child never wrote its pid")
        .trim()
        .to_string()
}

/// Test: a child writing well past the pipe buffer on both streams completes
#[tokio::test]
async fn test_heavy_output_on_both_streams_does_not_deadlock() {
    let script = "head -c 200000 /dev/zero | tr '\\0' a; \
                  head -c 200000 /dev/zero | tr '\\0' b >&2; \
                  head -c 100000 /dev/zero | tr '\\0' c";
    let start = Instant::now();

    let output = TokioProcessRunner
        .run(&sh(script).timeout(Duration::from_secs(20)))
        .await
        .expect("heavy output run failed");

    assert_eq!(output.stdout.len(), 300_000);
    assert_eq!(output.stderr.len(), 200_000);
    assert!(output.stderr.chars().all(|c| c == 'b'));
    assert!(start.elapsed() < Duration::from_secs(20));
}

/// Test: a child that never exits is killed at its deadline and reaped
#[tokio::test]
async fn test_timeout_kills_and_reaps_child() {
    let dir = tempfile::tempdir().unwrap();
    let pid_file = dir.path().join("child.pid");
    let script = format!("echo $$ > '{}'; exec sleep 30", pid_file.display());
    let limit = Duration::from_millis(500);

    let start = Instant::now();
    let err = TokioProcessRunner
        .run(&sh(&script).timeout(limit))
        .await
        .unwrap_err();
    let elapsed = start.elapsed();

    match err {
        ProcessError::Timeout { after, .. } => assert_eq!(after, limit),
        other => panic!("expected Timeout, got {other:?}"),
    }
    assert!(elapsed < limit + Duration::from_secs(3), "took {elapsed:?}");

    let pid = read_pid(&pid_file);
    assert!(
        gone_within(&pid, Duration::from_secs(2)).await,
        "child {pid} still alive after timeout"
    );
}

/// Test: a timed-out call takes the child's background jobs down with it
#[tokio::test]
async fn test_timeout_kills_background_jobs() {
    let dir = tempfile::tempdir().unwrap();
    let pid_file = dir.path().join("grandchild.pid");
    let script = format!("sleep 30 & echo $! > '{}'; wait", pid_file.display());
    let limit = Duration::from_millis(300);

    let start = Instant::now();
    let err = TokioProcessRunner
        .run(&sh(&script).timeout(limit))
        .await
        .unwrap_err();

    assert!(err.is_timeout());
    assert!(
        start.elapsed() < limit + proc_runner::DRAIN_GRACE,
        "took {:?}",
        start.elapsed()
    );
    let pid = read_pid(&pid_file);
    assert!(
        gone_within(&pid, Duration::from_secs(2)).await,
        "background job {pid} survived the timeout"
    );
}

/// Test: a child that exits while a background job still holds its pipes
/// times out at the deadline instead of waiting for the job
#[tokio::test]
async fn test_exited_child_with_inherited_pipes_respects_deadline() {
    let dir = tempfile::tempdir().unwrap();
    let pid_file = dir.path().join("grandchild.pid");
    let script = format!(
        "sleep 30 & echo $! > '{}'; echo hello-response",
        pid_file.display()
    );
    let limit = Duration::from_millis(500);

    let start = Instant::now();
    let err = TokioProcessRunner
        .run(&sh(&script).timeout(limit))
        .await
        .unwrap_err();
    let elapsed = start.elapsed();

    match err {
        ProcessError::Timeout { after, .. } => assert_eq!(after, limit),
        other => panic!("expected Timeout, got {other:?}"),
    }
    assert!(elapsed < limit + proc_runner::DRAIN_GRACE, "took {elapsed:?}");
    let pid = read_pid(&pid_file);
    assert!(
        gone_within(&pid, Duration::from_secs(2)).await,
        "background job {pid} outlived the call"
    );
}

/// Test: a background job with redirected output does not hold the call open
#[tokio::test]
async fn test_detached_background_job_does_not_block_success() {
    let start = Instant::now();
    let output = TokioProcessRunner
        .run(&sh("sleep 3 >/dev/null 2>&1 & echo done").timeout(Duration::from_secs(10)))
        .await
        .expect("run failed");

    assert_eq!(output.stdout_trimmed(), "done");
    assert!(start.elapsed() < Duration::from_secs(3), "took {:?}", start.elapsed());
}

/// Test: a command that finishes before its deadline is not affected by it
#[tokio::test]
async fn test_fast_command_under_deadline_succeeds() {
    let output = TokioProcessRunner
        .run(&sh("echo hello-response").timeout(Duration::from_secs(10)))
        .await
        .expect("run failed");

    assert_eq!(output.stdout_trimmed(), "hello-response");
}
