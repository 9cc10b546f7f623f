//! Process execution with concurrent stdout/stderr draining.
//!
//! Every spawned child gets exactly two reader tasks, one per pipe, running
//! alongside the wait-for-exit. Both readers are joined before [`ProcessRunner::run`]
//! returns. On unix the child leads its own process group, and the whole group
//! is killed on every error path, so descendants holding the pipes cannot
//! outlive the call.

use crate::command::{CommandSpec, ProcessOutput};
use crate::error::ProcessError;
use crate::Result;
use async_trait::async_trait;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, Command};
use tokio::task::{JoinError, JoinHandle};
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// How long reader tasks may keep draining after the child was killed.
///
/// A descendant that left the process group can keep the pipes open past the kill.
pub const DRAIN_GRACE: Duration = Duration::from_secs(2);

/// Runs external commands to completion.
#[async_trait]
pub trait ProcessRunner: Send + Sync {
    /// Run `spec` and return its captured output.
    ///
    /// A non-zero exit is reported as [`ProcessError::NonZeroExit`], never as `Ok`.
    /// With a timeout set, the call returns within that timeout plus [`DRAIN_GRACE`],
    /// including the time spent draining output.
    async fn run(&self, spec: &CommandSpec) -> Result<ProcessOutput>;
}

/// [`ProcessRunner`] backed by `tokio::process`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioProcessRunner;

impl TokioProcessRunner {
    pub fn new() -> Self {
        TokioProcessRunner
    }
}

#[async_trait]
impl ProcessRunner for TokioProcessRunner {
    async fn run(&self, spec: &CommandSpec) -> Result<ProcessOutput> {
        let program = spec.display_program();
        let start = Instant::now();
        let deadline = spec.timeout.map(|limit| start + limit);

        let mut command = Command::new(&spec.program);
        command
            .args(&spec.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        #[cfg(unix)]
        command.process_group(0);
        if let Some(dir) = &spec.current_dir {
            command.current_dir(dir);
        }
        for (key, value) in &spec.envs {
            command.env(key, value);
        }

        debug!(command = %spec.display_command(), "Spawning child process");
        let mut child = command
            .spawn()
            .map_err(|source| ProcessError::SpawnFailed {
                program: program.clone(),
                source,
            })?;

        let group = ProcessGroup::of(&child);
        let mut readers = Readers::spawn(&mut child, spec.echo_label.clone());

        let waited = match deadline {
            Some(at) => tokio::time::timeout_at(at, child.wait()).await.ok(),
            None => Some(child.wait().await),
        };

        let status = match waited {
            Some(Ok(status)) => status,
            Some(Err(source)) => {
                terminate(&mut child, &group, &program).await;
                readers.settle(DRAIN_GRACE).await;
                return Err(ProcessError::WaitFailed { program, source });
            }
            None => {
                let after = spec.timeout.unwrap_or_default();
                warn!(
                    program = %program,
                    timeout_ms = after.as_millis() as u64,
                    "Child exceeded its deadline, killing"
                );
                terminate(&mut child, &group, &program).await;
                readers.settle(DRAIN_GRACE).await;
                return Err(ProcessError::Timeout { program, after });
            }
        };

        let joined = match deadline {
            Some(at) => tokio::time::timeout_at(at, readers.join()).await.ok(),
            None => Some(readers.join().await),
        };
        let Some(joined) = joined else {
            let after = spec.timeout.unwrap_or_default();
            warn!(
                program = %program,
                timeout_ms = after.as_millis() as u64,
                "Output pipes held open past the deadline, killing process group"
            );
            group.kill();
            readers.settle(DRAIN_GRACE).await;
            return Err(ProcessError::Timeout { program, after });
        };
        let (stdout, stderr) = joined?;
        group.disarm();

        let duration_ms = start.elapsed().as_millis() as u64;
        let exit_code = status.code().unwrap_or(-1);
        let stdout = String::from_utf8_lossy(&stdout).into_owned();
        let stderr = String::from_utf8_lossy(&stderr).into_owned();

        debug!(program = %program, exit_code, duration_ms, "Child process finished");

        if !status.success() {
            return Err(ProcessError::NonZeroExit {
                program,
                code: exit_code,
                stderr,
            });
        }

        Ok(ProcessOutput {
            exit_code,
            stdout,
            stderr,
            duration_ms,
        })
    }
}

/// Kill the child's process group, then kill and reap the child itself.
async fn terminate(child: &mut Child, group: &ProcessGroup, program: &str) {
    group.kill();
    if let Err(e) = child.kill().await {
        debug!(program = %program, error = %e, "Kill after exit");
    }
}

/// Process group led by a spawned child.
///
/// Dropping it while armed kills the group, which covers every early return
/// and a caller dropping the `run` future.
struct ProcessGroup {
    #[cfg_attr(not(unix), allow(dead_code))]
    id: Option<u32>,
    armed: bool,
}

impl ProcessGroup {
    fn of(child: &Child) -> Self {
        ProcessGroup {
            id: child.id(),
            armed: true,
        }
    }

    #[cfg(unix)]
    fn kill(&self) {
        use nix::sys::signal::{killpg, Signal};
        use nix::unistd::Pid;

        let Some(id) = self.id.and_then(|id| i32::try_from(id).ok()) else {
            return;
        };
        // ESRCH: the group is already empty.
        if let Err(e) = killpg(Pid::from_raw(id), Signal::SIGKILL) {
            debug!(pgid = id, error = %e, "Process group kill");
        }
    }

    #[cfg(not(unix))]
    fn kill(&self) {}

    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for ProcessGroup {
    fn drop(&mut self) {
        if self.armed {
            self.kill();
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Stream {
    Stdout,
    Stderr,
}

impl Stream {
    fn name(self) -> &'static str {
        match self {
            Stream::Stdout => "stdout",
            Stream::Stderr => "stderr",
        }
    }
}

/// The two reader tasks of one child.
struct Readers {
    stdout: JoinHandle<std::io::Result<Vec<u8>>>,
    stderr: JoinHandle<std::io::Result<Vec<u8>>>,
}

impl Readers {
    fn spawn(child: &mut Child, echo_label: Option<String>) -> Self {
        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        Readers {
            stdout: tokio::spawn(drain(stdout, Stream::Stdout, echo_label.clone())),
            stderr: tokio::spawn(drain(stderr, Stream::Stderr, echo_label)),
        }
    }

    /// Wait for both readers to hit EOF.
    async fn join(&mut self) -> Result<(Vec<u8>, Vec<u8>)> {
        let (stdout, stderr) = tokio::join!(&mut self.stdout, &mut self.stderr);
        Ok((
            collect(stdout, Stream::Stdout)?,
            collect(stderr, Stream::Stderr)?,
        ))
    }

    /// Join after the child was killed, aborting readers still blocked past `grace`.
    async fn settle(self, grace: Duration) {
        let Readers {
            mut stdout,
            mut stderr,
        } = self;
        let joined = tokio::time::timeout(grace, async {
            let _ = tokio::join!(&mut stdout, &mut stderr);
        })
        .await;
        if joined.is_err() {
            debug!("Output pipes still open after kill, aborting readers");
            stdout.abort();
            stderr.abort();
        }
    }
}

fn collect(
    joined: std::result::Result<std::io::Result<Vec<u8>>, JoinError>,
    stream: Stream,
) -> Result<Vec<u8>> {
    match joined {
        Ok(Ok(bytes)) => Ok(bytes),
        Ok(Err(source)) => Err(ProcessError::DrainFailed {
            stream: stream.name(),
            source,
        }),
        Err(join_err) => Err(ProcessError::DrainFailed {
            stream: stream.name(),
            source: std::io::Error::new(std::io::ErrorKind::Other, join_err),
        }),
    }
}

/// Read a pipe to EOF, forwarding lines to the log when `echo_label` is set.
async fn drain<R>(pipe: Option<R>, stream: Stream, echo_label: Option<String>) -> std::io::Result<Vec<u8>>
where
    R: AsyncRead + Unpin,
{
    let Some(pipe) = pipe else {
        return Ok(Vec::new());
    };

    let mut reader = BufReader::new(pipe);
    let mut captured = Vec::new();
    let mut line = Vec::new();

    loop {
        line.clear();
        if reader.read_until(b'\n', &mut line).await? == 0 {
            break;
        }
        if let Some(label) = &echo_label {
            let text = String::from_utf8_lossy(&line);
            let text = text.trim_end();
            match stream {
                Stream::Stdout => info!(source = %label, "{}", text),
                Stream::Stderr => warn!(source = %label, "{}", text),
            }
        }
        captured.extend_from_slice(&line);
    }

    Ok(captured)
}
