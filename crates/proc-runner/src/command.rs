//! Command descriptors and captured output.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Description of one external command invocation.
///
/// Built with the chained setters and handed to a [`crate::ProcessRunner`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandSpec {
    /// Executable path or name resolved through `PATH`.
    pub program: PathBuf,

    /// Positional arguments.
    pub args: Vec<String>,

    /// Working directory (inherits the host's when unset).
    pub current_dir: Option<PathBuf>,

    /// Extra environment variables.
    pub envs: Vec<(String, String)>,

    /// Deadline after which the child is killed.
    pub timeout: Option<Duration>,

    /// When set, every drained line is also forwarded to the log under this label.
    pub echo_label: Option<String>,
}

impl CommandSpec {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        CommandSpec {
            program: program.into(),
            args: Vec::new(),
            current_dir: None,
            envs: Vec::new(),
            timeout: None,
            echo_label: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Append a filesystem path as an argument (lossy on non-UTF-8 paths).
    pub fn path_arg(self, path: &Path) -> Self {
        self.arg(path.to_string_lossy().into_owned())
    }

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.current_dir = Some(dir.into());
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.envs.push((key.into(), value.into()));
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set or clear the deadline.
    pub fn maybe_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn echo(mut self, label: impl Into<String>) -> Self {
        self.echo_label = Some(label.into());
        self
    }

    /// Program name for diagnostics.
    pub fn display_program(&self) -> String {
        self.program.to_string_lossy().into_owned()
    }

    /// Full command line, space separated, for logs.
    pub fn display_command(&self) -> String {
        let mut line = self.display_program();
        for arg in &self.args {
            line.push(' ');
            line.push_str(arg);
        }
        line
    }
}

/// Output of a command that exited with code 0.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessOutput {
    /// Exit code (always 0 when returned from a runner).
    pub exit_code: i32,

    /// Captured stdout.
    pub stdout: String,

    /// Captured stderr.
    pub stderr: String,

    /// Wall-clock duration in milliseconds.
    pub duration_ms: u64,
}

impl ProcessOutput {
    /// Successful output with the given stdout; mostly for test doubles.
    pub fn with_stdout(stdout: impl Into<String>) -> Self {
        ProcessOutput {
            exit_code: 0,
            stdout: stdout.into(),
            stderr: String::new(),
            duration_ms: 0,
        }
    }

    /// Stdout with surrounding whitespace removed.
    pub fn stdout_trimmed(&self) -> &str {
        self.stdout.trim()
    }
}
