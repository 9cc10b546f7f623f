//! Error types for proc-runner

use std::time::Duration;
use thiserror::Error;

/// Errors that can occur while running an external command
#[derive(Error, Debug)]
pub enum ProcessError {
    /// The command could not be started at all
    #[error("failed to spawn `{program}`: {source}")]
    SpawnFailed {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The command ran to completion but reported failure
    #[error("`{program}` exited with non-zero code {code}")]
    NonZeroExit {
        program: String,
        code: i32,
        /// Captured stderr, kept for diagnostics only
        stderr: String,
    },

    /// The command outlived its deadline and was killed
    #[error("`{program}` timed out after {}s and was terminated", after.as_secs_f64())]
    Timeout { program: String, after: Duration },

    /// Reading one of the output pipes failed
    #[error("failed to drain {stream} of child process: {source}")]
    DrainFailed {
        stream: &'static str,
        #[source]
        source: std::io::Error,
    },

    /// Waiting on the child failed
    #[error("failed to wait on `{program}`: {source}")]
    WaitFailed {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

impl ProcessError {
    /// Exit code of the child, when it produced one.
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            ProcessError::NonZeroExit { code, .. } => Some(*code),
            _ => None,
        }
    }

    /// Whether the error was caused by the deadline firing.
    pub fn is_timeout(&self) -> bool {
        matches!(self, ProcessError::Timeout { .. })
    }
}
