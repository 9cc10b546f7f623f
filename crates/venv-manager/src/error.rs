//! Error types for venv-manager

use proc_runner::ProcessError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while materializing the environment
#[derive(Error, Debug)]
pub enum ProvisionError {
    /// The system interpreter failed to create the environment
    #[error("environment creation failed: {0}")]
    InterpreterFailed(#[source] ProcessError),

    /// Creation reported success but the environment has no interpreter
    #[error("environment interpreter missing at {}", .0.display())]
    InterpreterMissing(PathBuf),

    /// Filesystem error while checking the environment root
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors that can occur while installing dependencies
#[derive(Error, Debug)]
pub enum InstallError {
    /// The dependency manifest does not exist
    #[error("dependency manifest not found at {}", .0.display())]
    ManifestMissing(PathBuf),

    /// The package installation step failed
    #[error("dependency installation failed{}: {source}", code.map(|c| format!(" with code {c}")).unwrap_or_default())]
    InstallFailed {
        code: Option<i32>,
        #[source]
        source: ProcessError,
    },
}

impl From<ProcessError> for InstallError {
    fn from(source: ProcessError) -> Self {
        InstallError::InstallFailed {
            code: source.exit_code(),
            source,
        }
    }
}
