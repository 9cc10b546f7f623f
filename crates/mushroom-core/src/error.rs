//! Error types for mushroom-core

use proc_runner::ProcessError;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use venv_manager::{InstallError, ProvisionError};

fn code_suffix(code: &Option<i32>) -> String {
    code.map(|c| format!(" with code {c}")).unwrap_or_default()
}

/// Errors from model artifact provisioning
#[derive(Error, Debug)]
pub enum ArtifactError {
    /// The model directory could not be created or listed
    #[error("model directory {} is not accessible: {source}", path.display())]
    DirectoryAccessFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The download step did not complete
    #[error("model download failed{}", code_suffix(code))]
    DownloadFailed {
        code: Option<i32>,
        #[source]
        source: ProcessError,
    },

    /// The training step did not complete
    #[error("model training failed{}", code_suffix(code))]
    TrainFailed {
        code: Option<i32>,
        #[source]
        source: ProcessError,
    },
}

/// Errors from a single inference call
///
/// Display strings are returned to HTTP clients and never carry subprocess output.
#[derive(Error, Debug)]
pub enum InferError {
    /// Prompt was empty or whitespace only
    #[error("prompt must not be empty")]
    InvalidPrompt,

    /// The inference process outlived its deadline
    #[error("inference timed out after {}s", .0.as_secs_f64())]
    Timeout(Duration),

    /// The inference process reported failure
    #[error("inference process exited with non-zero code {code}")]
    NonZeroExit { code: i32 },

    /// The inference process exited cleanly without output
    #[error("empty response from inference process")]
    EmptyResponse,

    /// The inference process could not be run or read
    #[error("inference process could not be run")]
    Launch(#[source] ProcessError),

    /// The gateway is shutting down
    #[error("inference gateway unavailable")]
    Unavailable,
}

/// Invalid runtime configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("failed to read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Config file is not valid JSON for [`crate::RuntimeConfig`]
    #[error("invalid config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// A value is out of range
    #[error("invalid config value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Fatal startup errors
#[derive(Error, Debug)]
pub enum BootstrapError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("environment provisioning failed: {0}")]
    Provision(#[from] ProvisionError),

    #[error("dependency installation failed: {0}")]
    Install(#[from] InstallError),

    #[error("model provisioning failed: {0}")]
    Artifact(#[from] ArtifactError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_artifact_error_reports_exit_code() {
        let err = ArtifactError::DownloadFailed {
            code: Some(7),
            source: ProcessError::NonZeroExit {
                program: "python".into(),
                code: 7,
                stderr: String::new(),
            },
        };
        assert_eq!(err.to_string(), "model download failed with code 7");

        let err = ArtifactError::TrainFailed {
            code: None,
            source: ProcessError::Timeout {
                program: "python".into(),
                after: Duration::from_secs(1),
            },
        };
        assert_eq!(err.to_string(), "model training failed");
    }

    #[test]
    fn test_launch_error_does_not_leak_details() {
        let err = InferError::Launch(ProcessError::SpawnFailed {
            program: "/srv/secret/venv/bin/python".into(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"),
        });
        assert!(!err.to_string().contains("/srv/secret"));
    }
}
