//! Model artifact provisioning.
//!
//! The model directory is the cache: a non-empty directory means the model
//! is present. An empty one triggers the download step followed by the
//! training step, both run to completion before returning.

use crate::error::ArtifactError;
use crate::obs::emit_bootstrap_step;
use proc_runner::{CommandSpec, ProcessRunner};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

/// Directory holding the model artifact. Never deleted by this crate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelArtifactLocation {
    dir: PathBuf,
}

impl ModelArtifactLocation {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        ModelArtifactLocation { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

/// The two opaque steps that populate an empty model directory.
#[derive(Debug, Clone)]
pub struct ArtifactSteps {
    pub download: CommandSpec,
    pub train: CommandSpec,
}

/// Result of [`ArtifactManager::ensure_model`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelStatus {
    /// Directory was already populated; nothing ran
    Cached,
    /// Download and training ran
    Provisioned,
}

pub struct ArtifactManager {
    runner: Arc<dyn ProcessRunner>,
    steps: ArtifactSteps,
}

impl ArtifactManager {
    pub fn new(runner: Arc<dyn ProcessRunner>, steps: ArtifactSteps) -> Self {
        ArtifactManager { runner, steps }
    }

    /// Make sure a model is present in `location`.
    ///
    /// A directory that cannot be created or listed is an error, never
    /// mistaken for an empty one. A failed download skips training.
    pub async fn ensure_model(
        &self,
        location: &ModelArtifactLocation,
    ) -> Result<ModelStatus, ArtifactError> {
        let dir = location.dir();
        let access_failed = |source| ArtifactError::DirectoryAccessFailed {
            path: dir.to_path_buf(),
            source,
        };

        tokio::fs::create_dir_all(dir).await.map_err(access_failed)?;

        let mut entries = tokio::fs::read_dir(dir).await.map_err(access_failed)?;
        if entries.next_entry().await.map_err(access_failed)?.is_some() {
            info!(model_dir = %dir.display(), "Model already present");
            return Ok(ModelStatus::Cached);
        }

        info!(model_dir = %dir.display(), "Model directory empty, downloading");
        emit_bootstrap_step("model.download");
        self.runner
            .run(&self.steps.download)
            .await
            .map_err(|source| ArtifactError::DownloadFailed {
                code: source.exit_code(),
                source,
            })?;

        info!("Model downloaded, training");
        emit_bootstrap_step("model.train");
        self.runner
            .run(&self.steps.train)
            .await
            .map_err(|source| ArtifactError::TrainFailed {
                code: source.exit_code(),
                source,
            })?;

        info!(model_dir = %dir.display(), "Model provisioned");
        Ok(ModelStatus::Provisioned)
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use proc_runner::ScriptedRunner;
    use std::os::unix::fs::PermissionsExt;

    fn steps() -> ArtifactSteps {
        ArtifactSteps {
            download: CommandSpec::new("python").arg("Downloader.py"),
            train: CommandSpec::new("python").arg("Trainer.py"),
        }
    }

    #[tokio::test]
    async fn test_unlistable_directory_is_access_failure() {
        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join("model");
        std::fs::create_dir(&dir).unwrap();
        std::fs::write(dir.join("weights.bin"), b"w").unwrap();
        std::fs::set_permissions(&dir, std::fs::Permissions::from_mode(0o000)).unwrap();

        // Privileged users list the directory regardless of its mode.
        if std::fs::read_dir(&dir).is_ok() {
            std::fs::set_permissions(&dir, std::fs::Permissions::from_mode(0o755)).unwrap();
            return;
        }

        let runner = Arc::new(ScriptedRunner::new());
        let result = ArtifactManager::new(runner.clone(), steps())
            .ensure_model(&ModelArtifactLocation::new(&dir))
            .await;
        std::fs::set_permissions(&dir, std::fs::Permissions::from_mode(0o755)).unwrap();

        match result {
            Err(ArtifactError::DirectoryAccessFailed { path, source }) => {
                assert_eq!(path, dir);
                assert_eq!(source.kind(), std::io::ErrorKind::PermissionDenied);
            }
            other => panic!("expected DirectoryAccessFailed, got {other:?}"),
        }
        assert_eq!(runner.call_count(), 0, "download must not run");
    }
}
