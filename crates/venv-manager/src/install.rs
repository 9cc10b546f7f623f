//! Dependency installation into a provisioned environment.

use crate::error::InstallError;
use crate::spec::EnvironmentSpec;
use proc_runner::{CommandSpec, ProcessRunner};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

/// Declarative list of required packages (a `requirements.txt`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyManifest {
    path: PathBuf,
}

impl DependencyManifest {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        DependencyManifest { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Runs the package manager inside an [`EnvironmentSpec`].
pub struct DependencyInstaller {
    runner: Arc<dyn ProcessRunner>,
}

impl DependencyInstaller {
    pub fn new(runner: Arc<dyn ProcessRunner>) -> Self {
        DependencyInstaller { runner }
    }

    /// Upgrade the package manager, then install everything in `manifest`.
    ///
    /// The upgrade is best-effort: its failure is logged and installation
    /// proceeds. Installer output is forwarded line by line while it runs.
    pub async fn install(
        &self,
        env: &EnvironmentSpec,
        manifest: &DependencyManifest,
    ) -> Result<(), InstallError> {
        if !tokio::fs::try_exists(manifest.path()).await.unwrap_or(false) {
            return Err(InstallError::ManifestMissing(manifest.path().to_path_buf()));
        }

        info!("Upgrading package manager");
        let upgrade = CommandSpec::new(env.interpreter())
            .args(["-m", "pip", "install", "--upgrade", "pip"])
            .echo("pip upgrade");
        if let Err(e) = self.runner.run(&upgrade).await {
            warn!(error = %e, "Package manager upgrade failed, continuing");
        }

        info!(manifest = %manifest.path().display(), "Installing dependencies");
        let install = CommandSpec::new(env.interpreter())
            .args(["-m", "pip", "install", "-r"])
            .path_arg(manifest.path())
            .echo("pip install");
        let output = self.runner.run(&install).await?;

        info!(duration_ms = output.duration_ms, "Dependencies installed");
        Ok(())
    }
}
