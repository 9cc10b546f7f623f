//! Environment provisioning: create-if-absent.

use crate::error::ProvisionError;
use crate::spec::EnvironmentSpec;
use proc_runner::{CommandSpec, ProcessRunner};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};

/// What [`Provisioner::ensure`] had to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProvisionOutcome {
    /// The root already existed; nothing ran
    AlreadyPresent,
    /// The environment was created
    Created,
}

/// Materializes an [`EnvironmentSpec`] with the system interpreter.
pub struct Provisioner {
    runner: Arc<dyn ProcessRunner>,
    system_interpreter: PathBuf,
}

impl Provisioner {
    pub fn new(runner: Arc<dyn ProcessRunner>, system_interpreter: impl Into<PathBuf>) -> Self {
        Provisioner {
            runner,
            system_interpreter: system_interpreter.into(),
        }
    }

    /// Ensure the environment exists.
    ///
    /// Only the root's existence is checked, not its contents or version, so
    /// this is safe to call on every startup. A failed creation is not retried.
    pub async fn ensure(&self, env: &EnvironmentSpec) -> Result<ProvisionOutcome, ProvisionError> {
        if tokio::fs::try_exists(env.root()).await? {
            debug!(root = %env.root().display(), "Environment already present");
            return Ok(ProvisionOutcome::AlreadyPresent);
        }

        info!(root = %env.root().display(), "Creating isolated environment");
        let create = CommandSpec::new(&self.system_interpreter)
            .args(["-m", "venv"])
            .path_arg(env.root())
            .echo("venv");
        self.runner
            .run(&create)
            .await
            .map_err(ProvisionError::InterpreterFailed)?;

        if !tokio::fs::try_exists(env.interpreter()).await? {
            return Err(ProvisionError::InterpreterMissing(
                env.interpreter().to_path_buf(),
            ));
        }

        info!(interpreter = %env.interpreter().display(), "Environment created");
        Ok(ProvisionOutcome::Created)
    }
}
