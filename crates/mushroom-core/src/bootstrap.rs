//! Startup sequence: environment, dependencies, model, gateway.
//!
//! Each step gates the next and every failure is fatal. Nothing here runs
//! concurrently; the gateway is only handed out once provisioning finished.

use crate::artifact::{ArtifactManager, ModelArtifactLocation, ModelStatus};
use crate::config::RuntimeConfig;
use crate::error::BootstrapError;
use crate::inference::InferenceGateway;
use crate::obs::emit_bootstrap_step;
use proc_runner::ProcessRunner;
use serde::Serialize;
use std::sync::Arc;
use tracing::info;
use venv_manager::{DependencyInstaller, EnvironmentSpec, ProvisionOutcome, Provisioner};

/// What the startup sequence did
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BootstrapReport {
    pub environment_created: bool,
    pub dependencies_installed: bool,
    pub model: ModelStatus,
}

/// Everything needed to serve requests after a successful startup.
pub struct Runtime {
    pub environment: EnvironmentSpec,
    pub model: ModelArtifactLocation,
    pub gateway: Arc<InferenceGateway>,
    pub report: BootstrapReport,
}

/// Run the startup sequence with `runner` executing every external step.
pub async fn bootstrap(
    config: &RuntimeConfig,
    runner: Arc<dyn ProcessRunner>,
) -> Result<Runtime, BootstrapError> {
    config.validate()?;
    let environment = config.environment();

    emit_bootstrap_step("environment");
    let outcome = Provisioner::new(runner.clone(), &config.system_interpreter)
        .ensure(&environment)
        .await?;

    let dependencies_installed = if config.skip_install {
        info!("Skipping dependency installation");
        false
    } else {
        emit_bootstrap_step("dependencies");
        DependencyInstaller::new(runner.clone())
            .install(&environment, &config.dependency_manifest())
            .await?;
        true
    };

    emit_bootstrap_step("model");
    let model = config.model_location();
    let status = ArtifactManager::new(runner.clone(), config.artifact_steps(&environment))
        .ensure_model(&model)
        .await?;

    let gateway = InferenceGateway::new(
        runner,
        config.inference_command(&environment),
        config.inference_timeout(),
        config.max_concurrent_inferences,
    );

    let report = BootstrapReport {
        environment_created: outcome == ProvisionOutcome::Created,
        dependencies_installed,
        model: status,
    };
    info!(
        environment_created = report.environment_created,
        dependencies_installed = report.dependencies_installed,
        model = ?report.model,
        "Runtime ready"
    );

    Ok(Runtime {
        environment,
        model,
        gateway: Arc::new(gateway),
        report,
    })
}
