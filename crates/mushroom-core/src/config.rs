//! Runtime configuration and the on-disk layout it describes.
//!
//! A [`RuntimeConfig`] is built once at startup (from defaults, a JSON file,
//! or CLI flags) and every component derives its paths from it.

use crate::artifact::{ArtifactSteps, ModelArtifactLocation};
use crate::error::ConfigError;
use proc_runner::CommandSpec;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use venv_manager::{DependencyManifest, EnvironmentSpec, Platform};

/// Reference deadline for one inference call.
pub const DEFAULT_INFERENCE_TIMEOUT_SECS: u64 = 60;

/// Environment variable through which the inference script learns the model directory.
pub const MODEL_DIR_ENV: &str = "MUSHROOM_MODEL_DIR";

pub const DOWNLOAD_SCRIPT: &str = "Downloader.py";
pub const TRAIN_SCRIPT: &str = "AITrainer.py";
pub const INFERENCE_SCRIPT: &str = "AIServer.py";

/// Paths and knobs for one runtime instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Root of the isolated interpreter environment.
    pub env_root: PathBuf,

    /// Host platform; selects the interpreter subpath.
    pub platform: Platform,

    /// Interpreter used to create the environment.
    pub system_interpreter: PathBuf,

    /// `requirements.txt` installed into the environment.
    pub manifest: PathBuf,

    /// Model artifact directory.
    pub model_dir: PathBuf,

    pub download_script: PathBuf,
    pub train_script: PathBuf,
    pub inference_script: PathBuf,

    /// Deadline for one inference call, in seconds.
    pub inference_timeout_secs: u64,

    #[serde(default)]
    pub download_timeout_secs: Option<u64>,

    #[serde(default)]
    pub train_timeout_secs: Option<u64>,

    /// Cap on inference subprocesses running at once; unlimited when unset.
    #[serde(default)]
    pub max_concurrent_inferences: Option<usize>,

    /// Skip dependency installation at startup.
    #[serde(default)]
    pub skip_install: bool,
}

impl RuntimeConfig {
    /// Standard layout under `base`:
    ///
    /// ```text
    /// <base>/python/                   scripts
    /// <base>/python/venv/              environment root
    /// <base>/python/requirements.txt   manifest
    /// <base>/model/                    model artifact
    /// ```
    pub fn from_base_dir(base: impl AsRef<Path>) -> Self {
        let base = base.as_ref();
        let scripts = base.join("python");
        let platform = Platform::current();

        RuntimeConfig {
            env_root: scripts.join("venv"),
            platform,
            system_interpreter: PathBuf::from(platform.default_system_interpreter()),
            manifest: scripts.join("requirements.txt"),
            model_dir: base.join("model"),
            download_script: scripts.join(DOWNLOAD_SCRIPT),
            train_script: scripts.join(TRAIN_SCRIPT),
            inference_script: scripts.join(INFERENCE_SCRIPT),
            inference_timeout_secs: DEFAULT_INFERENCE_TIMEOUT_SECS,
            download_timeout_secs: None,
            train_timeout_secs: None,
            max_concurrent_inferences: None,
            skip_install: false,
        }
    }

    /// Load a config from a JSON file and validate it.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: RuntimeConfig =
            serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.inference_timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                field: "inference_timeout_secs",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.max_concurrent_inferences == Some(0) {
            return Err(ConfigError::Invalid {
                field: "max_concurrent_inferences",
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    pub fn environment(&self) -> EnvironmentSpec {
        EnvironmentSpec::new(&self.env_root, self.platform)
    }

    pub fn dependency_manifest(&self) -> DependencyManifest {
        DependencyManifest::new(&self.manifest)
    }

    pub fn model_location(&self) -> ModelArtifactLocation {
        ModelArtifactLocation::new(&self.model_dir)
    }

    pub fn inference_timeout(&self) -> Duration {
        Duration::from_secs(self.inference_timeout_secs)
    }

    /// Download and train commands, each receiving the model directory.
    pub fn artifact_steps(&self, env: &EnvironmentSpec) -> ArtifactSteps {
        let model = self.model_location();
        let download = CommandSpec::new(env.interpreter())
            .path_arg(&self.download_script)
            .path_arg(model.dir())
            .maybe_timeout(self.download_timeout_secs.map(Duration::from_secs))
            .echo("download");
        let train = CommandSpec::new(env.interpreter())
            .path_arg(&self.train_script)
            .path_arg(model.dir())
            .maybe_timeout(self.train_timeout_secs.map(Duration::from_secs))
            .echo("train");
        ArtifactSteps { download, train }
    }

    /// Inference command without its prompt argument.
    pub fn inference_command(&self, env: &EnvironmentSpec) -> CommandSpec {
        CommandSpec::new(env.interpreter())
            .path_arg(&self.inference_script)
            .env(MODEL_DIR_ENV, self.model_dir.to_string_lossy())
    }
}
