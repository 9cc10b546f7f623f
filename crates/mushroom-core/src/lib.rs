//! Mushroom Core - supervision of the external inference runtime
//!
//! Provisions the interpreter environment, makes sure a model artifact is
//! present, and exposes the [`InferenceGateway`] that runs one inference
//! subprocess per prompt.

pub mod artifact;
pub mod bootstrap;
pub mod config;
pub mod error;
pub mod inference;
pub mod metrics;
pub mod obs;
pub mod telemetry;

pub use artifact::{ArtifactManager, ArtifactSteps, ModelArtifactLocation, ModelStatus};
pub use bootstrap::{bootstrap, BootstrapReport, Runtime};
pub use config::{RuntimeConfig, DEFAULT_INFERENCE_TIMEOUT_SECS, MODEL_DIR_ENV};
pub use error::{ArtifactError, BootstrapError, ConfigError, InferError};
pub use inference::{InferenceGateway, InferencePhase};
pub use metrics::METRICS;
pub use telemetry::{init_tracing, LogFormat};

pub use proc_runner::{
    CommandSpec, ProcessError, ProcessOutput, ProcessRunner, Scripted, ScriptedRunner,
    TokioProcessRunner,
};
pub use venv_manager::{EnvironmentSpec, Platform};
