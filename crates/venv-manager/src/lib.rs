//! venv-manager: isolated interpreter environments
//!
//! This crate owns the on-disk interpreter environment the inference
//! scripts run in. It creates the environment when it is absent and
//! installs the declared dependencies into it.
//!
//! ## Layer 1 - Environment/Tooling
//!
//! Focus: deterministic interpreter path resolution and fail-fast startup.

pub mod error;
pub mod install;
pub mod provision;
pub mod spec;

pub use error::{InstallError, ProvisionError};
pub use install::{DependencyInstaller, DependencyManifest};
pub use provision::{ProvisionOutcome, Provisioner};
pub use spec::{EnvironmentSpec, Platform};
