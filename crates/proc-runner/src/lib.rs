//! proc-runner: the shared subprocess primitive
//!
//! Every external step of the runtime (environment creation, package
//! installation, model download and training, inference) goes through the
//! [`ProcessRunner`] trait defined here.
//!
//! ## Layer 0 - Process execution
//!
//! Focus: no pipe-buffer deadlocks, bounded waits, no leaked children.

pub mod command;
pub mod error;
pub mod fakes;
pub mod runner;

pub use command::{CommandSpec, ProcessOutput};
pub use error::ProcessError;
pub use fakes::{Scripted, ScriptedRunner};
pub use runner::{ProcessRunner, TokioProcessRunner, DRAIN_GRACE};

/// Result type for proc-runner operations
pub type Result<T> = std::result::Result<T, ProcessError>;
