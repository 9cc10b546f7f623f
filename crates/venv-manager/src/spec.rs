//! Environment descriptor and platform-dependent path resolution.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Host platform family, as far as environment layout is concerned
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    /// `Scripts/python.exe`
    Windows,
    /// `bin/python`
    Unix,
}

impl Platform {
    /// Platform of the running host.
    pub fn current() -> Self {
        Self::from_os(std::env::consts::OS)
    }

    /// Classify an operating system name (`std::env::consts::OS` style).
    pub fn from_os(os: &str) -> Self {
        if os.to_ascii_lowercase().contains("win") && !os.eq_ignore_ascii_case("darwin") {
            Platform::Windows
        } else {
            Platform::Unix
        }
    }

    /// Interpreter location relative to an environment root.
    pub fn interpreter_subpath(&self) -> &'static str {
        match self {
            Platform::Windows => "Scripts/python.exe",
            Platform::Unix => "bin/python",
        }
    }

    /// Name of the system interpreter used to create environments.
    pub fn default_system_interpreter(&self) -> &'static str {
        match self {
            Platform::Windows => "python",
            Platform::Unix => "python3",
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Platform::Windows => write!(f, "windows"),
            Platform::Unix => write!(f, "unix"),
        }
    }
}

/// An isolated interpreter environment on disk.
///
/// The interpreter path is always derived from the root and the platform;
/// construct through [`EnvironmentSpec::new`] and pass by reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentSpec {
    root: PathBuf,
    interpreter: PathBuf,
    platform: Platform,
}

impl EnvironmentSpec {
    pub fn new(root: impl Into<PathBuf>, platform: Platform) -> Self {
        let root = root.into();
        let interpreter = root.join(platform.interpreter_subpath());
        EnvironmentSpec {
            root,
            interpreter,
            platform,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The environment's own interpreter.
    pub fn interpreter(&self) -> &Path {
        &self.interpreter
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }
}
