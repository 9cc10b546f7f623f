//! Command-line interface definitions.

use clap::{Args, Parser, Subcommand};
use mushroom_core::{ConfigError, RuntimeConfig};
use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "mushroomd")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Bootstraps the Mushroom AI runtime and serves it over HTTP", long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Provision the runtime, then serve the chat API
    Serve {
        #[command(flatten)]
        runtime: RuntimeArgs,

        /// Address to listen on
        #[arg(long, env = "MUSHROOM_LISTEN", default_value = "127.0.0.1:8080")]
        listen: SocketAddr,
    },

    /// Provision environment, dependencies and model, then exit
    Provision {
        #[command(flatten)]
        runtime: RuntimeArgs,
    },

    /// Send prompts read from stdin to a running server
    Chat {
        /// Server root URL
        #[arg(long, env = "MUSHROOM_URL", default_value = "http://127.0.0.1:8080")]
        url: String,

        /// Per-request timeout in seconds
        #[arg(long, default_value_t = 120)]
        timeout: u64,
    },
}

/// Options shared by every command that provisions the runtime.
#[derive(Args, Debug, Clone)]
pub struct RuntimeArgs {
    /// Base directory holding `python/` and `model/`
    #[arg(long, env = "MUSHROOM_BASE_DIR", default_value = "server")]
    pub base_dir: PathBuf,

    /// JSON config file; replaces the base-directory layout
    #[arg(long, env = "MUSHROOM_CONFIG")]
    pub config: Option<PathBuf>,

    /// System interpreter used to create the environment
    #[arg(long, env = "MUSHROOM_PYTHON")]
    pub python: Option<PathBuf>,

    /// Inference deadline in seconds
    #[arg(long, env = "MUSHROOM_INFERENCE_TIMEOUT")]
    pub inference_timeout: Option<u64>,

    /// Cap on inference subprocesses running at once
    #[arg(long, env = "MUSHROOM_MAX_CONCURRENT")]
    pub max_concurrent: Option<usize>,

    /// Skip dependency installation
    #[arg(long, env = "MUSHROOM_SKIP_INSTALL")]
    pub skip_install: bool,
}

impl RuntimeArgs {
    /// Build the runtime config: file or layout first, then flag overrides.
    pub fn resolve(&self) -> Result<RuntimeConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => RuntimeConfig::load(path)?,
            None => RuntimeConfig::from_base_dir(&self.base_dir),
        };

        if let Some(python) = &self.python {
            config.system_interpreter = python.clone();
        }
        if let Some(secs) = self.inference_timeout {
            config.inference_timeout_secs = secs;
        }
        if let Some(n) = self.max_concurrent {
            config.max_concurrent_inferences = Some(n);
        }
        if self.skip_install {
            config.skip_install = true;
        }

        config.validate()?;
        Ok(config)
    }
}
