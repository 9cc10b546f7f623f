//! Centralised tracing initialisation for the daemon.
//!
//! Call [`init_tracing`] once at program start. `RUST_LOG` wins over the
//! level passed in; HTTP client/server internals are kept at `warn` by default.

use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};

/// Log line format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable single lines
    Text,
    /// Newline-delimited JSON, including the current span's fields
    Json,
}

impl LogFormat {
    pub fn from_json_flag(json: bool) -> Self {
        if json {
            LogFormat::Json
        } else {
            LogFormat::Text
        }
    }
}

fn default_directives(level: Level) -> String {
    format!(
        "{},hyper=warn,reqwest=warn",
        level.as_str().to_ascii_lowercase()
    )
}

/// Initialise the global tracing subscriber. Only the first call takes effect.
pub fn init_tracing(format: LogFormat, level: Level) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(level)));

    let fmt_layer = match format {
        LogFormat::Text => fmt::layer().with_target(false).boxed(),
        LogFormat::Json => fmt::layer()
            .with_target(false)
            .json()
            .with_current_span(true)
            .boxed(),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()
        .ok();
}
