//! Logging and tracing initialization.
//!
//! The level is controlled by the `RUST_LOG` environment variable:
//!
//! ```bash
//! RUST_LOG=debug tessera token chain 42
//! RUST_LOG=tessera_core=debug,sqlx=warn tessera db migrate
//! ```
//!
//! Every `init_*` function installs a global subscriber and panics if one is
//! already installed. Call exactly one of them, once, at startup, or use
//! [`try_init_logging`] to get an error instead.

use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::{EnvFilter, Layer, Registry, layer::SubscriberExt};

use crate::config::Config;

/// Shape of each log line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Compact single-line output
    #[default]
    Text,
    /// Multi-line output with thread ids and line numbers, for development
    Pretty,
    /// One JSON object per line, for log aggregation
    Json,
}

impl LogFormat {
    /// Map a `LOG_FORMAT` value; anything unrecognised is `Text`.
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "json" => LogFormat::Json,
            "pretty" => LogFormat::Pretty,
            _ => LogFormat::Text,
        }
    }

    fn layer(self) -> Box<dyn Layer<Registry> + Send + Sync> {
        let fmt = tracing_subscriber::fmt::layer();
        match self {
            LogFormat::Text => fmt.boxed(),
            LogFormat::Pretty => fmt
                .pretty()
                .with_line_number(true)
                .with_thread_ids(true)
                .with_target(true)
                .boxed(),
            LogFormat::Json => fmt.json().boxed(),
        }
    }
}

/// Install the global subscriber. `RUST_LOG` wins over `default_level`.
pub fn try_init_logging(format: LogFormat, default_level: &str) -> Result<(), TryInitError> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(format.layer())
        .with(filter)
        .try_init()
}

fn init(format: LogFormat, default_level: &str) {
    if let Err(e) = try_init_logging(format, default_level) {
        panic!("failed to install tracing subscriber: {}", e);
    }
}

/// Initialize logging with sensible defaults (`info` unless `RUST_LOG` is set).
pub fn init_logging() {
    init(LogFormat::Text, "info");
}

/// Initialize logging with a specific default level.
pub fn init_logging_with_level(level: &str) {
    init(LogFormat::Text, level);
}

/// Initialize pretty-formatted logging (recommended for development).
pub fn init_logging_pretty() {
    init(LogFormat::Pretty, "info");
}

/// Initialize JSON-formatted logging (recommended for production).
pub fn init_logging_json() {
    init(LogFormat::Json, "info");
}

/// Initialize logging in the format selected by `LOG_FORMAT`.
pub fn init_logging_for(config: &Config) {
    init(LogFormat::from_name(&config.log_format), "info");
}
