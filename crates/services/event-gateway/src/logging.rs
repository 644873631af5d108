//! Log destination setup
//!
//! Installs the global `tracing` subscriber. Output goes to stdout when the
//! configured destination is `stdout`, otherwise it is appended to the
//! configured file through a mutex-guarded writer shared by all request tasks.

use std::fs::OpenOptions;
use std::sync::Mutex;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{Config, ConfigError};

const DEFAULT_FILTER: &str = "info,tower_http=debug";

/// Install the global subscriber for `config.log_file`
pub fn init_tracing(config: &Config) -> Result<(), ConfigError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_FILTER.into());

    if config.logs_to_stdout() {
        return tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .try_init()
            .map_err(|e| ConfigError::Logging(e.to_string()));
    }

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&config.log_file)
        .map_err(|e| ConfigError::LogFile(format!("{}: {}", config.log_file, e)))?;

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(Mutex::new(file)),
        )
        .try_init()
        .map_err(|e| ConfigError::Logging(e.to_string()))
}
