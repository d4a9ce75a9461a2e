//! Installs the process-wide `tracing` subscriber for a node.
//!
//! The format comes from [`NodeConfig::log_format`](crate::NodeConfig):
//! plain text for a terminal, or one JSON object per event when the output
//! is shipped somewhere else. `RUST_LOG` wins over the configured level when
//! it is set, so a single crate can be turned up without touching the file.

use serde::{Deserialize, Serialize};
use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// How log events are rendered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Readable lines with ANSI colour.
    #[default]
    Human,
    /// One JSON object per line.
    Json,
}

/// Initialise the global tracing subscriber.
///
/// # Panics
///
/// Panics if a global subscriber has already been set (i.e. this function
/// was called twice in the same process). Use [`try_init_logging`] where
/// that can happen, such as tests.
pub fn init_logging(format: LogFormat, level: &str) {
    if let Err(e) = try_init_logging(format, level) {
        panic!("failed to install tracing subscriber: {e}");
    }
}

/// Like [`init_logging`], but reports an already-installed subscriber as an error.
pub fn try_init_logging(format: LogFormat, level: &str) -> Result<(), TryInitError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    match format {
        LogFormat::Human => tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true).with_thread_ids(true))
            .try_init(),
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_target(true).with_thread_ids(true))
            .try_init(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_install_is_reported_not_panicking() {
        let config = crate::NodeConfig::default();
        let _ = try_init_logging(config.log_format, &config.log_level);
        assert!(try_init_logging(LogFormat::Json, "info").is_err());
    }
}
