// Logging setup.
// Routes tracing output to a rolling file, since stdout belongs to the terminal UI.

use std::fs;
use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::error::{Result, ShelfError};

const LOG_FILE_PREFIX: &str = "shelf.log";

/// Build the log filter: `RUST_LOG` wins, otherwise the configured level for this crate.
pub fn filter(config: &Config) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("shelf={}", config.log_level)))
}

/// Install the global subscriber writing daily-rolled files into `log_dir`.
/// Keep the returned guard alive until exit so buffered lines are flushed.
pub fn init(config: &Config, log_dir: &Path) -> Result<WorkerGuard> {
    fs::create_dir_all(log_dir)?;

    let appender = tracing_appender::rolling::daily(log_dir, LOG_FILE_PREFIX);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    tracing_subscriber::registry()
        .with(filter(config))
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(writer),
        )
        .try_init()
        .map_err(|e| ShelfError::Other(format!("failed to install logger: {}", e)))?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        log_dir = %log_dir.display(),
        "logging initialized"
    );
    Ok(guard)
}
