//! Logging setup and configuration.

use std::path::Path;

use tracing_appender::rolling::RollingFileAppender;
use tracing_appender::rolling::Rotation;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::error::AggregatorError;

/// Sets up logging with console output and, if `logs_dir` is given, a
/// daily-rotated log file.
///
/// Intended for host applications embedding the aggregator; the library
/// itself only emits `tracing` events and never installs a subscriber on
/// its own.
pub fn setup_logging(logs_dir: Option<&Path>) -> Result<(), AggregatorError> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("crier=info"));

    let registry = tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_writer(std::io::stdout).with_ansi(true));

    match logs_dir {
        Some(dir) => {
            let file_appender = RollingFileAppender::builder()
                .rotation(Rotation::DAILY)
                .filename_prefix("crier")
                .filename_suffix("log")
                .max_log_files(7)
                .build(dir)
                .map_err(|e| AggregatorError::LoggingSetup {
                    msg: format!(
                        "Failed to initialize rolling file appender at '{}': {}",
                        dir.to_string_lossy(),
                        e
                    ),
                })?;
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

            // Leak the guard so the writer thread outlives this call
            std::mem::forget(guard);

            registry
                .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
                .try_init()
        }
        None => registry.try_init(),
    }
    .map_err(|e| AggregatorError::LoggingSetup {
        msg: format!("Failed to install tracing subscriber: {e}"),
    })
}
