//! Logging setup
//!
//! Console output goes to stderr so that command lines and reports printed on
//! stdout stay machine-readable. File logging writes JSON lines to a daily
//! rotated file.

use std::io;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::{non_blocking, rolling};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use crate::config::LoggingConfig;

const LOG_FILE_NAME: &str = "dbcm.log";

/// Initialize logging. The returned guard must be kept alive for the file
/// writer to flush.
pub fn init(config: &LoggingConfig) -> Result<Option<WorkerGuard>, Box<dyn std::error::Error>> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))?;

    let console_layer = if config.json_format {
        fmt::layer()
            .json()
            .with_target(true)
            .with_writer(io::stderr)
            .boxed()
    } else {
        fmt::layer()
            .with_target(false)
            .with_level(true)
            .with_ansi(true)
            .with_writer(io::stderr)
            .boxed()
    };

    let mut guard = None;
    let file_layer = if config.file_logging_enabled {
        std::fs::create_dir_all(&config.log_dir)?;
        let file_appender = rolling::daily(&config.log_dir, LOG_FILE_NAME);
        let (writer, file_guard) = non_blocking(file_appender);
        guard = Some(file_guard);

        Some(
            fmt::layer()
                .with_target(true)
                .with_level(true)
                .with_thread_ids(true)
                .with_ansi(false)
                .json()
                .with_writer(writer),
        )
    } else {
        None
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()?;

    tracing::debug!(level = %config.level, "Logging initialized");

    Ok(guard)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_logging_creates_dir() {
        let dir = tempfile::tempdir().unwrap();
        let log_dir = dir.path().join("logs");
        let config = LoggingConfig {
            level: "debug".to_string(),
            log_dir: log_dir.clone(),
            file_logging_enabled: true,
            json_format: false,
        };

        let guard = init(&config).unwrap();
        assert!(guard.is_some());
        assert!(log_dir.is_dir());
    }
}
