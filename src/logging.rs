use std::path::Path;

use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{LoggingConfig, DEFAULT_LOG_LEVEL};

pub const LOG_FILE_NAME: &str = "curriculum.log";

/// Flushes the file writer on drop; hold it for the life of the process.
pub struct FileLogGuard {
    _guard: WorkerGuard,
}

/// Filter for `level`, falling back to the default level when it does not parse.
pub fn env_filter(level: &str) -> EnvFilter {
    EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_LEVEL))
}

/// Non-blocking daily appender under `dir`, or `None` when the directory
/// cannot be created.
fn file_writer(dir: &Path) -> Option<(NonBlocking, WorkerGuard)> {
    if let Err(err) = std::fs::create_dir_all(dir) {
        eprintln!("file logging disabled, cannot create {}: {err}", dir.display());
        return None;
    }
    let appender = RollingFileAppender::new(Rotation::DAILY, dir, LOG_FILE_NAME);
    Some(tracing_appender::non_blocking(appender))
}

pub fn init_tracing(config: &LoggingConfig) -> Option<FileLogGuard> {
    let (file_layer, guard) = match config.file_dir.as_deref().and_then(file_writer) {
        Some((writer, guard)) => (
            Some(
                fmt::layer()
                    .with_writer(writer)
                    .with_ansi(false)
                    .with_target(true),
            ),
            Some(FileLogGuard { _guard: guard }),
        ),
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(env_filter(&config.level))
        .with(fmt::layer().with_target(true))
        .with(file_layer)
        .init();

    if let (Some(dir), Some(_)) = (&config.file_dir, &guard) {
        tracing::info!(dir = %dir.display(), file = LOG_FILE_NAME, "file logging enabled");
    }
    guard
}
