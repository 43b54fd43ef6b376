//! File logging. The console owns the terminal, so nothing is written to stdout.

use anyhow::Result;
use std::path::Path;
use tracing_appender::{
    non_blocking::WorkerGuard,
    rolling::{RollingFileAppender, Rotation},
};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

const LOG_FILE_PREFIX: &str = "cadence";
pub const DEFAULT_FILTER: &str = "cadence=debug,warn";

/// Log to `dir/cadence.YYYY-MM-DD` with daily rotation.
///
/// `RUST_LOG` wins over `filter`, which wins over `DEFAULT_FILTER`. The returned
/// guard flushes pending lines on drop and must outlive every log call.
pub fn init_logging(dir: &Path, filter: Option<&str>) -> Result<WorkerGuard> {
    if !dir.exists() {
        std::fs::create_dir_all(dir)?;
    }

    let file_appender = RollingFileAppender::new(Rotation::DAILY, dir, LOG_FILE_PREFIX);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(filter.unwrap_or(DEFAULT_FILTER)))
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let fmt_layer = fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_target(true)
        .with_thread_names(true);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init()?;

    tracing::info!(dir = %dir.display(), "Logging initialized");

    Ok(guard)
}
