//! File-based logging. The terminal belongs to the UI, so nothing is written
//! to stdout or stderr once the screen is up.

use std::path::Path;
use std::str::FromStr;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::filter::{LevelFilter, Targets};
use tracing_subscriber::{fmt, prelude::*};

use crate::error::{AppError, Result};

/// Rolling log files kept on disk.
const MAX_LOG_FILES: usize = 14;

/// Parse a level name, falling back to `INFO` for unknown values.
pub fn parse_level(level: &str) -> LevelFilter {
    LevelFilter::from_str(level).unwrap_or(LevelFilter::INFO)
}

/// Install the global subscriber writing daily-rotated files into `dir`.
///
/// The returned guard must be kept alive for buffered lines to be flushed.
pub fn init(dir: &Path, level: &str) -> Result<WorkerGuard> {
    std::fs::create_dir_all(dir)?;
    let appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .max_log_files(MAX_LOG_FILES)
        .filename_prefix("invtree")
        .filename_suffix("log")
        .build(dir)
        .map_err(|e| AppError::Config(format!("log file in {}: {}", dir.display(), e)))?;
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let filter = Targets::new()
        .with_default(parse_level(level))
        .with_target("hyper", LevelFilter::WARN)
        .with_target("reqwest", LevelFilter::WARN);

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_filter(filter),
        )
        .try_init()
        .map_err(|e| AppError::Config(format!("logging already initialized: {}", e)))?;

    Ok(guard)
}
