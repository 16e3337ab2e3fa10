use std::path::Path;

use anyhow::{Context, Result};
use file_rotate::{compression::Compression, suffix::AppendCount, ContentLimit, FileRotate};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Env var consulted for the tracing filter, e.g. `LADLE_LOG=ladle=debug`.
pub const LOG_ENV: &str = "LADLE_LOG";
const DEFAULT_FILTER: &str = "ladle=info,sqlx=warn";

const LOG_BASENAME: &str = "ladle.log";
const LOG_MAX_BYTES: usize = 5 * 1024 * 1024;
const LOG_KEEP_FILES: usize = 5;

/// Keeps the non-blocking file writer alive; dropping it flushes and stops
/// the background thread. Hold it for the life of the process.
pub struct LogGuard {
    _file: Option<WorkerGuard>,
}

/// Install the global subscriber: human-readable stdout plus, when
/// `logs_dir` is given, size-rotated JSON lines on disk.
pub fn init(logs_dir: Option<&Path>) -> Result<LogGuard> {
    let _ = tracing_log::LogTracer::init();

    let filter =
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let stdout_layer = fmt::layer()
        .with_target(true)
        .with_timer(fmt::time::UtcTime::rfc_3339());

    let mut file_guard = None;
    let file_layer = match logs_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("create logs dir {}", dir.display()))?;
            let rotate = FileRotate::new(
                dir.join(LOG_BASENAME),
                AppendCount::new(LOG_KEEP_FILES),
                ContentLimit::Bytes(LOG_MAX_BYTES),
                Compression::None,
                None,
            );
            let (writer, guard) = tracing_appender::non_blocking(rotate);
            file_guard = Some(guard);
            Some(
                fmt::layer()
                    .json()
                    .with_ansi(false)
                    .with_target(true)
                    .with_timer(fmt::time::UtcTime::rfc_3339())
                    .with_writer(writer),
            )
        }
        None => None,
    };

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(stdout_layer)
        .with(file_layer)
        .try_init();

    Ok(LogGuard { _file: file_guard })
}
