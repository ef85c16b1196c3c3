//! Logging initialization: a static `tracing` subscriber, since there is
//! no WebSocket log-streaming API to feed here.

use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

pub const DEFAULT_LOG_FILTER: &str = "streamrec=info";

/// Initialize the global `tracing` subscriber: console output plus a
/// daily-rotated file under `log_dir`. The returned `WorkerGuard` must be
/// held for the process lifetime or the file writer drops buffered lines.
pub fn init_logging(log_dir: &Path) -> crate::error::Result<WorkerGuard> {
    std::fs::create_dir_all(log_dir)?;

    let file_appender = tracing_appender::rolling::daily(log_dir, "streamrec.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_ansi(true))
        .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
        .try_init()
        .map_err(|e| crate::error::Error::Other(format!("failed to install global subscriber: {e}")))?;

    Ok(guard)
}
