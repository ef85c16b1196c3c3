//! streamrec — Streamer Supervision and Capture Scheduler binary entrypoint.

use std::sync::Arc;

use streamrec::actions::{ActionDispatcher, CommandRunner, RcloneUploadService};
use streamrec::capture::CaptureInvoker;
use streamrec::config::RootConfig;
use streamrec::logging::init_logging;
use streamrec::platform::PlatformRegistry;
use streamrec::supervisor::Supervisor;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let log_dir = std::env::var("LOG_DIR").unwrap_or_else(|_| "logs".to_string());
    let _guard =
        init_logging(std::path::Path::new(&log_dir)).map_err(|e| anyhow::anyhow!("failed to initialize logging: {e}"))?;

    info!("starting streamrec v{}", env!("CARGO_PKG_VERSION"));

    let config = RootConfig::load().map_err(|e| anyhow::anyhow!("failed to load config: {e}"))?;
    info!(broadcasters = config.streamers.len(), "config loaded");

    let invoker = Arc::new(CaptureInvoker::new(config.capture_engine_path.clone()));
    let registry = Arc::new(PlatformRegistry::new(invoker, config.output_root.clone()));

    let rclone_path = std::env::var("RCLONE_PATH").unwrap_or_else(|_| "rclone".to_string());
    let dispatcher = Arc::new(ActionDispatcher::new(
        Box::new(RcloneUploadService::new(rclone_path)),
        CommandRunner::new(),
    ));

    let supervisor = Supervisor::new(
        registry,
        dispatcher,
        config.max_download_retries,
        config.download_retry_delay_seconds,
    );

    let cancel = CancellationToken::new();
    let supervisor_cancel = cancel.clone();
    let streamers = config.streamers.clone();
    let supervisor_handle = tokio::spawn(async move { supervisor.run(streamers, supervisor_cancel).await });

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("received SIGINT, shutting down");
        }
        _ = wait_for_sigterm() => {
            info!("received SIGTERM, shutting down");
        }
    }

    cancel.cancel();
    if let Err(err) = supervisor_handle.await {
        error!(error = %err, "supervisor task panicked during shutdown");
    }

    info!("streamrec shutdown complete");
    Ok(())
}

#[cfg(unix)]
async fn wait_for_sigterm() {
    use tokio::signal::unix::{SignalKind, signal};
    let mut sigterm = signal(SignalKind::terminate()).expect("failed to register SIGTERM handler");
    sigterm.recv().await;
}

#[cfg(not(unix))]
async fn wait_for_sigterm() {
    std::future::pending::<()>().await;
}
