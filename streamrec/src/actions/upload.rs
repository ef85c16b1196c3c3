//! Upload Service: accepts an `UploadJob` and returns only upon completion.
//! Reduced to the single `upload()` contract the dispatcher needs —
//! job-queue persistence, processor typing, and chained-output bookkeeping
//! are all out of scope.

use async_trait::async_trait;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::domain::UploadJob;
use crate::error::{Error, Result};

/// A collaborator that durably ships a completed upload job somewhere.
/// Must be safe for concurrent submission from every Streamer Worker.
/// `cancel` firing mid-upload must abort the in-flight submission rather
/// than let it run to completion.
#[async_trait]
pub trait UploadService: Send + Sync {
    async fn upload(&self, job: UploadJob, cancel: &CancellationToken) -> Result<()>;
}

/// Uploads each item in a job via `rclone copy`, one subprocess per item,
/// with exponential backoff retry.
pub struct RcloneUploadService {
    rclone_path: String,
    max_retries: u32,
}

impl RcloneUploadService {
    pub fn new(rclone_path: impl Into<String>) -> Self {
        Self {
            rclone_path: rclone_path.into(),
            max_retries: 3,
        }
    }

    async fn upload_one(
        &self,
        local_path: &str,
        remote_path: &str,
        extra_args: &[String],
        cancel: &CancellationToken,
    ) -> Result<()> {
        let mut last_error = None;

        for attempt in 0..self.max_retries {
            if attempt > 0 {
                tokio::select! {
                    _ = cancel.cancelled() => return Err(Error::Cancelled),
                    _ = tokio::time::sleep(Duration::from_secs(2u64.pow(attempt))) => {}
                }
            }

            let mut cmd = process_utils::tokio_command(&self.rclone_path);
            cmd.arg("copy")
                .arg("--progress")
                .arg(local_path)
                .arg(remote_path)
                .args(extra_args)
                .stdout(Stdio::null())
                .stderr(Stdio::piped());

            let mut child = match cmd.spawn() {
                Ok(c) => c,
                Err(e) => {
                    last_error = Some(format!("failed to spawn rclone: {e}"));
                    continue;
                }
            };

            if let Some(stderr) = child.stderr.take() {
                tokio::spawn(async move {
                    let mut lines = BufReader::new(stderr).lines();
                    while let Ok(Some(line)) = lines.next_line().await {
                        debug!(target: "rclone", "{line}");
                    }
                });
            }

            let status = tokio::select! {
                _ = cancel.cancelled() => {
                    debug!(local_path, "upload cancelled, killing rclone");
                    let _ = child.kill().await;
                    return Err(Error::Cancelled);
                }
                status = child.wait() => match status {
                    Ok(s) => s,
                    Err(e) => {
                        last_error = Some(format!("failed to wait on rclone: {e}"));
                        continue;
                    }
                },
            };

            if status.success() {
                info!(local_path, remote_path, "upload finished");
                return Ok(());
            }
            last_error = Some(format!("rclone exited with {}", status.code().unwrap_or(-1)));
        }

        Err(Error::UploadRejected(
            last_error.unwrap_or_else(|| "upload failed".to_string()),
        ))
    }
}

#[async_trait]
impl UploadService for RcloneUploadService {
    async fn upload(&self, job: UploadJob, cancel: &CancellationToken) -> Result<()> {
        for item in &job.items {
            let local_path = item.path.to_string_lossy().to_string();
            if let Err(err) = self
                .upload_one(&local_path, &job.config.remote_path, &job.config.args, cancel)
                .await
            {
                warn!(error = %err, local_path, "upload item failed");
                return Err(err);
            }
        }
        Ok(())
    }
}
