//! Action Dispatcher: runs the actions attached to a broadcaster's
//! `on_parted_download` / `on_streaming_finished` lists against a freshly
//! produced batch of `StreamData`.

mod command;
mod upload;

pub use command::CommandRunner;
pub use upload::{RcloneUploadService, UploadService};

use chrono::Utc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::domain::{Action, StreamData, UploadConfig, UploadJob};
use crate::error::{Error, Result};

/// Dispatches a single cycle's actions against the StreamData produced by
/// that cycle. Actions run sequentially within one cycle; independence is
/// only guaranteed *across* sessions, not across actions within one.
pub struct ActionDispatcher {
    upload_service: Box<dyn UploadService>,
    command_runner: CommandRunner,
}

impl ActionDispatcher {
    pub fn new(upload_service: Box<dyn UploadService>, command_runner: CommandRunner) -> Self {
        Self {
            upload_service,
            command_runner,
        }
    }

    /// Run every enabled action in `actions` against `items`, in order.
    /// A single action's failure is logged and does not stop the rest —
    /// actions run sequentially within one cycle but are independent
    /// across cycles; the worker loop is the caller's retry boundary, not
    /// this dispatcher.
    pub async fn dispatch_all(&self, actions: &[Action], items: &[StreamData], cancel: &CancellationToken) {
        for action in actions {
            if !action.enabled() {
                continue;
            }
            if let Err(err) = self.dispatch(action, items, cancel).await {
                warn!(error = %err, "action dispatch failed");
            }
        }
    }

    async fn dispatch(&self, action: &Action, items: &[StreamData], cancel: &CancellationToken) -> Result<()> {
        match action {
            Action::Upload { remote_path, extra_args, .. } => {
                let job = UploadJob::new(
                    items.to_vec(),
                    UploadConfig {
                        remote_path: remote_path.clone(),
                        args: extra_args.clone(),
                    },
                    Utc::now().timestamp_millis(),
                );
                self.upload_service.upload(job, cancel).await
            }
            Action::Command { program, .. } => {
                let status = self.command_runner.run(program, cancel).await?;
                info!(program = %program, exit_code = status, "command action finished");
                Ok(())
            }
            Action::Unknown => Err(Error::UnsupportedAction("unknown action variant".to_string())),
        }
    }
}
