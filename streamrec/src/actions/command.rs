//! Runs `CommandAction`'s `program` string as a bare subprocess — tokenized
//! by single spaces, no shell, no quoting (a documented limitation: callers
//! must not embed whitespace inside a single argument). No shell wrapping,
//! variable substitution, or output-dir scanning.

use process_utils::NoWindowExt;
use tokio::select;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::{Error, Result};

pub struct CommandRunner;

impl CommandRunner {
    pub fn new() -> Self {
        Self
    }

    /// Tokenize `program` by single spaces and run it, waiting for exit.
    /// If `cancel` fires first, the child is killed rather than awaited.
    pub async fn run(&self, program: &str, cancel: &CancellationToken) -> Result<i32> {
        let mut parts = program.split(' ').filter(|s| !s.is_empty());
        let binary = parts
            .next()
            .ok_or_else(|| Error::SubprocessSpawn("empty command".to_string()))?;

        let mut cmd = tokio::process::Command::new(binary);
        cmd.args(parts);
        cmd.no_window();

        let mut child = cmd
            .spawn()
            .map_err(|e| Error::SubprocessSpawn(format!("{binary}: {e}")))?;

        select! {
            _ = cancel.cancelled() => {
                debug!(binary, "command action cancelled, killing child");
                let _ = child.kill().await;
                Err(Error::Cancelled)
            }
            status = child.wait() => {
                let status = status.map_err(|e| Error::SubprocessSpawn(e.to_string()))?;
                Ok(status.code().unwrap_or(-1))
            }
        }
    }
}

impl Default for CommandRunner {
    fn default() -> Self {
        Self::new()
    }
}
