//! Platform Plugin interface — the external, named-interface contract the
//! Streamer Worker drives. Real stream-URL resolution and chat-protocol
//! decoding are platform-specific externals; the plugins in this module
//! forward the broadcaster's configured URL straight to the Capture
//! Invoker so the worker state machine is exercisable end to end.

mod douyin;
mod huya;
mod registry;

pub use douyin::DouyinPlugin;
pub use huya::HuyaPlugin;
pub use registry::PlatformRegistry;

use async_trait::async_trait;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::domain::{Broadcaster, StreamData};
use crate::error::Result;

/// A callback invoked once per finalized segment while `download()` is
/// running. Passed at call time rather than stored as a mutable field on
/// the plugin, so a worker recreated after a config reload never leaks a
/// prior run's closure.
pub type PartedDownloadHook = Arc<dyn Fn(StreamData) + Send + Sync>;

/// Contract implemented by each platform-specific plugin.
#[async_trait]
pub trait PlatformPlugin: Send + Sync {
    /// Probe whether the broadcaster is currently live. May perform
    /// network I/O and may fail; callers treat any error as `false`.
    async fn should_download(&self, broadcaster: &Broadcaster) -> Result<bool>;

    /// Drive a capture session to completion, invoking `on_parted` once
    /// per finalized segment. Blocks until the stream ends or capture
    /// fails; callers treat any error as an empty result. `cancel` is the
    /// worker's cancellation token and must be forwarded into the capture
    /// engine so a shutdown mid-capture stops the child gracefully instead
    /// of abandoning it.
    async fn download(
        &self,
        broadcaster: &Broadcaster,
        on_parted: PartedDownloadHook,
        cancel: &CancellationToken,
    ) -> Result<Vec<StreamData>>;
}
