use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::{PartedDownloadHook, PlatformPlugin};
use crate::capture::{CaptureInvoker, CaptureRequest};
use crate::domain::{Broadcaster, StreamData};
use crate::error::Result;

/// Huya plugin. Real stream-URL resolution and liveness probing are
/// platform-specific externals; this forwards the broadcaster's configured
/// URL directly to the Capture Invoker.
pub struct HuyaPlugin {
    invoker: Arc<CaptureInvoker>,
    output_root: PathBuf,
}

impl HuyaPlugin {
    pub fn new(invoker: Arc<CaptureInvoker>, output_root: PathBuf) -> Self {
        Self {
            invoker,
            output_root,
        }
    }
}

#[async_trait]
impl PlatformPlugin for HuyaPlugin {
    async fn should_download(&self, broadcaster: &Broadcaster) -> Result<bool> {
        debug!(
            broadcaster_id = %broadcaster.id,
            "huya liveness resolution is an external collaborator; treating configured URL as live"
        );
        Ok(!broadcaster.url.is_empty())
    }

    async fn download(
        &self,
        broadcaster: &Broadcaster,
        on_parted: PartedDownloadHook,
        cancel: &CancellationToken,
    ) -> Result<Vec<StreamData>> {
        let config = broadcaster.download_config.clone().unwrap_or_default();
        let output_path = CaptureRequest::resolve_output_path(
            &self.output_root.join(&broadcaster.id),
            &config.output_path_template,
            &broadcaster.id,
            &config.container,
        );
        let req = CaptureRequest {
            broadcaster_id: broadcaster.id.clone(),
            url: broadcaster.url.clone(),
            headers: config.headers,
            cookies: config.cookies,
            container: config.container,
            segmentation: config.segmentation,
            debug_logging: config.debug_logging,
            output_path,
        };
        self.invoker
            .run(&req, cancel, move |segment| on_parted(segment))
            .await
    }
}
