use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use super::{DouyinPlugin, HuyaPlugin, PlatformPlugin};
use crate::capture::CaptureInvoker;
use crate::domain::Platform;
use crate::error::{Error, Result};

/// Maps a broadcaster's `Platform` tag to its plugin. An unrecognized
/// platform is fatal at worker construction time, not a silently-skipped
/// broadcaster.
pub struct PlatformRegistry {
    plugins: HashMap<Platform, Arc<dyn PlatformPlugin>>,
}

impl PlatformRegistry {
    /// Build the registry with the two in-repo plugins, each sharing the
    /// same `CaptureInvoker` and writing under `output_root/<platform>`.
    pub fn new(invoker: Arc<CaptureInvoker>, output_root: PathBuf) -> Self {
        let mut plugins: HashMap<Platform, Arc<dyn PlatformPlugin>> = HashMap::new();
        plugins.insert(
            Platform::Huya,
            Arc::new(HuyaPlugin::new(invoker.clone(), output_root.join("huya"))),
        );
        plugins.insert(
            Platform::Douyin,
            Arc::new(DouyinPlugin::new(invoker, output_root.join("douyin"))),
        );
        Self { plugins }
    }

    pub fn resolve(&self, platform: &Platform) -> Result<Arc<dyn PlatformPlugin>> {
        self.plugins
            .get(platform)
            .cloned()
            .ok_or_else(|| Error::UnknownPlatform(platform.to_string()))
    }
}
