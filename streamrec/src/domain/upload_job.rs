//! `UploadJob` — the unit of work handed to the Upload Service.

use serde::{Deserialize, Serialize};

use super::stream_data::StreamData;

/// Configuration carried alongside an upload job's items.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    pub remote_path: String,
    pub args: Vec<String>,
}

/// A job handed to the Upload Service. `id == 0` denotes "not yet
/// persisted" — the Upload Service assigns identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadJob {
    pub id: u64,
    pub created_at_millis: i64,
    pub items: Vec<StreamData>,
    pub config: UploadConfig,
}

impl UploadJob {
    /// Synthesize a new, not-yet-persisted upload job.
    pub fn new(items: Vec<StreamData>, config: UploadConfig, created_at_millis: i64) -> Self {
        Self {
            id: 0,
            created_at_millis,
            items,
            config,
        }
    }
}
