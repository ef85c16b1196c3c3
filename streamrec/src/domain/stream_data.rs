//! `StreamData` — a finalized capture artifact.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A capture artifact produced by the Capture Invoker when a segment is
/// finalized. Never mutated after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamData {
    pub path: PathBuf,
    pub size_bytes: u64,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub broadcaster_id: String,
}
