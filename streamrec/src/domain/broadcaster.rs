//! Broadcaster configuration entity and runtime state.

use serde::{Deserialize, Serialize};

use super::action::Action;
use super::stream_data::StreamData;

/// Closed (but extensible) set of supported streaming platforms.
///
/// Unrecognized tags deserialize to `Unknown` rather than failing parsing,
/// so a bad config surfaces as a clean `Error::UnknownPlatform` at worker
/// construction time instead of a config-load error.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Platform {
    Huya,
    Douyin,
    #[serde(other)]
    Unknown,
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Platform::Huya => write!(f, "HUYA"),
            Platform::Douyin => write!(f, "DOUYIN"),
            Platform::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

/// Segmentation policy. `enabled` selects between two entirely different
/// argv shapes: when enabled, `segment_time_seconds` (or the 7200s
/// default) drives `-f segment`/`-segment_time`, and `segment_part_bytes`
/// is ignored with a debug diagnostic. When disabled, `segment_time_seconds`
/// becomes a single-file stop time (`-to`) and `segment_part_bytes`
/// becomes a single-file max size (`-fs`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SegmentationPolicy {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub segment_part_bytes: Option<i64>,
    #[serde(default)]
    pub segment_time_seconds: Option<i64>,
}

impl SegmentationPolicy {
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Effective segment time in seconds, defaulting to 7200 (2h) when
    /// segmentation is enabled but no explicit time was given.
    pub fn effective_segment_time(&self) -> i64 {
        self.segment_time_seconds.unwrap_or(7200)
    }

    /// Whether `segment_part_bytes` is being overridden by time-based
    /// segmentation: time wins, and the override is recorded with a debug
    /// diagnostic.
    pub fn part_bytes_overridden(&self) -> bool {
        self.enabled && self.segment_part_bytes.is_some()
    }
}

/// Download-specific configuration for a broadcaster.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DownloadConfig {
    /// Ordered header list — a `Vec`, not a map, so argv construction is
    /// deterministic and matches the order the broadcaster was configured
    /// with.
    #[serde(default)]
    pub headers: Vec<(String, String)>,
    #[serde(default)]
    pub cookies: Option<String>,
    #[serde(default = "default_container")]
    pub container: String,
    #[serde(default)]
    pub segmentation: SegmentationPolicy,
    #[serde(default = "default_output_path_template")]
    pub output_path_template: String,
    #[serde(default)]
    pub on_parted_download: Vec<Action>,
    #[serde(default)]
    pub on_streaming_finished: Vec<Action>,
    #[serde(default)]
    pub debug_logging: bool,
}

fn default_container() -> String {
    "mp4".to_string()
}

fn default_output_path_template() -> String {
    "%streamer_id%/%Y%m%d-%H%M%S".to_string()
}

/// A configured broadcaster (read-only to the core).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Broadcaster {
    pub id: String,
    pub name: String,
    pub platform: Platform,
    pub url: String,
    #[serde(default = "default_true")]
    pub activated: bool,
    #[serde(default)]
    pub download_config: Option<DownloadConfig>,
}

fn default_true() -> bool {
    true
}

/// Runtime broadcaster state owned by a single Streamer Worker — never
/// shared across workers.
#[derive(Debug, Default)]
pub struct RuntimeState {
    pub is_live: bool,
    pub retry_count: u32,
    pub collected: Vec<StreamData>,
}

/// Point-in-time snapshot of [`RuntimeState`] for logging/diagnostics,
/// without exposing the live mutable state.
#[derive(Debug, Clone, Copy)]
pub struct RuntimeStateSnapshot {
    pub is_live: bool,
    pub retry_count: u32,
    pub collected_count: usize,
}

impl RuntimeState {
    pub fn snapshot(&self) -> RuntimeStateSnapshot {
        RuntimeStateSnapshot {
            is_live: self.is_live,
            retry_count: self.retry_count,
            collected_count: self.collected.len(),
        }
    }
}
