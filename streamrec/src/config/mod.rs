//! Configuration loading: a TOML file, default `streamrec.toml`,
//! overridable via `STREAMREC_CONFIG`. A load-from-file-with-env-override
//! shape using `serde` + `toml` directly, with no persistence, REST
//! mutation, or change-broadcasting layer.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::domain::Broadcaster;
use crate::error::{Error, Result};

const DEFAULT_CONFIG_PATH: &str = "streamrec.toml";
const CONFIG_PATH_ENV_VAR: &str = "STREAMREC_CONFIG";

fn default_max_download_retries() -> u32 {
    5
}

fn default_download_retry_delay_seconds() -> u64 {
    10
}

fn default_capture_engine_path() -> String {
    "ffmpeg".to_string()
}

fn default_output_root() -> PathBuf {
    PathBuf::from("./recordings")
}

#[derive(Debug, Clone, Deserialize)]
pub struct RootConfig {
    #[serde(default)]
    pub streamers: Vec<Broadcaster>,
    #[serde(default = "default_max_download_retries")]
    pub max_download_retries: u32,
    #[serde(default = "default_download_retry_delay_seconds")]
    pub download_retry_delay_seconds: u64,
    #[serde(default = "default_capture_engine_path")]
    pub capture_engine_path: String,
    #[serde(default = "default_output_root")]
    pub output_root: PathBuf,
}

impl RootConfig {
    /// Resolve the config path (`STREAMREC_CONFIG` env var, else
    /// `streamrec.toml`) and load it.
    pub fn load() -> Result<Self> {
        let path = std::env::var(CONFIG_PATH_ENV_VAR).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        Self::load_from(Path::new(&path))
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| Error::Configuration(format!("reading {}: {e}", path.display())))?;
        toml::from_str(&contents).map_err(|e| Error::Configuration(format!("parsing {}: {e}", path.display())))
    }
}
