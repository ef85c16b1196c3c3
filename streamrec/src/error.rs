//! Application-wide error types.

use thiserror::Error;

/// Application-wide result type.
pub type Result<T> = std::result::Result<T, Error>;

/// Application-wide error type.
#[derive(Error, Debug)]
pub enum Error {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("unknown platform: {0}")]
    UnknownPlatform(String),

    #[error("platform plugin error: {0}")]
    Platform(String),

    #[error("capture engine spawn failed: {0}")]
    CaptureSpawn(String),

    #[error("capture engine exited with status {0}")]
    CaptureExit(i32),

    #[error("unsupported action variant: {0}")]
    UnsupportedAction(String),

    #[error("subprocess spawn failed: {0}")]
    SubprocessSpawn(String),

    #[error("upload rejected: {0}")]
    UploadRejected(String),

    #[error("operation was cancelled")]
    Cancelled,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

impl Error {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    pub fn unknown_platform(tag: impl Into<String>) -> Self {
        Self::UnknownPlatform(tag.into())
    }

    pub fn platform(msg: impl Into<String>) -> Self {
        Self::Platform(msg.into())
    }

    pub fn other(msg: impl Into<String>) -> Self {
        Self::Other(msg.into())
    }
}
