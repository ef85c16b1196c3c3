//! The data model: `Broadcaster`, runtime state, `StreamData`, `Action`,
//! `UploadJob`.

mod action;
mod broadcaster;
mod stream_data;
mod upload_job;

pub use action::Action;
pub use broadcaster::{
    Broadcaster, DownloadConfig, Platform, RuntimeState, RuntimeStateSnapshot, SegmentationPolicy,
};
pub use stream_data::StreamData;
pub use upload_job::{UploadConfig, UploadJob};
