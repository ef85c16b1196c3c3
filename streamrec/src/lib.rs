//! Streamer Supervision and Capture Scheduler.
//!
//! Supervises a configured set of broadcasters, polling each for
//! liveness, capturing live streams via an external capture engine, and
//! running post-processing actions (upload, arbitrary command) against
//! the results.

pub mod actions;
pub mod capture;
pub mod config;
pub mod domain;
pub mod error;
pub mod logging;
pub mod platform;
pub mod supervisor;
pub mod worker;

pub use error::{Error, Result};
