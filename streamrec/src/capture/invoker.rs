//! Capture Invoker: translates a download request into a Capture Engine
//! child-process invocation, parses its progress output, and returns the
//! finalized `StreamData` list.

use chrono::Utc;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::filename::expand_output_path_template;
use super::parser::{is_progress_line, parse_bitrate, parse_segment_start, parse_size_kb};
use crate::domain::{SegmentationPolicy, StreamData};
use crate::error::{Error, Result};

const NETWORK_TIMEOUT_MICROS: &str = "20000000";
const GRACEFUL_STOP_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(10);

/// A single `download()` request, fully resolved from `Broadcaster` +
/// `DownloadConfig` — no config lookups happen inside the invoker.
///
/// `output_path` is resolved once by the caller (the template is expanded
/// against "now" at request-construction time) rather than recomputed
/// inside the invoker, so the same request always yields a byte-identical
/// argv array instead of drifting if expansion straddled a clock tick.
#[derive(Debug, Clone)]
pub struct CaptureRequest {
    pub broadcaster_id: String,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub cookies: Option<String>,
    pub container: String,
    pub segmentation: SegmentationPolicy,
    pub debug_logging: bool,
    pub output_path: PathBuf,
}

impl CaptureRequest {
    /// Resolve a request's output path from a directory + filename
    /// template, expanding the template against the current time once.
    pub fn resolve_output_path(output_dir: &Path, template: &str, broadcaster_id: &str, container: &str) -> PathBuf {
        let name = expand_output_path_template(template, broadcaster_id, Utc::now());
        output_dir.join(format!("{name}.{container}"))
    }
}

/// Build the Capture Engine argv. Pure and side-effect free so it is
/// independently testable.
pub fn build_args(req: &CaptureRequest) -> Vec<String> {
    let mut args = Vec::new();

    for (key, value) in &req.headers {
        let flag = if key == "User-Agent" {
            "-user_agent"
        } else {
            "-headers"
        };
        args.push(flag.to_string());
        args.push(format!("{key}: {value}"));
    }
    if !req.headers.is_empty() {
        args.push("-headers".to_string());
        args.push("\r\n".to_string());
    }

    if let Some(cookies) = req.cookies.as_deref().filter(|c| !c.is_empty()) {
        args.push("-cookies".to_string());
        args.push(cookies.to_string());
    }

    args.push("-rw_timeout".to_string());
    args.push(NETWORK_TIMEOUT_MICROS.to_string());

    if req.debug_logging {
        args.push("-loglevel".to_string());
        args.push("debug".to_string());
    }

    args.push("-i".to_string());
    args.push(req.url.clone());

    if req.container.eq_ignore_ascii_case("avi") {
        args.push("-bsf:v".to_string());
        args.push("h264_mp4toannexb".to_string());
    }

    if req.segmentation.is_enabled() {
        if req.segmentation.part_bytes_overridden() {
            debug!(
                broadcaster_id = %req.broadcaster_id,
                "segment_part_bytes ignored: segment_time_seconds takes precedence"
            );
        }
        args.push("-f".to_string());
        args.push("segment".to_string());
        args.push("-segment_time".to_string());
        args.push(req.segmentation.effective_segment_time().to_string());

        let lc = req.container.to_ascii_lowercase();
        if lc == "mp4" || lc == "mov" {
            args.push("-segment_format_options".to_string());
            args.push("movflags=+faststart".to_string());
        }
        args.push("-reset_timestamps".to_string());
        args.push("1".to_string());
        args.push("-strftime".to_string());
        args.push("1".to_string());
    } else if let Some(seconds) = req.segmentation.segment_time_seconds {
        args.push("-to".to_string());
        args.push(seconds.to_string());
    } else if let Some(bytes) = req.segmentation.segment_part_bytes {
        args.push("-fs".to_string());
        args.push(bytes.to_string());
    }

    args.push("-c".to_string());
    args.push("copy".to_string());

    if !req.segmentation.is_enabled() {
        args.push("-f".to_string());
        args.push(req.container.clone());
    }

    args.push(req.output_path.to_string_lossy().into_owned());

    args
}

/// Spawns and drives the Capture Engine to completion, emitting each
/// finalized segment to `on_segment` as soon as it is known to be closed
/// (the next segment opens, or the process exits).
pub struct CaptureInvoker {
    binary_path: String,
}

impl CaptureInvoker {
    pub fn new(binary_path: impl Into<String>) -> Self {
        Self {
            binary_path: binary_path.into(),
        }
    }

    pub async fn run(
        &self,
        req: &CaptureRequest,
        cancel: &CancellationToken,
        mut on_segment: impl FnMut(StreamData),
    ) -> Result<Vec<StreamData>> {
        let output_parent = req.output_path.parent().unwrap_or_else(|| Path::new("."));
        tokio::fs::create_dir_all(output_parent)
            .await
            .map_err(Error::Io)?;

        let args = build_args(req);
        info!(broadcaster_id = %req.broadcaster_id, ?args, "starting capture engine");

        let mut cmd = process_utils::tokio_command(&self.binary_path);
        cmd.args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());

        let mut child = cmd
            .spawn()
            .map_err(|e| Error::CaptureSpawn(e.to_string()))?;

        let stdin = child.stdin.take();
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| Error::CaptureSpawn("no stderr handle".to_string()))?;
        let mut lines = BufReader::new(stderr).lines();

        let mut collected = Vec::new();
        let mut open_segment: Option<(PathBuf, chrono::DateTime<Utc>)> = if req
            .segmentation
            .is_enabled()
        {
            None
        } else {
            Some((req.output_path.clone(), Utc::now()))
        };
        let mut last_size_kb: u64 = 0;

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    self.stop_gracefully(&mut child, stdin).await;
                    break;
                }
                line = lines.next_line() => {
                    match line.map_err(Error::Io)? {
                        Some(line) => {
                            self.handle_line(
                                &line,
                                req,
                                &mut open_segment,
                                &mut last_size_kb,
                                &mut collected,
                                &mut on_segment,
                            );
                        }
                        None => break,
                    }
                }
            }
        }

        let status = child.wait().await.map_err(Error::Io)?;
        if let Some((path, start_time)) = open_segment.take() {
            let data = finalize_segment(req, path, start_time, last_size_kb);
            collected.push(data.clone());
            on_segment(data);
        }

        match status.code() {
            Some(0) | None => {}
            Some(code) => {
                warn!(broadcaster_id = %req.broadcaster_id, code, "capture engine exited non-zero");
            }
        }

        Ok(collected)
    }

    #[allow(clippy::too_many_arguments)]
    fn handle_line(
        &self,
        line: &str,
        req: &CaptureRequest,
        open_segment: &mut Option<(PathBuf, chrono::DateTime<Utc>)>,
        last_size_kb: &mut u64,
        collected: &mut Vec<StreamData>,
        on_segment: &mut impl FnMut(StreamData),
    ) {
        if let Some(filename) = parse_segment_start(line) {
            if let Some((path, start_time)) = open_segment.take() {
                let data = finalize_segment(req, path, start_time, *last_size_kb);
                collected.push(data.clone());
                on_segment(data);
                *last_size_kb = 0;
            }
            *open_segment = Some((PathBuf::from(filename), Utc::now()));
        } else if is_progress_line(line) {
            let size_kb = parse_size_kb(line).unwrap_or(*last_size_kb);
            let bitrate = parse_bitrate(line).unwrap_or_default();
            let delta_kb = size_kb as i64 - *last_size_kb as i64;
            *last_size_kb = size_kb;
            debug!(broadcaster_id = %req.broadcaster_id, size_kb, delta_kb, %bitrate, "capture progress");
        } else {
            debug!(broadcaster_id = %req.broadcaster_id, line, "capture engine output");
        }
    }

    async fn stop_gracefully(
        &self,
        child: &mut tokio::process::Child,
        mut stdin: Option<tokio::process::ChildStdin>,
    ) {
        debug!("capture cancellation requested, sending graceful stop");
        if let Some(stdin) = stdin.take() {
            let mut stdin = stdin;
            let _ = stdin.write_all(b"q").await;
            let _ = stdin.shutdown().await;
        }
        match tokio::time::timeout(GRACEFUL_STOP_TIMEOUT, child.wait()).await {
            Ok(_) => {}
            Err(_) => {
                warn!("capture engine did not exit in time, killing");
                let _ = child.kill().await;
            }
        }
    }
}

fn finalize_segment(
    req: &CaptureRequest,
    path: PathBuf,
    start_time: chrono::DateTime<Utc>,
    last_size_kb: u64,
) -> StreamData {
    StreamData {
        path,
        size_bytes: last_size_kb * 1024,
        start_time,
        end_time: Utc::now(),
        broadcaster_id: req.broadcaster_id.clone(),
    }
}

pub fn ensure_absolute(path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_request() -> CaptureRequest {
        CaptureRequest {
            broadcaster_id: "s1".to_string(),
            url: "u".to_string(),
            headers: vec![],
            cookies: None,
            container: "mp4".to_string(),
            segmentation: SegmentationPolicy::default(),
            debug_logging: false,
            output_path: PathBuf::from("/tmp/out/o.mp4"),
        }
    }

    #[test]
    fn golden_argv_matches_spec() {
        let req = CaptureRequest {
            headers: vec![
                ("User-Agent".to_string(), "UA".to_string()),
                ("Referer".to_string(), "R".to_string()),
            ],
            cookies: Some("c=1".to_string()),
            container: "mp4".to_string(),
            segmentation: SegmentationPolicy {
                enabled: true,
                segment_part_bytes: None,
                segment_time_seconds: Some(60),
            },
            output_path: PathBuf::from("/tmp/out/o.mp4"),
            ..base_request()
        };
        let args = build_args(&req);
        let expected: Vec<String> = [
            "-user_agent", "User-Agent: UA",
            "-headers", "Referer: R",
            "-headers", "\r\n",
            "-cookies", "c=1",
            "-rw_timeout", "20000000",
            "-i", "u",
            "-f", "segment",
            "-segment_time", "60",
            "-segment_format_options", "movflags=+faststart",
            "-reset_timestamps", "1",
            "-strftime", "1",
            "-c", "copy",
        ]
        .into_iter()
        .map(String::from)
        .collect();
        assert_eq!(args[..expected.len()], expected[..]);
        assert!(args.last().unwrap().ends_with("o.mp4"));
    }

    #[test]
    fn empty_headers_omit_trailing_sentinel() {
        let req = base_request();
        let args = build_args(&req);
        assert!(!args.contains(&"-headers".to_string()));
    }

    #[test]
    fn null_cookies_omit_cookies_flag() {
        let req = base_request();
        let args = build_args(&req);
        assert!(!args.contains(&"-cookies".to_string()));
    }

    #[test]
    fn segmentation_disabled_with_segment_time_uses_stop_time() {
        let req = CaptureRequest {
            segmentation: SegmentationPolicy {
                enabled: false,
                segment_part_bytes: None,
                segment_time_seconds: Some(120),
            },
            ..base_request()
        };
        let args = build_args(&req);
        let idx = args.iter().position(|a| a == "-to").unwrap();
        assert_eq!(args[idx + 1], "120");
    }

    #[test]
    fn segmentation_disabled_with_part_bytes_uses_fs() {
        let req = CaptureRequest {
            segmentation: SegmentationPolicy {
                enabled: false,
                segment_part_bytes: Some(1_000_000),
                segment_time_seconds: None,
            },
            ..base_request()
        };
        let args = build_args(&req);
        let idx = args.iter().position(|a| a == "-fs").unwrap();
        assert_eq!(args[idx + 1], "1000000");
    }

    #[test]
    fn avi_container_emits_bitstream_filter() {
        let req = CaptureRequest {
            container: "avi".to_string(),
            ..base_request()
        };
        let args = build_args(&req);
        assert!(args.windows(2).any(|w| w == ["-bsf:v", "h264_mp4toannexb"]));
    }

    #[test]
    fn non_segmented_capture_emits_trailing_muxer_flag() {
        let req = base_request();
        let args = build_args(&req);
        let c_copy_idx = args.iter().position(|a| a == "copy").unwrap();
        assert_eq!(args[c_copy_idx + 1], "-f");
        assert_eq!(args[c_copy_idx + 2], "mp4");
    }

    #[test]
    fn segmented_capture_has_no_trailing_muxer_flag() {
        let req = CaptureRequest {
            segmentation: SegmentationPolicy {
                enabled: true,
                segment_part_bytes: None,
                segment_time_seconds: None,
            },
            ..base_request()
        };
        let args = build_args(&req);
        let c_copy_idx = args.iter().position(|a| a == "copy").unwrap();
        // next token is the output path, not another flag
        assert_ne!(args[c_copy_idx + 1], "-f");
    }

    #[test]
    fn argv_is_deterministic_for_identical_inputs() {
        let req = base_request();
        assert_eq!(build_args(&req), build_args(&req));
    }
}
