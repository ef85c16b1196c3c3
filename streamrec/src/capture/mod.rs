//! Capture Invoker: launches the Capture Engine, parses its progress
//! output, and returns finalized `StreamData`.

mod filename;
mod invoker;
mod parser;

pub use filename::expand_output_path_template;
pub use invoker::{build_args, CaptureInvoker, CaptureRequest};
pub use parser::{is_progress_line, parse_bitrate, parse_segment_start, parse_size_kb};
