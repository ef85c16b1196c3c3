//! Line-oriented, lossy-tolerant parsing of the Capture Engine's stderr.
//! Unexpected lines are never an error — they are simply not recognized by
//! any of these functions.

/// A segment-start line looks like:
/// `[segment @ 0x...] Opening 'out_001.ts' for writing`
pub fn parse_segment_start(line: &str) -> Option<String> {
    if !(line.starts_with("[segment @") && line.contains("Opening")) {
        return None;
    }
    let start = line.find('\'')? + 1;
    let rest = &line[start..];
    let end = rest.find('\'')?;
    Some(rest[..end].to_string())
}

/// Extract the `size=` field as kilobytes: strip all non-digit characters
/// from the substring between `size=` and the next `time`.
pub fn parse_size_kb(line: &str) -> Option<u64> {
    let start = line.find("size=")? + "size=".len();
    let rest = &line[start..];
    let end = rest.find("time")?;
    let digits: String = rest[..end].chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return None;
    }
    digits.parse().ok()
}

/// Extract the `bitrate=` field as the trimmed substring up to `speed`.
pub fn parse_bitrate(line: &str) -> Option<String> {
    let start = line.find("bitrate=")? + "bitrate=".len();
    let rest = &line[start..];
    let end = rest.find("speed")?;
    let bitrate = rest[..end].trim();
    if bitrate.is_empty() {
        None
    } else {
        Some(bitrate.to_string())
    }
}

/// A progress line requires both `size=` and `time=`.
pub fn is_progress_line(line: &str) -> bool {
    line.contains("size=") && line.contains("time=")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn segment_start_extracts_quoted_filename() {
        let line = "[segment @ 0x55f1] Opening 'out_001.ts' for writing";
        assert_eq!(parse_segment_start(line), Some("out_001.ts".to_string()));
    }

    #[test]
    fn segment_start_requires_opening_keyword() {
        let line = "[segment @ 0x55f1] closing 'out_001.ts'";
        assert_eq!(parse_segment_start(line), None);
    }

    #[test]
    fn segment_start_requires_leading_tag() {
        let line = "Opening 'out_001.ts' for writing";
        assert_eq!(parse_segment_start(line), None);
    }

    #[test]
    fn size_kb_strips_non_digits() {
        let line = "frame=100 fps=25 size=    1024kB time=00:00:04.00 bitrate=2097.2kbits/s speed=1.0x";
        assert_eq!(parse_size_kb(line), Some(1024));
    }

    #[test]
    fn bitrate_is_trimmed_raw_substring() {
        let line = "size=1024kB time=00:00:04.00 bitrate=2097.2kbits/s speed=1.0x";
        assert_eq!(parse_bitrate(line), Some("2097.2kbits/s".to_string()));
    }

    #[test]
    fn progress_line_requires_both_markers() {
        assert!(is_progress_line(
            "size=1024kB time=00:00:04.00 bitrate=2097.2kbits/s speed=1.0x"
        ));
        assert!(!is_progress_line("time=00:00:04.00 only"));
        assert!(!is_progress_line("size=1024kB only"));
    }

    #[test]
    fn unrecognized_line_parses_to_none() {
        assert_eq!(parse_segment_start("some unrelated ffmpeg banner line"), None);
        assert_eq!(parse_size_kb("some unrelated ffmpeg banner line"), None);
    }
}
