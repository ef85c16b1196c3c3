//! Output path template expansion.
//!
//! Supports ffmpeg-style strftime placeholders (`%Y`, `%m`, `%d`, `%H`,
//! `%M`, `%S`) plus a `%streamer_id%` token.

use chrono::{DateTime, Utc};

pub fn expand_output_path_template(template: &str, streamer_id: &str, at: DateTime<Utc>) -> String {
    let mut result = String::with_capacity(template.len());
    let mut chars = template.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '%' {
            result.push(c);
            continue;
        }
        match chars.peek() {
            Some('Y') => {
                result.push_str(&at.format("%Y").to_string());
                chars.next();
            }
            Some('m') => {
                result.push_str(&at.format("%m").to_string());
                chars.next();
            }
            Some('d') => {
                result.push_str(&at.format("%d").to_string());
                chars.next();
            }
            Some('H') => {
                result.push_str(&at.format("%H").to_string());
                chars.next();
            }
            Some('M') => {
                result.push_str(&at.format("%M").to_string());
                chars.next();
            }
            Some('S') => {
                result.push_str(&at.format("%S").to_string());
                chars.next();
            }
            _ => {
                // `%streamer_id%` or a bare `%`: look ahead for the closing `%`.
                let rest: String = chars.clone().collect();
                if let Some(rest_end) = rest.find('%') {
                    let token = &rest[..rest_end];
                    if token == "streamer_id" {
                        result.push_str(streamer_id);
                        for _ in 0..=rest_end {
                            chars.next();
                        }
                        continue;
                    }
                }
                result.push('%');
            }
        }
    }

    result
}
