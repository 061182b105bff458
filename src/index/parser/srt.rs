//! SubRip (.srt)
//!
//! ```text
//! 1
//! 00:00:01,000 --> 00:00:04,000
//! First subtitle line
//! ```

use std::sync::OnceLock;

use regex::Regex;

use super::{make_cue, parse_clock, strip_markup};
use crate::error::ParseError;
use crate::models::SubtitleCue;

pub(super) fn parse(text: &str) -> Result<Vec<SubtitleCue>, ParseError> {
    static BLANK_LINE: OnceLock<Regex> = OnceLock::new();
    let blank = BLANK_LINE.get_or_init(|| Regex::new(r"\n[ \t]*\n").expect("valid regex"));

    let mut cues = Vec::new();
    for block in blank.split(text) {
        let lines: Vec<&str> = block.trim_matches('\n').lines().collect();

        // The index line is optional in practice, so locate the timing line
        let Some(timing_idx) = lines.iter().position(|line| line.contains("-->")) else {
            continue;
        };
        let Some(start_ms) = parse_timing(lines[timing_idx]) else {
            tracing::trace!(line = lines[timing_idx], "skipping srt block with bad timing");
            continue;
        };

        let body = lines[timing_idx + 1..].join("\n");
        if let Some(cue) = make_cue(start_ms, &strip_markup(&body)) {
            cues.push(cue);
        }
    }
    Ok(cues)
}

/// Start time of a `start --> end` line
fn parse_timing(line: &str) -> Option<u64> {
    let (start, _end) = line.split_once("-->")?;
    parse_clock(start)
}
