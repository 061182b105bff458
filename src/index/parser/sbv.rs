//! YouTube SubViewer (.sbv)
//!
//! ```text
//! 0:00:01.000,0:00:04.000
//! Caption text
//! ```

use super::{make_cue, parse_clock, strip_markup};
use crate::error::ParseError;
use crate::models::SubtitleCue;

pub(super) fn parse(text: &str) -> Result<Vec<SubtitleCue>, ParseError> {
    let mut cues = Vec::new();
    let mut lines = text.lines().peekable();

    while let Some(line) = lines.next() {
        let Some(start_ms) = parse_timing(line) else {
            continue;
        };

        let mut body = Vec::new();
        while let Some(next) = lines.peek() {
            if next.trim().is_empty() {
                lines.next();
                break;
            }
            body.push(*next);
            lines.next();
        }

        if let Some(cue) = make_cue(start_ms, &strip_markup(&body.join("\n"))) {
            cues.push(cue);
        }
    }
    Ok(cues)
}

/// Start time of a `start,end` line
fn parse_timing(line: &str) -> Option<u64> {
    let (start, end) = line.trim().split_once(',')?;
    // Both halves must be clock times, or this is just text with a comma
    parse_clock(end)?;
    parse_clock(start)
}
