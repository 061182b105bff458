//! WebVTT (.vtt)

use super::{decode_entities, make_cue, parse_clock, strip_markup};
use crate::error::ParseError;
use crate::models::SubtitleCue;

pub(super) fn parse(text: &str) -> Result<Vec<SubtitleCue>, ParseError> {
    let text = text.trim_start_matches('\u{feff}');
    let lines: Vec<&str> = text.lines().collect();

    if !lines.first().is_some_and(|l| l.trim().starts_with("WEBVTT")) {
        return Err(ParseError::Malformed {
            format: "WebVTT",
            reason: "missing WEBVTT header".to_string(),
        });
    }

    let mut cues = Vec::new();
    let mut i = 1;
    while i < lines.len() {
        let line = lines[i].trim();

        if line.is_empty() {
            i += 1;
            continue;
        }

        // NOTE, STYLE and REGION blocks run until the next blank line
        if line.starts_with("NOTE") || line.starts_with("STYLE") || line.starts_with("REGION") {
            while i < lines.len() && !lines[i].trim().is_empty() {
                i += 1;
            }
            continue;
        }

        if !line.contains("-->") {
            // cue identifier
            i += 1;
            continue;
        }

        let start = line.split_once("-->").and_then(|(start, _)| parse_clock(start));
        let mut body = Vec::new();
        i += 1;
        while i < lines.len() && !lines[i].trim().is_empty() {
            body.push(lines[i]);
            i += 1;
        }

        let Some(start_ms) = start else {
            tracing::trace!(line, "skipping vtt cue with bad timing");
            continue;
        };
        let body = decode_entities(&strip_markup(&body.join("\n")));
        if let Some(cue) = make_cue(start_ms, &body) {
            cues.push(cue);
        }
    }
    Ok(cues)
}
