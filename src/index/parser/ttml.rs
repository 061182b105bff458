//! Timed Text Markup Language (.ttml, .dfxp)
//!
//! A deliberately small reader: every `<p>` with a `begin` attribute is a
//! cue. Nested `<div>` timing offsets are not applied.

use std::sync::OnceLock;

use regex::Regex;

use super::{decode_entities, make_cue, parse_clock, strip_markup};
use crate::error::ParseError;
use crate::models::SubtitleCue;

/// Frame rate for `HH:MM:SS:FF` clock values when none is declared
const DEFAULT_FRAME_RATE: f64 = 30.0;

pub(super) fn parse(text: &str) -> Result<Vec<SubtitleCue>, ParseError> {
    static PARAGRAPH: OnceLock<Regex> = OnceLock::new();
    static BEGIN: OnceLock<Regex> = OnceLock::new();
    static BREAK: OnceLock<Regex> = OnceLock::new();
    static FRAME_RATE: OnceLock<Regex> = OnceLock::new();

    let paragraph = PARAGRAPH
        .get_or_init(|| Regex::new(r"(?s)<p\b([^>]*)>(.*?)</p>").expect("valid regex"));
    let begin = BEGIN.get_or_init(|| Regex::new(r#"\bbegin\s*=\s*"([^"]*)""#).expect("valid regex"));
    let line_break = BREAK.get_or_init(|| Regex::new(r"<br\s*/?>").expect("valid regex"));
    let frame_rate_re = FRAME_RATE
        .get_or_init(|| Regex::new(r#"frameRate\s*=\s*"(\d+)""#).expect("valid regex"));

    if !text.contains("<tt") {
        return Err(ParseError::Malformed {
            format: "TTML",
            reason: "missing <tt> root element".to_string(),
        });
    }

    let frame_rate = frame_rate_re
        .captures(text)
        .and_then(|c| c[1].parse::<f64>().ok())
        .filter(|r| *r > 0.0)
        .unwrap_or(DEFAULT_FRAME_RATE);

    let mut cues = Vec::new();
    for caps in paragraph.captures_iter(text) {
        let Some(start_ms) = begin
            .captures(&caps[1])
            .and_then(|b| parse_time_expression(&b[1], frame_rate))
        else {
            continue;
        };

        // Source line breaks inside <p> are layout, only <br/> is a break
        let body = caps[2].split_whitespace().collect::<Vec<_>>().join(" ");
        let body = line_break.replace_all(&body, "\n");
        let body = decode_entities(&strip_markup(&body));
        let body = body.lines().map(str::trim).collect::<Vec<_>>().join("\n");
        if let Some(cue) = make_cue(start_ms, &body) {
            cues.push(cue);
        }
    }
    Ok(cues)
}

/// Parse a TTML time expression into milliseconds
///
/// Clock times (`00:00:01.500`, `00:00:01:12` with frames) and offset times
/// (`1.5s`, `1500ms`, `2m`, `1h`) are supported.
fn parse_time_expression(expr: &str, frame_rate: f64) -> Option<u64> {
    let expr = expr.trim();

    let offset = |value: &str, scale: f64| -> Option<u64> {
        let v: f64 = value.parse().ok()?;
        (v >= 0.0).then(|| (v * scale).round() as u64)
    };
    if let Some(v) = expr.strip_suffix("ms") {
        return offset(v, 1.0);
    }
    if let Some(v) = expr.strip_suffix('s') {
        return offset(v, 1000.0);
    }
    if let Some(v) = expr.strip_suffix('m') {
        return offset(v, 60_000.0);
    }
    if let Some(v) = expr.strip_suffix('h') {
        return offset(v, 3_600_000.0);
    }

    let parts: Vec<&str> = expr.split(':').collect();
    if parts.len() == 4 {
        let clock = parts[..3].join(":");
        let frames: f64 = parts[3].parse().ok()?;
        return parse_clock(&clock)?.checked_add((frames * 1000.0 / frame_rate).round() as u64);
    }
    parse_clock(expr)
}
