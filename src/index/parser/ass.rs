//! Advanced SubStation Alpha (.ass) and SubStation Alpha (.ssa)
//!
//! Only the `[Events]` section matters for search. Column positions come
//! from its `Format:` line; the text column is always last and may itself
//! contain commas.

use std::sync::OnceLock;

use regex::Regex;

use super::{make_cue, parse_clock};
use crate::error::ParseError;
use crate::models::SubtitleCue;

/// Event columns assumed when a file has no `Format:` line
const DEFAULT_FORMAT: &[&str] = &[
    "layer", "start", "end", "style", "name", "marginl", "marginr", "marginv", "effect", "text",
];

pub(super) fn parse(text: &str) -> Result<Vec<SubtitleCue>, ParseError> {
    let mut in_events = false;
    let mut columns: Vec<String> = DEFAULT_FORMAT.iter().map(|c| c.to_string()).collect();
    let mut cues = Vec::new();

    for line in text.lines() {
        let line = line.trim();
        if line.starts_with('[') && line.ends_with(']') {
            in_events = line.eq_ignore_ascii_case("[events]");
            continue;
        }
        if !in_events {
            continue;
        }

        if let Some(format) = line.strip_prefix("Format:") {
            columns = format.split(',').map(|c| c.trim().to_lowercase()).collect();
            continue;
        }
        let Some(fields) = line.strip_prefix("Dialogue:") else {
            // Comment:, Picture:, Sound: and friends
            continue;
        };

        let (Some(start_col), Some(text_col)) = (
            columns.iter().position(|c| c == "start"),
            columns.iter().position(|c| c == "text"),
        ) else {
            return Err(ParseError::Malformed {
                format: "ASS",
                reason: format!("event format lacks start or text: {}", columns.join(",")),
            });
        };

        let values: Vec<&str> = fields.splitn(columns.len(), ',').collect();
        let (Some(start), Some(body)) = (values.get(start_col), values.get(text_col)) else {
            tracing::trace!(line, "skipping short ass dialogue line");
            continue;
        };
        let Some(start_ms) = parse_clock(start) else {
            tracing::trace!(line, "skipping ass dialogue with bad timing");
            continue;
        };
        if let Some(cue) = make_cue(start_ms, &clean_text(body)) {
            cues.push(cue);
        }
    }

    Ok(cues)
}

/// Drop override blocks and expand ASS escapes
fn clean_text(text: &str) -> String {
    static OVERRIDE: OnceLock<Regex> = OnceLock::new();
    let overrides = OVERRIDE.get_or_init(|| Regex::new(r"\{[^{}]*\}").expect("valid regex"));
    overrides
        .replace_all(text, "")
        .replace("\\N", "\n")
        .replace("\\n", "\n")
        .replace("\\h", " ")
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "[Script Info]\nTitle: Test\nScriptType: v4.00+\n\n\
        [V4+ Styles]\nFormat: Name, Fontname\nStyle: Default,Arial\n\n\
        [Events]\n\
        Format: Layer, Start, End, Style, Name, MarginL, MarginR, MarginV, Effect, Text\n\
        Dialogue: 0,0:00:01.50,0:00:03.00,Default,,0,0,0,,{\\i1}Hello{\\i0}, world\n\
        Comment: 0,0:00:02.00,0:00:03.00,Default,,0,0,0,,not shown\n\
        Dialogue: 0,0:01:00.00,0:01:02.00,Default,,0,0,0,,Line one\\NLine\\htwo\n";

    #[test]
    fn test_parse_ass() {
        let cues = parse(SAMPLE).unwrap();
        assert_eq!(
            cues,
            vec![
                SubtitleCue::new(1_500, "Hello, world"),
                SubtitleCue::new(60_000, "Line one\nLine two"),
            ]
        );
    }

    #[test]
    fn test_reordered_format_columns() {
        let ssa = "[Events]\nFormat: Start, End, Text\nDialogue: 0:00:02.00,0:00:04.00,Moved around\n";
        let cues = parse(ssa).unwrap();
        assert_eq!(cues, vec![SubtitleCue::new(2_000, "Moved around")]);
    }

    #[test]
    fn test_default_format_without_format_line() {
        let ssa = "[Events]\nDialogue: Marked=0,0:00:03.00,0:00:04.00,Default,,0,0,0,,Old style\n";
        let cues = parse(ssa).unwrap();
        assert_eq!(cues[0].start_ms, 3_000);
        assert_eq!(cues[0].text, "Old style");
    }

    #[test]
    fn test_format_without_text_column() {
        let ass = "[Events]\nFormat: Layer, End\nDialogue: 0,0:00:01.00\n";
        assert!(matches!(parse(ass), Err(ParseError::Malformed { .. })));
    }

    #[test]
    fn test_no_events_section() {
        assert_eq!(parse("[Script Info]\nTitle: x\n").unwrap(), vec![]);
    }
}
