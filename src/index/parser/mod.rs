//! Subtitle parsing
//!
//! Turns decoded subtitle text into an ordered list of cues. The format is
//! sniffed from the content first and taken from the file extension second,
//! since extensions on downloaded subtitles are often wrong.
//!
//! - `srt` - SubRip
//! - `vtt` - WebVTT
//! - `ass` - Advanced SubStation Alpha / SubStation Alpha
//! - `microdvd` - frame-based MicroDVD `.sub`
//! - `sbv` - YouTube SBV
//! - `ttml` - Timed Text Markup Language / DFXP

mod ass;
mod microdvd;
mod sbv;
mod srt;
mod ttml;
mod vtt;

use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;

use crate::error::{ParseError, SourceError};
use crate::index::encoding;
use crate::models::{SubFormat, SubtitleCue};

/// Cues parsed from one subtitle source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedSubtitle {
    pub format: SubFormat,
    pub cues: Vec<SubtitleCue>,
}

/// Read `path`, decode it as `encoding` and parse it.
pub fn parse(path: &Path, encoding: &str) -> Result<ParsedSubtitle, SourceError> {
    let bytes = std::fs::read(path).map_err(|e| SourceError::io(path, e))?;
    let text = encoding::decode(&bytes, encoding);
    Ok(parse_text(&text, SubFormat::from_path(path))?)
}

/// Parse decoded subtitle text.
///
/// `hint` is the format suggested by the file extension, used when the
/// content does not identify itself.
pub fn parse_text(text: &str, hint: Option<SubFormat>) -> Result<ParsedSubtitle, ParseError> {
    let text = normalize_newlines(text);
    let format = sniff(&text).or(hint).ok_or(ParseError::UnknownFormat)?;

    let cues = match format {
        SubFormat::Srt => srt::parse(&text)?,
        SubFormat::WebVtt => vtt::parse(&text)?,
        SubFormat::Ass | SubFormat::Ssa => ass::parse(&text)?,
        SubFormat::MicroDvd => microdvd::parse(&text)?,
        SubFormat::Sbv => sbv::parse(&text)?,
        SubFormat::Ttml => ttml::parse(&text)?,
    };

    if cues.is_empty() {
        return Err(ParseError::Empty);
    }
    Ok(ParsedSubtitle { format, cues })
}

/// Identify a subtitle format from its content
pub fn sniff(text: &str) -> Option<SubFormat> {
    static SRT_TIMING: OnceLock<Regex> = OnceLock::new();
    static SBV_TIMING: OnceLock<Regex> = OnceLock::new();
    static MICRODVD_LINE: OnceLock<Regex> = OnceLock::new();

    let head = text.trim_start_matches('\u{feff}').trim_start();

    if head.starts_with("WEBVTT") {
        return Some(SubFormat::WebVtt);
    }
    if head.contains("[Script Info]") || head.contains("[Events]") {
        if head.contains("[V4 Styles]") || head.contains("ScriptType: v4.00\n") {
            return Some(SubFormat::Ssa);
        }
        return Some(SubFormat::Ass);
    }
    let microdvd =
        MICRODVD_LINE.get_or_init(|| Regex::new(r"^\{\d+\}\{\d*\}").expect("valid regex"));
    if microdvd.is_match(head) {
        return Some(SubFormat::MicroDvd);
    }
    if (head.starts_with("<?xml") || head.starts_with("<tt")) && head.contains("<tt") {
        return Some(SubFormat::Ttml);
    }
    let srt = SRT_TIMING.get_or_init(|| {
        Regex::new(r"\d{1,2}:\d{2}:\d{2}[,.]\d{1,3}[ \t]*-->").expect("valid regex")
    });
    if srt.is_match(head) {
        return Some(SubFormat::Srt);
    }
    let sbv = SBV_TIMING.get_or_init(|| {
        Regex::new(r"(?m)^\d+:\d{2}:\d{2}\.\d{3},\d+:\d{2}:\d{2}\.\d{3}\s*$").expect("valid regex")
    });
    if sbv.is_match(head) {
        return Some(SubFormat::Sbv);
    }
    None
}

// =============================================================================
// Shared helpers
// =============================================================================

fn normalize_newlines(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\r', "\n")
}

/// Parse a clock time into milliseconds.
///
/// Accepts `HH:MM:SS`, `MM:SS` and `H:MM:SS`, each optionally followed by a
/// fraction after `,` or `.` (centiseconds in ASS, milliseconds elsewhere).
pub(crate) fn parse_clock(s: &str) -> Option<u64> {
    let s = s.trim();
    let (clock, fraction) = match s.find([',', '.']) {
        Some(idx) => (&s[..idx], Some(&s[idx + 1..])),
        None => (s, None),
    };

    let parts: Vec<&str> = clock.split(':').collect();
    let (hours, mins, secs) = match parts.as_slice() {
        [h, m, s] => (h.parse::<u64>().ok()?, m.parse::<u64>().ok()?, s.parse::<u64>().ok()?),
        [m, s] => (0, m.parse::<u64>().ok()?, s.parse::<u64>().ok()?),
        _ => return None,
    };

    let millis = match fraction {
        Some(f) if !f.is_empty() && f.chars().all(|c| c.is_ascii_digit()) => {
            let digits: String = f.chars().chain("00".chars()).take(3).collect();
            digits.parse::<u64>().ok()?
        }
        Some(_) => return None,
        None => 0,
    };

    // Hours come straight from the file and may be absurdly large
    hours
        .checked_mul(60)?
        .checked_add(mins)?
        .checked_mul(60)?
        .checked_add(secs)?
        .checked_mul(1000)?
        .checked_add(millis)
}

/// Remove HTML-like tags and ASS override blocks from cue text
pub(crate) fn strip_markup(text: &str) -> String {
    static TAG: OnceLock<Regex> = OnceLock::new();
    let tag = TAG.get_or_init(|| {
        Regex::new(r"</?[A-Za-z][^<>]*>|<\d[\d:.]*>|\{\\[^{}]*\}").expect("valid regex")
    });
    tag.replace_all(text, "").into_owned()
}

/// Decode the handful of entities that appear in WebVTT and TTML
pub(crate) fn decode_entities(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&nbsp;", "\u{a0}")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

/// Build a cue from raw text, dropping it when nothing is left after trimming
pub(crate) fn make_cue(start_ms: u64, text: &str) -> Option<SubtitleCue> {
    let text = text.trim();
    if text.is_empty() {
        None
    } else {
        Some(SubtitleCue::new(start_ms, text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_clock_variants() {
        assert_eq!(parse_clock("00:00:10,500"), Some(10_500));
        assert_eq!(parse_clock("01:23:45.678"), Some(5_025_678));
        assert_eq!(parse_clock("0:00:05.20"), Some(5_200));
        assert_eq!(parse_clock("01:30.250"), Some(90_250));
        assert_eq!(parse_clock("00:00:07"), Some(7_000));
        assert_eq!(parse_clock("00:00:01,5"), Some(1_500));
        assert_eq!(parse_clock("garbage"), None);
        assert_eq!(parse_clock("00:xx:01,000"), None);
    }

    #[test]
    fn test_parse_clock_overflow() {
        assert_eq!(parse_clock("99999999999999999:00:00,000"), None);
        assert_eq!(parse_clock("18446744073709551615:00"), None);
    }

    #[test]
    fn test_oversized_hours_degrade() {
        assert_eq!(
            parse_text(
                "1\n99999999999999999:00:00,000 --> 99999999999999999:00:01,000\nhello there\n",
                None,
            ),
            Err(ParseError::Empty)
        );
    }

    #[test]
    fn test_strip_markup() {
        assert_eq!(strip_markup("<i>Hello</i> <b>world</b>"), "Hello world");
        assert_eq!(strip_markup(r"{\an8}Top text"), "Top text");
        assert_eq!(strip_markup("<font color=\"#fff\">x</font>"), "x");
        assert_eq!(strip_markup("a < b and c > d"), "a < b and c > d");
    }

    #[test]
    fn test_sniff_formats() {
        assert_eq!(sniff("WEBVTT\n\n00:01.000 --> 00:02.000\nx"), Some(SubFormat::WebVtt));
        assert_eq!(sniff("1\n00:00:01,000 --> 00:00:02,000\nx"), Some(SubFormat::Srt));
        assert_eq!(sniff("[Script Info]\nScriptType: v4.00+\n"), Some(SubFormat::Ass));
        assert_eq!(sniff("[Script Info]\n[V4 Styles]\n"), Some(SubFormat::Ssa));
        assert_eq!(sniff("{1}{1}25\n{10}{20}Hi"), Some(SubFormat::MicroDvd));
        assert_eq!(sniff("0:00:01.000,0:00:02.000\nHi"), Some(SubFormat::Sbv));
        assert_eq!(sniff("<?xml version=\"1.0\"?>\n<tt xmlns=\"x\">"), Some(SubFormat::Ttml));
        assert_eq!(sniff("just some words"), None);
    }

    #[test]
    fn test_content_wins_over_extension() {
        let parsed = parse_text(
            "1\n00:00:01,000 --> 00:00:02,000\nActually SRT\n",
            Some(SubFormat::Ass),
        )
        .unwrap();
        assert_eq!(parsed.format, SubFormat::Srt);
        assert_eq!(parsed.cues[0].text, "Actually SRT");
    }

    #[test]
    fn test_unknown_format_without_hint() {
        assert_eq!(
            parse_text("nothing to see", None),
            Err(ParseError::UnknownFormat)
        );
    }

    #[test]
    fn test_garbage_with_hint_is_empty() {
        assert_eq!(
            parse_text("this is not a subtitle", Some(SubFormat::Srt)),
            Err(ParseError::Empty)
        );
    }

    #[test]
    fn test_crlf_input() {
        let parsed = parse_text(
            "1\r\n00:00:01,000 --> 00:00:02,000\r\nLine one\r\n\r\n",
            None,
        )
        .unwrap();
        assert_eq!(parsed.cues, vec![SubtitleCue::new(1_000, "Line one")]);
    }
}
