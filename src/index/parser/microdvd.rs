//! MicroDVD (.sub)
//!
//! Frame-based: `{start}{end}text`, with `|` separating lines. A leading
//! `{1}{1}23.976` line declares the frame rate.

use std::sync::OnceLock;

use regex::Regex;

use super::make_cue;
use crate::error::ParseError;
use crate::models::SubtitleCue;

/// Frame rate assumed when the file does not declare one
const DEFAULT_FPS: f64 = 23.976;

pub(super) fn parse(text: &str) -> Result<Vec<SubtitleCue>, ParseError> {
    static LINE: OnceLock<Regex> = OnceLock::new();
    static STYLE: OnceLock<Regex> = OnceLock::new();
    let line_re = LINE.get_or_init(|| Regex::new(r"^\{(\d+)\}\{(\d*)\}(.*)$").expect("valid regex"));
    let style_re = STYLE.get_or_init(|| Regex::new(r"\{[^{}]*\}").expect("valid regex"));

    let mut fps = DEFAULT_FPS;
    let mut cues = Vec::new();

    for (idx, line) in text.lines().enumerate() {
        let Some(caps) = line_re.captures(line.trim()) else {
            continue;
        };
        let start_frame: u64 = caps[1].parse().map_err(|_| ParseError::Malformed {
            format: "MicroDVD",
            reason: format!("frame number out of range: {}", &caps[1]),
        })?;
        let body = &caps[3];

        if idx == 0 && start_frame <= 1 {
            if let Ok(declared) = body.trim().parse::<f64>() {
                if declared > 0.0 {
                    fps = declared;
                }
                continue;
            }
        }

        let start_ms = (start_frame as f64 * 1000.0 / fps).round() as u64;
        let body = style_re.replace_all(body, "").replace('|', "\n");
        if let Some(cue) = make_cue(start_ms, &body) {
            cues.push(cue);
        }
    }
    Ok(cues)
}
