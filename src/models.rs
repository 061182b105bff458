//! Data structures and types for subseek
//!
//! Contains the shared models used across the crate organized by domain:
//! - **Formats**: subtitle file formats and their extensions
//! - **Cues**: parsed subtitle entries and cached parse results
//! - **Tracks**: attribution of subtitle sources to their video files
//! - **Search**: per-query matches and scan summaries

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Extensions recognized as standalone subtitle files
pub const SUBTITLE_EXTENSIONS: &[&str] = &["srt", "vtt", "ass", "ssa", "sub", "sbv", "ttml"];

/// Extensions recognized as containers with embedded subtitle tracks
pub const CONTAINER_EXTENSIONS: &[&str] = &["mkv"];

/// Placeholder shown instead of a timestamp for degraded matches
pub const UNRESOLVED_TIME: &str = "--:--:--";

/// Placeholder text for a match found without cue resolution
pub const DEGRADED_MATCH_TEXT: &str = "Text found (format not parsed)";

// =============================================================================
// Subtitle Formats
// =============================================================================

/// Subtitle file format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubFormat {
    Srt,
    WebVtt,
    Ass,
    Ssa,
    MicroDvd,
    Sbv,
    Ttml,
}

impl SubFormat {
    /// Parse format from file extension
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "srt" => Some(SubFormat::Srt),
            "vtt" | "webvtt" => Some(SubFormat::WebVtt),
            "ass" => Some(SubFormat::Ass),
            "ssa" => Some(SubFormat::Ssa),
            "sub" => Some(SubFormat::MicroDvd),
            "sbv" => Some(SubFormat::Sbv),
            "ttml" | "dfxp" | "xml" => Some(SubFormat::Ttml),
            _ => None,
        }
    }

    /// Format of a path, judged by its extension
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }

    /// Map an ffprobe codec name to the format it is stored in natively
    pub fn from_codec(codec: &str) -> Option<Self> {
        match codec {
            "subrip" | "srt" => Some(SubFormat::Srt),
            "ass" => Some(SubFormat::Ass),
            "ssa" => Some(SubFormat::Ssa),
            "webvtt" => Some(SubFormat::WebVtt),
            _ => None,
        }
    }

    /// Get file extension for this format
    pub fn extension(&self) -> &'static str {
        match self {
            SubFormat::Srt => "srt",
            SubFormat::WebVtt => "vtt",
            SubFormat::Ass => "ass",
            SubFormat::Ssa => "ssa",
            SubFormat::MicroDvd => "sub",
            SubFormat::Sbv => "sbv",
            SubFormat::Ttml => "ttml",
        }
    }
}

impl fmt::Display for SubFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubFormat::Srt => write!(f, "SRT"),
            SubFormat::WebVtt => write!(f, "WebVTT"),
            SubFormat::Ass => write!(f, "ASS"),
            SubFormat::Ssa => write!(f, "SSA"),
            SubFormat::MicroDvd => write!(f, "MicroDVD"),
            SubFormat::Sbv => write!(f, "SBV"),
            SubFormat::Ttml => write!(f, "TTML"),
        }
    }
}

/// Kind of file discovered during a folder walk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// Standalone subtitle file
    Subtitle,
    /// Video container that may embed subtitle tracks
    Container,
}

impl SourceKind {
    /// Classify a path by its extension, `None` for anything else
    pub fn classify(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_lowercase();
        if SUBTITLE_EXTENSIONS.contains(&ext.as_str()) {
            Some(SourceKind::Subtitle)
        } else if CONTAINER_EXTENSIONS.contains(&ext.as_str()) {
            Some(SourceKind::Container)
        } else {
            None
        }
    }
}

// =============================================================================
// Cue Models
// =============================================================================

/// A single timed subtitle entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubtitleCue {
    /// Start time in milliseconds
    pub start_ms: u64,
    pub text: String,
}

impl SubtitleCue {
    pub fn new(start_ms: u64, text: impl Into<String>) -> Self {
        Self {
            start_ms,
            text: text.into(),
        }
    }
}

/// Memoized parse result for one subtitle source
///
/// Entries are shared behind an `Arc` and replaced wholesale when stale.
#[derive(Debug, Clone)]
pub struct CachedSubtitle {
    pub path: PathBuf,
    /// Cues in file order; empty when `degraded` is set
    pub cues: Vec<SubtitleCue>,
    /// Modification time of the file when it was parsed
    pub last_modified: SystemTime,
    /// File length when it was parsed
    pub file_len: u64,
    /// Format the content was parsed as
    pub format: Option<SubFormat>,
    /// Encoding label used to decode the file
    pub encoding: &'static str,
    /// Decoded text of a file that could not be parsed structurally
    pub degraded: Option<String>,
}

impl CachedSubtitle {
    /// Whether structural parsing failed for this source
    pub fn is_degraded(&self) -> bool {
        self.degraded.is_some()
    }

    /// Whether this entry still describes a file with the given metadata
    pub fn is_fresh(&self, modified: SystemTime, len: u64) -> bool {
        self.last_modified >= modified && self.file_len == len
    }
}

// =============================================================================
// Track Models
// =============================================================================

/// Attribution of a subtitle source to the video it belongs to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackInfo {
    pub source_video_path: PathBuf,
    pub is_extracted: bool,
    /// Subtitle stream index inside the container, -1 for standalone files
    pub track_index: i32,
    pub language: Option<String>,
    pub title: Option<String>,
    /// ffprobe codec name of an extracted stream
    #[serde(skip_serializing_if = "Option::is_none")]
    pub codec: Option<String>,
}

impl TrackInfo {
    /// Track info for a standalone subtitle file (maps to itself)
    pub fn standalone(path: impl Into<PathBuf>) -> Self {
        Self {
            source_video_path: path.into(),
            is_extracted: false,
            track_index: -1,
            language: None,
            title: None,
            codec: None,
        }
    }

    /// Bracketed annotation for an extracted track, e.g. `[Track 0: en]`
    pub fn annotation(&self) -> Option<String> {
        if !self.is_extracted {
            return None;
        }
        let lang = self.language.as_deref().unwrap_or("unknown");
        Some(match self.title.as_deref().filter(|t| !t.is_empty()) {
            Some(title) => format!("[Track {}: {} - {}]", self.track_index, lang, title),
            None => format!("[Track {}: {}]", self.track_index, lang),
        })
    }
}

// =============================================================================
// Search Models
// =============================================================================

/// A single search hit
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SearchMatch {
    /// Relative path of the video or subtitle, plus track annotation
    pub display_name: String,
    /// Start time in milliseconds, `None` for degraded matches
    pub start_ms: Option<u64>,
    pub text: String,
    /// Subtitle file the match came from
    pub source_path: PathBuf,
    /// File to open in a player for this match
    pub video_path: PathBuf,
}

impl SearchMatch {
    /// Formatted start time (`HH:MM:SS` or the unresolved marker)
    pub fn time(&self) -> String {
        match self.start_ms {
            Some(ms) => format_timestamp(ms),
            None => UNRESOLVED_TIME.to_string(),
        }
    }

    /// Start offset in whole seconds for seeking a player
    pub fn start_secs(&self) -> u64 {
        self.start_ms.map(|ms| ms / 1000).unwrap_or(0)
    }

    /// Whether the match was found without timestamp resolution
    pub fn is_degraded(&self) -> bool {
        self.start_ms.is_none()
    }
}

impl fmt::Display for SearchMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}  {}  {}",
            self.display_name,
            self.time(),
            self.text.replace('\n', " / ")
        )
    }
}

/// Counts reported after a folder scan
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanSummary {
    /// Standalone subtitle files found
    pub standalone: usize,
    /// Subtitle tracks extracted from containers
    pub extracted: usize,
    /// Containers inspected for embedded tracks
    pub containers: usize,
}

impl ScanSummary {
    /// Total searchable subtitle sources
    pub fn total(&self) -> usize {
        self.standalone + self.extracted
    }
}

impl fmt::Display for ScanSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Found {} subtitle files ({} standalone, {} extracted from {} containers)",
            self.total(),
            self.standalone,
            self.extracted,
            self.containers
        )
    }
}

// =============================================================================
// Utility Functions
// =============================================================================

/// Format milliseconds as HH:MM:SS
pub fn format_timestamp(ms: u64) -> String {
    let total_secs = ms / 1000;
    let hours = total_secs / 3600;
    let mins = (total_secs % 3600) / 60;
    let secs = total_secs % 60;
    format!("{:02}:{:02}:{:02}", hours, mins, secs)
}

/// Parse a timestamp (HH:MM:SS, MM:SS or plain seconds) to seconds
pub fn parse_timestamp(s: &str) -> Option<u64> {
    let parts: Vec<&str> = s.trim().split(':').collect();
    match parts.len() {
        1 => parts[0].parse().ok(),
        2 => {
            let mins: u64 = parts[0].parse().ok()?;
            let secs: u64 = parts[1].parse().ok()?;
            mins.checked_mul(60)?.checked_add(secs)
        }
        3 => {
            let hours: u64 = parts[0].parse().ok()?;
            let mins: u64 = parts[1].parse().ok()?;
            let secs: u64 = parts[2].parse().ok()?;
            hours.checked_mul(60)?.checked_add(mins)?.checked_mul(60)?.checked_add(secs)
        }
        _ => None,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
