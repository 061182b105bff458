//! subseek - full-text search across subtitle files
//!
//! Point it at a folder and it finds standalone subtitle files as well as
//! subtitle tracks embedded in MKV containers, then searches all of them
//! concurrently and reports each hit with its timestamp.
//!
//! # Modules
//!
//! - `models` - Data structures for cues, tracks and matches
//! - `index` - Encoding detection, parsing, track extraction, cache, session
//! - `search` - Query matching, dispatcher and worker pool
//! - `playback` - Opening a video at a timestamp
//! - `config` - Configuration file and environment overrides
//! - `cli` - Argument parsing and output formatting for the binary

pub mod cli;
pub mod config;
pub mod error;
pub mod index;
pub mod models;
pub mod playback;
pub mod search;

// Re-export commonly used types
pub use models::{
    CachedSubtitle, ScanSummary, SearchMatch, SubFormat, SubtitleCue, TrackInfo,
};

pub use config::Config;
pub use error::{ExtractError, ParseError, PoolError, SearchError, SourceError};
pub use index::{Session, SubtitleCache, TrackExtractor};
pub use playback::{LaunchOutcome, Launcher, PlayerError, PlayerType};
pub use search::{Dispatcher, Matcher, SearchOutcome, SearchTarget, WorkerPool};
