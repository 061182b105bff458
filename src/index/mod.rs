//! Subtitle indexing
//!
//! - `encoding` - text encoding detection
//! - `parser` - subtitle formats to cues
//! - `tracks` - embedded track extraction and attribution
//! - `cache` - mtime-invalidated parse cache
//! - `scanner` - folder walk
//! - `session` - scan results and search entry point

pub mod cache;
pub mod encoding;
pub mod parser;
pub mod scanner;
pub mod session;
pub mod tracks;

pub use cache::SubtitleCache;
pub use scanner::{scan_folder, ScanListing};
pub use session::Session;
pub use tracks::{FfmpegExtractor, StreamInfo, TrackExtractor, TrackResolver};
