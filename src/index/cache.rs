//! Subtitle parse cache
//!
//! Memoizes parse results per path and re-parses when the file on disk has
//! a newer modification time (or a different length) than the cached entry.
//! Entries are immutable `Arc`s replaced wholesale, so concurrent readers
//! never observe a half-updated entry.

use dashmap::DashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::SystemTime;

use crate::error::SourceError;
use crate::index::{encoding, parser};
use crate::models::{CachedSubtitle, SubFormat};

/// Largest decoded text kept for a degraded entry
pub const MAX_DEGRADED_BYTES: usize = 4 * 1024 * 1024;

/// Concurrent cache of parsed subtitle files
#[derive(Debug, Default)]
pub struct SubtitleCache {
    /// Parsed entries (path -> entry)
    entries: DashMap<PathBuf, Arc<CachedSubtitle>>,
    /// Number of parses performed since creation
    parses: AtomicUsize,
}

impl SubtitleCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the parsed subtitle for `path`, or `None` if it cannot be read.
    pub fn get(&self, path: &Path) -> Option<Arc<CachedSubtitle>> {
        match self.load(path) {
            Ok(entry) => Some(entry),
            Err(SourceError::Missing(_)) => None,
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "subtitle unavailable");
                None
            }
        }
    }

    /// Get the parsed subtitle for `path`, parsing on a miss or stale entry.
    ///
    /// Content that cannot be parsed structurally is not an error: it is
    /// cached as a degraded entry holding the decoded text.
    pub fn load(&self, path: &Path) -> Result<Arc<CachedSubtitle>, SourceError> {
        let meta = std::fs::metadata(path).map_err(|e| SourceError::io(path, e))?;
        if !meta.is_file() {
            return Err(SourceError::Missing(path.to_path_buf()));
        }
        let modified = meta.modified().map_err(|e| SourceError::io(path, e))?;

        if let Some(entry) = self.entries.get(path) {
            if entry.is_fresh(modified, meta.len()) {
                return Ok(Arc::clone(entry.value()));
            }
            tracing::debug!(path = %path.display(), "cache entry is stale");
        }

        let entry = Arc::new(Self::parse_entry(path, modified, meta.len())?);
        self.parses.fetch_add(1, Ordering::Relaxed);
        self.entries.insert(path.to_path_buf(), Arc::clone(&entry));
        Ok(entry)
    }

    fn parse_entry(path: &Path, modified: SystemTime, len: u64) -> Result<CachedSubtitle, SourceError> {
        let bytes = std::fs::read(path).map_err(|e| SourceError::io(path, e))?;
        let encoding = encoding::detect(&bytes);
        let text = encoding::decode(&bytes, encoding);

        let (cues, format, degraded) =
            match parser::parse_text(&text, SubFormat::from_path(path)) {
                Ok(parsed) => {
                    tracing::trace!(
                        path = %path.display(),
                        format = %parsed.format,
                        encoding,
                        cues = parsed.cues.len(),
                        "parsed subtitle"
                    );
                    (parsed.cues, Some(parsed.format), None)
                }
                Err(e) => {
                    tracing::debug!(
                        path = %path.display(),
                        error = %e,
                        "falling back to raw text search"
                    );
                    (Vec::new(), None, Some(cap_degraded(path, text)))
                }
            };

        Ok(CachedSubtitle {
            path: path.to_path_buf(),
            cues,
            last_modified: modified,
            file_len: len,
            format,
            encoding,
            degraded,
        })
    }

    /// Drop every entry; later lookups start cold
    pub fn clear(&self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of parses performed (hits do not count)
    pub fn parse_count(&self) -> usize {
        self.parses.load(Ordering::Relaxed)
    }

    /// Whether `path` currently has an entry, fresh or not
    pub fn contains(&self, path: &Path) -> bool {
        self.entries.contains_key(path)
    }
}

/// Truncate degraded text to [`MAX_DEGRADED_BYTES`] on a char boundary
///
/// Binary files picked up by extension (VobSub `.sub`) would otherwise pin
/// their whole decoded content for the life of the session.
fn cap_degraded(path: &Path, mut text: String) -> String {
    if text.len() <= MAX_DEGRADED_BYTES {
        return text;
    }
    let mut end = MAX_DEGRADED_BYTES;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    tracing::debug!(
        path = %path.display(),
        bytes = text.len(),
        kept = end,
        "truncating degraded text"
    );
    text.truncate(end);
    text.shrink_to_fit();
    text
}
