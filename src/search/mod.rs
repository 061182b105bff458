//! Concurrent search across subtitle sources
//!
//! Each file is searched independently on the [`WorkerPool`]. A file that
//! cannot be read becomes a [`FileFailure`] in the outcome; only problems
//! with the query itself or the pool abort a search.

pub mod pool;

pub use pool::{WorkerPool, DEFAULT_WORKERS};

use regex::{Regex, RegexBuilder};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;

use crate::error::{PoolError, SearchError, SourceError};
use crate::index::cache::SubtitleCache;
use crate::models::{SearchMatch, DEGRADED_MATCH_TEXT};

// =============================================================================
// Query
// =============================================================================

/// Literal substring matcher
#[derive(Debug, Clone)]
pub struct Matcher {
    regex: Regex,
    case_sensitive: bool,
}

impl Matcher {
    /// Build a matcher for `query`, ignoring surrounding whitespace
    pub fn new(query: &str, case_sensitive: bool) -> Result<Self, SearchError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(SearchError::EmptyQuery);
        }
        let regex = RegexBuilder::new(&regex::escape(query))
            .case_insensitive(!case_sensitive)
            .build()?;
        Ok(Self {
            regex,
            case_sensitive,
        })
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }

    pub fn is_case_sensitive(&self) -> bool {
        self.case_sensitive
    }
}

// =============================================================================
// Targets and outcome
// =============================================================================

/// A subtitle source to search, with how its hits are presented
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchTarget {
    pub path: PathBuf,
    pub display_name: String,
    /// File a player should open for hits in this source
    pub video_path: PathBuf,
}

impl SearchTarget {
    /// A target displayed by its own path
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        Self {
            display_name: path.display().to_string(),
            video_path: path.clone(),
            path,
        }
    }
}

/// A source that could not be searched
#[derive(Debug)]
pub struct FileFailure {
    pub path: PathBuf,
    pub error: SourceError,
}

#[derive(Debug, Default)]
pub struct SearchOutcome {
    pub matches: Vec<SearchMatch>,
    pub files_searched: usize,
    pub failures: Vec<FileFailure>,
}

impl SearchOutcome {
    /// Order matches by display name, then time, then text
    pub fn sort(&mut self) {
        self.matches.sort_by(|a, b| {
            a.display_name
                .cmp(&b.display_name)
                .then(a.start_ms.cmp(&b.start_ms))
                .then_with(|| a.text.cmp(&b.text))
        });
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    /// Counts for machine-readable output
    pub fn stats(&self) -> SearchStats {
        SearchStats {
            matches: self.matches.len(),
            files_searched: self.files_searched,
            failed: self.failures.len(),
            degraded: self.matches.iter().filter(|m| m.is_degraded()).count(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SearchStats {
    pub matches: usize,
    pub files_searched: usize,
    pub failed: usize,
    pub degraded: usize,
}

// =============================================================================
// Dispatcher
// =============================================================================

/// Fans a query out over many sources and merges the hits
#[derive(Debug, Clone)]
pub struct Dispatcher {
    cache: Arc<SubtitleCache>,
    pool: WorkerPool,
}

impl Dispatcher {
    pub fn new(cache: Arc<SubtitleCache>, pool: WorkerPool) -> Self {
        Self { cache, pool }
    }

    pub fn cache(&self) -> &Arc<SubtitleCache> {
        &self.cache
    }

    /// Search every target for `query`
    ///
    /// Hits are grouped per target in the order targets are given, and in
    /// file order within a target. An empty match list is a success.
    pub async fn search(
        &self,
        targets: &[SearchTarget],
        query: &str,
        case_sensitive: bool,
    ) -> Result<SearchOutcome, SearchError> {
        let matcher = Arc::new(Matcher::new(query, case_sensitive)?);
        tracing::debug!(query = query.trim(), case_sensitive, files = targets.len(), "search started");

        let mut jobs = Vec::with_capacity(targets.len());
        for target in targets {
            let cache = Arc::clone(&self.cache);
            let matcher = Arc::clone(&matcher);
            let job_target = target.clone();
            let handle = self
                .pool
                .submit(move || search_file(&cache, &matcher, &job_target))?;
            jobs.push((target.path.clone(), handle));
        }

        let mut outcome = SearchOutcome {
            files_searched: targets.len(),
            ..Default::default()
        };
        for (path, handle) in jobs {
            let error = match handle.await {
                Ok(Ok(Ok(matches))) => {
                    outcome.matches.extend(matches);
                    continue;
                }
                Ok(Ok(Err(e))) => e,
                Ok(Err(PoolError::ShutDown)) => return Err(PoolError::ShutDown.into()),
                Ok(Err(PoolError::JobFailed(msg))) => SourceError::Task(msg),
                Err(e) => SourceError::Task(e.to_string()),
            };
            tracing::debug!(path = %path.display(), error = %error, "file not searched");
            outcome.failures.push(FileFailure { path, error });
        }

        tracing::info!(
            matches = outcome.matches.len(),
            files = outcome.files_searched,
            failed = outcome.failures.len(),
            "search finished"
        );
        Ok(outcome)
    }
}

/// Search one source through the cache
pub fn search_file(
    cache: &SubtitleCache,
    matcher: &Matcher,
    target: &SearchTarget,
) -> Result<Vec<SearchMatch>, SourceError> {
    let entry = cache.load(&target.path)?;

    if let Some(text) = &entry.degraded {
        if !matcher.is_match(text) {
            return Ok(Vec::new());
        }
        return Ok(vec![make_match(target, None, DEGRADED_MATCH_TEXT)]);
    }

    Ok(entry
        .cues
        .iter()
        .filter(|cue| matcher.is_match(&cue.text))
        .map(|cue| make_match(target, Some(cue.start_ms), cue.text.trim()))
        .collect())
}

fn make_match(target: &SearchTarget, start_ms: Option<u64>, text: &str) -> SearchMatch {
    SearchMatch {
        display_name: target.display_name.clone(),
        start_ms,
        text: text.to_string(),
        source_path: target.path.clone(),
        video_path: target.video_path.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matcher_rejects_blank_query() {
        assert!(matches!(Matcher::new("", false), Err(SearchError::EmptyQuery)));
        assert!(matches!(Matcher::new("  \t ", true), Err(SearchError::EmptyQuery)));
    }

    #[test]
    fn test_matcher_is_literal() {
        let m = Matcher::new("a.c (x)", false).unwrap();
        assert!(m.is_match("so a.c (x) here"));
        assert!(!m.is_match("abc (x)"));
    }

    #[test]
    fn test_matcher_case() {
        let insensitive = Matcher::new("Hello", false).unwrap();
        assert!(insensitive.is_match("hello world"));
        assert!(!insensitive.is_case_sensitive());

        let sensitive = Matcher::new("Hello", true).unwrap();
        assert!(!sensitive.is_match("hello world"));
        assert!(sensitive.is_match("Hello world"));
    }

    #[test]
    fn test_matcher_trims_query() {
        let m = Matcher::new("  world ", true).unwrap();
        assert!(m.is_match("hello world!"));
    }

    #[test]
    fn test_outcome_sort() {
        let target_b = SearchTarget::new("b.srt");
        let target_a = SearchTarget::new("a.srt");
        let mut outcome = SearchOutcome {
            matches: vec![
                make_match(&target_b, Some(1_000), "x"),
                make_match(&target_a, Some(9_000), "y"),
                make_match(&target_a, Some(2_000), "z"),
            ],
            files_searched: 2,
            failures: Vec::new(),
        };
        outcome.sort();
        let order: Vec<(&str, Option<u64>)> = outcome
            .matches
            .iter()
            .map(|m| (m.display_name.as_str(), m.start_ms))
            .collect();
        assert_eq!(
            order,
            vec![("a.srt", Some(2_000)), ("a.srt", Some(9_000)), ("b.srt", Some(1_000))]
        );
    }

    #[test]
    fn test_search_file_trims_and_filters() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.srt");
        std::fs::write(
            &path,
            "1\n00:00:01,000 --> 00:00:02,000\n  hello there  \n\n2\n00:00:03,000 --> 00:00:04,000\nbye\n",
        )
        .unwrap();
        let cache = SubtitleCache::new();
        let matcher = Matcher::new("hello", false).unwrap();
        let matches = search_file(&cache, &matcher, &SearchTarget::new(&path)).unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].text, "hello there");
        assert_eq!(matches[0].start_ms, Some(1_000));
    }
}
