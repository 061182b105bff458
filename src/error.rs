//! Error types for the indexing core
//!
//! Per-item errors (`SourceError`, `ParseError`, `ExtractError`) are
//! recovered from locally. Only `SearchError` escapes a scan or a search.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Systemic failures surfaced to the caller of a scan or search
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("Search text is empty")]
    EmptyQuery,

    #[error("Invalid search query: {0}")]
    InvalidQuery(#[from] regex::Error),

    #[error("Cannot read folder {path}: {source}")]
    FolderUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("No folder has been scanned yet")]
    NotScanned,

    #[error("Worker pool error: {0}")]
    Pool(#[from] PoolError),
}

/// Failure to read a single subtitle source
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("File not found: {0}")]
    Missing(PathBuf),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot parse subtitle: {0}")]
    Parse(#[from] ParseError),

    #[error("Worker task failed: {0}")]
    Task(String),
}

impl SourceError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        if source.kind() == std::io::ErrorKind::NotFound {
            return SourceError::Missing(path.into());
        }
        SourceError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Structural parse failure of subtitle content
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("Unrecognized subtitle format")]
    UnknownFormat,

    #[error("No cues found")]
    Empty,

    #[error("Malformed {format} content: {reason}")]
    Malformed { format: &'static str, reason: String },
}

/// Failure of the external track extractor
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("Failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} timed out after {timeout:?}")]
    Timeout { program: String, timeout: Duration },

    #[error("{program} exited with {status}")]
    Status { program: String, status: String },

    #[error("Unreadable probe output: {0}")]
    Probe(#[from] serde_json::Error),

    #[error("Extractor produced no output file at {0}")]
    MissingOutput(PathBuf),
}

/// Worker pool rejected a job
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PoolError {
    #[error("Worker pool is shut down")]
    ShutDown,

    #[error("Worker job failed: {0}")]
    JobFailed(String),
}

/// Result type alias for systemic operations
pub type Result<T> = std::result::Result<T, SearchError>;
