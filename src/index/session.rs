//! Search session
//!
//! A [`Session`] owns everything a scan produces: the root folder, the list
//! of searchable sources, their track attribution, the parse cache and the
//! worker pool. Every scan replaces the previous results wholesale.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::{JoinHandle, JoinSet};

use crate::config::Config;
use crate::error::{PoolError, Result, SearchError};
use crate::index::cache::SubtitleCache;
use crate::index::scanner::{self, ScanListing};
use crate::index::tracks::{FfmpegExtractor, TrackExtractor, TrackResolver};
use crate::models::{ScanSummary, TrackInfo};
use crate::search::{Dispatcher, SearchOutcome, SearchTarget, WorkerPool};

/// Video extensions considered when pairing a subtitle with its video
const VIDEO_EXTENSIONS: &[&str] = &["mkv", "mp4", "avi", "mov", "m4v", "webm", "wmv"];

/// Results of the most recent scan
#[derive(Debug)]
struct ScanState {
    root: PathBuf,
    targets: Arc<Vec<SearchTarget>>,
    /// Path -> position in `targets`
    index: HashMap<PathBuf, usize>,
    tracks: HashMap<PathBuf, TrackInfo>,
    summary: ScanSummary,
}

pub struct Session<E = FfmpegExtractor> {
    config: Config,
    pool: WorkerPool,
    cache: Arc<SubtitleCache>,
    resolver: Arc<TrackResolver<E>>,
    dispatcher: Dispatcher,
    /// Bumped on every scan and on shutdown; background work from an older
    /// generation stops early
    generation: Arc<AtomicU64>,
    state: Option<ScanState>,
}

impl Session<FfmpegExtractor> {
    /// Create a session that extracts tracks with ffprobe/ffmpeg
    pub fn new(config: Config) -> Self {
        let extractor = FfmpegExtractor::new(
            config.ffprobe.clone(),
            config.ffmpeg.clone(),
            config.extract_timeout(),
        );
        Self::with_extractor(config, extractor)
    }
}

impl<E: TrackExtractor> Session<E> {
    pub fn with_extractor(config: Config, extractor: E) -> Self {
        let pool = WorkerPool::new(config.workers);
        let cache = Arc::new(SubtitleCache::new());
        let resolver = Arc::new(TrackResolver::new(extractor, config.track_dir()));
        let dispatcher = Dispatcher::new(Arc::clone(&cache), pool.clone());
        Self {
            config,
            pool,
            cache,
            resolver,
            dispatcher,
            generation: Arc::new(AtomicU64::new(0)),
            state: None,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn cache(&self) -> &Arc<SubtitleCache> {
        &self.cache
    }

    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Root of the last scan
    pub fn root(&self) -> Option<&Path> {
        self.state.as_ref().map(|s| s.root.as_path())
    }

    /// Summary of the last scan
    pub fn summary(&self) -> Option<ScanSummary> {
        self.state.as_ref().map(|s| s.summary)
    }

    /// Searchable sources of the last scan, standalone files first
    pub fn targets(&self) -> &[SearchTarget] {
        self.state.as_ref().map(|s| s.targets.as_slice()).unwrap_or(&[])
    }

    /// Display name of a source from the last scan
    pub fn display_name(&self, path: &Path) -> Option<&str> {
        let state = self.state.as_ref()?;
        let idx = *state.index.get(path)?;
        Some(state.targets[idx].display_name.as_str())
    }

    /// Track attribution of a source from the last scan
    pub fn track(&self, path: &Path) -> Option<&TrackInfo> {
        self.state.as_ref()?.tracks.get(path)
    }

    /// Scan `root` for subtitle files and containers
    ///
    /// Clears the cache and replaces the previous scan results.
    pub async fn scan(&mut self, root: &Path) -> Result<ScanSummary> {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.cache.clear();

        let walk_root = root.to_path_buf();
        let track_dir = self.resolver.temp_dir().to_path_buf();
        let listing = tokio::task::spawn_blocking(move || {
            let mut listing = scanner::scan_folder(&walk_root)?;
            // Leftovers of earlier extractions are not standalone files
            listing.exclude_dir(&track_dir);
            Ok::<_, std::io::Error>(listing)
        })
        .await
        .map_err(|e| SearchError::Pool(PoolError::JobFailed(e.to_string())))?
        .map_err(|source| SearchError::FolderUnreadable {
            path: root.to_path_buf(),
            source,
        })?;

        let state = self.build_state(root, listing).await;
        tracing::info!(root = %root.display(), "{}", state.summary);
        let summary = state.summary;
        self.state = Some(state);
        Ok(summary)
    }

    /// Scan the last root again
    pub async fn rescan(&mut self) -> Result<ScanSummary> {
        let root = self.root().ok_or(SearchError::NotScanned)?.to_path_buf();
        self.scan(&root).await
    }

    async fn build_state(&self, root: &Path, listing: ScanListing) -> ScanState {
        let extracted = self.resolve_containers(&listing.containers).await;

        let mut state = ScanState {
            root: root.to_path_buf(),
            targets: Arc::new(Vec::new()),
            index: HashMap::new(),
            tracks: HashMap::new(),
            summary: ScanSummary {
                containers: listing.containers.len(),
                ..Default::default()
            },
        };
        let mut targets = Vec::new();

        for path in listing.subtitles {
            if state.index.contains_key(&path) {
                continue;
            }
            let target = SearchTarget {
                display_name: relative_name(root, &path),
                video_path: sibling_video(&path).unwrap_or_else(|| path.clone()),
                path: path.clone(),
            };
            state.index.insert(path.clone(), targets.len());
            state.tracks.insert(path, TrackInfo::standalone(target.path.clone()));
            targets.push(target);
            state.summary.standalone += 1;
        }

        for (path, info) in extracted.into_iter().flatten() {
            if state.index.contains_key(&path) {
                continue;
            }
            let mut display_name = relative_name(root, &info.source_video_path);
            if let Some(annotation) = info.annotation() {
                display_name.push(' ');
                display_name.push_str(&annotation);
            }
            state.index.insert(path.clone(), targets.len());
            targets.push(SearchTarget {
                path: path.clone(),
                display_name,
                video_path: info.source_video_path.clone(),
            });
            state.tracks.insert(path, info);
            state.summary.extracted += 1;
        }

        state.targets = Arc::new(targets);
        state
    }

    /// Extract tracks of all containers, up to the pool size at a time
    ///
    /// Results come back in container order.
    async fn resolve_containers(&self, containers: &[PathBuf]) -> Vec<Vec<(PathBuf, TrackInfo)>> {
        let limit = Arc::new(Semaphore::new(self.pool.size()));
        let mut set = JoinSet::new();
        for (idx, container) in containers.iter().cloned().enumerate() {
            let resolver = Arc::clone(&self.resolver);
            let limit = Arc::clone(&limit);
            set.spawn(async move {
                let _permit = limit.acquire_owned().await.ok();
                (idx, resolver.resolve_tracks(&container).await)
            });
        }

        let mut resolved = vec![Vec::new(); containers.len()];
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok((idx, tracks)) => resolved[idx] = tracks,
                Err(e) => tracing::warn!(error = %e, "track resolution task failed"),
            }
        }
        resolved
    }

    /// Populate the cache for the current sources in the background
    ///
    /// The task resolves to the number of sources loaded. It stops early
    /// once a newer scan starts or the session shuts down.
    pub fn preload(&self) -> Result<JoinHandle<usize>> {
        let state = self.state.as_ref().ok_or(SearchError::NotScanned)?;
        let targets = Arc::clone(&state.targets);
        let cache = Arc::clone(&self.cache);
        let pool = self.pool.clone();
        let generation = Arc::clone(&self.generation);
        let started = generation.load(Ordering::SeqCst);

        Ok(tokio::spawn(async move {
            let mut loaded = 0;
            // One batch at a time so searches are never stuck behind a
            // long preload queue
            for batch in targets.chunks(pool.size()) {
                if generation.load(Ordering::SeqCst) != started {
                    tracing::debug!(loaded, "preload superseded");
                    return loaded;
                }
                let mut handles = Vec::with_capacity(batch.len());
                for target in batch {
                    let cache = Arc::clone(&cache);
                    let path = target.path.clone();
                    match pool.submit(move || cache.get(&path).is_some()) {
                        Ok(handle) => handles.push(handle),
                        Err(_) => return loaded,
                    }
                }
                for handle in handles {
                    if let Ok(Ok(true)) = handle.await {
                        loaded += 1;
                    }
                }
            }
            tracing::debug!(loaded, "preload complete");
            loaded
        }))
    }

    /// Search the sources of the last scan
    pub async fn search(&self, query: &str, case_sensitive: bool) -> Result<SearchOutcome> {
        let state = self.state.as_ref().ok_or(SearchError::NotScanned)?;
        self.dispatcher
            .search(&state.targets, query, case_sensitive)
            .await
    }

    /// Drop cached data and stop the worker pool
    pub fn shutdown(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.cache.clear();
        self.pool.shutdown();
    }
}

/// Path relative to the scan root, for display
fn relative_name(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .display()
        .to_string()
}

/// A video next to `subtitle` sharing its name
///
/// `movie.srt` and `movie.en.srt` both pair with `movie.mkv`.
fn sibling_video(subtitle: &Path) -> Option<PathBuf> {
    let dir = subtitle.parent()?;
    let stem = subtitle.file_stem()?.to_str()?;

    let mut stems = vec![stem];
    if let Some((base, _lang)) = stem.rsplit_once('.') {
        stems.push(base);
    }
    stems.into_iter().find_map(|stem| {
        VIDEO_EXTENSIONS
            .iter()
            .map(|ext| dir.join(format!("{}.{}", stem, ext)))
            .find(|candidate| candidate.is_file())
    })
}
