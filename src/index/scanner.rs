//! Folder walk

use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::models::SourceKind;

/// Files found under a scanned root
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanListing {
    /// Standalone subtitle files, sorted
    pub subtitles: Vec<PathBuf>,
    /// Containers that may embed subtitle tracks, sorted
    pub containers: Vec<PathBuf>,
}

impl ScanListing {
    /// Drop subtitle files that live under `dir`
    ///
    /// Paths are compared in canonical form, so a relative scan root still
    /// matches an absolute `dir`.
    pub fn exclude_dir(&mut self, dir: &Path) {
        // Nothing can be inside a directory that does not exist yet
        let Ok(dir) = std::fs::canonicalize(dir) else {
            return;
        };
        self.subtitles.retain(|path| match std::fs::canonicalize(path) {
            Ok(resolved) => !resolved.starts_with(&dir),
            Err(_) => !path.starts_with(&dir),
        });
    }
}

/// Recursively list subtitle files and containers under `root`
///
/// Symlinks are not followed. Entries that cannot be read are skipped; only
/// an unreadable root is an error.
pub fn scan_folder(root: &Path) -> std::io::Result<ScanListing> {
    // Surface an unreadable root instead of silently returning nothing
    std::fs::read_dir(root)?;

    let mut listing = ScanListing::default();
    for entry in WalkDir::new(root).follow_links(false) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::debug!(error = %e, "skipping unreadable entry");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        match SourceKind::classify(entry.path()) {
            Some(SourceKind::Subtitle) => listing.subtitles.push(entry.into_path()),
            Some(SourceKind::Container) => listing.containers.push(entry.into_path()),
            None => {}
        }
    }

    listing.subtitles.sort();
    listing.containers.sort();
    tracing::debug!(
        root = %root.display(),
        subtitles = listing.subtitles.len(),
        containers = listing.containers.len(),
        "folder walk complete"
    );
    Ok(listing)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_scan_classifies_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("season1/extras")).unwrap();
        fs::write(root.join("b.srt"), "").unwrap();
        fs::write(root.join("a.VTT"), "").unwrap();
        fs::write(root.join("season1/ep1.mkv"), "").unwrap();
        fs::write(root.join("season1/extras/notes.txt"), "").unwrap();
        fs::write(root.join("season1/extras/ep1.ass"), "").unwrap();
        fs::write(root.join("movie.mp4"), "").unwrap();

        let listing = scan_folder(root).unwrap();
        assert_eq!(
            listing.subtitles,
            vec![
                root.join("a.VTT"),
                root.join("b.srt"),
                root.join("season1/extras/ep1.ass"),
            ]
        );
        assert_eq!(listing.containers, vec![root.join("season1/ep1.mkv")]);
    }

    #[test]
    fn test_directory_named_like_subtitle_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("fake.srt")).unwrap();
        assert!(scan_folder(dir.path()).unwrap().subtitles.is_empty());
    }

    #[test]
    fn test_exclude_dir_matches_any_spelling() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::create_dir(root.join(".tracks")).unwrap();
        fs::create_dir(root.join("season")).unwrap();
        fs::write(root.join("a.srt"), "").unwrap();
        fs::write(root.join(".tracks/b-1234abcd_en_track0.srt"), "").unwrap();

        let mut listing = scan_folder(root).unwrap();
        assert_eq!(listing.subtitles.len(), 2);

        // Same directory, different spelling than the walked paths
        listing.exclude_dir(&root.join("season/../.tracks"));
        assert_eq!(listing.subtitles, vec![root.join("a.srt")]);
    }

    #[test]
    fn test_exclude_missing_dir_keeps_everything() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.srt"), "").unwrap();
        let mut listing = scan_folder(dir.path()).unwrap();
        listing.exclude_dir(&dir.path().join("nope"));
        assert_eq!(listing.subtitles, vec![dir.path().join("a.srt")]);
    }

    #[test]
    fn test_missing_root_is_error() {
        assert!(scan_folder(Path::new("/definitely/not/a/folder")).is_err());
    }

    #[test]
    fn test_file_root_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("a.srt");
        fs::write(&file, "").unwrap();
        assert!(scan_folder(&file).is_err());
    }
}
