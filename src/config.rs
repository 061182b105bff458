//! Configuration management for subseek
//!
//! Config is stored at ~/.config/subseek/config.toml. A missing or invalid
//! file silently yields the defaults; `SUBSEEK_*` environment variables
//! override whatever the file says.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::playback::PlayerType;
use crate::search::DEFAULT_WORKERS;

/// Environment variable overriding the ffmpeg binary
pub const ENV_FFMPEG: &str = "SUBSEEK_FFMPEG";
/// Environment variable overriding the ffprobe binary
pub const ENV_FFPROBE: &str = "SUBSEEK_FFPROBE";
/// Environment variable overriding the worker count
pub const ENV_WORKERS: &str = "SUBSEEK_WORKERS";

/// Application configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Concurrent search and extraction jobs
    pub workers: usize,
    /// Match case by default
    pub case_sensitive: bool,
    /// Players to try, most preferred first
    pub players: Vec<PlayerType>,
    pub ffprobe: PathBuf,
    pub ffmpeg: PathBuf,
    /// Seconds before a probe or extraction is killed
    pub extract_timeout_secs: u64,
    /// Where extracted tracks are written (system temp dir when unset)
    pub temp_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            case_sensitive: false,
            players: PlayerType::ALL.to_vec(),
            ffprobe: PathBuf::from("ffprobe"),
            ffmpeg: PathBuf::from("ffmpeg"),
            extract_timeout_secs: 120,
            temp_dir: None,
        }
    }
}

impl Config {
    /// Get config file path (~/.config/subseek/config.toml)
    pub fn path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("subseek").join("config.toml"))
    }

    /// Load config from the default path with environment overrides
    pub fn load() -> Self {
        let mut config = Self::path()
            .map(|p| Self::load_from(&p))
            .unwrap_or_default();
        config.apply_env();
        config
    }

    /// Load config from a file, or return default if missing or invalid
    pub fn load_from(path: &Path) -> Self {
        let Ok(text) = std::fs::read_to_string(path) else {
            return Self::default();
        };
        match toml::from_str(&text) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "ignoring invalid config file");
                Self::default()
            }
        }
    }

    /// Save config to file
    pub fn save(&self) -> Result<()> {
        let path = Self::path().ok_or_else(|| anyhow::anyhow!("Could not determine config path"))?;
        self.save_to(&path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let toml = toml::to_string_pretty(self)?;
        std::fs::write(path, toml)?;
        Ok(())
    }

    /// Apply `SUBSEEK_*` overrides from the process environment
    pub fn apply_env(&mut self) {
        self.apply_env_with(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary variable lookup
    pub fn apply_env_with(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(ffmpeg) = lookup(ENV_FFMPEG).filter(|v| !v.is_empty()) {
            self.ffmpeg = PathBuf::from(ffmpeg);
        }
        if let Some(ffprobe) = lookup(ENV_FFPROBE).filter(|v| !v.is_empty()) {
            self.ffprobe = PathBuf::from(ffprobe);
        }
        if let Some(workers) = lookup(ENV_WORKERS) {
            match workers.trim().parse::<usize>() {
                Ok(n) if n > 0 => self.workers = n,
                _ => tracing::warn!(value = %workers, "ignoring invalid {}", ENV_WORKERS),
            }
        }
    }

    pub fn extract_timeout(&self) -> Duration {
        Duration::from_secs(self.extract_timeout_secs.max(1))
    }

    /// Directory for extracted tracks
    pub fn track_dir(&self) -> PathBuf {
        self.temp_dir
            .clone()
            .unwrap_or_else(|| std::env::temp_dir().join("subseek-tracks"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.workers, 4);
        assert!(!config.case_sensitive);
        assert_eq!(config.players[0], PlayerType::Mpv);
        assert_eq!(config.extract_timeout(), Duration::from_secs(120));
        assert!(config.track_dir().ends_with("subseek-tracks"));
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "workers = 8\nplayers = [\"vlc\", \"mpc-hc\"]\n").unwrap();

        let config = Config::load_from(&path);
        assert_eq!(config.workers, 8);
        assert_eq!(config.players, vec![PlayerType::Vlc, PlayerType::MpcHc]);
        assert_eq!(config.ffmpeg, PathBuf::from("ffmpeg"));
    }

    #[test]
    fn test_invalid_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "workers = \"many\"").unwrap();
        assert_eq!(Config::load_from(&path), Config::default());
        assert_eq!(Config::load_from(&dir.path().join("absent.toml")), Config::default());
    }

    #[test]
    fn test_save_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let config = Config {
            workers: 2,
            temp_dir: Some(PathBuf::from("/var/tmp/tracks")),
            ..Config::default()
        };
        config.save_to(&path).unwrap();
        assert_eq!(Config::load_from(&path), config);
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            (ENV_FFMPEG, "/opt/ffmpeg/bin/ffmpeg"),
            (ENV_WORKERS, "6"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config.apply_env_with(|k| env.get(k).map(|v| v.to_string()));
        assert_eq!(config.ffmpeg, PathBuf::from("/opt/ffmpeg/bin/ffmpeg"));
        assert_eq!(config.ffprobe, PathBuf::from("ffprobe"));
        assert_eq!(config.workers, 6);
    }

    #[test]
    fn test_invalid_worker_override_ignored() {
        let mut config = Config::default();
        config.apply_env_with(|k| (k == ENV_WORKERS).then(|| "0".to_string()));
        assert_eq!(config.workers, 4);
    }
}
