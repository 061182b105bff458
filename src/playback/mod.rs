//! Playback launcher
//!
//! Opens a video in the first local player that can be started, seeking to
//! a match's timestamp. Players are started detached and never awaited.

pub mod player;

pub use player::PlayerType;

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use thiserror::Error;
use tokio::process::Command;

use crate::models::format_timestamp;

/// Errors from launching playback
#[derive(Debug, Error)]
pub enum PlayerError {
    #[error("Video not found: {0}")]
    VideoNotFound(PathBuf),
    #[error("No player or default application could open the video: {0}")]
    NoHandler(#[source] std::io::Error),
}

/// How the video ended up being opened
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LaunchOutcome {
    /// A known player was started at the requested time
    Player(PlayerType),
    /// The system default application was used; it cannot seek
    DefaultHandler { hint: String },
}

impl LaunchOutcome {
    pub fn message(&self) -> String {
        match self {
            LaunchOutcome::Player(player) => format!("Opened in {}", player),
            LaunchOutcome::DefaultHandler { hint } => hint.clone(),
        }
    }
}

/// Starts players in priority order
#[derive(Debug, Clone)]
pub struct Launcher {
    players: Vec<PlayerType>,
}

impl Default for Launcher {
    fn default() -> Self {
        Self::new(PlayerType::ALL.to_vec())
    }
}

impl Launcher {
    pub fn new(players: Vec<PlayerType>) -> Self {
        Self { players }
    }

    pub fn players(&self) -> &[PlayerType] {
        &self.players
    }

    /// Open `video` at `start_secs`
    pub async fn open_at(&self, video: &Path, start_secs: u64) -> Result<LaunchOutcome, PlayerError> {
        if !video.exists() {
            return Err(PlayerError::VideoNotFound(video.to_path_buf()));
        }

        for player in &self.players {
            match spawn_detached(player.command(), player.args(video, start_secs)) {
                Ok(()) => {
                    tracing::info!(player = %player, video = %video.display(), start_secs, "player started");
                    return Ok(LaunchOutcome::Player(*player));
                }
                Err(e) => {
                    tracing::debug!(player = %player, error = %e, "player not available");
                }
            }
        }

        let (program, args) = default_opener(video);
        spawn_detached(program, args).map_err(PlayerError::NoHandler)?;
        tracing::info!(video = %video.display(), "opened with default application");
        Ok(LaunchOutcome::DefaultHandler {
            hint: format!(
                "No supported player found; opened with the default application. Seek to {} manually.",
                format_timestamp(start_secs.saturating_mul(1000))
            ),
        })
    }
}

/// Platform command that opens a file with its default application
fn default_opener(video: &Path) -> (&'static str, Vec<OsString>) {
    if cfg!(target_os = "windows") {
        (
            "cmd",
            vec!["/C".into(), "start".into(), "".into(), video.into()],
        )
    } else if cfg!(target_os = "macos") {
        ("open", vec![video.into()])
    } else {
        ("xdg-open", vec![video.into()])
    }
}

/// Start a process that outlives us, with no ties to our terminal
fn spawn_detached(program: &str, args: Vec<OsString>) -> std::io::Result<()> {
    let mut cmd = Command::new(program);
    cmd.args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null());

    // Own process group, so Ctrl-C in our terminal does not reach the player
    #[cfg(unix)]
    cmd.process_group(0);

    // Dropping the handle leaves the child running
    cmd.spawn().map(|_child| ())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_video() {
        let launcher = Launcher::default();
        let err = tokio_test::block_on(launcher.open_at(Path::new("/definitely/not/here.mkv"), 10))
            .unwrap_err();
        assert!(matches!(err, PlayerError::VideoNotFound(_)));
    }

    #[test]
    fn test_default_launcher_order() {
        assert_eq!(Launcher::default().players(), &PlayerType::ALL);
    }

    #[test]
    fn test_outcome_message() {
        assert_eq!(LaunchOutcome::Player(PlayerType::Mpv).message(), "Opened in mpv");
        let hint = LaunchOutcome::DefaultHandler {
            hint: "Seek to 00:01:00 manually.".to_string(),
        };
        assert!(hint.message().contains("00:01:00"));
    }

    #[cfg(unix)]
    #[test]
    fn test_spawn_detached() {
        tokio_test::assert_ok!(tokio_test::block_on(async {
            spawn_detached("sh", vec!["-c".into(), "exit 0".into()])
        }));
        tokio_test::assert_err!(tokio_test::block_on(async {
            spawn_detached("subseek-no-such-player", Vec::new())
        }));
    }

    #[test]
    fn test_default_opener_passes_video() {
        let (_, args) = default_opener(Path::new("/m/a.mkv"));
        assert_eq!(args.last().unwrap(), &OsString::from("/m/a.mkv"));
    }
}
