//! Local players and their seek flags

use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::path::Path;

/// Supported local players, in default priority order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PlayerType {
    Mpv,
    Vlc,
    Iina,
    MpcHc,
    Mplayer,
}

impl PlayerType {
    /// Every player, most preferred first
    pub const ALL: [PlayerType; 5] = [
        PlayerType::Mpv,
        PlayerType::Vlc,
        PlayerType::Iina,
        PlayerType::MpcHc,
        PlayerType::Mplayer,
    ];

    /// Get the command name for this player
    pub fn command(&self) -> &'static str {
        match self {
            PlayerType::Mpv => "mpv",
            PlayerType::Vlc => {
                // On macOS, VLC is an app bundle
                #[cfg(target_os = "macos")]
                if Path::new("/Applications/VLC.app").exists() {
                    return "/Applications/VLC.app/Contents/MacOS/VLC";
                }
                "vlc"
            }
            PlayerType::Iina => "iina",
            PlayerType::MpcHc => {
                #[cfg(target_os = "windows")]
                if Path::new(r"C:\Program Files\MPC-HC\mpc-hc64.exe").exists() {
                    return r"C:\Program Files\MPC-HC\mpc-hc64.exe";
                }
                "mpc-hc64"
            }
            PlayerType::Mplayer => "mplayer",
        }
    }

    /// Get a display name for this player
    pub fn display_name(&self) -> &'static str {
        match self {
            PlayerType::Mpv => "mpv",
            PlayerType::Vlc => "VLC",
            PlayerType::Iina => "IINA",
            PlayerType::MpcHc => "MPC-HC",
            PlayerType::Mplayer => "MPlayer",
        }
    }

    /// Arguments that open `video` and seek to `start_secs`
    pub fn args(&self, video: &Path, start_secs: u64) -> Vec<OsString> {
        let video = OsString::from(video);
        match self {
            PlayerType::Mpv => vec![
                format!("--start={}", start_secs).into(),
                "--force-window=immediate".into(),
                video,
            ],
            PlayerType::Vlc => vec![
                format!("--start-time={}", start_secs).into(),
                "--no-video-title-show".into(),
                video,
            ],
            PlayerType::Iina => vec![format!("--mpv-start={}", start_secs).into(), video],
            // MPC-HC takes milliseconds
            PlayerType::MpcHc => vec![
                video,
                "/start".into(),
                start_secs.saturating_mul(1000).to_string().into(),
            ],
            PlayerType::Mplayer => vec!["-ss".into(), start_secs.to_string().into(), video],
        }
    }
}

impl std::fmt::Display for PlayerType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}
