//! CLI - Command Line Interface for subseek
//!
//! Every command is scriptable. Output is JSON when `--json` is given or
//! stdout is not a terminal.
//!
//! # Examples
//!
//! ```bash
//! # List what a folder contains
//! subseek scan ~/Movies
//!
//! # Search all subtitles under a folder
//! subseek search ~/Movies "I'll be back" --limit 5
//!
//! # Open a video at a timestamp
//! subseek play ~/Movies/t2.mkv 01:02:03
//!
//! # Interactive session
//! subseek shell ~/Movies
//! ```

use clap::{ArgAction, Args, Parser, Subcommand};
use serde::{Deserialize, Serialize};
use std::io::IsTerminal;
use std::path::PathBuf;

use crate::error::SearchError;
use crate::models::{parse_timestamp, SearchMatch};

// =============================================================================
// Exit Codes
// =============================================================================

/// Exit codes for CLI operations (semantic for scripting)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Success
    Success = 0,
    /// General error
    Error = 1,
    /// Invalid arguments
    InvalidArgs = 2,
    /// Folder missing or unreadable
    FolderError = 3,
    /// Search found nothing
    NoMatches = 4,
    /// Video could not be opened
    PlayerFailed = 5,
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> i32 {
        code as i32
    }
}

impl From<ExitCode> for std::process::ExitCode {
    fn from(code: ExitCode) -> std::process::ExitCode {
        std::process::ExitCode::from(code as u8)
    }
}

impl From<&SearchError> for ExitCode {
    fn from(err: &SearchError) -> Self {
        match err {
            SearchError::EmptyQuery | SearchError::InvalidQuery(_) => ExitCode::InvalidArgs,
            SearchError::FolderUnreadable { .. } | SearchError::NotScanned => ExitCode::FolderError,
            SearchError::Pool(_) => ExitCode::Error,
        }
    }
}

// =============================================================================
// Main CLI Structure
// =============================================================================

/// subseek - search the dialogue of a video collection
#[derive(Parser, Debug)]
#[command(
    name = "subseek",
    version,
    about = "Full-text search across subtitle files and embedded MKV subtitle tracks",
    long_about = "Finds standalone subtitle files and subtitle tracks embedded in MKV \
                  containers under a folder, searches all of them at once and opens \
                  a player right at the matching line.",
    after_help = "EXAMPLES:\n\
                  subseek scan ~/Movies                   List subtitle sources\n\
                  subseek search ~/Movies \"hello\"         Search all subtitles\n\
                  subseek play ~/Movies/a.mkv 00:12:30    Open a video at a time\n\
                  subseek shell ~/Movies                  Interactive session"
)]
pub struct Cli {
    /// Output format as JSON (default for non-TTY)
    #[arg(long, short = 'j', global = true)]
    pub json: bool,

    /// Suppress non-essential output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Path to config file
    #[arg(long, short = 'c', global = true)]
    pub config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(long, short = 'v', global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Number of concurrent workers
    #[arg(long, short = 'w', global = true)]
    pub workers: Option<usize>,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Check if JSON output should be used
    pub fn should_json(&self) -> bool {
        self.json || !std::io::stdout().is_terminal()
    }

    /// Default log filter for the requested verbosity
    pub fn log_filter(&self) -> &'static str {
        match self.verbose {
            0 => "subseek=warn",
            1 => "subseek=info",
            2 => "subseek=debug",
            _ => "subseek=trace",
        }
    }
}

// =============================================================================
// Subcommands
// =============================================================================

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List subtitle sources under a folder
    Scan(ScanCmd),

    /// Search subtitles under a folder
    #[command(visible_alias = "s")]
    Search(SearchCmd),

    /// Open a video at a timestamp
    Play(PlayCmd),

    /// Interactive search session
    #[command(visible_alias = "sh")]
    Shell(ShellCmd),
}

/// Scan a folder and list its subtitle sources
#[derive(Args, Debug)]
pub struct ScanCmd {
    /// Folder to scan
    pub folder: PathBuf,
}

/// Search every subtitle under a folder
#[derive(Args, Debug)]
pub struct SearchCmd {
    /// Folder to scan
    pub folder: PathBuf,

    /// Text to search for (literal, not a pattern)
    #[arg(required = true)]
    pub query: String,

    /// Match case
    #[arg(long, short = 's')]
    pub case_sensitive: bool,

    /// Maximum number of results
    #[arg(long, short = 'l')]
    pub limit: Option<usize>,
}

/// Open a video in a local player
#[derive(Args, Debug)]
pub struct PlayCmd {
    /// Video file
    pub video: PathBuf,

    /// Start time (HH:MM:SS, MM:SS or seconds)
    pub time: String,
}

impl PlayCmd {
    /// Start time in seconds
    pub fn start_secs(&self) -> Option<u64> {
        parse_timestamp(&self.time)
    }
}

/// Scan a folder, then read queries from stdin
#[derive(Args, Debug)]
pub struct ShellCmd {
    /// Folder to scan
    pub folder: PathBuf,
}

// =============================================================================
// Interactive Shell Input
// =============================================================================

/// One line of shell input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellInput {
    /// Plain text to search for
    Query(String),
    /// `:case` toggles case sensitivity
    ToggleCase,
    /// `:play N` opens match N of the last search
    Play(usize),
    /// `:rescan`
    Rescan,
    /// `:stats`
    Stats,
    /// `:help`
    Help,
    /// `:quit`, `:q` or `:exit`
    Quit,
    /// Blank line
    Empty,
    /// Unknown or malformed command
    Invalid(String),
}

impl ShellInput {
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        if line.is_empty() {
            return ShellInput::Empty;
        }
        let Some(command) = line.strip_prefix(':') else {
            return ShellInput::Query(line.to_string());
        };

        let mut parts = command.split_whitespace();
        match (parts.next(), parts.next()) {
            (Some("case"), None) => ShellInput::ToggleCase,
            (Some("play" | "p"), Some(n)) => match n.parse::<usize>() {
                Ok(n) if n > 0 => ShellInput::Play(n),
                _ => ShellInput::Invalid(format!("Not a match number: {}", n)),
            },
            (Some("play" | "p"), None) => ShellInput::Invalid("Usage: :play N".to_string()),
            (Some("rescan"), None) => ShellInput::Rescan,
            (Some("stats"), None) => ShellInput::Stats,
            (Some("help" | "h"), None) => ShellInput::Help,
            (Some("quit" | "q" | "exit"), None) => ShellInput::Quit,
            _ => ShellInput::Invalid(format!("Unknown command: {}", line)),
        }
    }
}

pub const SHELL_HELP: &str = "\
Type text to search. Commands:
  :case      toggle case-sensitive matching
  :play N    open match N of the last search
  :rescan    scan the folder again
  :stats     show cache statistics
  :help      show this help
  :quit      leave";

// =============================================================================
// JSON Output Types
// =============================================================================

/// Generic JSON output wrapper with status
#[derive(Debug, Serialize, Deserialize)]
pub struct JsonOutput<T: Serialize> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "is_zero")]
    pub exit_code: i32,
}

fn is_zero(n: &i32) -> bool {
    *n == 0
}

impl<T: Serialize> JsonOutput<T> {
    /// Create success output with data
    pub fn success(data: T) -> Self {
        Self {
            data: Some(data),
            error: None,
            exit_code: 0,
        }
    }

    /// Create error output (no data)
    pub fn error_msg(msg: impl Into<String>, code: ExitCode) -> JsonOutput<()> {
        JsonOutput::<()> {
            data: None,
            error: Some(msg.into()),
            exit_code: code.into(),
        }
    }
}

/// One search hit as printed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchRow {
    pub file: String,
    pub time: String,
    /// Absent for matches without a resolved time
    pub start_ms: Option<u64>,
    pub text: String,
    pub video: PathBuf,
}

impl From<&SearchMatch> for MatchRow {
    fn from(m: &SearchMatch) -> Self {
        Self {
            file: m.display_name.clone(),
            time: m.time(),
            start_ms: m.start_ms,
            text: m.text.clone(),
            video: m.video_path.clone(),
        }
    }
}

/// Play success response
#[derive(Debug, Serialize, Deserialize)]
pub struct PlayResponse {
    pub status: &'static str,
    pub video: PathBuf,
    pub start_secs: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub player: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

// =============================================================================
// Output Helpers
// =============================================================================

/// Output handler for consistent formatting
pub struct Output {
    pub json: bool,
    pub quiet: bool,
}

impl Output {
    pub fn new(cli: &Cli) -> Self {
        Self {
            json: cli.should_json(),
            quiet: cli.quiet,
        }
    }

    /// Print success data in the JSON envelope
    pub fn print_json<T: Serialize>(&self, data: T) -> anyhow::Result<()> {
        let output = JsonOutput::success(data);
        println!("{}", serde_json::to_string_pretty(&output)?);
        Ok(())
    }

    /// Print error and return exit code
    pub fn error(&self, msg: impl Into<String>, code: ExitCode) -> ExitCode {
        let msg = msg.into();
        if self.json {
            let output = JsonOutput::<()>::error_msg(&msg, code);
            if let Ok(json) = serde_json::to_string_pretty(&output) {
                eprintln!("{}", json);
            }
        } else if !self.quiet {
            eprintln!("Error: {}", msg);
        }
        code
    }

    /// Print info message (suppressed in quiet mode)
    pub fn info(&self, msg: impl std::fmt::Display) {
        if !self.quiet && !self.json {
            eprintln!("{}", msg);
        }
    }
}

/// Render matches as an aligned, numbered table
pub fn format_matches(rows: &[MatchRow]) -> String {
    let width = rows.iter().map(|r| r.file.chars().count()).max().unwrap_or(0);
    let mut out = String::new();
    for (i, row) in rows.iter().enumerate() {
        out.push_str(&format!(
            "{:>3}. {:<width$}  {}  {}\n",
            i + 1,
            row.file,
            row.time,
            row.text.replace('\n', " / "),
            width = width
        ));
    }
    out
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_search_command() {
        let cli = Cli::parse_from(["subseek", "search", "/media", "hello"]);
        if let Command::Search(cmd) = cli.command {
            assert_eq!(cmd.folder, PathBuf::from("/media"));
            assert_eq!(cmd.query, "hello");
            assert!(!cmd.case_sensitive);
            assert_eq!(cmd.limit, None);
        } else {
            panic!("Expected Search command");
        }
    }

    #[test]
    fn test_verbosity() {
        let cli = Cli::parse_from(["subseek", "-vv", "scan", "."]);
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.log_filter(), "subseek=debug");

        let cli = Cli::parse_from(["subseek", "scan", "."]);
        assert_eq!(cli.log_filter(), "subseek=warn");
    }

    #[test]
    fn test_play_start_secs() {
        let cli = Cli::parse_from(["subseek", "play", "a.mkv", "1:02:03"]);
        if let Command::Play(cmd) = cli.command {
            assert_eq!(cmd.start_secs(), Some(3723));
        } else {
            panic!("Expected Play command");
        }
    }

    #[test]
    fn test_shell_input() {
        assert_eq!(ShellInput::parse("  hello "), ShellInput::Query("hello".to_string()));
        assert_eq!(ShellInput::parse(":case"), ShellInput::ToggleCase);
        assert_eq!(ShellInput::parse(":play 3"), ShellInput::Play(3));
        assert!(matches!(ShellInput::parse(":play 0"), ShellInput::Invalid(_)));
        assert!(matches!(ShellInput::parse(":play x"), ShellInput::Invalid(_)));
        assert_eq!(ShellInput::parse(":q"), ShellInput::Quit);
        assert_eq!(ShellInput::parse(""), ShellInput::Empty);
        assert!(matches!(ShellInput::parse(":bogus"), ShellInput::Invalid(_)));
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(i32::from(ExitCode::Success), 0);
        assert_eq!(i32::from(ExitCode::Error), 1);
        assert_eq!(i32::from(ExitCode::InvalidArgs), 2);
        assert_eq!(i32::from(ExitCode::FolderError), 3);
        assert_eq!(i32::from(ExitCode::NoMatches), 4);
        assert_eq!(i32::from(ExitCode::PlayerFailed), 5);
    }

    #[test]
    fn test_search_error_exit_codes() {
        assert_eq!(ExitCode::from(&SearchError::EmptyQuery), ExitCode::InvalidArgs);
        assert_eq!(ExitCode::from(&SearchError::NotScanned), ExitCode::FolderError);
    }

    #[test]
    fn test_format_matches() {
        let rows = vec![
            MatchRow {
                file: "a.srt".to_string(),
                time: "00:00:05".to_string(),
                start_ms: Some(5_000),
                text: "hello\nworld".to_string(),
                video: PathBuf::from("a.srt"),
            },
            MatchRow {
                file: "longer.srt".to_string(),
                time: "--:--:--".to_string(),
                start_ms: None,
                text: "x".to_string(),
                video: PathBuf::from("longer.srt"),
            },
        ];
        let table = format_matches(&rows);
        assert!(table.contains("  1. a.srt       00:00:05  hello / world"));
        assert!(table.contains("  2. longer.srt  --:--:--  x"));
    }
}
