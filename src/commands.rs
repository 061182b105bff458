//! CLI Command Handlers
//!
//! Each handler takes its CLI args, the loaded config and the Output, and
//! returns an ExitCode.

use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};
use tokio::io::{AsyncBufReadExt, BufReader};

use subseek::cli::{
    format_matches, ExitCode, MatchRow, Output, PlayCmd, PlayResponse, ScanCmd, SearchCmd,
    ShellCmd, ShellInput, SHELL_HELP,
};
use subseek::models::{ScanSummary, SearchMatch, TrackInfo};
use subseek::playback::{LaunchOutcome, Launcher, PlayerError};
use subseek::search::SearchOutcome;
use subseek::{Config, SearchError, Session};

// =============================================================================
// Scan Command
// =============================================================================

#[derive(Debug, Serialize)]
struct SourceRow {
    path: PathBuf,
    display_name: String,
    video: PathBuf,
    track: TrackInfo,
}

#[derive(Debug, Serialize)]
struct ScanResponse {
    root: PathBuf,
    summary: ScanSummary,
    sources: Vec<SourceRow>,
}

pub async fn scan_cmd(cmd: ScanCmd, config: &Config, output: &Output) -> ExitCode {
    let mut session = Session::new(config.clone());
    output.info(format!("Scanning {}...", cmd.folder.display()));

    let summary = match session.scan(&cmd.folder).await {
        Ok(summary) => summary,
        Err(e) => return search_error(&e, output),
    };

    let sources: Vec<SourceRow> = session
        .targets()
        .iter()
        .filter_map(|t| {
            Some(SourceRow {
                path: t.path.clone(),
                display_name: t.display_name.clone(),
                video: t.video_path.clone(),
                track: session.track(&t.path)?.clone(),
            })
        })
        .collect();
    session.shutdown();

    if output.json {
        let response = ScanResponse {
            root: cmd.folder,
            summary,
            sources,
        };
        if let Err(e) = output.print_json(&response) {
            return output.error(format!("Failed to serialize: {}", e), ExitCode::Error);
        }
    } else {
        println!("{}", summary);
        for source in &sources {
            println!("  {}", source.display_name);
        }
    }
    ExitCode::Success
}

// =============================================================================
// Search Command
// =============================================================================

#[derive(Debug, Serialize)]
struct SearchResponse {
    query: String,
    case_sensitive: bool,
    files_searched: usize,
    failed: Vec<PathBuf>,
    matches: Vec<MatchRow>,
}

pub async fn search_cmd(cmd: SearchCmd, config: &Config, output: &Output) -> ExitCode {
    let case_sensitive = cmd.case_sensitive || config.case_sensitive;
    let mut session = Session::new(config.clone());

    output.info(format!("Scanning {}...", cmd.folder.display()));
    match session.scan(&cmd.folder).await {
        Ok(summary) => output.info(summary),
        Err(e) => return search_error(&e, output),
    }

    let result = session.search(&cmd.query, case_sensitive).await;
    session.shutdown();
    let mut outcome = match result {
        Ok(outcome) => outcome,
        Err(e) => return search_error(&e, output),
    };
    outcome.sort();
    report_failures(&outcome, output);

    let mut rows: Vec<MatchRow> = outcome.matches.iter().map(MatchRow::from).collect();
    if let Some(limit) = cmd.limit {
        rows.truncate(limit);
    }

    if output.json {
        let response = SearchResponse {
            query: cmd.query.trim().to_string(),
            case_sensitive,
            files_searched: outcome.files_searched,
            failed: outcome.failures.iter().map(|f| f.path.clone()).collect(),
            matches: rows.clone(),
        };
        if let Err(e) = output.print_json(&response) {
            return output.error(format!("Failed to serialize: {}", e), ExitCode::Error);
        }
    } else if !rows.is_empty() {
        print!("{}", format_matches(&rows));
    }

    if rows.is_empty() {
        output.info(format!("No matches for \"{}\"", cmd.query.trim()));
        return ExitCode::NoMatches;
    }
    output.info(format!(
        "{} matches in {} files",
        outcome.matches.len(),
        outcome.files_searched
    ));
    ExitCode::Success
}

// =============================================================================
// Play Command
// =============================================================================

pub async fn play_cmd(cmd: PlayCmd, config: &Config, output: &Output) -> ExitCode {
    let Some(start_secs) = cmd.start_secs() else {
        return output.error(
            format!("Invalid time '{}' (expected HH:MM:SS, MM:SS or seconds)", cmd.time),
            ExitCode::InvalidArgs,
        );
    };
    let launcher = Launcher::new(config.players.clone());
    play_at(&launcher, &cmd.video, start_secs, output).await
}

async fn play_at(launcher: &Launcher, video: &Path, start_secs: u64, output: &Output) -> ExitCode {
    match launcher.open_at(video, start_secs).await {
        Ok(outcome) => {
            let (player, hint) = match &outcome {
                LaunchOutcome::Player(p) => (Some(p.display_name().to_string()), None),
                LaunchOutcome::DefaultHandler { hint } => (None, Some(hint.clone())),
            };
            if output.json {
                let response = PlayResponse {
                    status: "ok",
                    video: video.to_path_buf(),
                    start_secs,
                    player,
                    hint,
                };
                if let Err(e) = output.print_json(&response) {
                    return output.error(format!("Failed to serialize: {}", e), ExitCode::Error);
                }
            } else {
                output.info(outcome.message());
            }
            ExitCode::Success
        }
        Err(e @ PlayerError::VideoNotFound(_)) => output.error(e.to_string(), ExitCode::InvalidArgs),
        Err(e) => output.error(e.to_string(), ExitCode::PlayerFailed),
    }
}

// =============================================================================
// Shell Command
// =============================================================================

#[derive(Debug, Serialize)]
struct CacheStats {
    sources: usize,
    cached: usize,
    parses: usize,
    generation: u64,
    case_sensitive: bool,
}

pub async fn shell_cmd(cmd: ShellCmd, config: &Config, output: &Output) -> ExitCode {
    let mut session = Session::new(config.clone());
    let launcher = Launcher::new(config.players.clone());
    let mut case_sensitive = config.case_sensitive;
    let mut last: Vec<SearchMatch> = Vec::new();

    output.info(format!("Scanning {}...", cmd.folder.display()));
    match session.scan(&cmd.folder).await {
        Ok(summary) => output.info(summary),
        Err(e) => return search_error(&e, output),
    }
    start_preload(&session);
    output.info("Type text to search, :help for commands.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        prompt(output);
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                tracing::warn!(error = %e, "cannot read stdin");
                break;
            }
        };

        match ShellInput::parse(&line) {
            ShellInput::Empty => {}
            ShellInput::Quit => break,
            ShellInput::Help => output.info(SHELL_HELP),
            ShellInput::Invalid(msg) => {
                output.error(msg, ExitCode::InvalidArgs);
            }
            ShellInput::ToggleCase => {
                case_sensitive = !case_sensitive;
                output.info(format!(
                    "Case-sensitive matching {}",
                    if case_sensitive { "on" } else { "off" }
                ));
            }
            ShellInput::Rescan => match session.rescan().await {
                Ok(summary) => {
                    last.clear();
                    output.info(summary);
                    start_preload(&session);
                }
                Err(e) => {
                    search_error(&e, output);
                }
            },
            ShellInput::Stats => {
                let stats = CacheStats {
                    sources: session.targets().len(),
                    cached: session.cache().len(),
                    parses: session.cache().parse_count(),
                    generation: session.generation(),
                    case_sensitive,
                };
                if output.json {
                    let _ = output.print_json(&stats);
                } else {
                    println!(
                        "{} sources, {} cached, {} parses, scan #{}, case-sensitive {}",
                        stats.sources, stats.cached, stats.parses, stats.generation, stats.case_sensitive
                    );
                }
            }
            ShellInput::Play(n) => match last.get(n - 1) {
                Some(m) => {
                    if m.is_degraded() {
                        output.info("This match has no timestamp; starting from the beginning.");
                    }
                    play_at(&launcher, &m.video_path, m.start_secs(), output).await;
                }
                None => {
                    output.error(
                        format!("No match #{} (last search had {})", n, last.len()),
                        ExitCode::InvalidArgs,
                    );
                }
            },
            ShellInput::Query(query) => match session.search(&query, case_sensitive).await {
                Ok(mut outcome) => {
                    outcome.sort();
                    report_failures(&outcome, output);
                    let rows: Vec<MatchRow> = outcome.matches.iter().map(MatchRow::from).collect();
                    if output.json {
                        let _ = output.print_json(&rows);
                    } else if rows.is_empty() {
                        println!("No matches.");
                    } else {
                        print!("{}", format_matches(&rows));
                    }
                    last = outcome.matches;
                }
                Err(e) => {
                    search_error(&e, output);
                }
            },
        }
    }

    session.shutdown();
    ExitCode::Success
}

fn start_preload(session: &Session) {
    if let Err(e) = session.preload() {
        tracing::debug!(error = %e, "preload not started");
    }
}

fn prompt(output: &Output) {
    if !output.json && !output.quiet {
        eprint!("subseek> ");
        let _ = std::io::stderr().flush();
    }
}

// =============================================================================
// Helpers
// =============================================================================

fn search_error(err: &SearchError, output: &Output) -> ExitCode {
    output.error(err.to_string(), ExitCode::from(err))
}

fn report_failures(outcome: &SearchOutcome, output: &Output) {
    if outcome.failures.is_empty() {
        return;
    }
    output.info(format!(
        "{} of {} files could not be searched",
        outcome.failures.len(),
        outcome.files_searched
    ));
    for failure in &outcome.failures {
        tracing::info!(path = %failure.path.display(), error = %failure.error, "file skipped");
    }
}
