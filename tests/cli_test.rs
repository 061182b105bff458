//! CLI Command Tests
//!
//! Argument parsing, JSON output format, exit codes and shell input.

// =============================================================================
// CLI Argument Parsing Tests
// =============================================================================

mod cli_parsing {
    use clap::Parser;
    use std::path::PathBuf;
    use subseek::cli::{Cli, Command};

    #[test]
    fn test_command_is_required() {
        assert!(Cli::try_parse_from(["subseek"]).is_err());
    }

    #[test]
    fn test_scan_command() {
        let cli = Cli::parse_from(["subseek", "scan", "/media/films"]);
        match cli.command {
            Command::Scan(cmd) => assert_eq!(cmd.folder, PathBuf::from("/media/films")),
            _ => panic!("Expected Scan command"),
        }
    }

    #[test]
    fn test_search_with_options() {
        let cli = Cli::parse_from([
            "subseek",
            "search",
            "/media",
            "where are my pants",
            "--case-sensitive",
            "--limit",
            "5",
        ]);
        match cli.command {
            Command::Search(cmd) => {
                assert_eq!(cmd.query, "where are my pants");
                assert!(cmd.case_sensitive);
                assert_eq!(cmd.limit, Some(5));
            }
            _ => panic!("Expected Search command"),
        }
    }

    #[test]
    fn test_search_short_flags_and_alias() {
        let cli = Cli::parse_from(["subseek", "s", ".", "Hello", "-s", "-l", "1"]);
        match cli.command {
            Command::Search(cmd) => {
                assert!(cmd.case_sensitive);
                assert_eq!(cmd.limit, Some(1));
            }
            _ => panic!("Expected Search command"),
        }
    }

    #[test]
    fn test_search_requires_query() {
        assert!(Cli::try_parse_from(["subseek", "search", "/media"]).is_err());
    }

    #[test]
    fn test_play_command() {
        let cli = Cli::parse_from(["subseek", "play", "movie.mkv", "00:41:10"]);
        match cli.command {
            Command::Play(cmd) => {
                assert_eq!(cmd.video, PathBuf::from("movie.mkv"));
                assert_eq!(cmd.start_secs(), Some(2470));
            }
            _ => panic!("Expected Play command"),
        }
    }

    #[test]
    fn test_play_time_formats() {
        for (time, secs) in [
            ("90", Some(90)),
            ("1:30", Some(90)),
            ("abc", None),
            ("99999999999999999:0:0", None),
        ] {
            let cli = Cli::parse_from(["subseek", "play", "a.mkv", time]);
            match cli.command {
                Command::Play(cmd) => assert_eq!(cmd.start_secs(), secs, "{}", time),
                _ => panic!("Expected Play command"),
            }
        }
    }

    #[test]
    fn test_shell_alias() {
        let cli = Cli::parse_from(["subseek", "sh", "~/Movies"]);
        assert!(matches!(cli.command, Command::Shell(_)));
    }

    #[test]
    fn test_global_flags_anywhere() {
        let cli = Cli::parse_from([
            "subseek", "search", ".", "x", "--json", "-q", "-w", "8", "-c", "/tmp/c.toml",
        ]);
        assert!(cli.json);
        assert!(cli.should_json());
        assert!(cli.quiet);
        assert_eq!(cli.workers, Some(8));
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/c.toml")));
    }

    #[test]
    fn test_verbosity_levels() {
        let cases = [
            (vec!["subseek", "scan", "."], "subseek=warn"),
            (vec!["subseek", "-v", "scan", "."], "subseek=info"),
            (vec!["subseek", "-vvv", "scan", "."], "subseek=trace"),
            (vec!["subseek", "-vvvvv", "scan", "."], "subseek=trace"),
        ];
        for (args, filter) in cases {
            assert_eq!(Cli::parse_from(args).log_filter(), filter);
        }
    }
}

// =============================================================================
// JSON Output Tests
// =============================================================================

mod json_output {
    use std::path::PathBuf;
    use subseek::cli::{ExitCode, JsonOutput, MatchRow, PlayResponse};
    use subseek::models::SearchMatch;

    fn sample_match(start_ms: Option<u64>) -> SearchMatch {
        SearchMatch {
            display_name: "b.mkv [Track 0: en]".to_string(),
            start_ms,
            text: "say hello".to_string(),
            source_path: PathBuf::from("/tmp/b-1234abcd_en_track0.srt"),
            video_path: PathBuf::from("/media/b.mkv"),
        }
    }

    #[test]
    fn test_success_envelope() {
        let output = JsonOutput::success(vec![MatchRow::from(&sample_match(Some(12_000)))]);
        let json = serde_json::to_value(&output).unwrap();

        assert!(json.get("error").is_none());
        assert!(json.get("exit_code").is_none());
        let row = &json["data"][0];
        assert_eq!(row["file"], "b.mkv [Track 0: en]");
        assert_eq!(row["time"], "00:00:12");
        assert_eq!(row["start_ms"], 12_000);
        assert_eq!(row["text"], "say hello");
        assert_eq!(row["video"], "/media/b.mkv");
    }

    #[test]
    fn test_error_envelope() {
        let output = JsonOutput::<()>::error_msg("Folder not found", ExitCode::FolderError);
        let json = serde_json::to_value(&output).unwrap();

        assert!(json.get("data").is_none());
        assert_eq!(json["error"], "Folder not found");
        assert_eq!(json["exit_code"], 3);
    }

    #[test]
    fn test_degraded_row() {
        let row = MatchRow::from(&sample_match(None));
        assert_eq!(row.time, "--:--:--");
        assert_eq!(row.start_ms, None);

        let json = serde_json::to_value(&row).unwrap();
        assert!(json["start_ms"].is_null());
    }

    #[test]
    fn test_play_response_skips_empty_fields() {
        let response = PlayResponse {
            status: "playing",
            video: PathBuf::from("/media/b.mkv"),
            start_secs: 12,
            player: Some("mpv".to_string()),
            hint: None,
        };
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["status"], "playing");
        assert_eq!(json["player"], "mpv");
        assert!(json.get("hint").is_none());
    }
}

// =============================================================================
// Exit Code Tests
// =============================================================================

mod exit_codes {
    use std::path::PathBuf;
    use subseek::cli::ExitCode;
    use subseek::error::{PoolError, SearchError};

    #[test]
    fn test_search_errors_map_to_codes() {
        let unreadable = SearchError::FolderUnreadable {
            path: PathBuf::from("/nope"),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        };
        assert_eq!(ExitCode::from(&unreadable), ExitCode::FolderError);
        assert_eq!(ExitCode::from(&SearchError::EmptyQuery), ExitCode::InvalidArgs);
        assert_eq!(
            ExitCode::from(&SearchError::Pool(PoolError::ShutDown)),
            ExitCode::Error
        );
    }

    #[test]
    fn test_invalid_query_is_invalid_args() {
        let err = SearchError::InvalidQuery(regex::Regex::new("(").unwrap_err());
        assert_eq!(ExitCode::from(&err), ExitCode::InvalidArgs);
    }
}

// =============================================================================
// Shell Input Tests
// =============================================================================

mod shell_input {
    use subseek::cli::{ShellInput, SHELL_HELP};

    #[test]
    fn test_plain_text_is_query() {
        assert_eq!(
            ShellInput::parse("I'll be back\n"),
            ShellInput::Query("I'll be back".to_string())
        );
    }

    #[test]
    fn test_commands() {
        assert_eq!(ShellInput::parse(":case"), ShellInput::ToggleCase);
        assert_eq!(ShellInput::parse(":p 12"), ShellInput::Play(12));
        assert_eq!(ShellInput::parse(":rescan"), ShellInput::Rescan);
        assert_eq!(ShellInput::parse(":stats"), ShellInput::Stats);
        assert_eq!(ShellInput::parse(":help"), ShellInput::Help);
        assert_eq!(ShellInput::parse(":exit"), ShellInput::Quit);
        assert_eq!(ShellInput::parse("   "), ShellInput::Empty);
    }

    #[test]
    fn test_malformed_commands() {
        assert!(matches!(ShellInput::parse(":play"), ShellInput::Invalid(_)));
        assert!(matches!(ShellInput::parse(":case now"), ShellInput::Invalid(_)));
        assert!(matches!(ShellInput::parse(":rm -rf"), ShellInput::Invalid(_)));
    }

    #[test]
    fn test_help_lists_commands() {
        for command in [":case", ":play", ":rescan", ":stats", ":help", ":quit"] {
            assert!(SHELL_HELP.contains(command), "{}", command);
        }
    }
}
