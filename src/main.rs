//! subseek - full-text search across subtitle files
//!
//! # Usage
//!
//! ```bash
//! subseek scan ~/Movies
//! subseek search ~/Movies "where are my pants" --json
//! subseek play ~/Movies/a.mkv 00:41:10
//! subseek shell ~/Movies
//! ```

mod commands;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use subseek::cli::{Cli, Command, ExitCode, Output};
use subseek::Config;

#[tokio::main]
async fn main() -> std::process::ExitCode {
    let cli = Cli::parse();
    init_logging(cli.log_filter());

    let exit_code = run_cli(cli).await;
    exit_code.into()
}

/// Run CLI command and return exit code
async fn run_cli(cli: Cli) -> ExitCode {
    let output = Output::new(&cli);
    let config = load_config(&cli);
    tracing::debug!(?config, "configuration loaded");

    match cli.command {
        Command::Scan(cmd) => commands::scan_cmd(cmd, &config, &output).await,
        Command::Search(cmd) => commands::search_cmd(cmd, &config, &output).await,
        Command::Play(cmd) => commands::play_cmd(cmd, &config, &output).await,
        Command::Shell(cmd) => commands::shell_cmd(cmd, &config, &output).await,
    }
}

/// Config file, then environment, then command-line flags
fn load_config(cli: &Cli) -> Config {
    let mut config = match &cli.config {
        Some(path) => {
            let mut config = Config::load_from(path);
            config.apply_env();
            config
        }
        None => Config::load(),
    };
    if let Some(workers) = cli.workers {
        config.workers = workers.max(1);
    }
    config
}

/// Initialize logging with tracing, to stderr so stdout stays parseable
fn init_logging(default_filter: &str) {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
