mod cli;
mod commands;
mod config;
mod constants;

use anyhow::Result;

use config::AppConfig;
use constants::{APP_NAME_LOWER, ENV_LOG};

fn main() {
    if let Err(e) = run() {
        eprintln!("\nError: {:#}\n", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    dotenvy::dotenv().ok();
    init_logging();

    let (cli_config, command) = cli::parse();
    tracing::trace!(command = ?command, "Parsed command");

    let config = AppConfig::load(&cli_config)?;
    commands::run(command, &config)
}

/// Logs go to stderr so stdout carries only command output
fn init_logging() {
    let default_filter = format!("info,{}=info", APP_NAME_LOWER);

    let filter = std::env::var(ENV_LOG)
        .or_else(|_| std::env::var("RUST_LOG"))
        .unwrap_or(default_filter);

    tracing_subscriber::fmt()
        .with_target(false)
        .with_thread_ids(false)
        .with_level(true)
        .with_ansi(true)
        .compact()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
