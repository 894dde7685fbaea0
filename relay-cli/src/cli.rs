//! CLI parser.

use clap::{Parser, Subcommand};
use relay_bot::config::DEFAULT_CONFIG_PATH;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "relay")]
#[command(about = "Discord ↔ streaming LLM relay", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Connect to Discord and answer in the configured channels (token can come from DISCORD_TOKEN).
    Run {
        #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
        config: PathBuf,
        /// Overrides `log-file` from the config.
        #[arg(long)]
        log_file: Option<String>,
    },
    /// Load and validate the config, then print the channel table.
    CheckConfig {
        #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
        config: PathBuf,
    },
}

/// Log file for `run`: the `--log-file` flag wins over the config's `log-file`.
pub fn resolve_log_file(flag: Option<String>, configured: &str) -> String {
    flag.filter(|p| !p.trim().is_empty())
        .unwrap_or_else(|| configured.to_string())
}
