//! relay CLI: run the Discord relay, or check a config file. Config from YAML, token can come
//! from DISCORD_TOKEN (environment or .env).

mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{resolve_log_file, Cli, Commands};
use completion_client::mask_token;
use relay_bot::RelayConfig;
use std::path::Path;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run { config, log_file } => handle_run(&config, log_file).await,
        Commands::CheckConfig { config } => handle_check_config(&config),
    }
}

/// Handle the run command: load config, init logging, connect and serve until a shutdown signal.
async fn handle_run(config_path: &Path, log_file: Option<String>) -> Result<()> {
    let config = RelayConfig::load(config_path)
        .with_context(|| format!("Load config from {}", config_path.display()))?;
    let log_file = resolve_log_file(log_file, &config.log_file);
    relay_core::init_tracing(&log_file).context("Initialize logging")?;

    info!(
        config = %config_path.display(),
        log_file = %log_file,
        token = %mask_token(&config.token),
        "Relay starting"
    );

    relay_discord::run_client(Arc::new(config), shutdown_signal())
        .await
        .context("Discord client")?;

    info!("Relay stopped");
    Ok(())
}

/// Handle the check-config command: validate and print one row per channel profile.
fn handle_check_config(config_path: &Path) -> Result<()> {
    let config = RelayConfig::load(config_path)
        .with_context(|| format!("Load config from {}", config_path.display()))?;

    println!(
        "Config OK (token {}, edit interval {}s, log file {})\n",
        mask_token(&config.token),
        config.edit_interval_secs,
        config.log_file
    );
    println!(
        "{:<22} {:<20} {:<8} {:<9} {}",
        "chat_channel_id", "model", "auth", "preamble", "api_url"
    );
    println!("{}", "-".repeat(100));
    for profile in &config.api_channel_configs {
        println!(
            "{:<22} {:<20} {:<8} {:<9} {}",
            profile.chat_channel_id,
            profile.model_name,
            if profile.auth_token().is_some() { "bearer" } else { "-" },
            profile.system_role_messages.len(),
            profile.api_url
        );
    }
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
