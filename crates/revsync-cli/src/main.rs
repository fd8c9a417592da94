//! revsync CLI - keep a local copy of a business's Google reviews
//!
//! Exposes the settings form, the manual "sync now" action, a review listing
//! and the scheduler daemon.

mod cli;
mod commands;
mod error;


use clap::Parser;
use revsync_core::config::AppConfig;

use crate::cli::{Cli, Commands, SettingsCommands};
use crate::commands::deactivate::run_deactivate;
use crate::commands::list::run_list;
use crate::commands::run::run_daemon;
use crate::commands::settings::{run_settings_set, run_settings_show};
use crate::commands::sync::run_sync;
use crate::error::CliError;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), CliError> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                tracing_subscriber::EnvFilter::new("revsync=info,revsync_core=info")
            }),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = AppConfig::from_env()
        .map_err(CliError::Config)?
        .with_db_path(cli.db_path);

    match cli.command {
        Commands::Sync => run_sync(&config).await?,
        Commands::List { limit, json } => run_list(limit, json, &config).await?,
        Commands::Settings { command } => match command {
            SettingsCommands::Show { json } => run_settings_show(json, &config).await?,
            SettingsCommands::Set {
                api_key,
                place_id,
                frequency,
            } => run_settings_set(api_key, place_id, frequency, &config).await?,
        },
        Commands::Run => run_daemon(&config).await?,
        Commands::Deactivate => run_deactivate(&config).await?,
    }

    Ok(())
}
