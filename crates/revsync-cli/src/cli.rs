use std::path::PathBuf;

use clap::{Parser, Subcommand};
use revsync_core::SyncFrequency;

#[derive(Parser)]
#[command(name = "revsync")]
#[command(about = "Sync Google Place reviews into a local review store")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Optional path to local database file
    #[arg(long, global = true, value_name = "PATH")]
    pub db_path: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Fetch reviews now and upsert them
    Sync,
    /// List stored reviews, newest first
    List {
        /// Number of reviews to show
        #[arg(short, long, default_value = "10")]
        limit: usize,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show or change sync settings
    Settings {
        #[command(subcommand)]
        command: SettingsCommands,
    },
    /// Run the scheduler until interrupted
    Run,
    /// Remove the scheduled sync event
    Deactivate,
}

#[derive(Subcommand)]
pub enum SettingsCommands {
    /// Show current settings and the next scheduled sync
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Update settings and reschedule the sync
    Set {
        /// Google Places API key (empty string clears it)
        #[arg(long, value_name = "KEY")]
        api_key: Option<String>,
        /// Place ID of the business (empty string clears it)
        #[arg(long, value_name = "ID")]
        place_id: Option<String>,
        /// How often the scheduled sync runs
        #[arg(long, value_name = "FREQUENCY", value_parser = parse_frequency)]
        frequency: Option<SyncFrequency>,
    },
}

fn parse_frequency(value: &str) -> Result<SyncFrequency, String> {
    value.parse()
}
