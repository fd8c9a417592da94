use revsync_core::config::AppConfig;
use revsync_core::schedule;

use crate::commands::common::open_service;
use crate::error::CliError;

pub async fn run_deactivate(config: &AppConfig) -> Result<(), CliError> {
    let service = open_service(config).await?;
    schedule::clear(&service).await?;
    println!("Scheduled review sync removed");
    Ok(())
}
