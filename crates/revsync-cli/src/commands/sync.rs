use revsync_core::config::AppConfig;
use revsync_core::places::GooglePlacesClient;
use revsync_core::trigger::{run_manual, ManualSyncResult};
use revsync_core::util::unix_timestamp_now;

use crate::commands::common::open_service;
use crate::error::CliError;

/// Manual "sync now". Local CLI operators hold the settings capability.
pub async fn run_sync(config: &AppConfig) -> Result<(), CliError> {
    let service = open_service(config).await?;
    let client = GooglePlacesClient::with_endpoint(&config.places_endpoint)?;

    let result = run_manual(
        true,
        &client,
        &service,
        unix_timestamp_now(),
        config.lock_stale_after_secs,
    )
    .await;

    println!("{}", result.redirect_query());
    match result {
        ManualSyncResult::Success(_) => Ok(()),
        ManualSyncResult::Error(message) => Err(CliError::SyncFailed(message)),
    }
}
