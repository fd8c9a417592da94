use revsync_core::config::AppConfig;
use revsync_core::db::SettingsRepository;
use revsync_core::places::GooglePlacesClient;
use revsync_core::schedule::{self, SyncRunner};
use revsync_core::util::unix_timestamp_now;

use crate::commands::common::{format_next_sync, open_service};
use crate::error::CliError;

/// Reschedule from current settings, then fire due syncs until Ctrl-C.
///
/// Ctrl-C during a sync lets that sync finish before exiting.
pub async fn run_daemon(config: &AppConfig) -> Result<(), CliError> {
    let service = open_service(config).await?;
    let settings = service.load().await?;
    let scheduled = schedule::reschedule(&service, &settings, unix_timestamp_now()).await?;
    println!("{}", format_next_sync(scheduled));

    let client = GooglePlacesClient::with_endpoint(&config.places_endpoint)?;
    let runner = SyncRunner::new(
        client,
        service,
        config.poll_interval,
        config.lock_stale_after_secs,
    )?;

    tracing::info!(
        poll_secs = config.poll_interval.as_secs(),
        "Review sync runner started"
    );
    runner
        .run_loop(async {
            if let Err(error) = tokio::signal::ctrl_c().await {
                tracing::error!(%error, "Failed to listen for Ctrl-C");
            }
            tracing::info!("Shutting down review sync runner");
        })
        .await;
    Ok(())
}
