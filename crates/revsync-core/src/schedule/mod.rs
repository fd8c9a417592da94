//! Schedule coordination for the recurring review sync.

mod runner;

pub use runner::SyncRunner;

use crate::db::ScheduleRepository;
use crate::models::SyncSettings;
use crate::Result;

/// Hook name of the recurring sync event
pub const SYNC_EVENT_HOOK: &str = "fetch_google_reviews_event";

/// Clear any registered sync event and register a fresh one at `now`.
///
/// Nothing is registered unless both credentials are present. Returns the
/// newly scheduled time, if any.
pub async fn reschedule<S: ScheduleRepository>(
    scheduler: &S,
    settings: &SyncSettings,
    now: i64,
) -> Result<Option<i64>> {
    clear(scheduler).await?;

    if !settings.has_credentials() {
        tracing::info!("Review sync not scheduled: API key or place ID missing");
        return Ok(None);
    }

    scheduler
        .schedule(SYNC_EVENT_HOOK, settings.frequency, now)
        .await?;
    tracing::info!(frequency = %settings.frequency, start = now, "Scheduled review sync");
    Ok(Some(now))
}

/// Remove every registered occurrence of the sync event.
pub async fn clear<S: ScheduleRepository>(scheduler: &S) -> Result<()> {
    while let Some(timestamp) = scheduler.next_scheduled(SYNC_EVENT_HOOK).await? {
        scheduler.unschedule(SYNC_EVENT_HOOK, timestamp).await?;
    }
    Ok(())
}

/// Next time the sync event will fire.
pub async fn next_run<S: ScheduleRepository>(scheduler: &S) -> Result<Option<i64>> {
    scheduler.next_scheduled(SYNC_EVENT_HOOK).await
}
