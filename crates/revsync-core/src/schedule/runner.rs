//! Polling loop that fires due sync events from the schedule store.

use std::future::Future;
use std::time::Duration;

use crate::db::{ReviewRepository, ScheduleRepository, SettingsRepository, SyncLockRepository};
use crate::places::PlacesClient;
use crate::trigger::run_scheduled;
use crate::{Error, Result};

use super::SYNC_EVENT_HOOK;

/// Polling runner that fires due sync events.
pub struct SyncRunner<C, S> {
    client: C,
    store: S,
    poll_interval: Duration,
    lock_stale_after_secs: i64,
}

impl<C, S> SyncRunner<C, S>
where
    C: PlacesClient,
    S: ReviewRepository + SettingsRepository + SyncLockRepository + ScheduleRepository,
{
    pub fn new(
        client: C,
        store: S,
        poll_interval: Duration,
        lock_stale_after_secs: i64,
    ) -> Result<Self> {
        if poll_interval.is_zero() {
            return Err(Error::InvalidInput("poll_interval must be > 0".to_string()));
        }
        Ok(Self {
            client,
            store,
            poll_interval,
            lock_stale_after_secs,
        })
    }

    /// Tick on the poll interval until `shutdown` resolves.
    ///
    /// Shutdown is only observed between ticks, so a sync in flight finishes
    /// and releases its lock before the loop returns.
    pub async fn run_loop(&self, shutdown: impl Future<Output = ()>) {
        tokio::pin!(shutdown);
        let mut ticker = tokio::time::interval(self.poll_interval);
        loop {
            tokio::select! {
                biased;
                () = &mut shutdown => break,
                _ = ticker.tick() => {}
            }
            // Errors are logged but do not stop scheduling.
            if let Err(error) = self.tick(crate::util::unix_timestamp_now()).await {
                tracing::warn!(%error, "review sync runner tick failed");
            }
        }
        tracing::info!("Review sync runner stopped");
    }

    /// Fire every due sync event once and roll it forward. Returns the number fired.
    pub async fn tick(&self, now: i64) -> Result<usize> {
        let mut fired = 0;
        for event in self.store.due(now).await? {
            if event.hook != SYNC_EVENT_HOOK {
                continue;
            }
            let next = self.store.advance(&event, now).await?;
            tracing::debug!(due = event.timestamp, next, "Firing scheduled review sync");

            run_scheduled(&self.client, &self.store, now, self.lock_stale_after_secs).await;
            fired += 1;
        }
        Ok(fired)
    }
}
