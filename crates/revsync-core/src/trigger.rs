//! Adapters mapping external trigger events (scheduler ticks, manual admin
//! actions) onto the sync job.

use std::collections::HashSet;
use std::fmt;
use std::sync::{LazyLock, Mutex, MutexGuard, PoisonError};

use uuid::Uuid;

use crate::db::{ReviewRepository, SettingsRepository, SyncLockRepository};
use crate::places::PlacesClient;
use crate::sync::{sync, SyncError, SyncOutcome};

/// Name of the stored lock guarding sync runs
pub const SYNC_LOCK_NAME: &str = "google_reviews_sync";

/// Default age after which a held lock is treated as abandoned
pub const DEFAULT_LOCK_STALE_SECS: i64 = 10 * 60;

/// Prefix of every lock holder written by this process
static PROCESS_TOKEN: LazyLock<String> = LazyLock::new(|| Uuid::now_v7().to_string());

/// Holders of the runs currently executing in this process
static ACTIVE_RUNS: LazyLock<Mutex<HashSet<String>>> = LazyLock::new(Mutex::default);

fn active_runs() -> MutexGuard<'static, HashSet<String>> {
    ACTIVE_RUNS.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Marks one run as live in this process until dropped.
///
/// A run whose future is dropped mid-flight (timeout, shutdown) cannot
/// release its stored lock. Its guard still drops, so the next run in this
/// process sees the holder as abandoned and clears it.
struct RunGuard {
    holder: String,
}

impl RunGuard {
    fn start() -> Self {
        let holder = format!("{}:{}", *PROCESS_TOKEN, Uuid::now_v7());
        active_runs().insert(holder.clone());
        Self { holder }
    }
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        active_runs().remove(&self.holder);
    }
}

/// Whether `holder` belongs to a run of this process that is no longer live
fn is_abandoned(holder: &str) -> bool {
    holder
        .strip_prefix(PROCESS_TOKEN.as_str())
        .is_some_and(|rest| rest.starts_with(':'))
        && !active_runs().contains(holder)
}

/// Load settings, take the sync lock, run the job and release the lock.
///
/// The lock is released on success and on failure alike. A lock left by a
/// cancelled run of this process is cleared first; locks of other processes
/// only expire through `lock_stale_after_secs`.
pub async fn run_sync<C, S>(
    client: &C,
    store: &S,
    now: i64,
    lock_stale_after_secs: i64,
) -> Result<SyncOutcome, SyncError>
where
    C: PlacesClient,
    S: ReviewRepository + SettingsRepository + SyncLockRepository,
{
    let settings = store.load().await?;
    let run = RunGuard::start();

    let abandoned = store
        .holder(SYNC_LOCK_NAME)
        .await?
        .filter(|holder| is_abandoned(holder));
    if let Some(holder) = abandoned {
        tracing::warn!("Clearing sync lock left by a cancelled run");
        store.release(SYNC_LOCK_NAME, &holder).await?;
    }

    if !store
        .try_acquire(SYNC_LOCK_NAME, &run.holder, now, lock_stale_after_secs)
        .await?
    {
        return Err(SyncError::AlreadyRunning);
    }

    let result = sync(&settings, client, store).await;

    if let Err(error) = store.release(SYNC_LOCK_NAME, &run.holder).await {
        tracing::error!(%error, "Failed to release sync lock");
    }
    result
}

/// Scheduler tick: run the job and log the result; errors never propagate.
pub async fn run_scheduled<C, S>(client: &C, store: &S, now: i64, lock_stale_after_secs: i64)
where
    C: PlacesClient,
    S: ReviewRepository + SettingsRepository + SyncLockRepository,
{
    match run_sync(client, store, now, lock_stale_after_secs).await {
        Ok(outcome) => tracing::info!(
            total = outcome.total(),
            skipped = outcome.skipped,
            "Scheduled review sync completed"
        ),
        Err(error) => tracing::warn!(%error, "Scheduled review sync failed"),
    }
}

/// Result surface of a manual "sync now" action
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ManualSyncResult {
    /// Number of reviews processed
    Success(usize),
    /// Error message for the administrator
    Error(String),
}

impl ManualSyncResult {
    /// Redirect query parameter carrying the result
    pub fn redirect_query(&self) -> String {
        match self {
            Self::Success(count) => format!("sync_success={count}"),
            Self::Error(message) => format!("sync_error={}", urlencoding::encode(message)),
        }
    }

    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }
}

impl fmt::Display for ManualSyncResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.redirect_query())
    }
}

/// Manual trigger: requires the caller to hold the settings capability.
pub async fn run_manual<C, S>(
    authorized: bool,
    client: &C,
    store: &S,
    now: i64,
    lock_stale_after_secs: i64,
) -> ManualSyncResult
where
    C: PlacesClient,
    S: ReviewRepository + SettingsRepository + SyncLockRepository,
{
    if !authorized {
        tracing::warn!("Rejected unauthorized manual review sync");
        return ManualSyncResult::Error("Unauthorized".to_string());
    }

    match run_sync(client, store, now, lock_stale_after_secs).await {
        Ok(outcome) => ManualSyncResult::Success(outcome.total()),
        Err(error) => ManualSyncResult::Error(error.to_string()),
    }
}
