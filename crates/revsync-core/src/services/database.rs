//! Shared database service wrapper used across clients.

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::db::{
    Database, LibSqlReviewRepository, LibSqlScheduleRepository, LibSqlSettingsRepository,
    LibSqlSyncLockRepository, ReviewRepository, ScheduleRepository, ScheduledEvent,
    SettingsRepository, SyncLockRepository,
};
use crate::models::{ReviewId, ReviewMeta, ReviewPost, ReviewRecord, SyncFrequency, SyncSettings};
use crate::Result;

/// Thread-safe service for DB and repository operations.
///
/// Implements every store trait the sync job, scheduler and lock need, so one
/// handle can be passed wherever a collaborator is expected.
#[derive(Clone)]
pub struct DatabaseService {
    db: Arc<Mutex<Database>>,
    db_path: Option<PathBuf>,
}

impl DatabaseService {
    /// Open a database service at the given filesystem path.
    pub async fn open_path(db_path: impl Into<PathBuf>) -> Result<Self> {
        let db_path = db_path.into();
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let db = Database::open(&db_path).await?;
        tracing::debug!("Opened review database at {}", db_path.display());
        Ok(Self {
            db: Arc::new(Mutex::new(db)),
            db_path: Some(db_path),
        })
    }

    /// Open an in-memory database service (primarily for tests).
    pub async fn open_in_memory() -> Result<Self> {
        let db = Database::open_in_memory().await?;
        Ok(Self {
            db: Arc::new(Mutex::new(db)),
            db_path: None,
        })
    }

    /// Filesystem path of the database, `None` for in-memory services.
    pub fn db_path(&self) -> Option<&PathBuf> {
        self.db_path.as_ref()
    }
}

impl ReviewRepository for DatabaseService {
    async fn find_by_external_id(&self, external_id: &str) -> Result<Option<ReviewRecord>> {
        let db = self.db.lock().await;
        LibSqlReviewRepository::new(db.connection())
            .find_by_external_id(external_id)
            .await
    }

    async fn create(&self, post: &ReviewPost, meta: &ReviewMeta) -> Result<ReviewId> {
        let db = self.db.lock().await;
        LibSqlReviewRepository::new(db.connection())
            .create(post, meta)
            .await
    }

    async fn update(&self, id: &ReviewId, post: &ReviewPost, meta: &ReviewMeta) -> Result<()> {
        let db = self.db.lock().await;
        LibSqlReviewRepository::new(db.connection())
            .update(id, post, meta)
            .await
    }

    async fn list(&self, limit: usize, offset: usize) -> Result<Vec<ReviewRecord>> {
        let db = self.db.lock().await;
        LibSqlReviewRepository::new(db.connection())
            .list(limit, offset)
            .await
    }

    async fn count(&self) -> Result<usize> {
        let db = self.db.lock().await;
        LibSqlReviewRepository::new(db.connection()).count().await
    }
}

impl SettingsRepository for DatabaseService {
    async fn load(&self) -> Result<SyncSettings> {
        let db = self.db.lock().await;
        LibSqlSettingsRepository::new(db.connection()).load().await
    }

    async fn save(&self, settings: &SyncSettings) -> Result<()> {
        let db = self.db.lock().await;
        LibSqlSettingsRepository::new(db.connection())
            .save(settings)
            .await
    }
}

impl ScheduleRepository for DatabaseService {
    async fn next_scheduled(&self, hook: &str) -> Result<Option<i64>> {
        let db = self.db.lock().await;
        LibSqlScheduleRepository::new(db.connection())
            .next_scheduled(hook)
            .await
    }

    async fn schedule(&self, hook: &str, recurrence: SyncFrequency, start: i64) -> Result<()> {
        let db = self.db.lock().await;
        LibSqlScheduleRepository::new(db.connection())
            .schedule(hook, recurrence, start)
            .await
    }

    async fn unschedule(&self, hook: &str, timestamp: i64) -> Result<()> {
        let db = self.db.lock().await;
        LibSqlScheduleRepository::new(db.connection())
            .unschedule(hook, timestamp)
            .await
    }

    async fn due(&self, now: i64) -> Result<Vec<ScheduledEvent>> {
        let db = self.db.lock().await;
        LibSqlScheduleRepository::new(db.connection()).due(now).await
    }

    async fn advance(&self, event: &ScheduledEvent, now: i64) -> Result<i64> {
        let db = self.db.lock().await;
        LibSqlScheduleRepository::new(db.connection())
            .advance(event, now)
            .await
    }
}

impl SyncLockRepository for DatabaseService {
    async fn try_acquire(
        &self,
        name: &str,
        holder: &str,
        now: i64,
        stale_after_secs: i64,
    ) -> Result<bool> {
        let db = self.db.lock().await;
        LibSqlSyncLockRepository::new(db.connection())
            .try_acquire(name, holder, now, stale_after_secs)
            .await
    }

    async fn holder(&self, name: &str) -> Result<Option<String>> {
        let db = self.db.lock().await;
        LibSqlSyncLockRepository::new(db.connection())
            .holder(name)
            .await
    }

    async fn release(&self, name: &str, holder: &str) -> Result<()> {
        let db = self.db.lock().await;
        LibSqlSyncLockRepository::new(db.connection())
            .release(name, holder)
            .await
    }
}
