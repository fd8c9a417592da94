//! Stored "sync in progress" flag

use crate::error::Result;
use libsql::{params, Connection};

/// Trait for named run locks with a staleness timeout (async)
#[allow(async_fn_in_trait)]
pub trait SyncLockRepository {
    /// Take the lock for `holder` unless a holder younger than
    /// `stale_after_secs` exists
    async fn try_acquire(
        &self,
        name: &str,
        holder: &str,
        now: i64,
        stale_after_secs: i64,
    ) -> Result<bool>;

    /// Current holder of the lock, if held
    async fn holder(&self, name: &str) -> Result<Option<String>>;

    /// Release the lock if `holder` still owns it
    async fn release(&self, name: &str, holder: &str) -> Result<()>;
}

/// libSQL implementation of `SyncLockRepository`
pub struct LibSqlSyncLockRepository<'a> {
    conn: &'a Connection,
}

impl<'a> LibSqlSyncLockRepository<'a> {
    /// Create a new repository with the given connection
    pub const fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }
}

impl SyncLockRepository for LibSqlSyncLockRepository<'_> {
    async fn try_acquire(
        &self,
        name: &str,
        holder: &str,
        now: i64,
        stale_after_secs: i64,
    ) -> Result<bool> {
        let stale = self
            .conn
            .execute(
                "DELETE FROM sync_locks WHERE name = ? AND acquired_at <= ?",
                params![name, now - stale_after_secs],
            )
            .await?;
        if stale > 0 {
            tracing::warn!(lock = name, "Took over stale sync lock");
        }

        let inserted = self
            .conn
            .execute(
                "INSERT OR IGNORE INTO sync_locks (name, holder, acquired_at) VALUES (?, ?, ?)",
                params![name, holder, now],
            )
            .await?;

        Ok(inserted == 1)
    }

    async fn holder(&self, name: &str) -> Result<Option<String>> {
        let mut rows = self
            .conn
            .query("SELECT holder FROM sync_locks WHERE name = ?", [name])
            .await?;

        match rows.next().await? {
            Some(row) => Ok(Some(row.get(0)?)),
            None => Ok(None),
        }
    }

    async fn release(&self, name: &str, holder: &str) -> Result<()> {
        self.conn
            .execute(
                "DELETE FROM sync_locks WHERE name = ? AND holder = ?",
                [name, holder],
            )
            .await?;
        Ok(())
    }
}
