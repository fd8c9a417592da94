//! Persisted recurring event schedule

use crate::error::{Error, Result};
use crate::models::SyncFrequency;
use libsql::{params, Connection};

/// One registered occurrence of a recurring event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledEvent {
    pub hook: String,
    /// Unix seconds at which the event is due
    pub timestamp: i64,
    pub recurrence: SyncFrequency,
}

/// Trait for scheduler storage operations (async)
#[allow(async_fn_in_trait)]
pub trait ScheduleRepository {
    /// Earliest scheduled time for `hook`, if any
    async fn next_scheduled(&self, hook: &str) -> Result<Option<i64>>;

    /// Register a recurring event starting at `start`
    async fn schedule(&self, hook: &str, recurrence: SyncFrequency, start: i64) -> Result<()>;

    /// Remove the occurrence of `hook` at `timestamp`
    async fn unschedule(&self, hook: &str, timestamp: i64) -> Result<()>;

    /// Events due at or before `now`, earliest first
    async fn due(&self, now: i64) -> Result<Vec<ScheduledEvent>>;

    /// Roll a fired event forward by whole intervals until it is after `now`
    async fn advance(&self, event: &ScheduledEvent, now: i64) -> Result<i64>;
}

/// libSQL implementation of `ScheduleRepository`
pub struct LibSqlScheduleRepository<'a> {
    conn: &'a Connection,
}

impl<'a> LibSqlScheduleRepository<'a> {
    /// Create a new repository with the given connection
    pub const fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }
}

impl ScheduleRepository for LibSqlScheduleRepository<'_> {
    async fn next_scheduled(&self, hook: &str) -> Result<Option<i64>> {
        let mut rows = self
            .conn
            .query(
                "SELECT MIN(timestamp) FROM scheduled_events WHERE hook = ?",
                [hook],
            )
            .await?;

        match rows.next().await? {
            Some(row) => Ok(row.get::<Option<i64>>(0)?),
            None => Ok(None),
        }
    }

    async fn schedule(&self, hook: &str, recurrence: SyncFrequency, start: i64) -> Result<()> {
        self.conn
            .execute(
                "INSERT OR REPLACE INTO scheduled_events (hook, timestamp, recurrence, interval_secs)
                 VALUES (?, ?, ?, ?)",
                params![hook, start, recurrence.as_str(), recurrence.interval_secs()],
            )
            .await?;

        tracing::debug!(hook, start, recurrence = %recurrence, "Scheduled event");
        Ok(())
    }

    async fn unschedule(&self, hook: &str, timestamp: i64) -> Result<()> {
        self.conn
            .execute(
                "DELETE FROM scheduled_events WHERE hook = ? AND timestamp = ?",
                params![hook, timestamp],
            )
            .await?;

        tracing::debug!(hook, timestamp, "Unscheduled event");
        Ok(())
    }

    async fn due(&self, now: i64) -> Result<Vec<ScheduledEvent>> {
        let mut rows = self
            .conn
            .query(
                "SELECT hook, timestamp, recurrence FROM scheduled_events
                 WHERE timestamp <= ?
                 ORDER BY timestamp ASC",
                [now],
            )
            .await?;

        let mut events = Vec::new();
        while let Some(row) = rows.next().await? {
            let recurrence: String = row.get(2)?;
            events.push(ScheduledEvent {
                hook: row.get(0)?,
                timestamp: row.get(1)?,
                recurrence: recurrence.parse().map_err(Error::Database)?,
            });
        }
        Ok(events)
    }

    async fn advance(&self, event: &ScheduledEvent, now: i64) -> Result<i64> {
        let interval = event.recurrence.interval_secs();
        let elapsed = now.saturating_sub(event.timestamp).max(0);
        let next = event.timestamp + (elapsed / interval + 1) * interval;

        self.conn
            .execute(
                "UPDATE scheduled_events SET timestamp = ? WHERE hook = ? AND timestamp = ?",
                params![next, event.hook.as_str(), event.timestamp],
            )
            .await?;

        Ok(next)
    }
}
