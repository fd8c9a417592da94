//! Database migrations

use crate::error::Result;
use libsql::Connection;

/// Current schema version
const CURRENT_VERSION: i32 = 2;

/// Run all pending migrations
pub async fn run(conn: &Connection) -> Result<()> {
    let version = get_version(conn).await?;

    if version < 1 {
        migrate_v1(conn).await?;
    }
    if version < 2 {
        migrate_v2(conn).await?;
    }

    Ok(())
}

/// Get the current schema version
async fn get_version(conn: &Connection) -> Result<i32> {
    let mut rows = conn
        .query(
            "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version')",
            (),
        )
        .await?;

    let exists: bool = if let Some(row) = rows.next().await? {
        row.get::<i32>(0)? != 0
    } else {
        false
    };

    if !exists {
        return Ok(0);
    }

    let mut rows = conn
        .query("SELECT COALESCE(MAX(version), 0) FROM schema_version", ())
        .await?;

    let version: i32 = if let Some(row) = rows.next().await? {
        row.get(0)?
    } else {
        0
    };

    Ok(version)
}

/// Run statements inside one transaction, rolling back on the first failure
async fn apply(conn: &Connection, statements: &[&str]) -> Result<()> {
    conn.execute("BEGIN TRANSACTION", ()).await?;

    for stmt in statements {
        if let Err(e) = conn.execute(stmt, ()).await {
            conn.execute("ROLLBACK", ()).await.ok();
            return Err(e.into());
        }
    }

    if let Err(e) = conn.execute("COMMIT", ()).await {
        conn.execute("ROLLBACK", ()).await.ok();
        return Err(e.into());
    }

    Ok(())
}

/// Migration to version 1: reviews and settings
async fn migrate_v1(conn: &Connection) -> Result<()> {
    apply(
        conn,
        &[
            "CREATE TABLE IF NOT EXISTS schema_version (
                version INTEGER PRIMARY KEY
            )",
            "CREATE TABLE IF NOT EXISTS reviews (
                id TEXT PRIMARY KEY,
                external_id TEXT,
                author_name TEXT NOT NULL,
                text TEXT NOT NULL,
                status TEXT NOT NULL DEFAULT 'publish',
                rating INTEGER NOT NULL DEFAULT 0,
                review_date TEXT NOT NULL DEFAULT '',
                unix_time INTEGER NOT NULL DEFAULT 0,
                photo_url TEXT NOT NULL DEFAULT '',
                created_at INTEGER NOT NULL,
                updated_at INTEGER NOT NULL
            )",
            // Dedupe key
            "CREATE UNIQUE INDEX IF NOT EXISTS idx_reviews_external_id ON reviews(external_id)",
            "CREATE INDEX IF NOT EXISTS idx_reviews_unix_time ON reviews(unix_time DESC)",
            "CREATE TABLE IF NOT EXISTS settings (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            )",
            "INSERT INTO schema_version (version) VALUES (1)",
        ],
    )
    .await?;

    tracing::info!("Migrated database to version 1");
    Ok(())
}

/// Migration to version 2: scheduler events and the sync lock
async fn migrate_v2(conn: &Connection) -> Result<()> {
    apply(
        conn,
        &[
            "CREATE TABLE IF NOT EXISTS scheduled_events (
                hook TEXT NOT NULL,
                timestamp INTEGER NOT NULL,
                recurrence TEXT NOT NULL,
                interval_secs INTEGER NOT NULL,
                PRIMARY KEY (hook, timestamp)
            )",
            "CREATE INDEX IF NOT EXISTS idx_scheduled_events_timestamp ON scheduled_events(timestamp)",
            "CREATE TABLE IF NOT EXISTS sync_locks (
                name TEXT PRIMARY KEY,
                holder TEXT NOT NULL,
                acquired_at INTEGER NOT NULL
            )",
            "INSERT INTO schema_version (version) VALUES (2)",
        ],
    )
    .await?;

    tracing::info!("Migrated database to version {CURRENT_VERSION}");
    Ok(())
}
