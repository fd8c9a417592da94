//! Settings repository implementation

use crate::error::Result;
use crate::models::{SyncFrequency, SyncSettings};
use crate::util::normalize_text_option;
use libsql::Connection;

const API_KEY: &str = "google_reviews_api_key";
const PLACE_ID: &str = "google_reviews_place_id";
const SYNC_FREQUENCY: &str = "google_reviews_sync_frequency";

/// Trait for settings storage operations (async)
#[allow(async_fn_in_trait)]
pub trait SettingsRepository {
    /// Load settings from the database
    async fn load(&self) -> Result<SyncSettings>;

    /// Save settings to the database
    async fn save(&self, settings: &SyncSettings) -> Result<()>;
}

/// libSQL implementation of `SettingsRepository`
pub struct LibSqlSettingsRepository<'a> {
    conn: &'a Connection,
}

impl<'a> LibSqlSettingsRepository<'a> {
    /// Create a new repository with the given connection
    pub const fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }
}

impl SettingsRepository for LibSqlSettingsRepository<'_> {
    async fn load(&self) -> Result<SyncSettings> {
        let mut settings = SyncSettings {
            api_key: normalize_text_option(self.get_setting(API_KEY).await?),
            place_id: normalize_text_option(self.get_setting(PLACE_ID).await?),
            ..SyncSettings::default()
        };

        if let Some(value) = self.get_setting(SYNC_FREQUENCY).await? {
            match value.parse::<SyncFrequency>() {
                Ok(frequency) => settings.frequency = frequency,
                Err(error) => tracing::warn!("{error}; falling back to daily"),
            }
        }

        Ok(settings)
    }

    async fn save(&self, settings: &SyncSettings) -> Result<()> {
        self.set_setting(API_KEY, settings.api_key.as_deref().unwrap_or_default())
            .await?;
        self.set_setting(PLACE_ID, settings.place_id.as_deref().unwrap_or_default())
            .await?;
        self.set_setting(SYNC_FREQUENCY, settings.frequency.as_str())
            .await?;
        Ok(())
    }
}

impl LibSqlSettingsRepository<'_> {
    async fn get_setting(&self, key: &str) -> Result<Option<String>> {
        let mut rows = self
            .conn
            .query("SELECT value FROM settings WHERE key = ?", [key])
            .await?;

        if let Some(row) = rows.next().await? {
            Ok(Some(row.get(0)?))
        } else {
            Ok(None)
        }
    }

    async fn set_setting(&self, key: &str, value: &str) -> Result<()> {
        self.conn
            .execute(
                "INSERT OR REPLACE INTO settings (key, value) VALUES (?, ?)",
                [key, value.trim()],
            )
            .await?;
        Ok(())
    }
}
