//! Sync settings model

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::util::normalize_text_option;

/// How often the scheduled sync runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SyncFrequency {
    /// Every hour
    Hourly,
    /// Every twelve hours
    #[serde(rename = "twicedaily")]
    TwiceDaily,
    /// Every day
    #[default]
    Daily,
    /// Every week
    Weekly,
}

impl SyncFrequency {
    pub const ALL: [Self; 4] = [Self::Hourly, Self::TwiceDaily, Self::Daily, Self::Weekly];

    /// Stored setting value
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Hourly => "hourly",
            Self::TwiceDaily => "twicedaily",
            Self::Daily => "daily",
            Self::Weekly => "weekly",
        }
    }

    /// Recurrence interval in seconds
    pub const fn interval_secs(self) -> i64 {
        match self {
            Self::Hourly => 60 * 60,
            Self::TwiceDaily => 12 * 60 * 60,
            Self::Daily => 24 * 60 * 60,
            Self::Weekly => 7 * 24 * 60 * 60,
        }
    }

    /// Human label for the settings view
    pub const fn label(self) -> &'static str {
        match self {
            Self::Hourly => "Hourly",
            Self::TwiceDaily => "Twice Daily",
            Self::Daily => "Daily",
            Self::Weekly => "Weekly",
        }
    }
}

impl fmt::Display for SyncFrequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SyncFrequency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|frequency| frequency.as_str() == s.trim().to_ascii_lowercase())
            .ok_or_else(|| {
                format!("unknown sync frequency '{s}' (expected hourly, twicedaily, daily or weekly)")
            })
    }
}

/// API credentials required by a sync run.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub api_key: String,
    pub place_id: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("Credentials")
            .field("api_key", &"[REDACTED]")
            .field("place_id", &self.place_id)
            .finish()
    }
}

/// Process-wide sync configuration, persisted in the settings table
#[derive(Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SyncSettings {
    /// Google Places API key
    pub api_key: Option<String>,
    /// Place ID of the business
    pub place_id: Option<String>,
    /// Scheduled sync frequency
    pub frequency: SyncFrequency,
}

impl SyncSettings {
    /// Both credentials, trimmed, when neither is empty.
    pub fn credentials(&self) -> Option<Credentials> {
        Some(Credentials {
            api_key: normalize_text_option(self.api_key.clone())?,
            place_id: normalize_text_option(self.place_id.clone())?,
        })
    }

    pub fn has_credentials(&self) -> bool {
        self.credentials().is_some()
    }
}

impl fmt::Debug for SyncSettings {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("SyncSettings")
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("place_id", &self.place_id)
            .field("frequency", &self.frequency)
            .finish()
    }
}
