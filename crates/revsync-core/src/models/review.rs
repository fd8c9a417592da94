//! Review record model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Prefix of every external identifier derived from a Google review.
pub const EXTERNAL_ID_PREFIX: &str = "google_";

const REVIEW_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A unique identifier for a stored review, using UUID v7 (time-sortable)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReviewId(Uuid);

impl ReviewId {
    /// Create a new unique review ID using UUID v7
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Get the string representation of this ID
    #[must_use]
    pub fn as_str(&self) -> String {
        self.0.to_string()
    }
}

impl Default for ReviewId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ReviewId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ReviewId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// Publish status of a stored review
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ReviewStatus {
    /// Visible to listing consumers
    #[default]
    Publish,
    /// Hidden draft
    Draft,
}

impl ReviewStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Publish => "publish",
            Self::Draft => "draft",
        }
    }
}

impl FromStr for ReviewStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "publish" => Ok(Self::Publish),
            "draft" => Ok(Self::Draft),
            other => Err(format!("unknown review status: {other}")),
        }
    }
}

/// Title, body and status of a review record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewPost {
    pub author_name: String,
    pub text: String,
    pub status: ReviewStatus,
}

/// Derived meta fields attached to a review record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewMeta {
    pub external_id: String,
    pub rating: i64,
    pub review_date: String,
    pub photo_url: String,
    pub unix_time: i64,
}

/// A review persisted in the record store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewRecord {
    /// Unique identifier
    pub id: ReviewId,
    /// Dedupe key derived from the review's origin timestamp
    pub external_id: String,
    /// Reviewer name (title field)
    pub author_name: String,
    /// Review text (body field)
    pub text: String,
    /// Publish status
    pub status: ReviewStatus,
    /// Star rating, 1 to 5
    pub rating: i64,
    /// `YYYY-MM-DD HH:MM:SS` rendering of `unix_time` (UTC)
    pub review_date: String,
    /// Review origin timestamp (Unix seconds)
    pub unix_time: i64,
    /// Reviewer photo URL
    pub photo_url: String,
    /// Creation timestamp (Unix ms)
    pub created_at: i64,
    /// Last update timestamp (Unix ms)
    pub updated_at: i64,
}

impl ReviewRecord {
    /// Star rendering of the rating for listing columns, e.g. `★★★★☆`.
    #[must_use]
    pub fn rating_stars(&self) -> String {
        let filled = usize::try_from(self.rating.clamp(0, 5)).unwrap_or(0);
        format!("{}{}", "★".repeat(filled), "☆".repeat(5 - filled))
    }

    /// Short date for listing columns, e.g. `Nov 14, 2023`.
    #[must_use]
    pub fn short_date(&self) -> String {
        DateTime::<Utc>::from_timestamp(self.unix_time, 0)
            .map(|date| date.format("%b %-d, %Y").to_string())
            .unwrap_or_default()
    }
}

/// Derive the dedupe key for a review origin timestamp.
///
/// ```
/// use revsync_core::models::external_id_for;
///
/// assert_eq!(external_id_for(1_700_000_000), "google_1700000000");
/// ```
#[must_use]
pub fn external_id_for(unix_time: i64) -> String {
    format!("{EXTERNAL_ID_PREFIX}{unix_time}")
}

/// Render a Unix timestamp as the stored `review_date` value (UTC).
#[must_use]
pub fn format_review_date(unix_time: i64) -> String {
    DateTime::<Utc>::from_timestamp(unix_time, 0)
        .map(|date| date.format(REVIEW_DATE_FORMAT).to_string())
        .unwrap_or_default()
}
