use chrono::{DateTime, Utc};
use revsync_core::config::AppConfig;
use revsync_core::services::DatabaseService;
use revsync_core::util::mask_secret;
use revsync_core::{ReviewRecord, SyncSettings};
use serde::Serialize;

use crate::error::CliError;

#[derive(Debug, Serialize)]
pub struct ReviewListItem {
    pub id: String,
    pub external_id: String,
    pub author_name: String,
    pub text: String,
    pub rating: i64,
    pub review_date: String,
    pub unix_time: i64,
    pub photo_url: String,
}

#[derive(Debug, Serialize)]
pub struct SettingsView {
    pub api_key: Option<String>,
    pub place_id: Option<String>,
    pub frequency: String,
    pub next_sync: Option<i64>,
    pub next_sync_label: String,
}

pub async fn open_service(config: &AppConfig) -> Result<DatabaseService, CliError> {
    Ok(DatabaseService::open_path(&config.db_path).await?)
}

pub fn format_review_lines(reviews: &[ReviewRecord]) -> Vec<String> {
    reviews
        .iter()
        .map(|review| {
            let author = truncate(&review.author_name, 24);
            let stars = review.rating_stars();
            let date = review.short_date();
            let preview = truncate(&collapse_whitespace(&review.text), 50);
            format!("{author:<24}  {stars}  {date:<12}  {preview}")
        })
        .collect()
}

pub fn review_to_list_item(review: &ReviewRecord) -> ReviewListItem {
    ReviewListItem {
        id: review.id.to_string(),
        external_id: review.external_id.clone(),
        author_name: review.author_name.clone(),
        text: review.text.clone(),
        rating: review.rating,
        review_date: review.review_date.clone(),
        unix_time: review.unix_time,
        photo_url: review.photo_url.clone(),
    }
}

pub fn settings_view(settings: &SyncSettings, next_sync: Option<i64>) -> SettingsView {
    SettingsView {
        api_key: settings.api_key.as_deref().map(mask_secret),
        place_id: settings.place_id.clone(),
        frequency: settings.frequency.as_str().to_string(),
        next_sync,
        next_sync_label: format_next_sync(next_sync),
    }
}

pub fn format_settings_lines(view: &SettingsView, frequency_label: &str) -> Vec<String> {
    vec![
        format!(
            "API key:    {}",
            view.api_key.as_deref().unwrap_or("(not set)")
        ),
        format!(
            "Place ID:   {}",
            view.place_id.as_deref().unwrap_or("(not set)")
        ),
        format!("Frequency:  {frequency_label}"),
        view.next_sync_label.clone(),
    ]
}

pub fn format_next_sync(next_sync: Option<i64>) -> String {
    match next_sync.and_then(|timestamp| DateTime::<Utc>::from_timestamp(timestamp, 0)) {
        Some(date) => format!(
            "Next automatic sync: {}",
            date.format("%B %-d, %Y %-I:%M %P UTC")
        ),
        None => {
            "No sync scheduled. Save your settings to schedule automatic syncing.".to_string()
        }
    }
}

pub fn truncate(value: &str, max_chars: usize) -> String {
    if value.chars().count() <= max_chars {
        value.to_string()
    } else {
        let take_len = max_chars.saturating_sub(3);
        let mut truncated = value.chars().take(take_len).collect::<String>();
        truncated.push_str("...");
        truncated
    }
}

fn collapse_whitespace(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}
