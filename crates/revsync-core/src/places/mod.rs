//! Google Places Details API client.

use std::time::Duration;

use serde::Deserialize;

use crate::models::Credentials;
use crate::sync::SyncError;
use crate::util::{compact_text, is_http_url};

/// Place Details endpoint
pub const DEFAULT_DETAILS_ENDPOINT: &str = "https://maps.googleapis.com/maps/api/place/details/json";

/// Request timeout for one details call
pub const REQUEST_TIMEOUT_SECS: u64 = 15;

/// Source of raw Place Details response bodies.
#[allow(async_fn_in_trait)]
pub trait PlacesClient {
    /// Fetch the review details body for the configured place.
    async fn fetch_details(&self, credentials: &Credentials) -> Result<String, SyncError>;
}

/// reqwest-backed client for the Place Details endpoint
#[derive(Clone)]
pub struct GooglePlacesClient {
    endpoint: String,
    client: reqwest::Client,
}

impl GooglePlacesClient {
    /// Client against the public Google endpoint
    pub fn new() -> Result<Self, SyncError> {
        Self::with_endpoint(DEFAULT_DETAILS_ENDPOINT)
    }

    /// Client against a custom endpoint (proxies, tests)
    pub fn with_endpoint(endpoint: impl Into<String>) -> Result<Self, SyncError> {
        let endpoint = endpoint.into().trim().trim_end_matches('/').to_string();
        if !is_http_url(&endpoint) {
            return Err(SyncError::Transport(format!(
                "Places endpoint must include http:// or https://: {endpoint}"
            )));
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self { endpoint, client })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Build the details GET request for `credentials`
    pub fn details_request(
        &self,
        credentials: &Credentials,
    ) -> Result<reqwest::Request, SyncError> {
        Ok(self
            .client
            .get(&self.endpoint)
            .query(&[
                ("place_id", credentials.place_id.as_str()),
                ("fields", "reviews"),
                ("key", credentials.api_key.as_str()),
            ])
            .header(reqwest::header::ACCEPT, "application/json")
            .build()?)
    }
}

impl PlacesClient for GooglePlacesClient {
    async fn fetch_details(&self, credentials: &Credentials) -> Result<String, SyncError> {
        let request = self.details_request(credentials)?;
        tracing::debug!(place_id = %credentials.place_id, "Requesting place details");

        let response = self.client.execute(request).await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            tracing::warn!(
                status = status.as_u16(),
                body = %compact_text(&body),
                "Places API returned a non-success status"
            );
        }

        Ok(body)
    }
}

/// Top-level Place Details response
#[derive(Debug, Default, Deserialize)]
pub struct PlaceDetailsResponse {
    #[serde(default)]
    pub result: Option<PlaceResult>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub error_message: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PlaceResult {
    /// Kept as raw values so one malformed element doesn't fail the whole body
    #[serde(default)]
    pub reviews: Option<Vec<serde_json::Value>>,
}

/// One review element as returned by the API
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PlaceReview {
    #[serde(default)]
    pub author_name: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    pub rating: Option<i64>,
    pub time: Option<i64>,
    #[serde(default)]
    pub profile_photo_url: Option<String>,
}

impl PlaceDetailsResponse {
    /// Parse a body; non-JSON bodies parse as an empty response.
    pub fn parse(body: &str) -> Self {
        serde_json::from_str(body).unwrap_or_else(|error| {
            tracing::warn!(%error, "Places API body is not valid JSON");
            Self::default()
        })
    }

    /// The `result.reviews` list, `None` when absent or null
    pub fn into_reviews(self) -> Option<Vec<serde_json::Value>> {
        self.result.and_then(|result| result.reviews)
    }
}

impl From<reqwest::Error> for SyncError {
    fn from(error: reqwest::Error) -> Self {
        Self::Transport(error.to_string())
    }
}
