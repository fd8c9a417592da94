//! Review sync job: fetch the current review set and reconcile it against
//! stored records.
//!
//! Reconciliation is upsert-only. A review that disappears from a later API
//! response stays stored; nothing here ever deletes a record.

use serde::Serialize;
use thiserror::Error;

use crate::db::ReviewRepository;
use crate::models::{
    external_id_for, format_review_date, ReviewMeta, ReviewPost, ReviewStatus, SyncSettings,
};
use crate::places::{PlaceDetailsResponse, PlaceReview, PlacesClient};
use crate::sanitize::{sanitize_rich_text, sanitize_text_field, sanitize_url};

/// Failure of one sync run
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("API Key or Place ID not configured.")]
    MissingCredentials,
    #[error("{0}")]
    Transport(String),
    #[error("No reviews found in API response.")]
    NoReviews,
    #[error("A review sync is already in progress.")]
    AlreadyRunning,
    #[error("Review store error: {0}")]
    Store(#[from] crate::Error),
}

/// Counters of one successful sync run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SyncOutcome {
    pub created: usize,
    pub updated: usize,
    /// Malformed elements that were skipped
    pub skipped: usize,
}

impl SyncOutcome {
    /// Reviews processed: created plus updated
    pub const fn total(&self) -> usize {
        self.created + self.updated
    }
}

/// Fetch reviews for the configured place and upsert them into `store`.
pub async fn sync<C, R>(
    settings: &SyncSettings,
    client: &C,
    store: &R,
) -> Result<SyncOutcome, SyncError>
where
    C: PlacesClient,
    R: ReviewRepository,
{
    let credentials = settings
        .credentials()
        .ok_or(SyncError::MissingCredentials)?;

    let body = client.fetch_details(&credentials).await?;
    let response = PlaceDetailsResponse::parse(&body);
    if let Some(status) = response.status.as_deref().filter(|status| *status != "OK") {
        tracing::warn!(
            status,
            error_message = response.error_message.as_deref().unwrap_or_default(),
            "Places API reported a non-OK status"
        );
    }
    let reviews = response.into_reviews().ok_or(SyncError::NoReviews)?;

    let mut outcome = SyncOutcome::default();
    for (index, value) in reviews.into_iter().enumerate() {
        let (post, meta) = match prepare_review(value) {
            Ok(prepared) => prepared,
            Err(reason) => {
                tracing::warn!(index, %reason, "Skipping malformed review");
                outcome.skipped += 1;
                continue;
            }
        };

        // Post fields and meta are written together.
        if let Some(existing) = store.find_by_external_id(&meta.external_id).await? {
            store.update(&existing.id, &post, &meta).await?;
            outcome.updated += 1;
        } else {
            store.create(&post, &meta).await?;
            outcome.created += 1;
        }
    }

    tracing::info!(
        created = outcome.created,
        updated = outcome.updated,
        skipped = outcome.skipped,
        "Review sync finished"
    );
    Ok(outcome)
}

/// Decode and sanitize one API element into post fields and meta.
fn prepare_review(value: serde_json::Value) -> Result<(ReviewPost, ReviewMeta), String> {
    let review: PlaceReview =
        serde_json::from_value(value).map_err(|error| format!("undecodable element: {error}"))?;

    let unix_time = review.time.ok_or("missing time")?;
    let rating = review.rating.ok_or("missing rating")?;
    if !(1..=5).contains(&rating) {
        return Err(format!("rating {rating} outside 1-5"));
    }

    let post = ReviewPost {
        author_name: sanitize_text_field(review.author_name.as_deref().unwrap_or_default()),
        text: sanitize_rich_text(review.text.as_deref().unwrap_or_default()),
        status: ReviewStatus::Publish,
    };
    let meta = ReviewMeta {
        external_id: external_id_for(unix_time),
        rating,
        review_date: format_review_date(unix_time),
        photo_url: sanitize_url(review.profile_photo_url.as_deref().unwrap_or_default()),
        unix_time,
    };
    Ok((post, meta))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::db::{Database, LibSqlReviewRepository};
    use crate::models::Credentials;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Canned Places client recording how often it was called
    pub struct FakePlacesClient {
        body: Mutex<Result<String, String>>,
        calls: AtomicUsize,
    }

    impl FakePlacesClient {
        pub fn with_body(body: serde_json::Value) -> Self {
            Self {
                body: Mutex::new(Ok(body.to_string())),
                calls: AtomicUsize::new(0),
            }
        }

        pub fn failing(message: &str) -> Self {
            Self {
                body: Mutex::new(Err(message.to_string())),
                calls: AtomicUsize::new(0),
            }
        }

        pub fn set_body(&self, body: serde_json::Value) {
            *self.body.lock().unwrap() = Ok(body.to_string());
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl PlacesClient for FakePlacesClient {
        async fn fetch_details(&self, _credentials: &Credentials) -> Result<String, SyncError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.body
                .lock()
                .unwrap()
                .clone()
                .map_err(SyncError::Transport)
        }
    }

    pub fn settings() -> SyncSettings {
        SyncSettings {
            api_key: Some("AIza-test".to_string()),
            place_id: Some("ChIJ-place".to_string()),
            ..SyncSettings::default()
        }
    }

    pub fn review(author: &str, text: &str, rating: i64, time: i64) -> serde_json::Value {
        json!({
            "author_name": author,
            "text": text,
            "rating": rating,
            "time": time,
            "profile_photo_url": "https://x/p.jpg",
        })
    }

    pub fn body(reviews: Vec<serde_json::Value>) -> serde_json::Value {
        json!({ "result": { "reviews": reviews }, "status": "OK" })
    }

    async fn setup() -> Database {
        Database::open_in_memory().await.unwrap()
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn missing_credentials_make_no_call_and_no_writes() {
        let db = setup().await;
        let repo = LibSqlReviewRepository::new(db.connection());
        let client = FakePlacesClient::with_body(body(vec![review("Jane", "Great!", 5, 1)]));

        for settings in [
            SyncSettings {
                api_key: None,
                ..settings()
            },
            SyncSettings {
                place_id: Some("   ".to_string()),
                ..settings()
            },
        ] {
            let result = sync(&settings, &client, &repo).await;
            assert!(matches!(result, Err(SyncError::MissingCredentials)));
        }

        assert_eq!(client.calls(), 0);
        assert_eq!(repo.count().await.unwrap(), 0);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn transport_failure_writes_nothing() {
        let db = setup().await;
        let repo = LibSqlReviewRepository::new(db.connection());
        let client = FakePlacesClient::failing("operation timed out");

        let result = sync(&settings(), &client, &repo).await;
        match result {
            Err(SyncError::Transport(message)) => assert_eq!(message, "operation timed out"),
            other => panic!("expected transport error, got {other:?}"),
        }
        assert_eq!(repo.count().await.unwrap(), 0);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn response_without_reviews_is_no_reviews() {
        let db = setup().await;
        let repo = LibSqlReviewRepository::new(db.connection());

        for payload in [
            json!({ "result": {} }),
            json!({ "result": { "reviews": null } }),
            json!({ "status": "INVALID_REQUEST" }),
        ] {
            let client = FakePlacesClient::with_body(payload);
            let result = sync(&settings(), &client, &repo).await;
            assert!(matches!(result, Err(SyncError::NoReviews)));
        }
        assert_eq!(repo.count().await.unwrap(), 0);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn empty_review_list_is_zero_result_success() {
        let db = setup().await;
        let repo = LibSqlReviewRepository::new(db.connection());
        let client = FakePlacesClient::with_body(body(vec![]));

        let outcome = sync(&settings(), &client, &repo).await.unwrap();
        assert_eq!(outcome, SyncOutcome::default());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn maps_fields_onto_record() {
        let db = setup().await;
        let repo = LibSqlReviewRepository::new(db.connection());
        let client = FakePlacesClient::with_body(body(vec![review(
            "Jane",
            "Great!",
            5,
            1_700_000_000,
        )]));

        let outcome = sync(&settings(), &client, &repo).await.unwrap();
        assert_eq!(outcome.created, 1);

        let record = repo
            .find_by_external_id("google_1700000000")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(record.author_name, "Jane");
        assert_eq!(record.text, "Great!");
        assert_eq!(record.status, ReviewStatus::Publish);
        assert_eq!(record.rating, 5);
        assert_eq!(record.unix_time, 1_700_000_000);
        assert_eq!(record.review_date, "2023-11-14 22:13:20");
        assert_eq!(record.photo_url, "https://x/p.jpg");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn sanitizes_fields_before_persisting() {
        let db = setup().await;
        let repo = LibSqlReviewRepository::new(db.connection());
        let client = FakePlacesClient::with_body(body(vec![json!({
            "author_name": "<b>Mallory</b>\n",
            "text": "Fine<script>steal()</script>",
            "rating": 2,
            "time": 42,
            "profile_photo_url": "javascript:alert(1)",
        })]));

        sync(&settings(), &client, &repo).await.unwrap();

        let record = repo.find_by_external_id("google_42").await.unwrap().unwrap();
        assert_eq!(record.author_name, "Mallory");
        assert_eq!(record.text, "Fine");
        assert_eq!(record.photo_url, "");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn second_run_updates_every_review_without_duplicates() {
        let db = setup().await;
        let repo = LibSqlReviewRepository::new(db.connection());
        let client = FakePlacesClient::with_body(body(vec![
            review("Jane", "Great!", 5, 100),
            review("Bob", "Okay", 3, 200),
        ]));

        let first = sync(&settings(), &client, &repo).await.unwrap();
        assert_eq!((first.created, first.updated), (2, 0));
        let count_after_first = repo.count().await.unwrap();
        let record_before = repo.find_by_external_id("google_100").await.unwrap().unwrap();

        let second = sync(&settings(), &client, &repo).await.unwrap();
        assert_eq!((second.created, second.updated), (0, 2));
        assert_eq!(repo.count().await.unwrap(), count_after_first);

        let record_after = repo.find_by_external_id("google_100").await.unwrap().unwrap();
        assert_eq!(record_after.id, record_before.id);
        assert_eq!(record_after.review_date, record_before.review_date);
        assert_eq!(record_after.rating, record_before.rating);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn changed_text_updates_in_place() {
        let db = setup().await;
        let repo = LibSqlReviewRepository::new(db.connection());
        let client = FakePlacesClient::with_body(body(vec![review("Jane", "Good", 4, 100)]));

        sync(&settings(), &client, &repo).await.unwrap();
        client.set_body(body(vec![review("Jane", "Even better", 5, 100)]));
        sync(&settings(), &client, &repo).await.unwrap();

        assert_eq!(repo.count().await.unwrap(), 1);
        let record = repo.find_by_external_id("google_100").await.unwrap().unwrap();
        assert_eq!(record.text, "Even better");
        assert_eq!(record.rating, 5);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn same_time_collapses_and_different_times_do_not() {
        let db = setup().await;
        let repo = LibSqlReviewRepository::new(db.connection());
        let client = FakePlacesClient::with_body(body(vec![
            review("Jane", "First", 5, 100),
            review("Jane again", "Second", 4, 100),
            review("Bob", "Other", 3, 101),
        ]));

        let outcome = sync(&settings(), &client, &repo).await.unwrap();
        assert_eq!((outcome.created, outcome.updated), (2, 1));
        assert_eq!(repo.count().await.unwrap(), 2);

        let record = repo.find_by_external_id("google_100").await.unwrap().unwrap();
        assert_eq!(record.author_name, "Jane again");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn total_counts_created_plus_updated() {
        let db = setup().await;
        let repo = LibSqlReviewRepository::new(db.connection());
        let client = FakePlacesClient::with_body(body(vec![
            review("A", "a", 5, 1),
            review("B", "b", 4, 2),
            review("C", "c", 3, 3),
        ]));
        sync(&settings(), &client, &repo).await.unwrap();

        client.set_body(body(vec![
            review("A", "a", 5, 1),
            review("B", "b", 4, 2),
            review("C", "c", 3, 3),
            review("D", "d", 2, 4),
            review("E", "e", 1, 5),
        ]));
        let outcome = sync(&settings(), &client, &repo).await.unwrap();

        assert_eq!(outcome.created, 2);
        assert_eq!(outcome.updated, 3);
        assert_eq!(outcome.total(), 5);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn malformed_elements_are_skipped() {
        let db = setup().await;
        let repo = LibSqlReviewRepository::new(db.connection());
        let client = FakePlacesClient::with_body(body(vec![
            json!({ "author_name": "No time", "rating": 5 }),
            json!({ "author_name": "No rating", "time": 10 }),
            review("Too high", "x", 9, 11),
            json!("not an object"),
            review("Valid", "ok", 4, 12),
        ]));

        let outcome = sync(&settings(), &client, &repo).await.unwrap();
        assert_eq!(outcome.created, 1);
        assert_eq!(outcome.skipped, 4);
        assert_eq!(outcome.total(), 1);
        assert_eq!(repo.count().await.unwrap(), 1);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn absent_reviews_are_kept() {
        let db = setup().await;
        let repo = LibSqlReviewRepository::new(db.connection());
        let client = FakePlacesClient::with_body(body(vec![
            review("A", "a", 5, 1),
            review("B", "b", 4, 2),
        ]));
        sync(&settings(), &client, &repo).await.unwrap();

        client.set_body(body(vec![review("B", "b", 4, 2)]));
        sync(&settings(), &client, &repo).await.unwrap();

        assert_eq!(repo.count().await.unwrap(), 2);
        assert!(repo.find_by_external_id("google_1").await.unwrap().is_some());
    }

    /// Review store whose `n`th create fails, as a busy database would
    struct FailingCreateStore<'a> {
        inner: LibSqlReviewRepository<'a>,
        creates: AtomicUsize,
        fail_on: usize,
    }

    impl ReviewRepository for FailingCreateStore<'_> {
        async fn find_by_external_id(
            &self,
            external_id: &str,
        ) -> crate::Result<Option<crate::models::ReviewRecord>> {
            self.inner.find_by_external_id(external_id).await
        }

        async fn create(
            &self,
            post: &ReviewPost,
            meta: &ReviewMeta,
        ) -> crate::Result<crate::models::ReviewId> {
            if self.creates.fetch_add(1, Ordering::SeqCst) + 1 == self.fail_on {
                return Err(crate::Error::Database("database is locked".to_string()));
            }
            self.inner.create(post, meta).await
        }

        async fn update(
            &self,
            id: &crate::models::ReviewId,
            post: &ReviewPost,
            meta: &ReviewMeta,
        ) -> crate::Result<()> {
            self.inner.update(id, post, meta).await
        }

        async fn list(
            &self,
            limit: usize,
            offset: usize,
        ) -> crate::Result<Vec<crate::models::ReviewRecord>> {
            self.inner.list(limit, offset).await
        }

        async fn count(&self) -> crate::Result<usize> {
            self.inner.count().await
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn failed_write_is_recovered_without_duplicates() {
        let db = setup().await;
        let store = FailingCreateStore {
            inner: LibSqlReviewRepository::new(db.connection()),
            creates: AtomicUsize::new(0),
            fail_on: 2,
        };
        let client = FakePlacesClient::with_body(body(vec![
            review("Jane", "Great!", 5, 100),
            review("Bob", "Okay", 3, 200),
        ]));

        let first = sync(&settings(), &client, &store).await;
        assert!(matches!(first, Err(SyncError::Store(_))));
        assert_eq!(store.count().await.unwrap(), 1);

        let second = sync(&settings(), &client, &store).await.unwrap();
        assert_eq!((second.created, second.updated), (1, 1));

        let listed = store.list(10, 0).await.unwrap();
        assert_eq!(listed.len(), 2);
        for record in &listed {
            assert!(record.external_id.starts_with("google_"));
            assert!((1..=5).contains(&record.rating));
        }
    }
}
