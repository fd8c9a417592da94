//! Review repository implementation

#![allow(clippy::cast_possible_wrap)] // SQLite uses i64 for LIMIT/OFFSET

use crate::error::{Error, Result};
use crate::models::{ReviewId, ReviewMeta, ReviewPost, ReviewRecord, ReviewStatus};
use libsql::{params, Connection};

const REVIEW_COLUMNS: &str = "id, external_id, author_name, text, status, rating, review_date, \
                              unix_time, photo_url, created_at, updated_at";

/// Trait for review record storage operations (async)
#[allow(async_fn_in_trait)]
pub trait ReviewRepository {
    /// Find the single record whose external id matches exactly
    async fn find_by_external_id(&self, external_id: &str) -> Result<Option<ReviewRecord>>;

    /// Create a record with its post fields and meta in one write
    async fn create(&self, post: &ReviewPost, meta: &ReviewMeta) -> Result<ReviewId>;

    /// Overwrite the post fields and meta of an existing record in one write
    async fn update(&self, id: &ReviewId, post: &ReviewPost, meta: &ReviewMeta) -> Result<()>;

    /// List published records, newest review first
    async fn list(&self, limit: usize, offset: usize) -> Result<Vec<ReviewRecord>>;

    /// Count stored records
    async fn count(&self) -> Result<usize>;
}

/// libSQL implementation of `ReviewRepository`
pub struct LibSqlReviewRepository<'a> {
    conn: &'a Connection,
}

impl<'a> LibSqlReviewRepository<'a> {
    /// Create a new repository with the given connection
    pub const fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Parse a review from a database row
    fn parse_review(row: &libsql::Row) -> Result<ReviewRecord> {
        let id: String = row.get(0)?;
        let status: String = row.get(4)?;
        Ok(ReviewRecord {
            id: id
                .parse()
                .map_err(|_| Error::Database(format!("invalid review id in store: {id}")))?,
            external_id: row.get::<Option<String>>(1)?.unwrap_or_default(),
            author_name: row.get(2)?,
            text: row.get(3)?,
            status: status.parse().unwrap_or_default(),
            rating: row.get(5)?,
            review_date: row.get(6)?,
            unix_time: row.get(7)?,
            photo_url: row.get(8)?,
            created_at: row.get(9)?,
            updated_at: row.get(10)?,
        })
    }

    async fn collect(mut rows: libsql::Rows) -> Result<Vec<ReviewRecord>> {
        let mut reviews = Vec::new();
        while let Some(row) = rows.next().await? {
            reviews.push(Self::parse_review(&row)?);
        }
        Ok(reviews)
    }
}

impl ReviewRepository for LibSqlReviewRepository<'_> {
    async fn find_by_external_id(&self, external_id: &str) -> Result<Option<ReviewRecord>> {
        let rows = self
            .conn
            .query(
                &format!("SELECT {REVIEW_COLUMNS} FROM reviews WHERE external_id = ? LIMIT 1"),
                [external_id],
            )
            .await?;

        Ok(Self::collect(rows).await?.into_iter().next())
    }

    async fn create(&self, post: &ReviewPost, meta: &ReviewMeta) -> Result<ReviewId> {
        let id = ReviewId::new();
        let now = chrono::Utc::now().timestamp_millis();

        self.conn
            .execute(
                "INSERT INTO reviews (id, external_id, author_name, text, status, rating,
                                      review_date, unix_time, photo_url, created_at, updated_at)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
                params![
                    id.as_str(),
                    meta.external_id.as_str(),
                    post.author_name.as_str(),
                    post.text.as_str(),
                    post.status.as_str(),
                    meta.rating,
                    meta.review_date.as_str(),
                    meta.unix_time,
                    meta.photo_url.as_str(),
                    now,
                    now
                ],
            )
            .await?;

        tracing::debug!(
            review_id = %id,
            external_id = %meta.external_id,
            "Created review record"
        );
        Ok(id)
    }

    async fn update(&self, id: &ReviewId, post: &ReviewPost, meta: &ReviewMeta) -> Result<()> {
        let now = chrono::Utc::now().timestamp_millis();

        let rows = self
            .conn
            .execute(
                "UPDATE reviews
                 SET author_name = ?, text = ?, status = ?, external_id = ?, rating = ?,
                     review_date = ?, photo_url = ?, unix_time = ?, updated_at = ?
                 WHERE id = ?",
                params![
                    post.author_name.as_str(),
                    post.text.as_str(),
                    post.status.as_str(),
                    meta.external_id.as_str(),
                    meta.rating,
                    meta.review_date.as_str(),
                    meta.photo_url.as_str(),
                    meta.unix_time,
                    now,
                    id.as_str()
                ],
            )
            .await?;

        if rows == 0 {
            return Err(Error::NotFound(id.to_string()));
        }

        tracing::debug!(review_id = %id, "Updated review record");
        Ok(())
    }

    async fn list(&self, limit: usize, offset: usize) -> Result<Vec<ReviewRecord>> {
        let rows = self
            .conn
            .query(
                &format!(
                    "SELECT {REVIEW_COLUMNS} FROM reviews
                     WHERE status = ?
                     ORDER BY unix_time DESC, created_at DESC
                     LIMIT ? OFFSET ?"
                ),
                params![ReviewStatus::Publish.as_str(), limit as i64, offset as i64],
            )
            .await?;

        Self::collect(rows).await
    }

    async fn count(&self) -> Result<usize> {
        let mut rows = self.conn.query("SELECT COUNT(*) FROM reviews", ()).await?;
        let count = match rows.next().await? {
            Some(row) => row.get::<i64>(0)?,
            None => 0,
        };
        usize::try_from(count).map_err(|_| Error::Database(format!("invalid row count {count}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use crate::models::{external_id_for, format_review_date};
    use pretty_assertions::assert_eq;

    async fn setup() -> Database {
        Database::open_in_memory().await.unwrap()
    }

    fn post(author: &str, text: &str) -> ReviewPost {
        ReviewPost {
            author_name: author.to_string(),
            text: text.to_string(),
            status: ReviewStatus::Publish,
        }
    }

    fn meta(unix_time: i64, rating: i64) -> ReviewMeta {
        ReviewMeta {
            external_id: external_id_for(unix_time),
            rating,
            review_date: format_review_date(unix_time),
            photo_url: "https://example.com/p.jpg".to_string(),
            unix_time,
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_create_writes_post_and_meta() {
        let db = setup().await;
        let repo = LibSqlReviewRepository::new(db.connection());

        let id = repo
            .create(&post("Jane", "Great!"), &meta(1_700_000_000, 5))
            .await
            .unwrap();

        let found = repo
            .find_by_external_id("google_1700000000")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.id, id);
        assert_eq!(found.author_name, "Jane");
        assert_eq!(found.text, "Great!");
        assert_eq!(found.status, ReviewStatus::Publish);
        assert_eq!(found.rating, 5);
        assert_eq!(found.unix_time, 1_700_000_000);
        assert_eq!(found.review_date, "2023-11-14 22:13:20");

        assert!(repo
            .find_by_external_id("google_1700000001")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_update_overwrites_post_and_meta() {
        let db = setup().await;
        let repo = LibSqlReviewRepository::new(db.connection());

        let id = repo.create(&post("Jane", "Good"), &meta(100, 3)).await.unwrap();
        repo.update(&id, &post("Jane D.", "Even better"), &meta(100, 5))
            .await
            .unwrap();

        let fetched = repo.find_by_external_id("google_100").await.unwrap().unwrap();
        assert_eq!(fetched.id, id);
        assert_eq!(fetched.author_name, "Jane D.");
        assert_eq!(fetched.text, "Even better");
        assert_eq!(fetched.rating, 5);
        assert!(fetched.updated_at >= fetched.created_at);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_update_restores_publish_status() {
        let db = setup().await;
        let repo = LibSqlReviewRepository::new(db.connection());

        let draft = ReviewPost {
            status: ReviewStatus::Draft,
            ..post("Jane", "Good")
        };
        let id = repo.create(&draft, &meta(100, 4)).await.unwrap();
        assert!(repo.list(10, 0).await.unwrap().is_empty());
        let stored = repo.find_by_external_id("google_100").await.unwrap().unwrap();
        assert_eq!(stored.status, ReviewStatus::Draft);

        repo.update(&id, &post("Jane", "Good"), &meta(100, 4))
            .await
            .unwrap();
        assert_eq!(repo.list(10, 0).await.unwrap().len(), 1);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_update_missing_record_is_not_found() {
        let db = setup().await;
        let repo = LibSqlReviewRepository::new(db.connection());

        let result = repo
            .update(&ReviewId::new(), &post("x", "y"), &meta(1, 1))
            .await;
        assert!(matches!(result, Err(Error::NotFound(_))));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_rejected_create_leaves_no_partial_record() {
        let db = setup().await;
        let repo = LibSqlReviewRepository::new(db.connection());

        repo.create(&post("A", "a"), &meta(100, 4)).await.unwrap();
        assert!(repo.create(&post("B", "b"), &meta(100, 2)).await.is_err());

        assert_eq!(repo.count().await.unwrap(), 1);
        let listed = repo.list(10, 0).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].author_name, "A");
        assert_eq!(listed[0].external_id, "google_100");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_list_newest_review_first() {
        let db = setup().await;
        let repo = LibSqlReviewRepository::new(db.connection());

        for (author, time) in [("Old", 100), ("New", 300), ("Mid", 200)] {
            repo.create(&post(author, "text"), &meta(time, 3))
                .await
                .unwrap();
        }

        let reviews = repo.list(2, 0).await.unwrap();
        let authors = reviews
            .iter()
            .map(|review| review.author_name.as_str())
            .collect::<Vec<_>>();
        assert_eq!(authors, vec!["New", "Mid"]);
        assert_eq!(repo.count().await.unwrap(), 3);
    }
}
