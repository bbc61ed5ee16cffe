//! # Review Repository
//!
//! Reviews are always addressed through their title: a review id that
//! exists but belongs to a different title is reported as not found.
//!
//! ## One Review per Author per Title
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  service: exists_for(title, author)?  ── yes ──► DuplicateReview       │
//! │               │ no                                                      │
//! │               ▼                                                         │
//! │  insert ── UNIQUE (title_id, author_id) ── violated ──► UniqueViolation│
//! │               │                            (racing second insert)      │
//! │               ▼                                                         │
//! │            Review                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//! The pre-check gives the common case a clean error; the constraint is
//! what actually holds under concurrency.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use yamdb_core::{NewReview, Review, ReviewPatch, UserId};

const REVIEW_SELECT: &str = r#"
    SELECT r.id, r.title_id, r.author_id, u.username AS author, r.text, r.score, r.pub_date
    FROM reviews r
    JOIN users u ON u.id = r.author_id
"#;

/// Repository for review database operations.
#[derive(Debug, Clone)]
pub struct ReviewRepository {
    pool: SqlitePool,
}

impl ReviewRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ReviewRepository { pool }
    }

    /// Reviews of a title, newest first.
    pub async fn list_for_title(&self, title_id: i64) -> DbResult<Vec<Review>> {
        let reviews = sqlx::query_as::<_, Review>(&format!(
            "{REVIEW_SELECT} WHERE r.title_id = ?1 ORDER BY r.pub_date DESC, r.id DESC"
        ))
        .bind(title_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(reviews)
    }

    pub async fn get_for_title(&self, title_id: i64, review_id: i64) -> DbResult<Option<Review>> {
        let review = sqlx::query_as::<_, Review>(&format!(
            "{REVIEW_SELECT} WHERE r.title_id = ?1 AND r.id = ?2"
        ))
        .bind(title_id)
        .bind(review_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(review)
    }

    /// True if `author_id` already reviewed `title_id`.
    pub async fn exists_for(&self, title_id: i64, author_id: UserId) -> DbResult<bool> {
        let exists: i64 = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM reviews WHERE title_id = ?1 AND author_id = ?2)",
        )
        .bind(title_id)
        .bind(author_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists != 0)
    }

    /// Inserts a review stamped with the current time.
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - the author already reviewed this
    ///   title (see [`DbError::is_duplicate_review`])
    pub async fn insert(&self, title_id: i64, author_id: UserId, review: &NewReview) -> DbResult<Review> {
        debug!(title_id = %title_id, author_id = %author_id, score = review.score, "Inserting review");

        let result = sqlx::query(
            r#"
            INSERT INTO reviews (title_id, author_id, text, score, pub_date)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(title_id)
        .bind(author_id)
        .bind(&review.text)
        .bind(review.score)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        let id = result.last_insert_rowid();
        self.get_for_title(title_id, id)
            .await?
            .ok_or_else(|| DbError::not_found("Review", id))
    }

    pub async fn update(&self, title_id: i64, review_id: i64, patch: &ReviewPatch) -> DbResult<Review> {
        debug!(title_id = %title_id, review_id = %review_id, "Updating review");

        let result = sqlx::query(
            r#"
            UPDATE reviews SET
                text = COALESCE(?3, text),
                score = COALESCE(?4, score)
            WHERE title_id = ?1 AND id = ?2
            "#,
        )
        .bind(title_id)
        .bind(review_id)
        .bind(patch.text.as_deref())
        .bind(patch.score)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Review", review_id));
        }

        self.get_for_title(title_id, review_id)
            .await?
            .ok_or_else(|| DbError::not_found("Review", review_id))
    }

    /// Deletes a review and its comments.
    pub async fn delete(&self, title_id: i64, review_id: i64) -> DbResult<()> {
        debug!(title_id = %title_id, review_id = %review_id, "Deleting review");

        let result = sqlx::query("DELETE FROM reviews WHERE title_id = ?1 AND id = ?2")
            .bind(title_id)
            .bind(review_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Review", review_id));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::{database, user};
    use crate::{Database, NewTitleRecord};
    use yamdb_core::Role;

    async fn title(db: &Database, name: &str) -> i64 {
        db.titles()
            .insert(&NewTitleRecord {
                name: name.to_string(),
                year: 2000,
                ..NewTitleRecord::default()
            })
            .await
            .unwrap()
            .id
    }

    fn review(text: &str, score: i64) -> NewReview {
        NewReview {
            text: text.to_string(),
            score,
        }
    }

    #[tokio::test]
    async fn test_insert_exposes_author_username() {
        let db = database().await;
        let title_id = title(&db, "Heat").await;
        let alice = user(&db, "alice", Role::User).await;

        let stored = db.reviews().insert(title_id, alice.id, &review("Great", 8)).await.unwrap();

        assert_eq!(stored.author, "alice");
        assert_eq!(stored.author_id, alice.id);
        assert_eq!(stored.title_id, title_id);
        assert!(db.reviews().exists_for(title_id, alice.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_second_review_violates_unique_constraint() {
        let db = database().await;
        let title_id = title(&db, "Heat").await;
        let alice = user(&db, "alice", Role::User).await;

        db.reviews().insert(title_id, alice.id, &review("Great", 8)).await.unwrap();
        let err = db
            .reviews()
            .insert(title_id, alice.id, &review("Changed my mind", 2))
            .await
            .unwrap_err();

        assert!(err.is_duplicate_review(), "unexpected error: {err:?}");
        assert_eq!(db.reviews().list_for_title(title_id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_same_author_may_review_other_titles() {
        let db = database().await;
        let heat = title(&db, "Heat").await;
        let alien = title(&db, "Alien").await;
        let alice = user(&db, "alice", Role::User).await;

        db.reviews().insert(heat, alice.id, &review("Great", 8)).await.unwrap();
        db.reviews().insert(alien, alice.id, &review("Scary", 9)).await.unwrap();
    }

    #[tokio::test]
    async fn test_score_out_of_range_rejected_by_store() {
        let db = database().await;
        let title_id = title(&db, "Heat").await;
        let alice = user(&db, "alice", Role::User).await;

        let err = db.reviews().insert(title_id, alice.id, &review("Off", 11)).await.unwrap_err();
        assert!(matches!(err, DbError::QueryFailed(_)));
    }

    #[tokio::test]
    async fn test_review_scoped_to_title() {
        let db = database().await;
        let heat = title(&db, "Heat").await;
        let alien = title(&db, "Alien").await;
        let alice = user(&db, "alice", Role::User).await;
        let stored = db.reviews().insert(heat, alice.id, &review("Great", 8)).await.unwrap();

        assert!(db.reviews().get_for_title(alien, stored.id).await.unwrap().is_none());
        assert!(matches!(
            db.reviews().delete(alien, stored.id).await,
            Err(DbError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_list_newest_first() {
        let db = database().await;
        let title_id = title(&db, "Heat").await;
        let alice = user(&db, "alice", Role::User).await;
        let bob = user(&db, "bob", Role::User).await;

        let first = db.reviews().insert(title_id, alice.id, &review("One", 5)).await.unwrap();
        let second = db.reviews().insert(title_id, bob.id, &review("Two", 6)).await.unwrap();

        let ids: Vec<_> = db
            .reviews()
            .list_for_title(title_id)
            .await
            .unwrap()
            .iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, vec![second.id, first.id]);
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let db = database().await;
        let title_id = title(&db, "Heat").await;
        let alice = user(&db, "alice", Role::User).await;
        let stored = db.reviews().insert(title_id, alice.id, &review("Great", 8)).await.unwrap();

        let updated = db
            .reviews()
            .update(title_id, stored.id, &ReviewPatch { score: Some(9), text: None })
            .await
            .unwrap();
        assert_eq!(updated.score, 9);
        assert_eq!(updated.text, "Great");
        assert_eq!(updated.pub_date, stored.pub_date);

        db.reviews().delete(title_id, stored.id).await.unwrap();
        assert!(!db.reviews().exists_for(title_id, alice.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_author_delete_cascades() {
        let db = database().await;
        let title_id = title(&db, "Heat").await;
        let alice = user(&db, "alice", Role::User).await;
        db.reviews().insert(title_id, alice.id, &review("Great", 8)).await.unwrap();

        db.users().delete(alice.id).await.unwrap();
        assert!(db.reviews().list_for_title(title_id).await.unwrap().is_empty());
    }
}
