//! # Comment Repository
//!
//! Comments are addressed through their review, the same way reviews are
//! addressed through their title. Checking that the review belongs to the
//! requested title is the service's job.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use yamdb_core::{Comment, CommentPatch, NewComment, UserId};

const COMMENT_SELECT: &str = r#"
    SELECT c.id, c.review_id, c.author_id, u.username AS author, c.text, c.pub_date
    FROM comments c
    JOIN users u ON u.id = c.author_id
"#;

/// Repository for comment database operations.
#[derive(Debug, Clone)]
pub struct CommentRepository {
    pool: SqlitePool,
}

impl CommentRepository {
    pub fn new(pool: SqlitePool) -> Self {
        CommentRepository { pool }
    }

    /// Comments on a review, newest first.
    pub async fn list_for_review(&self, review_id: i64) -> DbResult<Vec<Comment>> {
        let comments = sqlx::query_as::<_, Comment>(&format!(
            "{COMMENT_SELECT} WHERE c.review_id = ?1 ORDER BY c.pub_date DESC, c.id DESC"
        ))
        .bind(review_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(comments)
    }

    pub async fn get_for_review(&self, review_id: i64, comment_id: i64) -> DbResult<Option<Comment>> {
        let comment = sqlx::query_as::<_, Comment>(&format!(
            "{COMMENT_SELECT} WHERE c.review_id = ?1 AND c.id = ?2"
        ))
        .bind(review_id)
        .bind(comment_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(comment)
    }

    pub async fn insert(&self, review_id: i64, author_id: UserId, comment: &NewComment) -> DbResult<Comment> {
        debug!(review_id = %review_id, author_id = %author_id, "Inserting comment");

        let result = sqlx::query(
            "INSERT INTO comments (review_id, author_id, text, pub_date) VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(review_id)
        .bind(author_id)
        .bind(&comment.text)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        let id = result.last_insert_rowid();
        self.get_for_review(review_id, id)
            .await?
            .ok_or_else(|| DbError::not_found("Comment", id))
    }

    pub async fn update(&self, review_id: i64, comment_id: i64, patch: &CommentPatch) -> DbResult<Comment> {
        debug!(review_id = %review_id, comment_id = %comment_id, "Updating comment");

        let result = sqlx::query(
            "UPDATE comments SET text = COALESCE(?3, text) WHERE review_id = ?1 AND id = ?2",
        )
        .bind(review_id)
        .bind(comment_id)
        .bind(patch.text.as_deref())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Comment", comment_id));
        }

        self.get_for_review(review_id, comment_id)
            .await?
            .ok_or_else(|| DbError::not_found("Comment", comment_id))
    }

    pub async fn delete(&self, review_id: i64, comment_id: i64) -> DbResult<()> {
        debug!(review_id = %review_id, comment_id = %comment_id, "Deleting comment");

        let result = sqlx::query("DELETE FROM comments WHERE review_id = ?1 AND id = ?2")
            .bind(review_id)
            .bind(comment_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Comment", comment_id));
        }

        Ok(())
    }
}
