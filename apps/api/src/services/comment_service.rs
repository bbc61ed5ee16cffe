//! Comment service.
//!
//! Comments are addressed as `(title, review, comment)`. The review must
//! belong to the title; otherwise the whole path is not found.

use std::sync::Arc;

use tracing::info;
use yamdb_core::validation::validate_comment_text;
use yamdb_core::{authorize, Action, Actor, Comment, CommentPatch, NewComment, Resource, Review};

use crate::error::{ApiError, ApiResult};
use crate::AppState;

/// Comment service implementation.
pub struct CommentService {
    state: Arc<AppState>,
}

impl CommentService {
    pub fn new(state: Arc<AppState>) -> Self {
        CommentService { state }
    }

    pub async fn list(&self, actor: &Actor, title_id: i64, review_id: i64) -> ApiResult<Vec<Comment>> {
        authorize(actor, Action::List, &Resource::Comment { author: None })?;
        let review = self.review(title_id, review_id).await?;

        Ok(self.state.db.comments().list_for_review(review.id).await?)
    }

    pub async fn retrieve(
        &self,
        actor: &Actor,
        title_id: i64,
        review_id: i64,
        comment_id: i64,
    ) -> ApiResult<Comment> {
        authorize(actor, Action::Retrieve, &Resource::Comment { author: None })?;
        self.find(title_id, review_id, comment_id).await
    }

    pub async fn create(
        &self,
        actor: &Actor,
        title_id: i64,
        review_id: i64,
        comment: NewComment,
    ) -> ApiResult<Comment> {
        authorize(actor, Action::Create, &Resource::Comment { author: None })?;
        let author_id = actor
            .user_id()
            .ok_or_else(|| ApiError::unauthenticated("Authentication required"))?;

        validate_comment_text(&comment.text)?;
        let review = self.review(title_id, review_id).await?;

        let created = self.state.db.comments().insert(review.id, author_id, &comment).await?;
        info!(comment_id = %created.id, review_id = %review.id, author_id = %author_id, "Comment created");
        Ok(created)
    }

    pub async fn partial_update(
        &self,
        actor: &Actor,
        title_id: i64,
        review_id: i64,
        comment_id: i64,
        patch: CommentPatch,
    ) -> ApiResult<Comment> {
        authorize(actor, Action::PartialUpdate, &Resource::Comment { author: actor.user_id() })?;
        let comment = self.find(title_id, review_id, comment_id).await?;
        authorize(actor, Action::PartialUpdate, &Resource::Comment { author: Some(comment.author_id) })?;

        if let Some(text) = &patch.text {
            validate_comment_text(text)?;
        }

        let updated = self
            .state
            .db
            .comments()
            .update(comment.review_id, comment.id, &patch)
            .await?;
        info!(comment_id = %comment.id, by = ?actor.user_id(), "Comment updated");
        Ok(updated)
    }

    pub async fn destroy(&self, actor: &Actor, title_id: i64, review_id: i64, comment_id: i64) -> ApiResult<()> {
        authorize(actor, Action::Destroy, &Resource::Comment { author: actor.user_id() })?;
        let comment = self.find(title_id, review_id, comment_id).await?;
        authorize(actor, Action::Destroy, &Resource::Comment { author: Some(comment.author_id) })?;

        self.state.db.comments().delete(comment.review_id, comment.id).await?;
        info!(comment_id = %comment.id, by = ?actor.user_id(), "Comment deleted");
        Ok(())
    }

    async fn find(&self, title_id: i64, review_id: i64, comment_id: i64) -> ApiResult<Comment> {
        let review = self.review(title_id, review_id).await?;

        self.state
            .db
            .comments()
            .get_for_review(review.id, comment_id)
            .await?
            .ok_or_else(|| ApiError::not_found("Comment", comment_id))
    }

    async fn review(&self, title_id: i64, review_id: i64) -> ApiResult<Review> {
        self.state
            .db
            .reviews()
            .get_for_title(title_id, review_id)
            .await?
            .ok_or_else(|| ApiError::not_found("Review", review_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::services::test_support::{actor, state, user};
    use crate::services::ReviewService;
    use yamdb_core::{NewReview, Role};
    use yamdb_db::NewTitleRecord;

    struct Fixture {
        state: Arc<AppState>,
        title_id: i64,
        review_id: i64,
        author: Actor,
        other: Actor,
        moderator: Actor,
    }

    async fn fixture() -> Fixture {
        let (state, _rx) = state().await;
        let title_id = state
            .db
            .titles()
            .insert(&NewTitleRecord { name: "X".into(), year: 2000, ..NewTitleRecord::default() })
            .await
            .unwrap()
            .id;
        let author = actor(&user(&state, "a", Role::User).await);
        let other = actor(&user(&state, "c", Role::User).await);
        let moderator = actor(&user(&state, "mod", Role::Moderator).await);
        let review_id = ReviewService::new(state.clone())
            .create(&author, title_id, NewReview { text: "Good".into(), score: 7 })
            .await
            .unwrap()
            .id;

        Fixture { state, title_id, review_id, author, other, moderator }
    }

    fn text(text: &str) -> NewComment {
        NewComment { text: text.into() }
    }

    #[tokio::test]
    async fn test_comment_permissions() {
        let f = fixture().await;
        let comments = CommentService::new(f.state.clone());

        let created = comments.create(&f.other, f.title_id, f.review_id, text("Agreed")).await.unwrap();
        assert_eq!(created.author, "c");

        assert_eq!(
            comments
                .create(&Actor::Anonymous, f.title_id, f.review_id, text("Hi"))
                .await
                .unwrap_err()
                .code,
            ErrorCode::Unauthenticated
        );

        // The review's author does not own comments on it.
        let err = comments
            .destroy(&f.author, f.title_id, f.review_id, created.id)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::Forbidden);

        let edited = comments
            .partial_update(
                &f.other,
                f.title_id,
                f.review_id,
                created.id,
                CommentPatch { text: Some("Strongly agreed".into()) },
            )
            .await
            .unwrap();
        assert_eq!(edited.text, "Strongly agreed");

        comments.destroy(&f.moderator, f.title_id, f.review_id, created.id).await.unwrap();
        assert!(comments
            .list(&Actor::Anonymous, f.title_id, f.review_id)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_review_must_belong_to_title() {
        let f = fixture().await;
        let comments = CommentService::new(f.state.clone());
        let created = comments.create(&f.other, f.title_id, f.review_id, text("Agreed")).await.unwrap();

        let other_title = f
            .state
            .db
            .titles()
            .insert(&NewTitleRecord { name: "Y".into(), year: 2000, ..NewTitleRecord::default() })
            .await
            .unwrap()
            .id;

        assert_eq!(
            comments.list(&f.other, other_title, f.review_id).await.unwrap_err().code,
            ErrorCode::NotFound
        );
        assert_eq!(
            comments
                .retrieve(&f.other, other_title, f.review_id, created.id)
                .await
                .unwrap_err()
                .code,
            ErrorCode::NotFound
        );
        assert_eq!(
            comments
                .create(&f.other, other_title, f.review_id, text("Lost"))
                .await
                .unwrap_err()
                .code,
            ErrorCode::NotFound
        );
    }

    #[tokio::test]
    async fn test_comment_text_limit() {
        let f = fixture().await;
        let comments = CommentService::new(f.state.clone());

        let err = comments
            .create(&f.other, f.title_id, f.review_id, text(&"x".repeat(1001)))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::Validation);

        let err = comments
            .create(&f.other, f.title_id, f.review_id, text("   "))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::Validation);
    }
}
