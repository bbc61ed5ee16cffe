//! Review service.
//!
//! ## Checks on modification
//! ```text
//! partial_update / destroy (actor, title, review)
//!   │
//!   ├── could the actor modify *their own* review?   no → 401
//!   ├── load review within title                     none → 404
//!   └── may the actor modify *this* review?          no → 403
//! ```
//! Anonymous callers learn nothing about which reviews exist; signed-in
//! callers get a 404 before a 403.

use std::sync::Arc;

use tracing::{info, warn};
use yamdb_core::validation::{validate_review_text, validate_score};
use yamdb_core::{authorize, ensure_first_review, Action, Actor, NewReview, Resource, Review, ReviewPatch};

use crate::error::{ApiError, ApiResult, ErrorCode};
use crate::AppState;

/// Review service implementation.
pub struct ReviewService {
    state: Arc<AppState>,
}

impl ReviewService {
    pub fn new(state: Arc<AppState>) -> Self {
        ReviewService { state }
    }

    /// Reviews of a title, newest first.
    pub async fn list(&self, actor: &Actor, title_id: i64) -> ApiResult<Vec<Review>> {
        authorize(actor, Action::List, &Resource::Review { author: None })?;
        self.ensure_title(title_id).await?;

        Ok(self.state.db.reviews().list_for_title(title_id).await?)
    }

    pub async fn retrieve(&self, actor: &Actor, title_id: i64, review_id: i64) -> ApiResult<Review> {
        authorize(actor, Action::Retrieve, &Resource::Review { author: None })?;
        self.find(title_id, review_id).await
    }

    /// Creates the actor's review of a title.
    ///
    /// ## Returns
    /// * `Err(DuplicateReview)` - the actor already reviewed this title,
    ///   including when a concurrent request won the race
    pub async fn create(&self, actor: &Actor, title_id: i64, review: NewReview) -> ApiResult<Review> {
        authorize(actor, Action::Create, &Resource::Review { author: None })?;
        let author_id = actor
            .user_id()
            .ok_or_else(|| ApiError::unauthenticated("Authentication required"))?;

        validate_review_text(&review.text)?;
        validate_score(review.score)?;
        self.ensure_title(title_id).await?;

        let reviews = self.state.db.reviews();
        ensure_first_review(title_id, reviews.exists_for(title_id, author_id).await?)?;

        let created = reviews.insert(title_id, author_id, &review).await.map_err(|e| {
            let err = ApiError::from(e);
            if err.code == ErrorCode::DuplicateReview {
                warn!(title_id = %title_id, author_id = %author_id, "Concurrent duplicate review rejected");
            }
            err
        })?;

        info!(
            review_id = %created.id,
            title_id = %title_id,
            author_id = %author_id,
            score = created.score,
            "Review created"
        );
        Ok(created)
    }

    pub async fn partial_update(
        &self,
        actor: &Actor,
        title_id: i64,
        review_id: i64,
        patch: ReviewPatch,
    ) -> ApiResult<Review> {
        let review = self.find_for_modification(actor, Action::PartialUpdate, title_id, review_id).await?;

        if let Some(text) = &patch.text {
            validate_review_text(text)?;
        }
        if let Some(score) = patch.score {
            validate_score(score)?;
        }

        let updated = self.state.db.reviews().update(title_id, review.id, &patch).await?;
        info!(review_id = %review.id, by = ?actor.user_id(), "Review updated");
        Ok(updated)
    }

    /// Deletes a review and its comments.
    pub async fn destroy(&self, actor: &Actor, title_id: i64, review_id: i64) -> ApiResult<()> {
        let review = self.find_for_modification(actor, Action::Destroy, title_id, review_id).await?;

        self.state.db.reviews().delete(title_id, review.id).await?;
        info!(review_id = %review.id, by = ?actor.user_id(), "Review deleted");
        Ok(())
    }

    async fn find_for_modification(
        &self,
        actor: &Actor,
        action: Action,
        title_id: i64,
        review_id: i64,
    ) -> ApiResult<Review> {
        authorize(actor, action, &Resource::Review { author: actor.user_id() })?;

        let review = self.find(title_id, review_id).await?;
        authorize(actor, action, &Resource::Review { author: Some(review.author_id) })?;
        Ok(review)
    }

    async fn find(&self, title_id: i64, review_id: i64) -> ApiResult<Review> {
        self.ensure_title(title_id).await?;

        self.state
            .db
            .reviews()
            .get_for_title(title_id, review_id)
            .await?
            .ok_or_else(|| ApiError::not_found("Review", review_id))
    }

    async fn ensure_title(&self, title_id: i64) -> ApiResult<()> {
        match self.state.db.titles().get_by_id(title_id).await? {
            Some(_) => Ok(()),
            None => Err(ApiError::not_found("Title", title_id)),
        }
    }
}
