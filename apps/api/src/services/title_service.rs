//! Title service.
//!
//! Every read assembles a [`TitleView`]:
//!
//! ```text
//! titles row ──┬── genres_for(id)          → genre: [Genre]
//!              ├── categories.get_by_id    → category: Option<Category>
//!              └── score_aggregate(id)     → rating: Option<f64>
//! ```
//!
//! The rating is recomputed on each read, never stored.

use std::sync::Arc;

use chrono::{Datelike, Utc};
use tracing::info;
use yamdb_core::validation::{validate_title_name, validate_year};
use yamdb_core::{
    authorize, Action, Actor, NewTitle, Resource, Title, TitleFilter, TitlePatch, TitleView,
    ValidationError,
};
use yamdb_db::{NewTitleRecord, TitleChanges};

use crate::error::{ApiError, ApiResult};
use crate::AppState;

/// Title service implementation.
pub struct TitleService {
    state: Arc<AppState>,
}

impl TitleService {
    pub fn new(state: Arc<AppState>) -> Self {
        TitleService { state }
    }

    pub async fn list(&self, actor: &Actor, filter: &TitleFilter) -> ApiResult<Vec<TitleView>> {
        authorize(actor, Action::List, &Resource::Title)?;

        let titles = self.state.db.titles().list(filter).await?;

        let mut views = Vec::with_capacity(titles.len());
        for title in titles {
            views.push(self.view(title).await?);
        }
        Ok(views)
    }

    pub async fn retrieve(&self, actor: &Actor, id: i64) -> ApiResult<TitleView> {
        authorize(actor, Action::Retrieve, &Resource::Title)?;

        let title = self.find(id).await?;
        self.view(title).await
    }

    pub async fn create(&self, actor: &Actor, new_title: NewTitle) -> ApiResult<TitleView> {
        authorize(actor, Action::Create, &Resource::Title)?;

        validate_title_name(&new_title.name)?;
        validate_year(new_title.year, current_year())?;

        let category_id = match &new_title.category {
            Some(slug) => Some(self.category_id(slug).await?),
            None => None,
        };
        let genre_ids = self.genre_ids(&new_title.genre).await?;

        let title = self
            .state
            .db
            .titles()
            .insert(&NewTitleRecord {
                name: new_title.name,
                year: new_title.year,
                description: new_title.description,
                category_id,
                genre_ids,
            })
            .await?;

        info!(title_id = %title.id, name = %title.name, "Title created");
        self.view(title).await
    }

    pub async fn partial_update(&self, actor: &Actor, id: i64, patch: TitlePatch) -> ApiResult<TitleView> {
        authorize(actor, Action::PartialUpdate, &Resource::Title)?;

        self.find(id).await?;

        if let Some(name) = &patch.name {
            validate_title_name(name)?;
        }
        if let Some(year) = patch.year {
            validate_year(year, current_year())?;
        }

        let category_id = match &patch.category {
            Some(Some(slug)) => Some(Some(self.category_id(slug).await?)),
            Some(None) => Some(None),
            None => None,
        };
        let genre_ids = match &patch.genre {
            Some(slugs) => Some(self.genre_ids(slugs).await?),
            None => None,
        };

        let title = self
            .state
            .db
            .titles()
            .update(
                id,
                &TitleChanges {
                    name: patch.name,
                    year: patch.year,
                    description: patch.description,
                    category_id,
                    genre_ids,
                },
            )
            .await?;

        info!(title_id = %id, "Title updated");
        self.view(title).await
    }

    /// Deletes the title with its reviews and their comments.
    pub async fn destroy(&self, actor: &Actor, id: i64) -> ApiResult<()> {
        authorize(actor, Action::Destroy, &Resource::Title)?;

        self.state.db.titles().delete(id).await?;
        info!(title_id = %id, "Title deleted");
        Ok(())
    }

    async fn find(&self, id: i64) -> ApiResult<Title> {
        self.state
            .db
            .titles()
            .get_by_id(id)
            .await?
            .ok_or_else(|| ApiError::not_found("Title", id))
    }

    async fn view(&self, title: Title) -> ApiResult<TitleView> {
        let db = &self.state.db;

        let genre = db.titles().genres_for(title.id).await?;
        let category = match title.category_id {
            Some(category_id) => db.categories().get_by_id(category_id).await?,
            None => None,
        };
        let rating = db.titles().score_aggregate(title.id).await?.rating();

        Ok(TitleView {
            id: title.id,
            name: title.name,
            year: title.year,
            rating,
            description: title.description,
            genre,
            category,
        })
    }

    async fn category_id(&self, slug: &str) -> ApiResult<i64> {
        self.state
            .db
            .categories()
            .get_by_slug(slug)
            .await?
            .map(|category| category.id)
            .ok_or_else(|| unknown_slug("category", slug))
    }

    async fn genre_ids(&self, slugs: &[String]) -> ApiResult<Vec<i64>> {
        let genres = self.state.db.genres();

        let mut ids = Vec::with_capacity(slugs.len());
        for slug in slugs {
            let genre = genres
                .get_by_slug(slug)
                .await?
                .ok_or_else(|| unknown_slug("genre", slug))?;
            ids.push(genre.id);
        }
        Ok(ids)
    }
}

fn current_year() -> i32 {
    Utc::now().year()
}

/// An unknown slug in the request body is a validation failure, not a 404.
fn unknown_slug(field: &str, slug: &str) -> ApiError {
    ValidationError::InvalidFormat {
        field: field.to_string(),
        reason: format!("no {field} with slug '{slug}'"),
    }
    .into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::services::test_support::{actor, state, user};
    use crate::services::{CategoryService, GenreService};
    use yamdb_core::{NewReview, Role, TaxonInput};

    async fn seed_taxonomy(state: &Arc<AppState>, admin: &Actor) {
        CategoryService::new(state.clone())
            .create(admin, TaxonInput { name: "Film".into(), slug: "film".into() })
            .await
            .unwrap();
        let genres = GenreService::new(state.clone());
        genres
            .create(admin, TaxonInput { name: "Crime".into(), slug: "crime".into() })
            .await
            .unwrap();
        genres
            .create(admin, TaxonInput { name: "Drama".into(), slug: "drama".into() })
            .await
            .unwrap();
    }

    fn godfather() -> NewTitle {
        NewTitle {
            name: "The Godfather".into(),
            year: 1972,
            description: "An offer you can't refuse".into(),
            genre: vec!["crime".into(), "drama".into()],
            category: Some("film".into()),
        }
    }

    #[tokio::test]
    async fn test_create_nests_taxonomy() {
        let (state, _rx) = state().await;
        let admin = actor(&user(&state, "root", Role::Admin).await);
        seed_taxonomy(&state, &admin).await;
        let titles = TitleService::new(state.clone());

        let view = titles.create(&admin, godfather()).await.unwrap();

        assert_eq!(view.rating, None);
        assert_eq!(view.category.as_ref().map(|c| c.slug.as_str()), Some("film"));
        assert_eq!(view.genre.len(), 2);
        assert_eq!(titles.retrieve(&Actor::Anonymous, view.id).await.unwrap(), view);
    }

    #[tokio::test]
    async fn test_only_admin_manages_titles() {
        let (state, _rx) = state().await;
        let admin = actor(&user(&state, "root", Role::Admin).await);
        let moderator = actor(&user(&state, "mod", Role::Moderator).await);
        seed_taxonomy(&state, &admin).await;
        let titles = TitleService::new(state.clone());

        assert_eq!(
            titles.create(&moderator, godfather()).await.unwrap_err().code,
            ErrorCode::Forbidden
        );
        assert_eq!(
            titles.create(&Actor::Anonymous, godfather()).await.unwrap_err().code,
            ErrorCode::Unauthenticated
        );

        let view = titles.create(&admin, godfather()).await.unwrap();
        assert_eq!(
            titles.destroy(&moderator, view.id).await.unwrap_err().code,
            ErrorCode::Forbidden
        );
    }

    #[tokio::test]
    async fn test_create_validation() {
        let (state, _rx) = state().await;
        let admin = actor(&user(&state, "root", Role::Admin).await);
        seed_taxonomy(&state, &admin).await;
        let titles = TitleService::new(state.clone());

        let future = NewTitle { year: current_year() + 1, ..godfather() };
        assert_eq!(titles.create(&admin, future).await.unwrap_err().code, ErrorCode::Validation);

        let unknown = NewTitle { genre: vec!["western".into()], ..godfather() };
        assert_eq!(titles.create(&admin, unknown).await.unwrap_err().code, ErrorCode::Validation);
    }

    #[tokio::test]
    async fn test_partial_update_relinks() {
        let (state, _rx) = state().await;
        let admin = actor(&user(&state, "root", Role::Admin).await);
        seed_taxonomy(&state, &admin).await;
        let titles = TitleService::new(state.clone());
        let view = titles.create(&admin, godfather()).await.unwrap();

        let updated = titles
            .partial_update(
                &admin,
                view.id,
                TitlePatch { genre: Some(vec!["drama".into()]), ..TitlePatch::default() },
            )
            .await
            .unwrap();

        assert_eq!(updated.name, "The Godfather");
        assert_eq!(updated.genre.len(), 1);
        assert_eq!(updated.genre[0].slug, "drama");
        assert!(updated.category.is_some());

        let cleared = titles
            .partial_update(&admin, view.id, TitlePatch { category: Some(None), ..TitlePatch::default() })
            .await
            .unwrap();
        assert_eq!(cleared.category, None);
        assert_eq!(cleared.genre.len(), 1);

        let err = titles
            .partial_update(
                &admin,
                view.id,
                TitlePatch { category: Some(Some("nope".into())), ..TitlePatch::default() },
            )
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::Validation);

        assert_eq!(
            titles
                .partial_update(&admin, 999, TitlePatch::default())
                .await
                .unwrap_err()
                .code,
            ErrorCode::NotFound
        );
    }

    #[tokio::test]
    async fn test_list_filters_and_rating() {
        let (state, _rx) = state().await;
        let admin = actor(&user(&state, "root", Role::Admin).await);
        seed_taxonomy(&state, &admin).await;
        let titles = TitleService::new(state.clone());

        let godfather = titles.create(&admin, godfather()).await.unwrap();
        titles
            .create(
                &admin,
                NewTitle { name: "Heat".into(), year: 1995, genre: vec!["crime".into()], ..NewTitle::default() },
            )
            .await
            .unwrap();

        let alice = user(&state, "alice", Role::User).await;
        state
            .db
            .reviews()
            .insert(godfather.id, alice.id, &NewReview { text: "Classic".into(), score: 10 })
            .await
            .unwrap();

        let crime = titles
            .list(&Actor::Anonymous, &TitleFilter { genre: Some("crime".into()), ..TitleFilter::default() })
            .await
            .unwrap();
        assert_eq!(crime.len(), 2);

        let films = titles
            .list(&Actor::Anonymous, &TitleFilter { category: Some("film".into()), ..TitleFilter::default() })
            .await
            .unwrap();
        assert_eq!(films.len(), 1);
        assert_eq!(films[0].rating, Some(10.0));
    }

    #[tokio::test]
    async fn test_category_delete_keeps_title() {
        let (state, _rx) = state().await;
        let admin = actor(&user(&state, "root", Role::Admin).await);
        seed_taxonomy(&state, &admin).await;
        let titles = TitleService::new(state.clone());
        let view = titles.create(&admin, godfather()).await.unwrap();

        CategoryService::new(state.clone()).destroy(&admin, "film").await.unwrap();

        let reloaded = titles.retrieve(&admin, view.id).await.unwrap();
        assert_eq!(reloaded.category, None);
    }
}
