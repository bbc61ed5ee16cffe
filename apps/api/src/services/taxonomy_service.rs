//! Category and genre service.
//!
//! Both are public to read and admin-only to change; one generic service
//! covers them.

use std::marker::PhantomData;
use std::sync::Arc;

use tracing::info;
use yamdb_core::validation::{validate_slug, validate_taxon_name};
use yamdb_core::{authorize, Action, Actor, Category, Genre, Resource, TaxonInput};
use yamdb_db::{TaxonomyRepository, TaxonomyTable};

use crate::error::{ApiError, ApiResult};
use crate::AppState;

/// A taxonomy entity together with the policy resource it maps to.
pub trait Taxon: TaxonomyTable {
    const RESOURCE: Resource;
}

impl Taxon for Category {
    const RESOURCE: Resource = Resource::Category;
}

impl Taxon for Genre {
    const RESOURCE: Resource = Resource::Genre;
}

pub type CategoryService = TaxonomyService<Category>;
pub type GenreService = TaxonomyService<Genre>;

/// Service over one taxonomy table, addressed by slug.
pub struct TaxonomyService<T> {
    state: Arc<AppState>,
    _taxon: PhantomData<fn() -> T>,
}

impl<T: Taxon> TaxonomyService<T> {
    pub fn new(state: Arc<AppState>) -> Self {
        TaxonomyService {
            state,
            _taxon: PhantomData,
        }
    }

    fn repo(&self) -> TaxonomyRepository<T> {
        TaxonomyRepository::new(self.state.db.pool().clone())
    }

    pub async fn list(&self, actor: &Actor, search: Option<&str>) -> ApiResult<Vec<T>> {
        authorize(actor, Action::List, &T::RESOURCE)?;
        Ok(self.repo().list(search).await?)
    }

    pub async fn retrieve(&self, actor: &Actor, slug: &str) -> ApiResult<T> {
        authorize(actor, Action::Retrieve, &T::RESOURCE)?;

        self.repo()
            .get_by_slug(slug)
            .await?
            .ok_or_else(|| ApiError::not_found(T::ENTITY, slug))
    }

    pub async fn create(&self, actor: &Actor, input: TaxonInput) -> ApiResult<T> {
        authorize(actor, Action::Create, &T::RESOURCE)?;
        validate(&input)?;

        let created = self.repo().insert(&input).await?;
        info!(entity = T::ENTITY, slug = %input.slug, "Created");
        Ok(created)
    }

    pub async fn update(&self, actor: &Actor, slug: &str, input: TaxonInput) -> ApiResult<T> {
        authorize(actor, Action::Update, &T::RESOURCE)?;
        validate(&input)?;

        let updated = self.repo().update(slug, &input).await?;
        info!(entity = T::ENTITY, slug = %slug, new_slug = %input.slug, "Updated");
        Ok(updated)
    }

    pub async fn destroy(&self, actor: &Actor, slug: &str) -> ApiResult<()> {
        authorize(actor, Action::Destroy, &T::RESOURCE)?;

        self.repo().delete_by_slug(slug).await?;
        info!(entity = T::ENTITY, slug = %slug, "Deleted");
        Ok(())
    }
}

fn validate(input: &TaxonInput) -> ApiResult<()> {
    validate_taxon_name(&input.name)?;
    validate_slug(&input.slug)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::services::test_support::{actor, state, user};
    use yamdb_core::Role;

    fn input(name: &str, slug: &str) -> TaxonInput {
        TaxonInput {
            name: name.to_string(),
            slug: slug.to_string(),
        }
    }

    #[tokio::test]
    async fn test_public_reads_admin_writes() {
        let (state, _rx) = state().await;
        let genres = GenreService::new(state.clone());
        let admin = actor(&user(&state, "root", Role::Admin).await);
        let moderator = actor(&user(&state, "mod", Role::Moderator).await);

        genres.create(&admin, input("Drama", "drama")).await.unwrap();

        assert_eq!(genres.list(&Actor::Anonymous, None).await.unwrap().len(), 1);
        assert_eq!(genres.retrieve(&Actor::Anonymous, "drama").await.unwrap().name, "Drama");

        assert_eq!(
            genres.create(&moderator, input("Rock", "rock")).await.unwrap_err().code,
            ErrorCode::Forbidden
        );
        assert_eq!(
            genres.destroy(&Actor::Anonymous, "drama").await.unwrap_err().code,
            ErrorCode::Unauthenticated
        );
    }

    #[tokio::test]
    async fn test_validation_and_conflicts() {
        let (state, _rx) = state().await;
        let categories = CategoryService::new(state.clone());
        let admin = actor(&user(&state, "root", Role::Admin).await);

        assert_eq!(
            categories.create(&admin, input("Film", "bad slug!")).await.unwrap_err().code,
            ErrorCode::Validation
        );

        categories.create(&admin, input("Film", "film")).await.unwrap();
        assert_eq!(
            categories.create(&admin, input("Film", "movie")).await.unwrap_err().code,
            ErrorCode::Conflict
        );
    }

    #[tokio::test]
    async fn test_update_and_destroy() {
        let (state, _rx) = state().await;
        let categories = CategoryService::new(state.clone());
        let admin = actor(&user(&state, "root", Role::Admin).await);
        categories.create(&admin, input("Films", "films")).await.unwrap();

        let updated = categories.update(&admin, "films", input("Film", "film")).await.unwrap();
        assert_eq!(updated.slug, "film");

        categories.destroy(&admin, "film").await.unwrap();
        assert_eq!(
            categories.retrieve(&admin, "film").await.unwrap_err().code,
            ErrorCode::NotFound
        );
    }
}
