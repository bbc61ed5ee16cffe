//! # Taxonomy Repository
//!
//! Categories and genres share one shape (`id`, `name`, `slug`) and one set
//! of operations, so a single generic repository serves both tables.
//!
//! ```text
//! TaxonomyRepository<Category>  ──►  categories
//! TaxonomyRepository<Genre>     ──►  genres
//! ```
//!
//! Deleting a category sets `titles.category_id` to NULL; deleting a genre
//! drops its `title_genres` links. Both are schema rules.

use std::marker::PhantomData;

use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use yamdb_core::{Category, Genre, TaxonInput};

/// A table holding `id, name, slug` rows.
pub trait TaxonomyTable: for<'r> FromRow<'r, SqliteRow> + Send + Unpin + 'static {
    /// Table name.
    const TABLE: &'static str;
    /// Entity name used in errors and logs.
    const ENTITY: &'static str;
}

impl TaxonomyTable for Category {
    const TABLE: &'static str = "categories";
    const ENTITY: &'static str = "Category";
}

impl TaxonomyTable for Genre {
    const TABLE: &'static str = "genres";
    const ENTITY: &'static str = "Genre";
}

pub type CategoryRepository = TaxonomyRepository<Category>;
pub type GenreRepository = TaxonomyRepository<Genre>;

/// Repository for category or genre rows.
#[derive(Debug)]
pub struct TaxonomyRepository<T> {
    pool: SqlitePool,
    _table: PhantomData<fn() -> T>,
}

impl<T> Clone for TaxonomyRepository<T> {
    fn clone(&self) -> Self {
        TaxonomyRepository {
            pool: self.pool.clone(),
            _table: PhantomData,
        }
    }
}

impl<T: TaxonomyTable> TaxonomyRepository<T> {
    pub fn new(pool: SqlitePool) -> Self {
        TaxonomyRepository {
            pool,
            _table: PhantomData,
        }
    }

    /// Lists rows ordered by name, optionally filtered by a case-insensitive
    /// name substring.
    pub async fn list(&self, search: Option<&str>) -> DbResult<Vec<T>> {
        debug!(table = T::TABLE, search = ?search, "Listing taxonomy");

        let rows = sqlx::query_as::<_, T>(&format!(
            r#"
            SELECT id, name, slug FROM {}
            WHERE ?1 IS NULL OR instr(lower(name), lower(?1)) > 0
            ORDER BY name
            "#,
            T::TABLE
        ))
        .bind(search)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    pub async fn get_by_id(&self, id: i64) -> DbResult<Option<T>> {
        let row = sqlx::query_as::<_, T>(&format!(
            "SELECT id, name, slug FROM {} WHERE id = ?1",
            T::TABLE
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    pub async fn get_by_slug(&self, slug: &str) -> DbResult<Option<T>> {
        let row = sqlx::query_as::<_, T>(&format!(
            "SELECT id, name, slug FROM {} WHERE slug = ?1",
            T::TABLE
        ))
        .bind(slug)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    /// Inserts a row.
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - name or slug taken
    pub async fn insert(&self, input: &TaxonInput) -> DbResult<T> {
        debug!(table = T::TABLE, slug = %input.slug, "Inserting taxon");

        let result = sqlx::query(&format!(
            "INSERT INTO {} (name, slug) VALUES (?1, ?2)",
            T::TABLE
        ))
        .bind(&input.name)
        .bind(&input.slug)
        .execute(&self.pool)
        .await?;

        let id = result.last_insert_rowid();
        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found(T::ENTITY, id))
    }

    /// Replaces name and slug of the row currently at `slug`.
    pub async fn update(&self, slug: &str, input: &TaxonInput) -> DbResult<T> {
        debug!(table = T::TABLE, slug = %slug, new_slug = %input.slug, "Updating taxon");

        let result = sqlx::query(&format!(
            "UPDATE {} SET name = ?2, slug = ?3 WHERE slug = ?1",
            T::TABLE
        ))
        .bind(slug)
        .bind(&input.name)
        .bind(&input.slug)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found(T::ENTITY, slug));
        }

        self.get_by_slug(&input.slug)
            .await?
            .ok_or_else(|| DbError::not_found(T::ENTITY, &input.slug))
    }

    pub async fn delete_by_slug(&self, slug: &str) -> DbResult<()> {
        debug!(table = T::TABLE, slug = %slug, "Deleting taxon");

        let result = sqlx::query(&format!("DELETE FROM {} WHERE slug = ?1", T::TABLE))
            .bind(slug)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found(T::ENTITY, slug));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::database;

    fn taxon(name: &str, slug: &str) -> TaxonInput {
        TaxonInput {
            name: name.to_string(),
            slug: slug.to_string(),
        }
    }

    #[tokio::test]
    async fn test_insert_and_get_by_slug() {
        let db = database().await;
        let film = db.categories().insert(&taxon("Film", "film")).await.unwrap();

        assert_eq!(film.slug, "film");
        assert_eq!(db.categories().get_by_slug("film").await.unwrap(), Some(film));
        assert!(db.categories().get_by_slug("book").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_tables_are_independent() {
        let db = database().await;
        db.categories().insert(&taxon("Drama", "drama")).await.unwrap();

        // Same slug in the other table is fine.
        db.genres().insert(&taxon("Drama", "drama")).await.unwrap();
        assert_eq!(db.genres().list(None).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_slug_rejected() {
        let db = database().await;
        db.genres().insert(&taxon("Rock", "rock")).await.unwrap();

        let err = db.genres().insert(&taxon("Rock music", "rock")).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { ref field, .. } if field == "genres.slug"));
    }

    #[tokio::test]
    async fn test_search_and_order() {
        let db = database().await;
        db.genres().insert(&taxon("Thriller", "thriller")).await.unwrap();
        db.genres().insert(&taxon("Comedy", "comedy")).await.unwrap();
        db.genres().insert(&taxon("Dark comedy", "dark-comedy")).await.unwrap();

        let all = db.genres().list(None).await.unwrap();
        let names: Vec<_> = all.iter().map(|g| g.name.as_str()).collect();
        assert_eq!(names, vec!["Comedy", "Dark comedy", "Thriller"]);

        let found = db.genres().list(Some("COMEDY")).await.unwrap();
        assert_eq!(found.len(), 2);
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let db = database().await;
        db.categories().insert(&taxon("Films", "films")).await.unwrap();

        let updated = db
            .categories()
            .update("films", &taxon("Film", "film"))
            .await
            .unwrap();
        assert_eq!(updated.name, "Film");
        assert!(db.categories().get_by_slug("films").await.unwrap().is_none());

        db.categories().delete_by_slug("film").await.unwrap();
        assert!(matches!(
            db.categories().delete_by_slug("film").await,
            Err(DbError::NotFound { .. })
        ));
    }
}
