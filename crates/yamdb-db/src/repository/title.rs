//! # Title Repository
//!
//! Titles, their genre links and the score aggregate behind the rating.
//!
//! ## Filtering
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  TitleFilter                     SQL predicate                         │
//! │  ───────────                     ─────────────                         │
//! │  name     = "godf"          →    instr(lower(t.name), lower(?)) > 0    │
//! │  year     = 1972            →    t.year = ?                            │
//! │  genre    = "crime"         →    EXISTS (title_genres ⋈ genres.slug)   │
//! │  category = "film"          →    categories.slug = ?                   │
//! │                                                                         │
//! │  Unset fields bind NULL and match everything.                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Slug resolution happens in the service layer; this repository works with
//! category and genre ids only.

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use yamdb_core::{Genre, ScoreAggregate, Title, TitleFilter};

const TITLE_COLUMNS: &str = "t.id, t.name, t.year, t.description, t.category_id";

/// A title ready to be stored, with category and genres already resolved.
#[derive(Debug, Clone, Default)]
pub struct NewTitleRecord {
    pub name: String,
    pub year: i32,
    pub description: String,
    pub category_id: Option<i64>,
    pub genre_ids: Vec<i64>,
}

/// Partial title update.
///
/// `category_id: Some(None)` clears the category; `genre_ids: Some(ids)`
/// replaces every genre link.
#[derive(Debug, Clone, Default)]
pub struct TitleChanges {
    pub name: Option<String>,
    pub year: Option<i32>,
    pub description: Option<String>,
    pub category_id: Option<Option<i64>>,
    pub genre_ids: Option<Vec<i64>>,
}

/// Repository for title database operations.
#[derive(Debug, Clone)]
pub struct TitleRepository {
    pool: SqlitePool,
}

impl TitleRepository {
    pub fn new(pool: SqlitePool) -> Self {
        TitleRepository { pool }
    }

    /// Lists titles matching `filter`, ordered by name.
    pub async fn list(&self, filter: &TitleFilter) -> DbResult<Vec<Title>> {
        debug!(filter = ?filter, "Listing titles");

        let titles = sqlx::query_as::<_, Title>(&format!(
            r#"
            SELECT {TITLE_COLUMNS}
            FROM titles t
            LEFT JOIN categories c ON c.id = t.category_id
            WHERE (?1 IS NULL OR instr(lower(t.name), lower(?1)) > 0)
              AND (?2 IS NULL OR t.year = ?2)
              AND (?3 IS NULL OR EXISTS (
                    SELECT 1 FROM title_genres tg
                    JOIN genres g ON g.id = tg.genre_id
                    WHERE tg.title_id = t.id AND g.slug = ?3))
              AND (?4 IS NULL OR c.slug = ?4)
            ORDER BY t.name, t.id
            "#
        ))
        .bind(filter.name.as_deref())
        .bind(filter.year)
        .bind(filter.genre.as_deref())
        .bind(filter.category.as_deref())
        .fetch_all(&self.pool)
        .await?;

        Ok(titles)
    }

    pub async fn get_by_id(&self, id: i64) -> DbResult<Option<Title>> {
        let title = sqlx::query_as::<_, Title>(&format!(
            "SELECT {TITLE_COLUMNS} FROM titles t WHERE t.id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(title)
    }

    /// Inserts a title and its genre links in one transaction.
    pub async fn insert(&self, record: &NewTitleRecord) -> DbResult<Title> {
        debug!(name = %record.name, genres = record.genre_ids.len(), "Inserting title");

        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            INSERT INTO titles (name, year, description, category_id)
            VALUES (?1, ?2, ?3, ?4)
            "#,
        )
        .bind(&record.name)
        .bind(record.year)
        .bind(&record.description)
        .bind(record.category_id)
        .execute(&mut *tx)
        .await?;

        let id = result.last_insert_rowid();

        for genre_id in &record.genre_ids {
            sqlx::query("INSERT OR IGNORE INTO title_genres (title_id, genre_id) VALUES (?1, ?2)")
                .bind(id)
                .bind(genre_id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;

        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Title", id))
    }

    /// Applies a partial update, relinking genres when asked to.
    pub async fn update(&self, id: i64, changes: &TitleChanges) -> DbResult<Title> {
        debug!(id = %id, "Updating title");

        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            UPDATE titles SET
                name = COALESCE(?2, name),
                year = COALESCE(?3, year),
                description = COALESCE(?4, description),
                category_id = CASE WHEN ?5 THEN ?6 ELSE category_id END
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(changes.name.as_deref())
        .bind(changes.year)
        .bind(changes.description.as_deref())
        .bind(changes.category_id.is_some())
        .bind(changes.category_id.flatten())
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Title", id));
        }

        if let Some(genre_ids) = &changes.genre_ids {
            sqlx::query("DELETE FROM title_genres WHERE title_id = ?1")
                .bind(id)
                .execute(&mut *tx)
                .await?;

            for genre_id in genre_ids {
                sqlx::query(
                    "INSERT OR IGNORE INTO title_genres (title_id, genre_id) VALUES (?1, ?2)",
                )
                .bind(id)
                .bind(genre_id)
                .execute(&mut *tx)
                .await?;
            }
        }

        tx.commit().await?;

        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Title", id))
    }

    /// Deletes a title; its reviews, their comments and its genre links go
    /// with it.
    pub async fn delete(&self, id: i64) -> DbResult<()> {
        debug!(id = %id, "Deleting title");

        let result = sqlx::query("DELETE FROM titles WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Title", id));
        }

        Ok(())
    }

    /// Sum and count of the title's review scores at this instant.
    pub async fn score_aggregate(&self, title_id: i64) -> DbResult<ScoreAggregate> {
        let (sum, count): (i64, i64) = sqlx::query_as(
            "SELECT COALESCE(SUM(score), 0), COUNT(score) FROM reviews WHERE title_id = ?1",
        )
        .bind(title_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(ScoreAggregate::new(sum, count))
    }

    /// Genres linked to the title, ordered by name.
    pub async fn genres_for(&self, title_id: i64) -> DbResult<Vec<Genre>> {
        let genres = sqlx::query_as::<_, Genre>(
            r#"
            SELECT g.id, g.name, g.slug
            FROM genres g
            JOIN title_genres tg ON tg.genre_id = g.id
            WHERE tg.title_id = ?1
            ORDER BY g.name
            "#,
        )
        .bind(title_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(genres)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::{database, user};
    use crate::Database;
    use yamdb_core::{NewReview, Role, TaxonInput};

    async fn taxonomy(db: &Database) -> (i64, i64, i64) {
        let film = db
            .categories()
            .insert(&TaxonInput { name: "Film".into(), slug: "film".into() })
            .await
            .unwrap();
        let crime = db
            .genres()
            .insert(&TaxonInput { name: "Crime".into(), slug: "crime".into() })
            .await
            .unwrap();
        let drama = db
            .genres()
            .insert(&TaxonInput { name: "Drama".into(), slug: "drama".into() })
            .await
            .unwrap();
        (film.id, crime.id, drama.id)
    }

    fn record(name: &str, year: i32, category_id: Option<i64>, genre_ids: Vec<i64>) -> NewTitleRecord {
        NewTitleRecord {
            name: name.to_string(),
            year,
            description: String::new(),
            category_id,
            genre_ids,
        }
    }

    #[tokio::test]
    async fn test_insert_links_genres() {
        let db = database().await;
        let (film, crime, drama) = taxonomy(&db).await;

        let title = db
            .titles()
            .insert(&record("The Godfather", 1972, Some(film), vec![drama, crime]))
            .await
            .unwrap();

        assert_eq!(title.category_id, Some(film));
        let genres = db.titles().genres_for(title.id).await.unwrap();
        let slugs: Vec<_> = genres.iter().map(|g| g.slug.as_str()).collect();
        assert_eq!(slugs, vec!["crime", "drama"]);
    }

    #[tokio::test]
    async fn test_list_filters() {
        let db = database().await;
        let (film, crime, drama) = taxonomy(&db).await;
        let titles = db.titles();

        titles.insert(&record("The Godfather", 1972, Some(film), vec![crime])).await.unwrap();
        titles.insert(&record("Godzilla", 1954, None, vec![drama])).await.unwrap();
        titles.insert(&record("Heat", 1995, Some(film), vec![crime, drama])).await.unwrap();

        let by_name = titles
            .list(&TitleFilter { name: Some("GOD".into()), ..TitleFilter::default() })
            .await
            .unwrap();
        let names: Vec<_> = by_name.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["Godzilla", "The Godfather"]);

        let by_year = titles
            .list(&TitleFilter { year: Some(1995), ..TitleFilter::default() })
            .await
            .unwrap();
        assert_eq!(by_year.len(), 1);

        let by_genre = titles
            .list(&TitleFilter { genre: Some("crime".into()), ..TitleFilter::default() })
            .await
            .unwrap();
        assert_eq!(by_genre.len(), 2);

        let by_category_and_genre = titles
            .list(&TitleFilter {
                genre: Some("drama".into()),
                category: Some("film".into()),
                ..TitleFilter::default()
            })
            .await
            .unwrap();
        assert_eq!(by_category_and_genre.len(), 1);
        assert_eq!(by_category_and_genre[0].name, "Heat");

        assert_eq!(titles.list(&TitleFilter::default()).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_update_relinks_and_clears_category() {
        let db = database().await;
        let (film, crime, drama) = taxonomy(&db).await;
        let title = db
            .titles()
            .insert(&record("Heat", 1995, Some(film), vec![crime]))
            .await
            .unwrap();

        let updated = db
            .titles()
            .update(
                title.id,
                &TitleChanges {
                    year: Some(1996),
                    category_id: Some(None),
                    genre_ids: Some(vec![drama]),
                    ..TitleChanges::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.year, 1996);
        assert_eq!(updated.name, "Heat");
        assert_eq!(updated.category_id, None);
        let genres = db.titles().genres_for(title.id).await.unwrap();
        assert_eq!(genres.len(), 1);
        assert_eq!(genres[0].slug, "drama");
    }

    #[tokio::test]
    async fn test_update_keeps_unspecified_links() {
        let db = database().await;
        let (film, crime, _) = taxonomy(&db).await;
        let title = db
            .titles()
            .insert(&record("Heat", 1995, Some(film), vec![crime]))
            .await
            .unwrap();

        let updated = db
            .titles()
            .update(title.id, &TitleChanges { name: Some("Heat (1995)".into()), ..TitleChanges::default() })
            .await
            .unwrap();

        assert_eq!(updated.category_id, Some(film));
        assert_eq!(db.titles().genres_for(title.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_category_delete_sets_null() {
        let db = database().await;
        let (film, _, _) = taxonomy(&db).await;
        let title = db.titles().insert(&record("Heat", 1995, Some(film), vec![])).await.unwrap();

        db.categories().delete_by_slug("film").await.unwrap();

        let reloaded = db.titles().get_by_id(title.id).await.unwrap().unwrap();
        assert_eq!(reloaded.category_id, None);
    }

    #[tokio::test]
    async fn test_score_aggregate_tracks_reviews() {
        let db = database().await;
        let title = db.titles().insert(&record("Heat", 1995, None, vec![])).await.unwrap();

        let empty = db.titles().score_aggregate(title.id).await.unwrap();
        assert_eq!(empty, ScoreAggregate::new(0, 0));
        assert_eq!(empty.rating(), None);

        let a = user(&db, "alice", Role::User).await;
        let b = user(&db, "bob", Role::User).await;
        db.reviews()
            .insert(title.id, a.id, &NewReview { text: "Great".into(), score: 8 })
            .await
            .unwrap();
        db.reviews()
            .insert(title.id, b.id, &NewReview { text: "Meh".into(), score: 4 })
            .await
            .unwrap();

        let aggregate = db.titles().score_aggregate(title.id).await.unwrap();
        assert_eq!(aggregate, ScoreAggregate::new(12, 2));
        assert_eq!(aggregate.rating(), Some(6.0));
    }

    #[tokio::test]
    async fn test_delete_cascades_reviews() {
        let db = database().await;
        let title = db.titles().insert(&record("Heat", 1995, None, vec![])).await.unwrap();
        let a = user(&db, "alice", Role::User).await;
        db.reviews()
            .insert(title.id, a.id, &NewReview { text: "Great".into(), score: 8 })
            .await
            .unwrap();

        db.titles().delete(title.id).await.unwrap();

        assert!(db.titles().get_by_id(title.id).await.unwrap().is_none());
        assert!(!db.reviews().exists_for(title.id, a.id).await.unwrap());
        assert!(matches!(db.titles().delete(title.id).await, Err(DbError::NotFound { .. })));
    }
}
