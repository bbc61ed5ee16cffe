//! # yamdb-db: Entity Store for YaMDb
//!
//! This crate persists users, categories, genres, titles, reviews and
//! comments in SQLite via sqlx, and enforces the store-level constraints the
//! domain relies on.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          YaMDb Data Flow                                │
//! │                                                                         │
//! │  yamdb-api service (e.g. ReviewService::create)                        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     yamdb-db (THIS CRATE)                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │  user, title  │    │  (embedded)  │  │   │
//! │  │   │               │    │  taxonomy     │    │              │  │   │
//! │  │   │ SqlitePool    │◄───│  review       │    │ 001_initial  │  │   │
//! │  │   │               │    │  comment      │    │              │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite (UNIQUE / CHECK / FOREIGN KEY ... ON DELETE)                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use yamdb_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("yamdb.db")).await?;
//! let aggregate = db.titles().score_aggregate(title_id).await?;
//! let rating = aggregate.rating();
//! ```

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

pub use repository::comment::CommentRepository;
pub use repository::review::ReviewRepository;
pub use repository::taxonomy::{CategoryRepository, GenreRepository, TaxonomyRepository, TaxonomyTable};
pub use repository::title::{NewTitleRecord, TitleChanges, TitleRepository};
pub use repository::user::{SignupOutcome, UserRepository};
