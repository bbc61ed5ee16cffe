//! # Repository Module
//!
//! One repository per entity, each a thin wrapper around a pool clone.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Service                                                                │
//! │       │  db.reviews().exists_for(title_id, author_id)                  │
//! │       ▼                                                                 │
//! │  ReviewRepository                                                      │
//! │  ├── list_for_title / get_for_title                                    │
//! │  ├── exists_for                                                        │
//! │  ├── insert / update / delete                                          │
//! │       │  SQL                                                            │
//! │       ▼                                                                 │
//! │  SQLite                                                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Substring searches use `instr(lower(col), lower(?))` rather than `LIKE` so
//! user input containing `%` or `_` is matched literally.

pub mod comment;
pub mod review;
pub mod taxonomy;
pub mod title;
pub mod user;

#[cfg(test)]
pub(crate) mod test_support {
    use crate::{Database, DbConfig};
    use yamdb_core::{NewUser, Role, User};

    pub async fn database() -> Database {
        Database::new(DbConfig::in_memory())
            .await
            .expect("in-memory database")
    }

    pub async fn user(db: &Database, username: &str, role: Role) -> User {
        db.users()
            .insert(&NewUser {
                username: username.to_string(),
                email: format!("{username}@example.com"),
                role,
                ..NewUser::default()
            })
            .await
            .expect("insert user")
    }
}
