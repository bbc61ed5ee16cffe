//! # User Repository
//!
//! Database operations for user accounts.
//!
//! ## Signup Get-or-Create
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  get_or_create_signup("alice", "alice@example.com")                     │
//! │                                                                         │
//! │  BEGIN                                                                  │
//! │    INSERT ... ON CONFLICT DO NOTHING   ← never creates a second row    │
//! │    SELECT WHERE username = ? AND email = ?                              │
//! │  COMMIT                                                                 │
//! │       │                                                                 │
//! │       ├── row found   → Ok(SignupOutcome { created: inserted? })        │
//! │       └── no row      → username or email belongs to someone else       │
//! │                         → DbError::UniqueViolation                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//! Two racing signups for the same identity both end up with the same row.

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use yamdb_core::{NewUser, User, UserId, UserPatch};

const USER_COLUMNS: &str =
    "id, username, email, first_name, last_name, bio, role, confirmation_version";

/// Result of a signup get-or-create.
#[derive(Debug, Clone)]
pub struct SignupOutcome {
    pub user: User,
    pub created: bool,
}

/// Repository for user database operations.
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    /// Creates a new UserRepository.
    pub fn new(pool: SqlitePool) -> Self {
        UserRepository { pool }
    }

    pub async fn get_by_id(&self, id: UserId) -> DbResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    pub async fn get_by_username(&self, username: &str) -> DbResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE username = ?1"
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    pub async fn get_by_email(&self, email: &str) -> DbResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = ?1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Lists users ordered by username, optionally filtered by a
    /// case-insensitive username substring.
    pub async fn list(&self, search: Option<&str>) -> DbResult<Vec<User>> {
        debug!(search = ?search, "Listing users");

        let users = sqlx::query_as::<_, User>(&format!(
            r#"
            SELECT {USER_COLUMNS} FROM users
            WHERE ?1 IS NULL OR instr(lower(username), lower(?1)) > 0
            ORDER BY username
            "#
        ))
        .bind(search)
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }

    /// Inserts a new user and returns the stored row.
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - username or email taken
    pub async fn insert(&self, user: &NewUser) -> DbResult<User> {
        debug!(username = %user.username, role = %user.role, "Inserting user");

        let result = sqlx::query(
            r#"
            INSERT INTO users (username, email, first_name, last_name, bio, role)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.bio)
        .bind(user.role)
        .execute(&self.pool)
        .await?;

        let id = result.last_insert_rowid();
        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("User", id))
    }

    /// Applies a partial update. `None` fields are left untouched.
    pub async fn update(&self, id: UserId, patch: &UserPatch) -> DbResult<User> {
        debug!(id = %id, "Updating user");

        let result = sqlx::query(
            r#"
            UPDATE users SET
                username = COALESCE(?2, username),
                email = COALESCE(?3, email),
                first_name = COALESCE(?4, first_name),
                last_name = COALESCE(?5, last_name),
                bio = COALESCE(?6, bio),
                role = COALESCE(?7, role)
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(patch.username.as_deref())
        .bind(patch.email.as_deref())
        .bind(patch.first_name.as_deref())
        .bind(patch.last_name.as_deref())
        .bind(patch.bio.as_deref())
        .bind(patch.role)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("User", id));
        }

        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("User", id))
    }

    /// Deletes a user. Their reviews and comments go with them.
    pub async fn delete(&self, id: UserId) -> DbResult<()> {
        debug!(id = %id, "Deleting user");

        let result = sqlx::query("DELETE FROM users WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("User", id));
        }

        Ok(())
    }

    /// Atomically gets or creates the account for a signup pair.
    ///
    /// ## Returns
    /// * `Ok(SignupOutcome)` - the account whose username AND email match
    /// * `Err(DbError::UniqueViolation)` - one of them belongs to another account
    pub async fn get_or_create_signup(&self, username: &str, email: &str) -> DbResult<SignupOutcome> {
        let mut tx = self.pool.begin().await?;

        let inserted = sqlx::query(
            "INSERT INTO users (username, email) VALUES (?1, ?2) ON CONFLICT DO NOTHING",
        )
        .bind(username)
        .bind(email)
        .execute(&mut *tx)
        .await?;

        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE username = ?1 AND email = ?2"
        ))
        .bind(username)
        .bind(email)
        .fetch_optional(&mut *tx)
        .await?;

        tx.commit().await?;

        match user {
            Some(user) => {
                let created = inserted.rows_affected() == 1;
                debug!(id = %user.id, created, "Signup account resolved");
                Ok(SignupOutcome { user, created })
            }
            None => Err(DbError::duplicate(
                "users.username/users.email",
                format!("{username} <{email}>"),
            )),
        }
    }

    /// Consumes the confirmation state `expected` that a code was checked
    /// against, invalidating every outstanding code of the user.
    ///
    /// The compare-and-swap makes redemption single-use under concurrency:
    /// of two requests that checked the same code, only one moves the
    /// version.
    ///
    /// ## Returns
    /// * `Ok(true)` - the version was `expected` and is now `expected + 1`
    /// * `Ok(false)` - the version already moved (or the user is gone)
    pub async fn bump_confirmation_version(&self, id: UserId, expected: i64) -> DbResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE users SET confirmation_version = confirmation_version + 1
            WHERE id = ?1 AND confirmation_version = ?2
            "#,
        )
        .bind(id)
        .bind(expected)
        .execute(&self.pool)
        .await?;

        let bumped = result.rows_affected() == 1;
        debug!(user_id = %id, expected, bumped, "Bump confirmation version");
        Ok(bumped)
    }
}
