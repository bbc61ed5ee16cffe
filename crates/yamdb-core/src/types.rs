//! # Domain Types
//!
//! Core domain types used throughout YaMDb.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │   Category      │   │     Title       │   │     Genre       │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  name, slug     │◄──│  category (0-1) │──►│  name, slug     │       │
//! │  └─────────────────┘   │  genres (0-n)   │   └─────────────────┘       │
//! │                        │  year           │                              │
//! │                        └───────┬─────────┘                              │
//! │                                │ cascade                                │
//! │  ┌─────────────────┐   ┌───────▼─────────┐   ┌─────────────────┐       │
//! │  │     User        │   │    Review       │   │    Comment      │       │
//! │  │  ─────────────  │──►│  author, score  │──►│  author, text   │       │
//! │  │  role           │   │  text, pub_date │   │  pub_date       │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Parent vs. Author
//! A Review belongs to a Title and a Comment belongs to a Review: that is the
//! cascade relationship. Both are also *authored* by a User, which is the
//! relationship the access policy looks at. The two are kept as separate
//! fields (`title_id` / `review_id` vs. `author_id`).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationError};

/// Store-assigned identifier of a user.
pub type UserId = i64;

// =============================================================================
// Role
// =============================================================================

/// The closed set of roles a user can hold.
///
/// Every permission decision is derived from this value by
/// [`crate::access::authorize`]; nothing else on the user carries privileges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Regular account: reviews and comments, edits own content.
    User,
    /// Edits and deletes any review or comment.
    Moderator,
    /// Full access, including the catalogue and the users collection.
    Admin,
}

impl Role {
    /// All roles, in privilege order.
    pub const ALL: [Role; 3] = [Role::User, Role::Moderator, Role::Admin];

    /// Returns the stored/serialized name of the role.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Moderator => "moderator",
            Role::Admin => "admin",
        }
    }
}

impl Default for Role {
    fn default() -> Self {
        Role::User
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|role| role.as_str() == s)
            .ok_or_else(|| ValidationError::NotAllowed {
                field: "role".to_string(),
                allowed: Role::ALL.iter().map(|r| r.as_str().to_string()).collect(),
            })
    }
}

// =============================================================================
// User
// =============================================================================

/// A registered account.
///
/// `confirmation_version` is the mutable state confirmation codes are derived
/// from. It is bumped whenever a code is redeemed, which invalidates every
/// code issued before.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub bio: String,
    pub role: Role,
    pub confirmation_version: i64,
}

/// Public representation of a user (users collection and `me`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct UserView {
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub bio: String,
    pub role: Role,
}

impl From<&User> for UserView {
    fn from(user: &User) -> Self {
        UserView {
            username: user.username.clone(),
            email: user.email.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            bio: user.bio.clone(),
            role: user.role,
        }
    }
}

/// Fields for creating a user through the admin users collection.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub bio: String,
    #[serde(default)]
    pub role: Role,
}

/// Partial update of a user. `None` leaves the field untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserPatch {
    pub username: Option<String>,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub bio: Option<String>,
    pub role: Option<Role>,
}

// =============================================================================
// Category & Genre
// =============================================================================

/// A category a title may belong to (film, book, music...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Category {
    #[serde(skip)]
    pub id: i64,
    pub name: String,
    pub slug: String,
}

/// A genre; titles link to any number of them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Genre {
    #[serde(skip)]
    pub id: i64,
    pub name: String,
    pub slug: String,
}

/// Name and slug for a new or updated category/genre.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxonInput {
    pub name: String,
    pub slug: String,
}

// =============================================================================
// Title
// =============================================================================

/// A stored title row. Genres and rating live elsewhere.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Title {
    pub id: i64,
    pub name: String,
    pub year: i32,
    pub description: String,
    pub category_id: Option<i64>,
}

/// What readers of a title see.
///
/// `rating` is never stored: it is recomputed from the reviews on every read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TitleView {
    pub id: i64,
    pub name: String,
    pub year: i32,
    pub rating: Option<f64>,
    pub description: String,
    pub genre: Vec<Genre>,
    pub category: Option<Category>,
}

/// Fields for creating a title. Genres and category are given by slug.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewTitle {
    pub name: String,
    pub year: i32,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub genre: Vec<String>,
    pub category: Option<String>,
}

/// Partial update of a title.
///
/// `category` distinguishes an absent field (`None`, keep) from an explicit
/// `null` (`Some(None)`, clear the category).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TitlePatch {
    pub name: Option<String>,
    pub year: Option<i32>,
    pub description: Option<String>,
    pub genre: Option<Vec<String>>,
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub category: Option<Option<String>>,
}

/// Wraps a field that was present in the input, `null` included.
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Title list filter. `name` is a substring match, the rest are exact.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TitleFilter {
    pub name: Option<String>,
    pub year: Option<i32>,
    /// Genre slug.
    pub genre: Option<String>,
    /// Category slug.
    pub category: Option<String>,
}

// =============================================================================
// Review
// =============================================================================

/// A review of a title. `author` is the author's username.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Review {
    pub id: i64,
    #[serde(skip)]
    pub title_id: i64,
    #[serde(skip)]
    pub author_id: UserId,
    pub author: String,
    pub text: String,
    pub score: i64,
    #[ts(as = "String")]
    pub pub_date: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewReview {
    pub text: String,
    pub score: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReviewPatch {
    pub text: Option<String>,
    pub score: Option<i64>,
}

/// Rejects a second review of the same title by the same author.
///
/// `already_reviewed` comes from the store lookup on (title, author).
pub fn ensure_first_review(title_id: i64, already_reviewed: bool) -> CoreResult<()> {
    if already_reviewed {
        return Err(CoreError::DuplicateReview { title_id });
    }
    Ok(())
}

// =============================================================================
// Comment
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Comment {
    pub id: i64,
    #[serde(skip)]
    pub review_id: i64,
    #[serde(skip)]
    pub author_id: UserId,
    pub author: String,
    pub text: String,
    #[ts(as = "String")]
    pub pub_date: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewComment {
    pub text: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CommentPatch {
    pub text: Option<String>,
}

// =============================================================================
// Unit Tests
// =============================================================================
