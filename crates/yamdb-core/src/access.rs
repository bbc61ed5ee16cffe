//! # Access Control Policy
//!
//! A single pure decision function answering "may this actor perform this
//! action on this resource?".
//!
//! ## Decision Table (first match wins)
//! ```text
//! ┌──────────────────────────────┬────────────────────────┬──────────────────┐
//! │ Resource                     │ Action                 │ Allowed for      │
//! ├──────────────────────────────┼────────────────────────┼──────────────────┤
//! │ Category/Genre/Title/        │ list, retrieve         │ everyone         │
//! │ Review/Comment               │                        │                  │
//! │ Category/Genre/Title         │ create, update,        │ admin            │
//! │                              │ partial update, destroy│                  │
//! │ Review/Comment               │ update, partial update,│ admin, moderator,│
//! │                              │ destroy                │ author           │
//! │ Review/Comment               │ create                 │ any signed-in    │
//! │ OtherUserAccount             │ any                    │ admin            │
//! │ UserProfile (self)           │ retrieve, update,      │ any signed-in    │
//! │                              │ partial update         │                  │
//! │ anything else                │                        │ nobody           │
//! └──────────────────────────────┴────────────────────────┴──────────────────┘
//! ```
//!
//! ## Denial Kinds
//! An anonymous actor is always told to authenticate (`Unauthenticated`);
//! a signed-in actor lacking the role or ownership gets `Forbidden`.
//!
//! Roles are looked up live by the caller for every request, so promoting or
//! demoting a user takes effect without re-issuing their token.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{Role, UserId};

// =============================================================================
// Inputs
// =============================================================================

/// Who is asking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Actor {
    /// No (valid) credentials were presented.
    Anonymous,
    /// A signed-in user with their current role.
    User { id: UserId, role: Role },
}

impl Actor {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Actor::User { .. })
    }

    pub fn user_id(&self) -> Option<UserId> {
        match self {
            Actor::User { id, .. } => Some(*id),
            Actor::Anonymous => None,
        }
    }

    pub fn role(&self) -> Option<Role> {
        match self {
            Actor::User { role, .. } => Some(*role),
            Actor::Anonymous => None,
        }
    }
}

/// What is being attempted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    List,
    Retrieve,
    Create,
    Update,
    PartialUpdate,
    Destroy,
}

impl Action {
    fn is_read(self) -> bool {
        matches!(self, Action::List | Action::Retrieve)
    }

    fn is_modification(self) -> bool {
        matches!(self, Action::Update | Action::PartialUpdate | Action::Destroy)
    }
}

/// What it is attempted on.
///
/// Reviews and comments carry their author so the ownership rule can be
/// evaluated. `author: None` means "no specific object" (e.g. the collection
/// when creating), in which case nobody counts as the owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Category,
    Genre,
    Title,
    Review { author: Option<UserId> },
    Comment { author: Option<UserId> },
    /// The caller's own profile (`users/me`).
    UserProfile,
    /// The users collection and any account reached through it.
    OtherUserAccount,
}

// =============================================================================
// Outcome
// =============================================================================

/// Why an action was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AccessDenied {
    /// Anonymous actor attempted a gated action (401).
    #[error("Authentication credentials were not provided")]
    Unauthenticated,

    /// Authenticated, but the role or ownership does not allow it (403).
    #[error("You do not have permission to perform this action")]
    Forbidden,
}

// =============================================================================
// Decision
// =============================================================================

/// Decides whether `actor` may perform `action` on `resource`.
///
/// ## Example
/// ```rust
/// use yamdb_core::access::{authorize, AccessDenied, Action, Actor, Resource};
/// use yamdb_core::Role;
///
/// let alice = Actor::User { id: 1, role: Role::User };
/// let bob_review = Resource::Review { author: Some(2) };
///
/// assert_eq!(authorize(&alice, Action::Destroy, &bob_review), Err(AccessDenied::Forbidden));
/// assert_eq!(
///     authorize(&Actor::Anonymous, Action::Create, &Resource::Review { author: None }),
///     Err(AccessDenied::Unauthenticated)
/// );
/// ```
pub fn authorize(actor: &Actor, action: Action, resource: &Resource) -> Result<(), AccessDenied> {
    if is_allowed(actor, action, resource) {
        return Ok(());
    }

    match actor {
        Actor::Anonymous => Err(AccessDenied::Unauthenticated),
        Actor::User { .. } => Err(AccessDenied::Forbidden),
    }
}

/// Boolean form of [`authorize`].
pub fn can_perform(actor: &Actor, action: Action, resource: &Resource) -> bool {
    authorize(actor, action, resource).is_ok()
}

fn is_allowed(actor: &Actor, action: Action, resource: &Resource) -> bool {
    use Resource::*;

    let role = actor.role();

    match resource {
        // 1. Public reads.
        Category | Genre | Title | Review { .. } | Comment { .. } if action.is_read() => true,

        // 2. Catalogue management.
        Category | Genre | Title => role == Some(Role::Admin),

        // 3. Editing or removing content.
        Review { author } | Comment { author } if action.is_modification() => match actor {
            Actor::User { id, role } => {
                matches!(role, Role::Admin | Role::Moderator) || *author == Some(*id)
            }
            Actor::Anonymous => false,
        },

        // 4. Writing content.
        Review { .. } | Comment { .. } => action == Action::Create && actor.is_authenticated(),

        // 5. The users collection.
        OtherUserAccount => role == Some(Role::Admin),

        // 6. Own profile.
        UserProfile => {
            matches!(action, Action::Retrieve | Action::Update | Action::PartialUpdate)
                && actor.is_authenticated()
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
