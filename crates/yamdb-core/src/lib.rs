//! # yamdb-core: Pure Domain Logic for YaMDb
//!
//! This crate is the **heart** of YaMDb. It contains the rules that decide who
//! may touch which entity and how a title's rating is derived, as pure
//! functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          YaMDb Architecture                             │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 Request Orchestrator (external)                 │   │
//! │  │     actor + action + resource  ──►  service call                │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 yamdb-api (services, JWT, signup)               │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ yamdb-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │  access   │  │  rating   │  │ validation│  │   │
//! │  │   │  Title    │  │  Actor    │  │ Aggregate │  │   rules   │  │   │
//! │  │   │  Review   │  │ authorize │  │   mean    │  │  checks   │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    yamdb-db (Entity Store)                      │   │
//! │  │              SQLite queries, migrations, repositories           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (User, Title, Review, Comment, etc.)
//! - [`access`] - The access control decision table
//! - [`rating`] - Score aggregation for title ratings
//! - [`error`] - Domain error types
//! - [`validation`] - Field-level validation
//!
//! ## Example Usage
//!
//! ```rust
//! use yamdb_core::access::{can_perform, Action, Actor, Resource};
//! use yamdb_core::Role;
//!
//! let moderator = Actor::User { id: 7, role: Role::Moderator };
//!
//! // Moderators may delete anybody's review...
//! assert!(can_perform(&moderator, Action::Destroy, &Resource::Review { author: Some(1) }));
//!
//! // ...but may not manage the catalogue.
//! assert!(!can_perform(&moderator, Action::Create, &Resource::Title));
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod access;
pub mod error;
pub mod rating;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use access::{authorize, can_perform, AccessDenied, Action, Actor, Resource};
pub use error::{CoreError, CoreResult, ValidationError};
pub use rating::ScoreAggregate;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Username that can never be registered (case-insensitive).
///
/// `me` is the path segment of the self-service profile endpoint, so a user
/// named "me" would be unreachable through the users collection.
pub const RESERVED_USERNAME: &str = "me";

/// Maximum username length.
pub const USERNAME_MAX_LEN: usize = 150;

/// Maximum email length.
pub const EMAIL_MAX_LEN: usize = 254;

/// Lowest accepted review score.
pub const MIN_SCORE: i64 = 1;

/// Highest accepted review score.
pub const MAX_SCORE: i64 = 10;
