//! Service implementations.
//!
//! One service per resource. Every operation takes the acting [`Actor`]
//! and asks [`yamdb_core::authorize`] before touching the store.
//!
//! [`Actor`]: yamdb_core::Actor

pub mod comment_service;
pub mod identity_service;
pub mod review_service;
pub mod taxonomy_service;
pub mod title_service;
pub mod user_service;

pub use comment_service::CommentService;
pub use identity_service::{AccessToken, IdentityService, PendingConfirmation};
pub use review_service::ReviewService;
pub use taxonomy_service::{CategoryService, GenreService, Taxon, TaxonomyService};
pub use title_service::TitleService;
pub use user_service::UserService;
