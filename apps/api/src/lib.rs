//! # yamdb-api
//!
//! Service layer for YaMDb: identity, access checks and one service per
//! resource. A transport maps each request onto exactly one call here.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         YaMDb Services                                  │
//! │                                                                         │
//! │  ┌────────────────┐  ┌────────────────┐  ┌────────────────────────────┐│
//! │  │IdentityService │  │  UserService   │  │  TaxonomyService<T>        ││
//! │  │                │  │                │  │  (categories, genres)      ││
//! │  │ • request_signup│ │ • list/create  │  │ • list / retrieve          ││
//! │  │ • issue_token  │  │ • retrieve ... │  │ • create / update / destroy││
//! │  │ • authenticate │  │ • me/update_me │  │                            ││
//! │  └────────────────┘  └────────────────┘  └────────────────────────────┘│
//! │                                                                         │
//! │  ┌────────────────┐  ┌────────────────┐  ┌────────────────┐            │
//! │  │ TitleService   │  │ ReviewService  │  │ CommentService │            │
//! │  │ (+ rating)     │  │ (one per title │  │                │            │
//! │  │                │  │  per author)   │  │                │            │
//! │  └────────────────┘  └────────────────┘  └────────────────┘            │
//! │                                                                         │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │                      Infrastructure (AppState)                    │  │
//! │  │  Database (yamdb-db) · JwtManager · ConfirmationCodes · Notifier │  │
//! │  └──────────────────────────────────────────────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration
//! Environment variables:
//! - `DATABASE_PATH` - SQLite file (default: yamdb.db)
//! - `DB_MAX_CONNECTIONS` - pool size (default: 5)
//! - `JWT_SECRET` - Secret for JWT signing and confirmation codes
//! - `JWT_ACCESS_LIFETIME_SECS` - Access token lifetime (default: 86400)
//! - `CONFIRMATION_CODE_TTL_SECS` - Code validity window (default: 259200)
//! - `DEFAULT_FROM_EMAIL` - Sender of confirmation emails

pub mod auth;
pub mod config;
pub mod error;
pub mod notify;
pub mod services;

use std::sync::Arc;

use yamdb_db::{Database, DbConfig, DbResult};

use crate::auth::{ConfirmationCodes, JwtManager};
use crate::notify::Notifier;

// Re-exports
pub use config::ApiConfig;
pub use error::{ApiError, ApiResult, ErrorCode};

/// Shared application state.
pub struct AppState {
    pub db: Database,
    pub config: ApiConfig,
    pub jwt: JwtManager,
    pub codes: ConfirmationCodes,
    pub notifier: Arc<dyn Notifier>,
}

impl AppState {
    pub fn new(db: Database, config: ApiConfig, notifier: Arc<dyn Notifier>) -> Self {
        let jwt = JwtManager::new(config.jwt_secret.clone(), config.jwt_access_lifetime_secs);
        let codes = ConfirmationCodes::new(config.jwt_secret.clone(), config.confirmation_code_ttl_secs);

        AppState {
            db,
            config,
            jwt,
            codes,
            notifier,
        }
    }

    /// Opens the configured database (running migrations) and builds the state.
    pub async fn connect(config: ApiConfig, notifier: Arc<dyn Notifier>) -> DbResult<Arc<Self>> {
        let db_config = DbConfig::new(&config.database_path).max_connections(config.db_max_connections);
        let db = Database::new(db_config).await?;
        Ok(Arc::new(AppState::new(db, config, notifier)))
    }
}
