//! Service configuration module.
//!
//! Configuration is loaded from environment variables with fallback to defaults.

use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;

/// YaMDb service configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// SQLite database file
    pub database_path: String,

    /// Maximum pooled connections
    pub db_max_connections: u32,

    /// JWT secret key for signing tokens, also keys confirmation codes
    pub jwt_secret: String,

    /// JWT access token lifetime in seconds
    pub jwt_access_lifetime_secs: i64,

    /// How long a confirmation code stays redeemable, in seconds
    pub confirmation_code_ttl_secs: i64,

    /// Sender address on confirmation emails
    pub default_from_email: String,
}

impl ApiConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        let config = ApiConfig {
            database_path: env::var("DATABASE_PATH").unwrap_or_else(|_| "yamdb.db".to_string()),

            db_max_connections: parse_var("DB_MAX_CONNECTIONS", "5")?,

            jwt_secret: env::var("JWT_SECRET")
                // In production, this MUST be set via environment variable
                .unwrap_or_else(|_| "yamdb-dev-secret-change-in-production".to_string()),

            jwt_access_lifetime_secs: parse_var("JWT_ACCESS_LIFETIME_SECS", "86400")?, // 1 day

            confirmation_code_ttl_secs: parse_var("CONFIRMATION_CODE_TTL_SECS", "259200")?, // 3 days

            default_from_email: env::var("DEFAULT_FROM_EMAIL")
                .unwrap_or_else(|_| "noreply@yamdb.local".to_string()),
        };

        config.validate()?;
        Ok(config)
    }

    /// Configuration for tests: in-memory database, fixed secret.
    pub fn for_tests() -> Self {
        ApiConfig {
            database_path: ":memory:".to_string(),
            db_max_connections: 1,
            jwt_secret: "test-secret".to_string(),
            jwt_access_lifetime_secs: 3600,
            confirmation_code_ttl_secs: 259_200,
            default_from_email: "noreply@yamdb.test".to_string(),
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.jwt_secret.is_empty() {
            return Err(ConfigError::MissingRequired("JWT_SECRET".to_string()));
        }
        if self.jwt_access_lifetime_secs <= 0 {
            return Err(ConfigError::InvalidValue("JWT_ACCESS_LIFETIME_SECS".to_string()));
        }
        if self.confirmation_code_ttl_secs <= 0 {
            return Err(ConfigError::InvalidValue("CONFIRMATION_CODE_TTL_SECS".to_string()));
        }
        if self.db_max_connections == 0 {
            return Err(ConfigError::InvalidValue("DB_MAX_CONNECTIONS".to_string()));
        }
        Ok(())
    }
}

fn parse_var<T: FromStr>(name: &str, default: &str) -> Result<T, ConfigError> {
    env::var(name)
        .unwrap_or_else(|_| default.to_string())
        .parse()
        .map_err(|_| ConfigError::InvalidValue(name.to_string()))
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),
}
