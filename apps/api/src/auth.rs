//! Authentication module.
//!
//! Two kinds of credential:
//! - confirmation codes, mailed on signup and exchanged once for a token
//! - JWT access tokens, presented as `Bearer <token>` on every call
//!
//! ## Confirmation Code Format
//! ```text
//!   lx2k9q-3f1c0a9e7b5d42c8e1a0
//!   ──┬───  ─────────┬──────────
//!     │              └── first 20 hex chars of SHA-256(secret, user id,
//!     │                  username, email, confirmation_version, issued_at)
//!     └── issued_at (unix seconds, base36)
//! ```
//! Nothing is stored: a code is checked by recomputing the digest from the
//! user's current row. Bumping `confirmation_version` after a successful
//! exchange makes every earlier code stop matching.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, TokenData, Validation};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;
use yamdb_core::{User, UserId};

use crate::error::{ApiError, ApiResult, ErrorCode};

// =============================================================================
// Access tokens
// =============================================================================

/// JWT claims structure.
///
/// The role is deliberately absent: it is loaded from the store on every
/// request so demotions take effect immediately.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user id)
    pub sub: String,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration (Unix timestamp)
    pub exp: i64,

    /// JWT ID (unique identifier for this token)
    pub jti: String,

    /// Token type, always "access"
    pub token_type: String,
}

impl Claims {
    pub fn user_id(&self) -> ApiResult<UserId> {
        self.sub
            .parse()
            .map_err(|_| ApiError::unauthenticated("Invalid token subject"))
    }
}

/// JWT token manager.
pub struct JwtManager {
    secret: String,
    access_lifetime_secs: i64,
}

impl JwtManager {
    /// Create a new JWT manager.
    pub fn new(secret: String, access_lifetime_secs: i64) -> Self {
        JwtManager {
            secret,
            access_lifetime_secs,
        }
    }

    /// Generate an access token.
    pub fn generate_access_token(&self, user_id: UserId) -> ApiResult<String> {
        let now = Utc::now();
        let exp = now + Duration::seconds(self.access_lifetime_secs);

        let claims = Claims {
            sub: user_id.to_string(),
            iat: now.timestamp(),
            exp: exp.timestamp(),
            jti: Uuid::new_v4().to_string(),
            token_type: "access".to_string(),
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|e| ApiError::internal(format!("Failed to generate token: {}", e)))
    }

    /// Validate and decode a token.
    pub fn validate_token(&self, token: &str) -> ApiResult<Claims> {
        let validation = Validation::default();

        let token_data: TokenData<Claims> = decode(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &validation,
        )
        .map_err(|e| ApiError::unauthenticated(format!("Invalid token: {}", e)))?;

        Ok(token_data.claims)
    }

    /// Validate that a token is an access token.
    pub fn validate_access_token(&self, token: &str) -> ApiResult<Claims> {
        let claims = self.validate_token(token)?;

        if claims.token_type != "access" {
            return Err(ApiError::unauthenticated("Expected access token"));
        }

        Ok(claims)
    }

    /// Access token lifetime, for `expires_in` style responses.
    pub fn access_lifetime_secs(&self) -> i64 {
        self.access_lifetime_secs
    }
}

/// Extract bearer token from authorization header.
pub fn extract_bearer_token(auth_header: &str) -> Option<&str> {
    auth_header.strip_prefix("Bearer ").map(str::trim).filter(|t| !t.is_empty())
}

// =============================================================================
// Confirmation codes
// =============================================================================

const CODE_DIGEST_LEN: usize = 20;

/// Issues and checks confirmation codes.
pub struct ConfirmationCodes {
    secret: String,
    ttl: Duration,
}

impl ConfirmationCodes {
    pub fn new(secret: String, ttl_secs: i64) -> Self {
        ConfirmationCodes {
            secret,
            ttl: Duration::seconds(ttl_secs),
        }
    }

    /// A fresh code for the user's current state.
    pub fn make_code(&self, user: &User) -> String {
        self.make_code_at(user, Utc::now())
    }

    pub fn make_code_at(&self, user: &User, now: DateTime<Utc>) -> String {
        let issued_at = now.timestamp();
        format!("{}-{}", to_base36(issued_at), self.digest(user, issued_at))
    }

    /// Checks `code` against the user's current state.
    ///
    /// ## Returns
    /// * `Err(ErrorCode::InvalidCode)` - malformed, or not derived from this state
    /// * `Err(ErrorCode::ExpiredCode)` - derived from this state, window passed
    pub fn check_code(&self, user: &User, code: &str) -> ApiResult<()> {
        self.check_code_at(user, code, Utc::now())
    }

    pub fn check_code_at(&self, user: &User, code: &str, now: DateTime<Utc>) -> ApiResult<()> {
        let invalid = || ApiError::new(ErrorCode::InvalidCode, "Invalid confirmation code");

        let (stamp, digest) = code.trim().split_once('-').ok_or_else(invalid)?;
        let issued_at = i64::from_str_radix(stamp, 36).map_err(|_| invalid())?;

        if !constant_time_eq(digest.as_bytes(), self.digest(user, issued_at).as_bytes()) {
            return Err(invalid());
        }

        // A code can only come from the future if the clock moved backwards.
        if issued_at > now.timestamp() {
            return Err(invalid());
        }

        if now.timestamp() - issued_at > self.ttl.num_seconds() {
            return Err(ApiError::new(
                ErrorCode::ExpiredCode,
                "Confirmation code has expired",
            ));
        }

        Ok(())
    }

    fn digest(&self, user: &User, issued_at: i64) -> String {
        let mut hasher = Sha256::new();
        for part in [
            self.secret.as_bytes(),
            user.id.to_string().as_bytes(),
            user.username.as_bytes(),
            user.email.as_bytes(),
            user.confirmation_version.to_string().as_bytes(),
            issued_at.to_string().as_bytes(),
        ] {
            hasher.update(part);
            hasher.update([0u8]);
        }
        let mut digest = hex::encode(hasher.finalize());
        digest.truncate(CODE_DIGEST_LEN);
        digest
    }
}

fn to_base36(mut value: i64) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

    if value <= 0 {
        return "0".to_string();
    }
    let mut out = Vec::new();
    while value > 0 {
        out.push(DIGITS[(value % 36) as usize]);
        value /= 36;
    }
    out.reverse();
    String::from_utf8_lossy(&out).into_owned()
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
