//! Identity service.
//!
//! Passwordless signup and token issuance.
//!
//! ## Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  request_signup(username, email)                                        │
//! │       │  validate, conflict checks, get-or-create (one transaction)    │
//! │       ▼                                                                 │
//! │  code = ConfirmationCodes::make_code(user)  ──► mailed (detached)      │
//! │                                                                         │
//! │  issue_token(username, code)                                            │
//! │       │  check_code(user, code)                                        │
//! │       │  bump confirmation_version  ← every earlier code now invalid   │
//! │       ▼                                                                 │
//! │  JWT { sub: user id }                                                  │
//! │                                                                         │
//! │  authenticate(token)                                                    │
//! │       │  verify JWT, load user, read role live                         │
//! │       ▼                                                                 │
//! │  Actor::User { id, role }                                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use yamdb_core::validation::{validate_email, validate_username};
use yamdb_core::Actor;

use crate::auth::extract_bearer_token;
use crate::error::{ApiError, ApiResult, ErrorCode};
use crate::notify::{dispatch, Notification};
use crate::AppState;

/// What signup returns: the identity a code was sent for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingConfirmation {
    pub username: String,
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessToken {
    pub token: String,
    pub expires_in: i64,
}

/// Identity service implementation.
pub struct IdentityService {
    state: Arc<AppState>,
}

impl IdentityService {
    pub fn new(state: Arc<AppState>) -> Self {
        IdentityService { state }
    }

    /// Registers (or re-registers) a username/email pair and mails a code.
    ///
    /// Repeating the call with the same pair is idempotent apart from
    /// sending a fresh code.
    pub async fn request_signup(&self, username: &str, email: &str) -> ApiResult<PendingConfirmation> {
        let username = username.trim();
        let email = email.trim();
        validate_username(username)?;
        validate_email(email)?;

        info!(username = %username, "Signup request");

        let users = self.state.db.users();

        if let Some(existing) = users.get_by_username(username).await? {
            if existing.email != email {
                warn!(username = %username, "Signup username already taken");
                return Err(ApiError::conflict(format!(
                    "Username '{username}' is already registered with a different email"
                )));
            }
        }

        if let Some(existing) = users.get_by_email(email).await? {
            if existing.username != username {
                warn!(email = %email, "Signup email already taken");
                return Err(ApiError::conflict(format!(
                    "Email '{email}' is already registered with a different username"
                )));
            }
        }

        // A racing signup that slipped past the checks above ends up here as a
        // UniqueViolation, which converts to Conflict.
        let outcome = users.get_or_create_signup(username, email).await?;

        let code = self.state.codes.make_code(&outcome.user);
        dispatch(
            self.state.notifier.clone(),
            Notification {
                from: self.state.config.default_from_email.clone(),
                to: outcome.user.email.clone(),
                subject: "YaMDb confirmation code".to_string(),
                body: format!("Your confirmation code: {code}"),
            },
        );

        info!(
            user_id = %outcome.user.id,
            created = outcome.created,
            "Confirmation code issued"
        );

        Ok(PendingConfirmation {
            username: outcome.user.username,
            email: outcome.user.email,
        })
    }

    /// Exchanges a confirmation code for an access token.
    pub async fn issue_token(&self, username: &str, code: &str) -> ApiResult<AccessToken> {
        let users = self.state.db.users();

        let user = users
            .get_by_username(username.trim())
            .await?
            .ok_or_else(|| ApiError::not_found("User", username))?;

        if let Err(e) = self.state.codes.check_code(&user, code) {
            warn!(user_id = %user.id, code = ?e.code, "Confirmation code rejected");
            return Err(e);
        }

        // The code was checked against `user.confirmation_version`; only the
        // request that moves exactly that version gets a token.
        if !users
            .bump_confirmation_version(user.id, user.confirmation_version)
            .await?
        {
            warn!(user_id = %user.id, "Confirmation code already redeemed");
            return Err(ApiError::new(ErrorCode::InvalidCode, "Invalid confirmation code"));
        }

        let token = self.state.jwt.generate_access_token(user.id)?;

        info!(user_id = %user.id, "Access token issued");

        Ok(AccessToken {
            token,
            expires_in: self.state.jwt.access_lifetime_secs(),
        })
    }

    /// Resolves a bearer token to the acting identity.
    ///
    /// ## Returns
    /// * `Ok(Actor::Anonymous)` - no token
    /// * `Ok(Actor::User)` - valid token, role as currently stored
    /// * `Err(Unauthenticated)` - bad/expired token, or the user is gone
    pub async fn authenticate(&self, token: Option<&str>) -> ApiResult<Actor> {
        let Some(token) = token else {
            return Ok(Actor::Anonymous);
        };

        let claims = self.state.jwt.validate_access_token(token)?;
        let user_id = claims.user_id()?;

        let user = self
            .state
            .db
            .users()
            .get_by_id(user_id)
            .await?
            .ok_or_else(|| ApiError::unauthenticated("User not found"))?;

        debug!(user_id = %user.id, role = %user.role, "Authenticated");

        Ok(Actor::User {
            id: user.id,
            role: user.role,
        })
    }

    /// [`authenticate`](Self::authenticate) from a raw `Authorization` header.
    pub async fn authenticate_header(&self, header: Option<&str>) -> ApiResult<Actor> {
        match header {
            None => Ok(Actor::Anonymous),
            Some(header) => {
                let token = extract_bearer_token(header)
                    .ok_or_else(|| ApiError::unauthenticated("Invalid authorization header"))?;
                self.authenticate(Some(token)).await
            }
        }
    }
}
