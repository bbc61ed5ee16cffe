//! # API Error Type
//!
//! Unified error type returned by every service operation.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in YaMDb                                  │
//! │                                                                         │
//! │  Service operation: Result<T, ApiError>                                │
//! │         │                                                               │
//! │         ├── AccessDenied      ── Unauthenticated / Forbidden ──┐       │
//! │         ├── ValidationError   ── Validation ───────────────────┤       │
//! │         ├── CoreError         ── DuplicateReview ... ──────────┤       │
//! │         ├── DbError           ── NotFound / Conflict /         │       │
//! │         │                        DuplicateReview / Internal ───┤       │
//! │         ▼                                                       ▼       │
//! │  Success                                       ApiError { code, message }│
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Infrastructure failures are logged with their detail and surface only as
//! a generic `INTERNAL` message.

use serde::Serialize;
use tracing::error;
use yamdb_core::{AccessDenied, CoreError, ValidationError};
use yamdb_db::DbError;

/// Error returned from service operations.
///
/// ## Serialization
/// ```json
/// {
///   "code": "DUPLICATE_REVIEW",
///   "message": "Only one review per title is allowed (title 42)"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    /// Machine-readable error code for programmatic handling
    pub code: ErrorCode,

    /// Human-readable error message for display
    pub message: String,
}

/// Error kinds a caller can branch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Input failed field validation (400)
    Validation,

    /// Username/email/slug already used by something else (400)
    Conflict,

    /// Resource not found (404)
    NotFound,

    /// Confirmation code does not match (400)
    InvalidCode,

    /// Confirmation code matched but its window has passed (400)
    ExpiredCode,

    /// Authenticated but not allowed (403)
    Forbidden,

    /// Missing or unusable credentials (401)
    Unauthenticated,

    /// Second review of the same title by the same author (400)
    DuplicateReview,

    /// Infrastructure failure (500)
    Internal,
}

impl ErrorCode {
    /// HTTP status a transport should answer with.
    pub const fn http_status(self) -> u16 {
        match self {
            ErrorCode::Validation
            | ErrorCode::Conflict
            | ErrorCode::InvalidCode
            | ErrorCode::ExpiredCode
            | ErrorCode::DuplicateReview => 400,
            ErrorCode::Unauthenticated => 401,
            ErrorCode::Forbidden => 403,
            ErrorCode::NotFound => 404,
            ErrorCode::Internal => 500,
        }
    }
}

impl ApiError {
    /// Creates a new API error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
        }
    }

    /// Creates a not found error.
    pub fn not_found(resource: &str, id: impl std::fmt::Display) -> Self {
        ApiError::new(ErrorCode::NotFound, format!("{resource} not found: {id}"))
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Conflict, message)
    }

    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Validation, message)
    }

    pub fn unauthenticated(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Unauthenticated, message)
    }

    /// Creates an internal error. The detail is logged, not returned.
    pub fn internal(detail: impl std::fmt::Display) -> Self {
        error!(detail = %detail, "Internal error");
        ApiError::new(ErrorCode::Internal, "Internal server error")
    }
}

/// Converts database errors to API errors.
impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        if err.is_duplicate_review() {
            return ApiError::new(
                ErrorCode::DuplicateReview,
                "Only one review per title is allowed",
            );
        }

        match err {
            DbError::NotFound { entity, id } => ApiError::not_found(&entity, id),
            DbError::UniqueViolation { field, value } => {
                ApiError::conflict(format!("{field} '{value}' already exists"))
            }
            DbError::ForeignKeyViolation { message } => {
                error!("Foreign key violation: {}", message);
                ApiError::validation("Invalid reference")
            }
            other => ApiError::internal(other),
        }
    }
}

/// Converts core errors to API errors.
impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::DuplicateReview { .. } => {
                ApiError::new(ErrorCode::DuplicateReview, err.to_string())
            }
            CoreError::Access(denied) => denied.into(),
            CoreError::Validation(e) => e.into(),
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::validation(err.to_string())
    }
}

impl From<AccessDenied> for ApiError {
    fn from(denied: AccessDenied) -> Self {
        let code = match denied {
            AccessDenied::Unauthenticated => ErrorCode::Unauthenticated,
            AccessDenied::Forbidden => ErrorCode::Forbidden,
        };
        ApiError::new(code, denied.to_string())
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

/// Result type for service operations.
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unique_review_violation_maps_to_duplicate_review() {
        let err: ApiError = DbError::duplicate("reviews.title_id, reviews.author_id", "unknown").into();
        assert_eq!(err.code, ErrorCode::DuplicateReview);

        let err: ApiError = DbError::duplicate("users.email", "a@b.c").into();
        assert_eq!(err.code, ErrorCode::Conflict);
    }

    #[test]
    fn test_access_denied_kinds() {
        assert_eq!(ApiError::from(AccessDenied::Unauthenticated).code.http_status(), 401);
        assert_eq!(ApiError::from(AccessDenied::Forbidden).code.http_status(), 403);
        assert_eq!(
            ApiError::from(CoreError::Access(AccessDenied::Forbidden)).code,
            ErrorCode::Forbidden
        );
    }

    #[test]
    fn test_internal_hides_detail() {
        let err: ApiError = DbError::QueryFailed("syntax error near SELEC".into()).into();
        assert_eq!(err.code, ErrorCode::Internal);
        assert!(!err.message.contains("SELEC"));
    }

    #[test]
    fn test_serialized_shape() {
        let json = serde_json::to_value(ApiError::not_found("Title", 7)).unwrap();
        assert_eq!(json["code"], "NOT_FOUND");
        assert_eq!(json["message"], "Title not found: 7");
    }
}
