//! # Error Types
//!
//! Domain-specific error types for yamdb-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  yamdb-core errors (this file + access.rs)                             │
//! │  ├── CoreError        - Domain rule violations                         │
//! │  ├── ValidationError  - Input validation failures                      │
//! │  └── AccessDenied     - Policy denials (401 / 403)                     │
//! │                                                                         │
//! │  yamdb-db errors (separate crate)                                      │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  yamdb-api errors                                                      │
//! │  └── ApiError         - What the caller sees (code + message)          │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → ApiError ← DbError                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

use crate::access::AccessDenied;

// =============================================================================
// Core Error
// =============================================================================

/// Core domain errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The author already reviewed this title.
    ///
    /// ## When This Occurs
    /// ```text
    /// POST review on title 42 by alice
    ///      │
    ///      ▼
    /// Existing review (42, alice)? ── yes ──► DuplicateReview { title_id: 42 }
    /// ```
    #[error("Only one review per title is allowed (title {title_id})")]
    DuplicateReview { title_id: i64 },

    /// The actor is not allowed to perform the action.
    #[error(transparent)]
    Access(#[from] AccessDenied),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when user input doesn't meet requirements.
/// Used for early validation before any store access happens.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Invalid format (e.g., malformed email, bad slug).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },

    /// Value is reserved and cannot be used.
    #[error("{field} '{value}' is not valid")]
    Reserved { field: String, value: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::DuplicateReview { title_id: 42 };
        assert_eq!(
            err.to_string(),
            "Only one review per title is allowed (title 42)"
        );
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "text".to_string(),
        };
        assert_eq!(err.to_string(), "text is required");

        let err = ValidationError::Reserved {
            field: "username".to_string(),
            value: "Me".to_string(),
        };
        assert_eq!(err.to_string(), "username 'Me' is not valid");
    }

    #[test]
    fn test_conversions_into_core_error() {
        let core_err: CoreError = ValidationError::Required {
            field: "slug".to_string(),
        }
        .into();
        assert!(matches!(core_err, CoreError::Validation(_)));

        let core_err: CoreError = AccessDenied::Unauthenticated.into();
        assert!(matches!(core_err, CoreError::Access(AccessDenied::Unauthenticated)));
    }
}
