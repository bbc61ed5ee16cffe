//! # Validation Module
//!
//! Field-level validation for YaMDb inputs.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Transport (external)                                         │
//! │  └── Type validation (deserialization)                                 │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Services (yamdb-api)                                         │
//! │  └── THIS MODULE: field rules, reserved names, score range             │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── UNIQUE constraints (username, email, slugs, title+author)         │
//! │  ├── CHECK constraints (score range)                                   │
//! │  └── Foreign key constraints (cascade / set null)                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Lengths are counted in characters, not bytes.

use crate::error::ValidationError;
use crate::{EMAIL_MAX_LEN, MAX_SCORE, MIN_SCORE, RESERVED_USERNAME, USERNAME_MAX_LEN};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

const NAME_MAX_LEN: usize = 256;
const SLUG_MAX_LEN: usize = 50;
const PERSON_NAME_MAX_LEN: usize = 150;
const BIO_MAX_LEN: usize = 254;
const REVIEW_TEXT_MAX_LEN: usize = 10_000;
const COMMENT_TEXT_MAX_LEN: usize = 1_000;

// =============================================================================
// Helpers
// =============================================================================

fn required<'a>(field: &str, value: &'a str) -> ValidationResult<&'a str> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }
    Ok(value)
}

fn max_len(field: &str, value: &str, max: usize) -> ValidationResult<()> {
    if value.chars().count() > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }
    Ok(())
}

// =============================================================================
// Identity
// =============================================================================

/// Validates a username.
///
/// ## Rules
/// - Must not be empty, at most 150 characters
/// - Letters, digits and `@ . + - _` only
/// - Must not be `me` in any casing
///
/// ## Example
/// ```rust
/// use yamdb_core::validation::validate_username;
///
/// assert!(validate_username("alice_1").is_ok());
/// assert!(validate_username("ME").is_err());
/// assert!(validate_username("has space").is_err());
/// assert!(validate_username(" alice").is_err());
/// ```
pub fn validate_username(username: &str) -> ValidationResult<()> {
    // Checked as stored: surrounding whitespace fails the character rule.
    required("username", username)?;
    max_len("username", username, USERNAME_MAX_LEN)?;

    if !username
        .chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_'))
    {
        return Err(ValidationError::InvalidFormat {
            field: "username".to_string(),
            reason: "must contain only letters, numbers, and @/./+/-/_".to_string(),
        });
    }

    if username.to_lowercase() == RESERVED_USERNAME {
        return Err(ValidationError::Reserved {
            field: "username".to_string(),
            value: username.to_string(),
        });
    }

    Ok(())
}

/// Validates an email address.
///
/// Structural check only: one `@`, a non-empty local part, a dotted domain
/// and no whitespace. Deliverability is proven by the confirmation code.
pub fn validate_email(email: &str) -> ValidationResult<()> {
    required("email", email)?;
    max_len("email", email, EMAIL_MAX_LEN)?;

    let invalid = |reason: &str| ValidationError::InvalidFormat {
        field: "email".to_string(),
        reason: reason.to_string(),
    };

    if email.chars().any(char::is_whitespace) {
        return Err(invalid("must not contain whitespace"));
    }

    let (local, domain) = email
        .split_once('@')
        .ok_or_else(|| invalid("must contain '@'"))?;

    if local.is_empty() || domain.contains('@') {
        return Err(invalid("must contain exactly one '@' after a local part"));
    }

    let labels: Vec<&str> = domain.split('.').collect();
    if labels.len() < 2 || labels.iter().any(|label| label.is_empty()) {
        return Err(invalid("domain must look like example.com"));
    }

    Ok(())
}

/// Validates optional profile fields (first/last name, bio).
pub fn validate_profile_fields(first_name: &str, last_name: &str, bio: &str) -> ValidationResult<()> {
    max_len("first_name", first_name, PERSON_NAME_MAX_LEN)?;
    max_len("last_name", last_name, PERSON_NAME_MAX_LEN)?;
    max_len("bio", bio, BIO_MAX_LEN)
}

// =============================================================================
// Catalogue
// =============================================================================

/// Validates a category/genre name.
pub fn validate_taxon_name(name: &str) -> ValidationResult<()> {
    let name = required("name", name)?;
    max_len("name", name, NAME_MAX_LEN)
}

/// Validates a slug: `[-a-zA-Z0-9_]+`, at most 50 characters.
///
/// ## Example
/// ```rust
/// use yamdb_core::validation::validate_slug;
///
/// assert!(validate_slug("sci-fi").is_ok());
/// assert!(validate_slug("sci fi").is_err());
/// ```
pub fn validate_slug(slug: &str) -> ValidationResult<()> {
    if slug.is_empty() {
        return Err(ValidationError::Required {
            field: "slug".to_string(),
        });
    }
    max_len("slug", slug, SLUG_MAX_LEN)?;

    if !slug
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ValidationError::InvalidFormat {
            field: "slug".to_string(),
            reason: "must contain only letters, numbers, hyphens, and underscores".to_string(),
        });
    }

    Ok(())
}

/// Validates a title name.
pub fn validate_title_name(name: &str) -> ValidationResult<()> {
    let name = required("name", name)?;
    max_len("name", name, NAME_MAX_LEN)
}

/// Validates a release year against the current year.
///
/// The current year is passed in so this stays a pure function.
pub fn validate_year(year: i32, current_year: i32) -> ValidationResult<()> {
    if year > current_year {
        return Err(ValidationError::OutOfRange {
            field: "year".to_string(),
            min: i64::from(i32::MIN),
            max: i64::from(current_year),
        });
    }
    Ok(())
}

// =============================================================================
// Reviews & Comments
// =============================================================================

/// Validates a review score: an integer in `[1, 10]`.
pub fn validate_score(score: i64) -> ValidationResult<()> {
    if !(MIN_SCORE..=MAX_SCORE).contains(&score) {
        return Err(ValidationError::OutOfRange {
            field: "score".to_string(),
            min: MIN_SCORE,
            max: MAX_SCORE,
        });
    }
    Ok(())
}

pub fn validate_review_text(text: &str) -> ValidationResult<()> {
    let text = required("text", text)?;
    max_len("text", text, REVIEW_TEXT_MAX_LEN)
}

pub fn validate_comment_text(text: &str) -> ValidationResult<()> {
    let text = required("text", text)?;
    max_len("text", text, COMMENT_TEXT_MAX_LEN)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_username() {
        assert!(validate_username("alice").is_ok());
        assert!(validate_username("bob.smith+1@x").is_ok());
        assert!(validate_username("мария").is_ok());

        assert!(validate_username("").is_err());
        assert!(validate_username("   ").is_err());
        assert!(validate_username("no spaces").is_err());
        assert!(validate_username(&"a".repeat(151)).is_err());
    }

    #[test]
    fn test_surrounding_whitespace_rejected() {
        assert!(validate_username(" bob ").is_err());
        assert!(validate_username("carol ").is_err());
        assert!(validate_username("\tdave").is_err());
        assert!(validate_email(" alice@example.com").is_err());
        assert!(validate_email("alice@example.com\n").is_err());
    }

    #[test]
    fn test_reserved_username_any_casing() {
        for name in ["me", "Me", "mE", "ME"] {
            assert_eq!(
                validate_username(name),
                Err(ValidationError::Reserved {
                    field: "username".to_string(),
                    value: name.to_string(),
                })
            );
        }
        assert!(validate_username("meme").is_ok());
    }

    #[test]
    fn test_validate_email() {
        assert!(validate_email("alice@example.com").is_ok());
        assert!(validate_email("a.b+c@mail.example.org").is_ok());

        assert!(validate_email("").is_err());
        assert!(validate_email("alice").is_err());
        assert!(validate_email("@example.com").is_err());
        assert!(validate_email("alice@example").is_err());
        assert!(validate_email("alice@@example.com").is_err());
        assert!(validate_email("alice@example..com").is_err());
        assert!(validate_email("al ice@example.com").is_err());
        assert!(validate_email(&format!("{}@example.com", "a".repeat(250))).is_err());
    }

    #[test]
    fn test_validate_slug() {
        assert!(validate_slug("drama").is_ok());
        assert!(validate_slug("rock_n-roll2").is_ok());
        assert!(validate_slug("").is_err());
        assert!(validate_slug("with/slash").is_err());
        assert!(validate_slug(&"s".repeat(51)).is_err());
    }

    #[test]
    fn test_validate_year() {
        assert!(validate_year(1994, 2026).is_ok());
        assert!(validate_year(2026, 2026).is_ok());
        assert!(validate_year(2027, 2026).is_err());
    }

    #[test]
    fn test_validate_score() {
        assert!(validate_score(1).is_ok());
        assert!(validate_score(10).is_ok());
        assert!(validate_score(0).is_err());
        assert!(validate_score(11).is_err());
        assert!(validate_score(-3).is_err());
    }

    #[test]
    fn test_text_limits() {
        assert!(validate_review_text("Solid film").is_ok());
        assert!(validate_review_text(" ").is_err());
        assert!(validate_review_text(&"x".repeat(10_001)).is_err());
        assert!(validate_comment_text(&"x".repeat(1_000)).is_ok());
        assert!(validate_comment_text(&"x".repeat(1_001)).is_err());
    }

    #[test]
    fn test_profile_fields() {
        assert!(validate_profile_fields("Ann", "Lee", "Film buff").is_ok());
        assert!(validate_profile_fields("", "", "").is_ok());
        assert!(validate_profile_fields("", "", &"b".repeat(255)).is_err());
    }
}
