use validator::ValidateEmail;

use crate::error::ApiError;

pub const MAX_COMMENT_LENGTH: usize = 2_000;
pub const MAX_NOTE_LENGTH: usize = 5_000;
pub const MAX_NAME_LENGTH: usize = 100;

/// Validate an email address shape (RFC-ish, via the validator crate).
pub fn validate_email(email: &str) -> Result<(), ApiError> {
    if !email.validate_email() {
        return Err(ApiError::Validation(format!(
            "Invalid email address: '{email}'"
        )));
    }
    Ok(())
}

/// Validate a free-text body: non-empty after trimming, bounded length.
pub fn validate_body(body: &str, max_len: usize, what: &str) -> Result<(), ApiError> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return Err(ApiError::Validation(format!("{what} cannot be empty")));
    }
    if trimmed.len() > max_len {
        return Err(ApiError::Validation(format!(
            "{what} exceeds the maximum length of {max_len} characters"
        )));
    }
    Ok(())
}

/// Completion percentages live in `[0, 100]`.
pub fn validate_percentage(value: f64) -> Result<(), ApiError> {
    if !(0.0..=100.0).contains(&value) || value.is_nan() {
        return Err(ApiError::Validation(format!(
            "Percentage must be between 0 and 100, got {value}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_email() {
        assert!(validate_email("alice@example.com").is_ok());
        assert!(validate_email("a.b+tag@sub.example.org").is_ok());

        assert!(validate_email("").is_err());
        assert!(validate_email("not-an-email").is_err());
        assert!(validate_email("missing@tld@twice.com").is_err());
    }

    #[test]
    fn test_validate_body() {
        assert!(validate_body("hello", 10, "Comment").is_ok());
        assert!(validate_body("", 10, "Comment").is_err());
        assert!(validate_body("   ", 10, "Comment").is_err());
        assert!(validate_body("way too long here", 5, "Comment").is_err());
    }

    #[test]
    fn test_validate_percentage() {
        assert!(validate_percentage(0.0).is_ok());
        assert!(validate_percentage(45.5).is_ok());
        assert!(validate_percentage(100.0).is_ok());

        assert!(validate_percentage(-0.1).is_err());
        assert!(validate_percentage(100.1).is_err());
        assert!(validate_percentage(f64::NAN).is_err());
    }
}
