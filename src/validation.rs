//! Input constraints for new task text.

use thiserror::Error;

/// Minimum task text length, in characters, after trimming.
pub const MIN_TEXT_LEN: usize = 3;
/// Maximum task text length, in characters, after trimming.
pub const MAX_TEXT_LEN: usize = 100;

/// Reasons a task text is rejected. Only the first failing rule is reported.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Task cannot be empty")]
    EmptyTask,
    #[error("Task must be at least 3 characters long")]
    TooShort,
    #[error("Task cannot exceed 100 characters")]
    TooLong,
}

/// Trim `raw` and check it against the length rules, returning the trimmed text.
pub fn validate(raw: &str) -> Result<String, ValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyTask);
    }
    let len = trimmed.chars().count();
    if len < MIN_TEXT_LEN {
        return Err(ValidationError::TooShort);
    }
    if len > MAX_TEXT_LEN {
        return Err(ValidationError::TooLong);
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_short_and_long() {
        assert_eq!(validate(""), Err(ValidationError::EmptyTask));
        assert_eq!(validate("a"), Err(ValidationError::TooShort));
        assert_eq!(validate("ab"), Err(ValidationError::TooShort));
        assert_eq!(validate(&"x".repeat(101)), Err(ValidationError::TooLong));
        assert_eq!(validate(&"x".repeat(250)), Err(ValidationError::TooLong));
    }

    #[test]
    fn test_accepts_boundaries() {
        assert_eq!(validate("abc").as_deref(), Ok("abc"));
        let hundred = "y".repeat(100);
        assert_eq!(validate(&hundred), Ok(hundred.clone()));
    }

    #[test]
    fn test_whitespace_only_is_empty() {
        assert_eq!(validate("   \t\n "), Err(ValidationError::EmptyTask));
    }

    #[test]
    fn test_length_checked_after_trim() {
        assert_eq!(validate("  ok  "), Err(ValidationError::TooShort));
        assert_eq!(validate("  Buy bread  ").as_deref(), Ok("Buy bread"));
        let padded = format!("  {}  ", "z".repeat(100));
        assert_eq!(validate(&padded), Ok("z".repeat(100)));
    }

    #[test]
    fn test_counts_characters_not_bytes() {
        assert_eq!(validate("äöü").as_deref(), Ok("äöü"));
        assert!(validate(&"é".repeat(100)).is_ok());
    }

    #[test]
    fn test_messages() {
        assert_eq!(ValidationError::EmptyTask.to_string(), "Task cannot be empty");
        assert_eq!(
            ValidationError::TooShort.to_string(),
            "Task must be at least 3 characters long"
        );
        assert_eq!(ValidationError::TooLong.to_string(), "Task cannot exceed 100 characters");
    }
}
