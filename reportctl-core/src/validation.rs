//! Validation of user-supplied fields
//!
//! Handlers validate request bodies before touching the store.
//! Invalid input returns ValidationError, not panic.

use std::fmt;

/// Maximum length for schedule and report group names
pub const MAX_NAME_LEN: usize = 256;

/// Validation error for request input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Field is empty when it shouldn't be
    Empty { field: &'static str },

    /// Field exceeds maximum length
    TooLong { field: &'static str, max: usize },

    /// Value doesn't match the required format
    InvalidFormat { field: &'static str, reason: &'static str },

    /// Numeric value outside the accepted range
    OutOfRange { field: &'static str, value: i64 },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty { field } => write!(f, "{} cannot be empty", field),
            Self::TooLong { field, max } => {
                write!(f, "{} exceeds maximum length of {} characters", field, max)
            }
            Self::InvalidFormat { field, reason } => write!(f, "{}: {}", field, reason),
            Self::OutOfRange { field, value } => {
                write!(f, "{} is out of range: {}", field, value)
            }
        }
    }
}

impl std::error::Error for ValidationError {}

/// Validate a display name: trimmed non-empty, at most `MAX_NAME_LEN` chars.
pub fn name(field: &'static str, value: &str) -> Result<(), ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Empty { field });
    }
    if trimmed.chars().count() > MAX_NAME_LEN {
        return Err(ValidationError::TooLong {
            field,
            max: MAX_NAME_LEN,
        });
    }
    Ok(())
}

/// Validate an identifier-like field that must carry a value.
pub fn non_empty(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::Empty { field });
    }
    Ok(())
}

/// Validate a field that must not be negative (intervals, lookbacks).
pub fn non_negative(field: &'static str, value: i64) -> Result<(), ValidationError> {
    if value < 0 {
        return Err(ValidationError::OutOfRange { field, value });
    }
    Ok(())
}

/// Dashboard variables are stored as text: empty, or a JSON object.
pub fn variables(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Ok(());
    }
    match serde_json::from_str::<serde_json::Value>(value) {
        Ok(serde_json::Value::Object(_)) => Ok(()),
        _ => Err(ValidationError::InvalidFormat {
            field: "variables",
            reason: "must be a JSON object",
        }),
    }
}
