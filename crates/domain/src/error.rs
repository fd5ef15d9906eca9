//! Domain error types.

use thiserror::Error;

/// Maximum length of names and titles.
pub const MAX_NAME_LEN: usize = 100;

/// Errors raised when constructing or changing an entity.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    /// A required text field was blank.
    #[error("{field} must not be empty")]
    EmptyField { field: &'static str },

    /// A text field exceeded its maximum length.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: &'static str, max: usize },
}

/// Trims `value` and checks it is non-empty and at most `MAX_NAME_LEN` characters.
pub(crate) fn required_name(field: &'static str, value: &str) -> Result<String, DomainError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(DomainError::EmptyField { field });
    }
    if value.chars().count() > MAX_NAME_LEN {
        return Err(DomainError::TooLong {
            field,
            max: MAX_NAME_LEN,
        });
    }
    Ok(value.to_string())
}
