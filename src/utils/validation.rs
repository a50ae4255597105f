//! Centralized validation and helper functions.

use crate::core::types::ResourceName;

/// Maximum number of verse entries accepted in a single book (DOS protection)
pub const MAX_CONTENTS: usize = 100_000;

/// Maximum number of books accepted in one upload or update batch
pub const MAX_BOOKS_PER_BATCH: usize = 100;

/// Security-related constants for input validation
pub const MAX_RESOURCE_NAME_LENGTH: usize = 64;

/// Check if adding another verse entry would exceed the maximum allowed.
///
/// Call this with the current count BEFORE adding a new entry.
/// Returns an error message if adding would exceed the limit, None if safe to add.
#[must_use]
pub fn check_content_limit(count: usize) -> Option<String> {
    if count >= MAX_CONTENTS {
        Some(format!(
            "Too many verse entries: adding another would exceed maximum of {MAX_CONTENTS}"
        ))
    } else {
        None
    }
}

/// Check a batch of books against [`MAX_BOOKS_PER_BATCH`].
#[must_use]
pub fn check_batch_limit(count: usize) -> Option<String> {
    if count > MAX_BOOKS_PER_BATCH {
        Some(format!(
            "Too many books in one batch: {count} exceeds maximum of {MAX_BOOKS_PER_BATCH}"
        ))
    } else {
        None
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Empty resource name provided")]
    EmptyName,
    #[error("Resource name too long: exceeds {MAX_RESOURCE_NAME_LENGTH} characters")]
    NameTooLong,
    #[error("Invalid resource name '{0}': only letters, digits, '_', '-' and '.' are allowed")]
    InvalidName(String),
    #[error("The operation is supported only on bible resources, got '{0}'")]
    NotABible(String),
}

/// Validate a bible resource name such as `en_KJV_1_bible`.
///
/// # Errors
///
/// Returns `ValidationError::EmptyName`, `ValidationError::NameTooLong` or
/// `ValidationError::InvalidName` for malformed names, and
/// `ValidationError::NotABible` when the name lacks the `_bible` suffix.
pub fn validate_resource_name(name: &str) -> Result<ResourceName, ValidationError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ValidationError::EmptyName);
    }
    if name.len() > MAX_RESOURCE_NAME_LENGTH {
        return Err(ValidationError::NameTooLong);
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
    {
        return Err(ValidationError::InvalidName(name.to_string()));
    }

    let resource = ResourceName::new(name);
    if !resource.is_bible() {
        return Err(ValidationError::NotABible(name.to_string()));
    }
    Ok(resource)
}
