//! Name validation for files and folders.

use thiserror::Error;

use super::MAX_NAME_LENGTH;

/// Reasons a file or folder name is rejected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NameError {
    /// Name is empty or whitespace only.
    #[error("name cannot be empty")]
    Empty,

    /// Name is too long.
    #[error("name must be at most {MAX_NAME_LENGTH} characters")]
    TooLong,

    /// Name contains a path separator.
    #[error("name cannot contain '/' or '\\'")]
    PathSeparator,

    /// Name contains control characters.
    #[error("name cannot contain control characters")]
    ControlChars,

    /// Name is a relative path component.
    #[error("name cannot be '.' or '..'")]
    Reserved,
}

/// Validate a file or folder name and return it trimmed.
pub fn validate_name(name: &str) -> Result<String, NameError> {
    let trimmed = name.trim();

    if trimmed.is_empty() {
        return Err(NameError::Empty);
    }
    if trimmed.chars().count() > MAX_NAME_LENGTH {
        return Err(NameError::TooLong);
    }
    if trimmed.contains('/') || trimmed.contains('\\') {
        return Err(NameError::PathSeparator);
    }
    if trimmed.chars().any(char::is_control) {
        return Err(NameError::ControlChars);
    }
    if trimmed == "." || trimmed == ".." {
        return Err(NameError::Reserved);
    }

    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_names() {
        assert_eq!(validate_name("report.pdf").unwrap(), "report.pdf");
        assert_eq!(validate_name("  Photos 2024 ").unwrap(), "Photos 2024");
        assert_eq!(validate_name("日本語.txt").unwrap(), "日本語.txt");
        assert_eq!(validate_name("..hidden").unwrap(), "..hidden");
    }

    #[test]
    fn test_empty_name() {
        assert_eq!(validate_name(""), Err(NameError::Empty));
        assert_eq!(validate_name("   "), Err(NameError::Empty));
    }

    #[test]
    fn test_too_long() {
        let name = "a".repeat(MAX_NAME_LENGTH + 1);
        assert_eq!(validate_name(&name), Err(NameError::TooLong));
        assert!(validate_name(&"a".repeat(MAX_NAME_LENGTH)).is_ok());
    }

    #[test]
    fn test_separators() {
        assert_eq!(validate_name("a/b"), Err(NameError::PathSeparator));
        assert_eq!(validate_name("a\\b"), Err(NameError::PathSeparator));
    }

    #[test]
    fn test_control_chars() {
        assert_eq!(validate_name("bad\nname"), Err(NameError::ControlChars));
        assert_eq!(validate_name("nul\0"), Err(NameError::ControlChars));
    }

    #[test]
    fn test_reserved() {
        assert_eq!(validate_name("."), Err(NameError::Reserved));
        assert_eq!(validate_name(".."), Err(NameError::Reserved));
    }
}
