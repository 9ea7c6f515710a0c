//! Error types for filevault.

use thiserror::Error;

/// Common error type for filevault.
#[derive(Error, Debug)]
pub enum VaultError {
    /// Database error.
    ///
    /// Errors from sqlx are converted into this variant.
    #[error("database error: {0}")]
    Database(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed or missing client input.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Authentication error.
    #[error("authentication error: {0}")]
    Auth(String),

    /// Permission denied error.
    #[error("permission denied: {0}")]
    Permission(String),

    /// Validation error for user input.
    #[error("validation error: {0}")]
    Validation(String),

    /// Resource already exists.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Resource not found.
    #[error("{0} not found")]
    NotFound(String),

    /// Storage backend error (URL signing).
    #[error("storage error: {0}")]
    Storage(String),

    /// Remote scan service error.
    #[error("scan error: {0}")]
    Scan(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

impl From<sqlx::Error> for VaultError {
    fn from(e: sqlx::Error) -> Self {
        VaultError::Database(e.to_string())
    }
}

/// Result type alias for filevault operations.
pub type Result<T> = std::result::Result<T, VaultError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bad_request_display() {
        let err = VaultError::BadRequest("fileUrl is required".to_string());
        assert_eq!(err.to_string(), "bad request: fileUrl is required");
    }

    #[test]
    fn test_not_found_error_display() {
        let err = VaultError::NotFound("file".to_string());
        assert_eq!(err.to_string(), "file not found");
    }

    #[test]
    fn test_scan_error_display() {
        let err = VaultError::Scan("analysis submission failed: HTTP 401".to_string());
        assert_eq!(
            err.to_string(),
            "scan error: analysis submission failed: HTTP 401"
        );
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: VaultError = io_err.into();
        assert!(matches!(err, VaultError::Io(_)));
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_sqlx_error_conversion() {
        let err: VaultError = sqlx::Error::RowNotFound.into();
        assert!(matches!(err, VaultError::Database(_)));
    }
}
