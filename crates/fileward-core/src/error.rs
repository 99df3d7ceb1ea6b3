//! Error types module
//!
//! All attachment operations report failures through [`FileError`]. Each variant
//! self-describes how it should be presented at an HTTP boundary via
//! [`ErrorMetadata`].

use std::io;

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected errors like validation failures
    Debug,
    /// Warning level - for recoverable issues like name conflicts
    Warn,
    /// Error level - for unexpected failures
    Error,
}

/// Metadata for error responses - defines how an error should be presented
pub trait ErrorMetadata {
    /// HTTP status code to return
    fn http_status_code(&self) -> u16;

    /// Machine-readable error code (e.g., "NOT_FOUND")
    fn error_code(&self) -> &'static str;

    /// Client-facing message (may differ from internal error message)
    fn client_message(&self) -> String;

    /// Whether details should be hidden from clients
    fn is_sensitive(&self) -> bool;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}

#[derive(Debug, thiserror::Error)]
pub enum FileError {
    #[error("File not found: {0}")]
    NotFound(String),

    #[error("File {0} already exists")]
    Conflict(String),

    #[error("Owner has no file")]
    NoFile,

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Image processing error: {0}")]
    Processing(String),

    #[error("Unknown processing operation: {0}")]
    UnknownOperation(String),

    #[error("Validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),

    #[error("Owner persistence error: {0}")]
    Owner(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type for attachment operations
pub type FileResult<T> = Result<T, FileError>;

impl From<serde_json::Error> for FileError {
    fn from(err: serde_json::Error) -> Self {
        FileError::Config(err.to_string())
    }
}

/// (status, code, sensitive, log level)
fn file_error_static_metadata(err: &FileError) -> (u16, &'static str, bool, LogLevel) {
    match err {
        FileError::NotFound(_) => (404, "NOT_FOUND", false, LogLevel::Debug),
        FileError::NoFile => (404, "NO_FILE", false, LogLevel::Debug),
        FileError::Conflict(_) => (409, "CONFLICT", false, LogLevel::Warn),
        FileError::Validation(_) => (422, "VALIDATION_FAILED", false, LogLevel::Debug),
        FileError::Io(_) => (500, "IO_ERROR", true, LogLevel::Error),
        FileError::Processing(_) => (500, "PROCESSING_ERROR", true, LogLevel::Error),
        FileError::UnknownOperation(_) => (500, "UNKNOWN_OPERATION", true, LogLevel::Error),
        FileError::Owner(_) => (500, "OWNER_ERROR", true, LogLevel::Error),
        FileError::Config(_) => (500, "CONFIG_ERROR", true, LogLevel::Error),
    }
}

impl FileError {
    /// Get the error type name for detailed error responses
    pub fn error_type(&self) -> &str {
        match self {
            FileError::NotFound(_) => "NotFound",
            FileError::Conflict(_) => "Conflict",
            FileError::NoFile => "NoFile",
            FileError::Io(_) => "Io",
            FileError::Processing(_) => "Processing",
            FileError::UnknownOperation(_) => "UnknownOperation",
            FileError::Validation(_) => "Validation",
            FileError::Owner(_) => "Owner",
            FileError::Config(_) => "Config",
        }
    }
}

impl ErrorMetadata for FileError {
    fn http_status_code(&self) -> u16 {
        file_error_static_metadata(self).0
    }

    fn error_code(&self) -> &'static str {
        file_error_static_metadata(self).1
    }

    fn is_sensitive(&self) -> bool {
        file_error_static_metadata(self).2
    }

    fn log_level(&self) -> LogLevel {
        file_error_static_metadata(self).3
    }

    fn client_message(&self) -> String {
        match self {
            FileError::NotFound(_) | FileError::NoFile => "File not found".to_string(),
            FileError::Conflict(name) => format!("File {} already exists", name),
            FileError::Validation(errors) => errors.join("; "),
            FileError::Io(_)
            | FileError::Processing(_)
            | FileError::UnknownOperation(_)
            | FileError::Owner(_)
            | FileError::Config(_) => "Internal server error".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_metadata_not_found() {
        let err = FileError::NotFound("/files/post/1/image/1_a.png".to_string());
        assert_eq!(err.http_status_code(), 404);
        assert_eq!(err.error_code(), "NOT_FOUND");
        assert_eq!(err.log_level(), LogLevel::Debug);
        // Read failures never leak the storage path
        assert_eq!(err.client_message(), "File not found");
    }

    #[test]
    fn test_error_metadata_conflict() {
        let err = FileError::Conflict("2_b.png".to_string());
        assert_eq!(err.http_status_code(), 409);
        assert_eq!(err.to_string(), "File 2_b.png already exists");
        assert!(!err.is_sensitive());
    }

    #[test]
    fn test_io_errors_are_sensitive() {
        let err = FileError::from(io::Error::new(io::ErrorKind::PermissionDenied, "denied"));
        assert_eq!(err.http_status_code(), 500);
        assert!(err.is_sensitive());
        assert_eq!(err.error_type(), "Io");
        assert_eq!(err.client_message(), "Internal server error");
    }

    #[test]
    fn test_validation_message_joins_errors() {
        let err = FileError::Validation(vec!["a".to_string(), "b".to_string()]);
        assert_eq!(err.to_string(), "Validation failed: a; b");
        assert_eq!(err.client_message(), "a; b");
        assert_eq!(err.http_status_code(), 422);
    }
}
