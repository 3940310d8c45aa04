//! Unified application error types for CDN Offload.
//!
//! All crates map their internal errors into [`AppError`] for consistent
//! propagation through the ? operator.

use std::fmt;
use thiserror::Error;

/// Top-level error kind categorization used across the entire application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ErrorKind {
    /// The requested record was not found.
    NotFound,
    /// Input validation failed.
    Validation,
    /// Required offload settings (API key, storage zone, CDN URL) are missing.
    ConfigIncomplete,
    /// The local file vanished before it could be transferred.
    FileMissing,
    /// The remote transfer failed (transport error, non-2xx, timeout).
    TransferFailure,
    /// The queue persistence layer could not be reached.
    StorageUnavailable,
    /// The caller lacks the privilege required for the operation.
    PermissionDenied,
    /// Another processing cycle currently holds the cycle lease.
    Busy,
    /// A configuration file could not be loaded or parsed.
    Configuration,
    /// A serialization/deserialization error occurred.
    Serialization,
    /// An internal error occurred.
    Internal,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "NOT_FOUND"),
            Self::Validation => write!(f, "VALIDATION"),
            Self::ConfigIncomplete => write!(f, "CONFIG_INCOMPLETE"),
            Self::FileMissing => write!(f, "FILE_MISSING"),
            Self::TransferFailure => write!(f, "TRANSFER_FAILURE"),
            Self::StorageUnavailable => write!(f, "STORAGE_UNAVAILABLE"),
            Self::PermissionDenied => write!(f, "PERMISSION_DENIED"),
            Self::Busy => write!(f, "BUSY"),
            Self::Configuration => write!(f, "CONFIGURATION"),
            Self::Serialization => write!(f, "SERIALIZATION"),
            Self::Internal => write!(f, "INTERNAL"),
        }
    }
}

/// The unified application error used throughout CDN Offload.
///
/// All crate-specific errors are mapped into `AppError` using `From` impls
/// or explicit `.map_err()` calls. This provides a single error type for
/// the entire application boundary.
#[derive(Debug, Error)]
#[error("{kind}: {message}")]
pub struct AppError {
    /// The category of error.
    pub kind: ErrorKind,
    /// A human-readable error message.
    pub message: String,
    /// Optional underlying cause.
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl AppError {
    /// Create a new application error.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    /// Create a new application error with an underlying cause.
    pub fn with_source(
        kind: ErrorKind,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            kind,
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a not-found error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    /// Create a config-incomplete error.
    pub fn config_incomplete(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ConfigIncomplete, message)
    }

    /// Create a file-missing error.
    pub fn file_missing(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::FileMissing, message)
    }

    /// Create a transfer-failure error.
    pub fn transfer(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::TransferFailure, message)
    }

    /// Create a storage-unavailable error.
    pub fn storage_unavailable(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::StorageUnavailable, message)
    }

    /// Create a permission-denied error.
    pub fn permission_denied(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::PermissionDenied, message)
    }

    /// Create a busy error.
    pub fn busy(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Busy, message)
    }

    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Configuration, message)
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }

    /// Whether this error describes a single job's transfer outcome rather
    /// than a problem with the cycle as a whole.
    pub fn is_job_failure(&self) -> bool {
        matches!(self.kind, ErrorKind::FileMissing | ErrorKind::TransferFailure)
    }
}

impl Clone for AppError {
    fn clone(&self) -> Self {
        Self {
            kind: self.kind,
            message: self.message.clone(),
            source: None,
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::with_source(
            ErrorKind::Serialization,
            format!("JSON serialization error: {err}"),
            err,
        )
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        if err.kind() == std::io::ErrorKind::NotFound {
            return Self::with_source(ErrorKind::FileMissing, format!("I/O error: {err}"), err);
        }
        Self::with_source(ErrorKind::Internal, format!("I/O error: {err}"), err)
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        Self::with_source(
            ErrorKind::Configuration,
            format!("Configuration error: {err}"),
            err,
        )
    }
}

#[cfg(feature = "sqlx")]
impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        Self::with_source(
            ErrorKind::StorageUnavailable,
            format!("Database error: {err}"),
            err,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_kind() {
        let err = AppError::transfer("HTTP 500");
        assert_eq!(err.to_string(), "TRANSFER_FAILURE: HTTP 500");
    }

    #[test]
    fn test_io_not_found_maps_to_file_missing() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: AppError = io.into();
        assert_eq!(err.kind, ErrorKind::FileMissing);
        assert!(err.is_job_failure());
    }

    #[test]
    fn test_storage_unavailable_is_not_job_failure() {
        assert!(!AppError::storage_unavailable("down").is_job_failure());
    }
}
