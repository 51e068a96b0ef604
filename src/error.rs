use thiserror::Error;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    /// Record store errors (persistence of tickets/playbooks)
    #[error("Record store error: {0}")]
    RecordStore(String),

    /// Not found errors
    #[error("Not found: {0}")]
    NotFound(String),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// External ticketing source errors (whole-run failures)
    #[error("External source error ({source_name}): {message}")]
    ExternalSource { source_name: String, message: String },

    /// Timeout errors
    #[error("Operation timed out: {0}")]
    Timeout(String),

    /// Internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Get error code string
    pub fn error_code(&self) -> &str {
        match self {
            AppError::RecordStore(_) => "RECORD_STORE_ERROR",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::Configuration(_) => "CONFIGURATION_ERROR",
            AppError::Io(_) => "IO_ERROR",
            AppError::Serialization(_) => "SERIALIZATION_ERROR",
            AppError::ExternalSource { .. } => "EXTERNAL_SOURCE_ERROR",
            AppError::Timeout(_) => "TIMEOUT",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Whether the failure indicates a transient condition rather than a
    /// deployment/config defect. Non-recoverable errors must propagate to the
    /// caller as hard failures.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, AppError::Configuration(_) | AppError::Validation(_))
    }
}

/// Conversion from serde_json::Error
impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// Conversion from validator::ValidationErrors
impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::Validation(err.to_string())
    }
}

/// Conversion from config::ConfigError
impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Configuration(err.to_string())
    }
}

/// Conversion from sled::Error
impl From<sled::Error> for AppError {
    fn from(err: sled::Error) -> Self {
        AppError::RecordStore(err.to_string())
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(
            AppError::NotFound("test".to_string()).error_code(),
            "NOT_FOUND"
        );
        assert_eq!(
            AppError::RecordStore("test".to_string()).error_code(),
            "RECORD_STORE_ERROR"
        );
        assert_eq!(
            AppError::ExternalSource {
                source_name: "jira".to_string(),
                message: "timeout".to_string()
            }
            .error_code(),
            "EXTERNAL_SOURCE_ERROR"
        );
    }

    #[test]
    fn test_recoverability() {
        assert!(AppError::RecordStore("write failed".to_string()).is_recoverable());
        assert!(AppError::Timeout("slow".to_string()).is_recoverable());
        assert!(!AppError::Configuration("bad provider".to_string()).is_recoverable());
    }
}
