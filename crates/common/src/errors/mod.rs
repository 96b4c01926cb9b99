//! Error types for PaperScout
//!
//! Provides:
//! - Distinct error types for configuration, storage and judgment failures
//! - Machine-readable error codes
//! - Classification of judgment-service failures (transient vs. permanent)

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;

/// Error codes for machine-readable error identification
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Validation errors (1xxx)
    ValidationError,

    // Resource errors (4xxx)
    PaperNotFound,

    // Rate limiting (6xxx)
    QuotaExceeded,

    // Database errors (7xxx)
    DatabaseError,
    ConnectionError,

    // Judgment service errors (8xxx)
    JudgmentRequestFailed,
    JudgmentTimeout,
    JudgmentRejected,

    // Configuration errors (9xxx)
    ConfigurationError,
}

impl ErrorCode {
    /// Get the numeric code for this error
    pub fn as_code(&self) -> u16 {
        match self {
            ErrorCode::ValidationError => 1001,

            ErrorCode::PaperNotFound => 4002,

            ErrorCode::QuotaExceeded => 6002,

            ErrorCode::DatabaseError => 7001,
            ErrorCode::ConnectionError => 7002,

            ErrorCode::JudgmentRequestFailed => 8011,
            ErrorCode::JudgmentTimeout => 8012,
            ErrorCode::JudgmentRejected => 8013,

            ErrorCode::ConfigurationError => 9002,
        }
    }
}

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Validation errors
    #[error("Validation failed: {message}")]
    Validation {
        message: String,
        field: Option<String>,
    },

    // Resource errors
    #[error("Paper not found: {id}")]
    PaperNotFound { id: String },

    // Database errors
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    #[error("Database connection error: {message}")]
    DatabaseConnection { message: String },

    // Judgment service errors
    #[error("Judgment request failed: {message}")]
    JudgmentRequest { message: String },

    #[error("Judgment request timed out after {timeout_ms}ms")]
    JudgmentTimeout { timeout_ms: u64 },

    #[error("Judgment service rejected credentials ({status})")]
    JudgmentRejected { status: u16 },

    #[error("Judgment quota exceeded: {message}")]
    QuotaExceeded { message: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
}

impl AppError {
    /// Get the error code for this error
    pub fn code(&self) -> ErrorCode {
        match self {
            AppError::Validation { .. } => ErrorCode::ValidationError,
            AppError::PaperNotFound { .. } => ErrorCode::PaperNotFound,
            AppError::Database(_) => ErrorCode::DatabaseError,
            AppError::DatabaseConnection { .. } => ErrorCode::ConnectionError,
            AppError::JudgmentRequest { .. } => ErrorCode::JudgmentRequestFailed,
            AppError::JudgmentTimeout { .. } => ErrorCode::JudgmentTimeout,
            AppError::JudgmentRejected { .. } => ErrorCode::JudgmentRejected,
            AppError::QuotaExceeded { .. } => ErrorCode::QuotaExceeded,
            AppError::Configuration { .. } | AppError::Config(_) => ErrorCode::ConfigurationError,
        }
    }

    /// Whether this error came from talking to the judgment service
    pub fn is_judgment_failure(&self) -> bool {
        matches!(
            self,
            AppError::JudgmentRequest { .. }
                | AppError::JudgmentTimeout { .. }
                | AppError::JudgmentRejected { .. }
                | AppError::QuotaExceeded { .. }
        )
    }

    /// Whether a later run could reasonably succeed where this one failed
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            AppError::JudgmentRequest { .. }
                | AppError::JudgmentTimeout { .. }
                | AppError::QuotaExceeded { .. }
                | AppError::DatabaseConnection { .. }
        )
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::Validation {
            message: err.to_string(),
            field: err.field_errors().keys().next().map(|k| k.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_mapping() {
        let err = AppError::PaperNotFound { id: "2602.12345".into() };
        assert_eq!(err.code(), ErrorCode::PaperNotFound);
        assert_eq!(err.code().as_code(), 4002);
    }

    #[test]
    fn test_judgment_failures_are_classified() {
        let timeout = AppError::JudgmentTimeout { timeout_ms: 30_000 };
        assert!(timeout.is_judgment_failure());
        assert!(timeout.is_transient());

        let rejected = AppError::JudgmentRejected { status: 401 };
        assert!(rejected.is_judgment_failure());
        assert!(!rejected.is_transient());
    }

    #[test]
    fn test_configuration_error_is_not_judgment_failure() {
        let err = AppError::Configuration {
            message: "heuristic_weight must be numeric".into(),
        };
        assert_eq!(err.code(), ErrorCode::ConfigurationError);
        assert!(!err.is_judgment_failure());
        assert!(!err.is_transient());
    }
}
