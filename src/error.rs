//! Application-wide error types.
//!
//! This module defines the main error type hierarchy for the application,
//! allowing for type-safe error handling throughout the codebase.

pub use crate::carbure::CarbureError;
pub use crate::config::ConfigError;
pub use crate::query::QueryError;

/// Main application error type.
///
/// This is the top-level error type that encompasses all error types
/// in the application. It uses `thiserror` for automatic error derivation
/// and conversion.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// CarbuRe API-related errors
    #[error("CarbuRe API error: {0}")]
    Carbure(#[from] CarbureError),

    /// Rejected list state changes
    #[error("Query error: {0}")]
    Query(#[from] QueryError),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Logger initialization errors
    #[error("Logger error: {0}")]
    Logger(String),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

/// Convenience type alias for Result with AppError
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preferences::PAGE_SIZES;

    #[test]
    fn test_app_error_from_config_error() {
        let config_error = ConfigError::FilePathNotSet;
        let app_error: AppError = config_error.into();
        assert!(matches!(app_error, AppError::Config(_)));
        assert!(app_error.to_string().contains("Configuration error"));
    }

    #[test]
    fn test_app_error_from_carbure_error() {
        let carbure_error = CarbureError::ApiError {
            status: 403,
            message: "Forbidden".to_string(),
        };
        let app_error: AppError = carbure_error.into();
        assert!(matches!(app_error, AppError::Carbure(_)));
        assert!(app_error.to_string().contains("CarbuRe API error"));
        assert!(app_error.to_string().contains("403"));
    }

    #[test]
    fn test_app_error_from_query_error() {
        let query_error = QueryError::UnsupportedPageSize {
            size: 30,
            allowed: PAGE_SIZES,
        };
        let app_error: AppError = query_error.into();
        assert!(matches!(app_error, AppError::Query(_)));
        assert!(app_error.to_string().contains("Query error"));
    }

    #[test]
    fn test_app_error_from_io_error() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "File not found");
        let app_error: AppError = io_error.into();
        assert!(matches!(app_error, AppError::Io(_)));
        assert!(app_error.to_string().contains("I/O error"));
    }

    #[test]
    fn test_app_error_other() {
        let error = AppError::Other("Generic error".to_string());
        assert_eq!(error.to_string(), "Generic error");
    }
}
