//! Unified error handling.
//!
//! A single error type for the repository layer and the services built on
//! it. Absence is never an error at the repository level (`Ok(None)`), so
//! `NotFound` is produced only by callers that require a row.

use domain::DomainError;
use thiserror::Error;

/// Application error types.
#[derive(Error, Debug)]
pub enum AppError {
    // Resource errors
    #[error("Resource not found")]
    NotFound,

    #[error("{0} already exists")]
    Conflict(String),

    // Validation
    #[error("{0}")]
    Validation(String),

    // Wiring defects: missing actor, unknown column
    #[error("Configuration error: {0}")]
    Configuration(String),

    // External service errors
    #[cfg(feature = "database")]
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // Internal
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Get error code for client
    pub fn code(&self) -> &'static str {
        match self {
            AppError::NotFound => "NOT_FOUND",
            AppError::Conflict(_) => "CONFLICT",
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::Configuration(_) => "CONFIGURATION_ERROR",
            #[cfg(feature = "database")]
            AppError::Database(_) => "DATABASE_ERROR",
            AppError::Serialization(_) => "SERIALIZATION_ERROR",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// True for errors caused by how the layer was wired rather than by data
    pub fn is_configuration(&self) -> bool {
        matches!(self, AppError::Configuration(_))
    }
}

// =============================================================================
// Domain Error Conversion
// =============================================================================

impl From<DomainError> for AppError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::Validation(msg) => AppError::Validation(msg),
        }
    }
}

/// Result type alias
pub type AppResult<T> = Result<T, AppError>;

/// Extension trait for Option -> AppError conversion
pub trait OptionExt<T> {
    fn ok_or_not_found(self) -> AppResult<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn ok_or_not_found(self) -> AppResult<T> {
        self.ok_or(AppError::NotFound)
    }
}

/// Convenience constructors
impl AppError {
    pub fn conflict(entity: impl Into<String>) -> Self {
        AppError::Conflict(entity.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        AppError::Validation(msg.into())
    }

    pub fn configuration(msg: impl Into<String>) -> Self {
        AppError::Configuration(msg.into())
    }

    /// A stamped write ran without an actor in scope
    pub fn missing_actor(operation: &str) -> Self {
        AppError::Configuration(format!("no actor in context for {operation}"))
    }

    /// A filter or ordering referenced a column the entity does not have
    pub fn unknown_column(column: &str) -> Self {
        AppError::Configuration(format!("unknown column `{column}`"))
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        AppError::Internal(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_actor_is_a_configuration_error() {
        let err = AppError::missing_actor("create");
        assert!(err.is_configuration());
        assert_eq!(err.code(), "CONFIGURATION_ERROR");
        assert_eq!(err.to_string(), "Configuration error: no actor in context for create");
    }

    #[test]
    fn domain_errors_map_to_app_errors() {
        let err: AppError = DomainError::validation("bad").into();
        assert!(matches!(err, AppError::Validation(msg) if msg == "bad"));
    }

    #[test]
    fn none_becomes_not_found() {
        let missing: Option<u8> = None;
        assert!(matches!(missing.ok_or_not_found(), Err(AppError::NotFound)));
        assert_eq!(Some(3).ok_or_not_found().unwrap(), 3);
    }
}
