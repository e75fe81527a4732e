//! Error handling for the Zaiko inventory engine
//!
//! The feed read path never fails (it degrades to empty data); everything
//! that can fail returns `AppResult`.

use thiserror::Error;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Validation errors
    #[error("Validation error: {message}")]
    Validation { field: String, message: String },

    #[error("Resource not found: {0}")]
    NotFound(String),

    // Business logic errors
    #[error("Conflict: {0}")]
    Conflict(String),

    // Feed and export errors
    #[error("Feed write error: {0}")]
    FeedWrite(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Configuration error: {0}")]
    Configuration(#[from] config::ConfigError),

    // Database errors
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    // Internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Stable machine-readable code for the error
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Validation { .. } => "VALIDATION_ERROR",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Conflict(_) => "CONFLICT",
            AppError::FeedWrite(_) => "FEED_WRITE_ERROR",
            AppError::Csv(_) => "CSV_ERROR",
            AppError::Configuration(_) => "CONFIGURATION_ERROR",
            AppError::DatabaseError(e) if is_serialization_failure(e) => "CONFLICT",
            AppError::DatabaseError(_) => "DATABASE_ERROR",
            AppError::Migration(_) => "MIGRATION_ERROR",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        AppError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let (field, message) = errors
            .errors()
            .iter()
            .find_map(|(field, kind)| match kind {
                validator::ValidationErrorsKind::Field(errs) => errs.first().map(|e| {
                    let msg = e
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| e.code.to_string());
                    let field: &str = if *field == "__all__" { "input" } else { *field };
                    (field.to_string(), msg)
                }),
                _ => None,
            })
            .unwrap_or_else(|| ("input".to_string(), errors.to_string()));

        AppError::Validation { field, message }
    }
}

/// PostgreSQL SQLSTATE 40001 (serialization_failure) or 40P01 (deadlock)
fn is_serialization_failure(e: &sqlx::Error) -> bool {
    match e {
        sqlx::Error::Database(db) => matches!(db.code().as_deref(), Some("40001") | Some("40P01")),
        _ => false,
    }
}

/// Result type alias for services
pub type AppResult<T> = Result<T, AppError>;
