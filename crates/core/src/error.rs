// Central Error Type for the Application

use thiserror::Error;

/// Application-level error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Domain error: {0}")]
    Domain(#[from] crate::domain::DomainError),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Catalog error: {0}")]
    Catalog(String),

    #[error("Advisory lock error: {0}")]
    Lock(String),

    #[error("Table maintenance failed on {table}: {reason}")]
    Execution { table: String, reason: String },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Wrap a lower-level failure that happened while reading the catalog.
    ///
    /// Catalog failures abort the whole cycle, so the caller keeps the
    /// original message for the trigger's log.
    pub fn catalog(context: &str, err: AppError) -> Self {
        AppError::Catalog(format!("{}: {}", context, err))
    }
}

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;

// Note: sqlx::Error conversion is handled in infra-postgres
// by converting to AppError::Database(String)
