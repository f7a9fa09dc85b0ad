//! Store error types.

use thiserror::Error;

/// Errors raised by the relational store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No row with the requested id.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: i64 },

    /// A UNIQUE index rejected the write.
    #[error("unique constraint violated: {message}")]
    UniqueViolation { message: String },

    /// A referenced row does not exist.
    #[error("foreign key constraint violated: {message}")]
    ForeignKeyViolation { message: String },

    /// A module migration could not be applied.
    #[error("migration {module}/{id} failed: {source}")]
    Migration {
        module: String,
        id: String,
        #[source]
        source: sqlx::Error,
    },

    /// Any other driver error.
    #[error("database error: {0}")]
    Database(#[source] sqlx::Error),
}

impl StoreError {
    pub fn not_found(entity: &'static str, id: i64) -> Self {
        Self::NotFound { entity, id }
    }

    pub fn is_unique_violation(&self) -> bool {
        matches!(self, Self::UniqueViolation { .. })
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(ref db_err) = err {
            if db_err.is_unique_violation() {
                return Self::UniqueViolation {
                    message: db_err.message().to_string(),
                };
            }
            if db_err.is_foreign_key_violation() {
                return Self::ForeignKeyViolation {
                    message: db_err.message().to_string(),
                };
            }
        }
        Self::Database(err)
    }
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
