//! Errors surfaced by the document and blob stores.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("stored document is malformed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("that username is already taken")]
    DuplicateUsername,
}

impl StoreError {
    /// True when the underlying failure is a UNIQUE constraint violation
    pub fn is_unique_violation(&self) -> bool {
        match self {
            StoreError::Database(sqlx::Error::Database(db_err)) => {
                db_err.is_unique_violation()
                    || db_err.message().contains("UNIQUE constraint failed")
            }
            StoreError::DuplicateUsername => true,
            _ => false,
        }
    }
}
