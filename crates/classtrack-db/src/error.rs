//! Database-specific error types and conversions.

use classtrack_core::error::ClasstrackError;

/// Database-layer error type.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("SurrealDB error: {0}")]
    Surreal(surrealdb::Error),

    #[error("Migration failed: {0}")]
    Migration(String),

    /// A stored row could not be converted into a domain value, or a
    /// value could not be prepared for storage.
    #[error("Row conversion failed: {0}")]
    Decode(String),

    #[error("Record not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    /// A `DEFINE INDEX ... UNIQUE` rejected the write.
    #[error("Unique index violated: {index}")]
    UniqueViolation { index: String },

    /// The storage engine aborted the transaction with a retryable
    /// read/write conflict.
    #[error("Transaction conflict: {0}")]
    Conflict(String),
}

impl From<surrealdb::Error> for DbError {
    /// Classify a raw SurrealDB error.
    ///
    /// SurrealDB reports unique-index rejections and retryable
    /// transaction conflicts only through the error message, so the
    /// classification is textual. The index name is extracted where
    /// present (message form: ``Database index `name` already
    /// contains ...``).
    fn from(err: surrealdb::Error) -> Self {
        let msg = err.to_string();
        if let Some(rest) = msg.split("Database index `").nth(1) {
            if msg.contains("already contains") {
                let index = rest.split('`').next().unwrap_or("unknown").to_string();
                return DbError::UniqueViolation { index };
            }
        }
        if msg.contains("read or write conflict") || msg.contains("can be retried") {
            return DbError::Conflict(msg);
        }
        DbError::Surreal(err)
    }
}

impl From<DbError> for ClasstrackError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => ClasstrackError::NotFound { entity, id },
            DbError::UniqueViolation { index } => ClasstrackError::ConstraintViolation { index },
            DbError::Conflict(_) => ClasstrackError::PersistenceConflict {
                entity: "transaction".into(),
            },
            other => ClasstrackError::Database(other.to_string()),
        }
    }
}
