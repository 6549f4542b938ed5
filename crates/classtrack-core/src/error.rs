//! Error types for the CLASSTRACK system.

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::models::fee_payment::PaymentMode;

#[derive(Debug, Error)]
pub enum ClasstrackError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Entity already exists: {entity}")]
    AlreadyExists { entity: String },

    /// A store-level uniqueness rule rejected a write. The index name
    /// tells the caller which constraint fired.
    #[error("Unique constraint violated: {index}")]
    ConstraintViolation { index: String },

    /// Identifier allocation gave up after bounded retries. Retryable
    /// by the caller after backoff; never turned into a fabricated
    /// identifier.
    #[error("Identifier allocation exhausted after {attempts} attempts")]
    AllocationExhausted { attempts: u32 },

    /// A paid record already exists for this (student, month). The
    /// existing record's identity travels with the error so the caller
    /// can present a precise conflict message.
    #[error("Fees already paid for this month (receipt {receipt_number})")]
    DuplicatePayment {
        receipt_number: String,
        amount: i64,
        paid_at: Option<DateTime<Utc>>,
        mode: PaymentMode,
    },

    /// An optimistic check passed but the write lost the race. The
    /// caller must redo the whole check-then-act sequence, not just
    /// repeat the write.
    #[error("Lost a write race on {entity}; redo the operation")]
    PersistenceConflict { entity: String },

    #[error("Authentication failed: {reason}")]
    AuthenticationFailed { reason: String },

    #[error("Institute subscription has expired")]
    SubscriptionInactive,

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Database error: {0}")]
    Database(String),

    #[error("Notification error: {0}")]
    Notification(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type ClasstrackResult<T> = Result<T, ClasstrackError>;
