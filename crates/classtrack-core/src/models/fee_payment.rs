//! Fee payment domain model.
//!
//! The core invariant: for a given (institute, student, month) at most
//! one payment may ever hold [`PaymentStatus::Paid`]. Pending and
//! overdue rows for the same month are history and may repeat.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentMode {
    Cash,
    Online,
    Cheque,
    Upi,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentStatus {
    Paid,
    Pending,
    Overdue,
}

/// One fee payment row. Once `Paid`, the record is immutable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeePayment {
    pub id: Uuid,
    pub institute_id: Uuid,
    pub student_id: Uuid,
    /// Billing period as a year-month token, e.g. `2025-03`.
    pub month_year: String,
    /// Amount in whole rupees.
    pub amount: i64,
    pub payment_date: Option<DateTime<Utc>>,
    pub mode: PaymentMode,
    pub status: PaymentStatus,
    /// Assigned only when the payment is recorded as paid, in the form
    /// `{institute_code}-REC-{year}-{NNNNN}`. Unique per institute.
    pub receipt_number: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Fields required to insert a payment row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateFeePayment {
    pub institute_id: Uuid,
    pub student_id: Uuid,
    pub month_year: String,
    pub amount: i64,
    pub payment_date: Option<DateTime<Utc>>,
    pub mode: PaymentMode,
    pub status: PaymentStatus,
    pub receipt_number: Option<String>,
}

/// Filters for payment listings.
#[derive(Debug, Clone, Default)]
pub struct FeeFilter {
    pub student_id: Option<Uuid>,
    pub month_year: Option<String>,
    pub status: Option<PaymentStatus>,
}
