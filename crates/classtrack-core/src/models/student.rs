//! Student domain model.
//!
//! Students are never physically deleted: removal flips the status to
//! [`StudentStatus::Inactive`] so the allocated `student_code` suffix
//! stays on record and is never reused.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Examination board a student is enrolled under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Board {
    Cbse,
    Icse,
    StateBoard,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StudentStatus {
    Active,
    Inactive,
}

/// A student enrolled at one institute.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Student {
    pub id: Uuid,
    pub institute_id: Uuid,
    /// Tenant-scoped human identifier, `{institute_code}-{NNNN}` with a
    /// zero-padded 4-digit suffix. Unique per institute; suffixes are
    /// strictly increasing and never reused.
    pub student_code: String,
    pub name: String,
    pub class_name: String,
    pub board: Board,
    pub admission_date: DateTime<Utc>,
    pub parent_name: String,
    /// 10-digit parent contact number; target of absence SMS.
    pub contact_number: String,
    pub email: Option<String>,
    /// Monthly tuition fee in whole rupees.
    pub monthly_fee: i64,
    pub status: StudentStatus,
    pub created_at: DateTime<Utc>,
}

/// Fields required to create a student record.
///
/// `student_code` is assigned by the identifier allocator, never by
/// the caller directly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateStudent {
    pub institute_id: Uuid,
    pub student_code: String,
    pub name: String,
    pub class_name: String,
    pub board: Board,
    pub parent_name: String,
    pub contact_number: String,
    pub email: Option<String>,
    pub monthly_fee: i64,
}

/// Fields that can be updated on an existing student.
///
/// `student_code` is deliberately absent: once allocated it is
/// immutable.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateStudent {
    pub name: Option<String>,
    pub class_name: Option<String>,
    pub board: Option<Board>,
    pub parent_name: Option<String>,
    pub contact_number: Option<String>,
    pub email: Option<Option<String>>,
    pub monthly_fee: Option<i64>,
    pub status: Option<StudentStatus>,
}

/// Filters for student listings.
#[derive(Debug, Clone, Default)]
pub struct StudentFilter {
    pub class_name: Option<String>,
    pub board: Option<Board>,
    pub status: Option<StudentStatus>,
    /// Case-insensitive match against name, student code, or parent
    /// name.
    pub search: Option<String>,
}
