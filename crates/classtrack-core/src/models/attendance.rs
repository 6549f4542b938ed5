//! Attendance domain model.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttendanceStatus {
    Present,
    Absent,
}

/// Delivery state of the absence SMS for one attendance record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SmsStatus {
    Sent,
    Failed,
    NotSent,
}

/// One student's attendance for one calendar day.
///
/// At most one record exists per (institute, student, date);
/// re-marking the same day updates the existing row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attendance {
    pub id: Uuid,
    pub institute_id: Uuid,
    pub student_id: Uuid,
    pub date: NaiveDate,
    pub status: AttendanceStatus,
    /// User who marked the record, if known.
    pub marked_by: Option<Uuid>,
    pub sms_status: SmsStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAttendance {
    pub institute_id: Uuid,
    pub student_id: Uuid,
    pub date: NaiveDate,
    pub status: AttendanceStatus,
    pub marked_by: Option<Uuid>,
}

/// Fields that can be updated on an existing attendance record.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateAttendance {
    pub status: Option<AttendanceStatus>,
    pub marked_by: Option<Uuid>,
    pub sms_status: Option<SmsStatus>,
}

/// Filters for attendance listings.
#[derive(Debug, Clone, Default)]
pub struct AttendanceFilter {
    pub student_id: Option<Uuid>,
    pub date: Option<NaiveDate>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}
