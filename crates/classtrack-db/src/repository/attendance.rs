//! SurrealDB implementation of [`AttendanceRepository`].
//!
//! Dates are stored as `YYYY-MM-DD` strings so the compound unique
//! index `(institute_id, student_id, date)` compares whole calendar
//! days, never timestamps.

use chrono::{DateTime, NaiveDate, Utc};
use classtrack_core::error::ClasstrackResult;
use classtrack_core::models::attendance::{
    Attendance, AttendanceFilter, AttendanceStatus, CreateAttendance, SmsStatus, UpdateAttendance,
};
use classtrack_core::repository::AttendanceRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::DbError;

const DATE_FMT: &str = "%Y-%m-%d";

/// DB-side row struct for queries where the UUID is already known.
#[derive(Debug, SurrealValue)]
struct AttendanceRow {
    institute_id: String,
    student_id: String,
    date: String,
    status: String,
    marked_by: Option<String>,
    sms_status: String,
    created_at: DateTime<Utc>,
}

/// DB-side row struct that includes the record ID via `meta::id(id)`.
#[derive(Debug, SurrealValue)]
struct AttendanceRowWithId {
    record_id: String,
    institute_id: String,
    student_id: String,
    date: String,
    status: String,
    marked_by: Option<String>,
    sms_status: String,
    created_at: DateTime<Utc>,
}

fn parse_status(s: &str) -> Result<AttendanceStatus, DbError> {
    match s {
        "Present" => Ok(AttendanceStatus::Present),
        "Absent" => Ok(AttendanceStatus::Absent),
        other => Err(DbError::Decode(format!(
            "unknown attendance status: {other}"
        ))),
    }
}

fn status_to_string(s: AttendanceStatus) -> &'static str {
    match s {
        AttendanceStatus::Present => "Present",
        AttendanceStatus::Absent => "Absent",
    }
}

fn parse_sms_status(s: &str) -> Result<SmsStatus, DbError> {
    match s {
        "Sent" => Ok(SmsStatus::Sent),
        "Failed" => Ok(SmsStatus::Failed),
        "NotSent" => Ok(SmsStatus::NotSent),
        other => Err(DbError::Decode(format!("unknown sms status: {other}"))),
    }
}

fn sms_status_to_string(s: SmsStatus) -> &'static str {
    match s {
        SmsStatus::Sent => "Sent",
        SmsStatus::Failed => "Failed",
        SmsStatus::NotSent => "NotSent",
    }
}

fn parse_date(s: &str) -> Result<NaiveDate, DbError> {
    NaiveDate::parse_from_str(s, DATE_FMT)
        .map_err(|e| DbError::Decode(format!("invalid date: {e}")))
}

fn parse_marked_by(s: Option<&str>) -> Result<Option<Uuid>, DbError> {
    s.map(|v| {
        Uuid::parse_str(v).map_err(|e| DbError::Decode(format!("invalid marker UUID: {e}")))
    })
    .transpose()
}

impl AttendanceRow {
    fn into_attendance(self, id: Uuid) -> Result<Attendance, DbError> {
        let institute_id = Uuid::parse_str(&self.institute_id)
            .map_err(|e| DbError::Decode(format!("invalid institute UUID: {e}")))?;
        let student_id = Uuid::parse_str(&self.student_id)
            .map_err(|e| DbError::Decode(format!("invalid student UUID: {e}")))?;
        Ok(Attendance {
            id,
            institute_id,
            student_id,
            date: parse_date(&self.date)?,
            status: parse_status(&self.status)?,
            marked_by: parse_marked_by(self.marked_by.as_deref())?,
            sms_status: parse_sms_status(&self.sms_status)?,
            created_at: self.created_at,
        })
    }
}

impl AttendanceRowWithId {
    fn try_into_attendance(self) -> Result<Attendance, DbError> {
        let id = Uuid::parse_str(&self.record_id)
            .map_err(|e| DbError::Decode(format!("invalid UUID: {e}")))?;
        let institute_id = Uuid::parse_str(&self.institute_id)
            .map_err(|e| DbError::Decode(format!("invalid institute UUID: {e}")))?;
        let student_id = Uuid::parse_str(&self.student_id)
            .map_err(|e| DbError::Decode(format!("invalid student UUID: {e}")))?;
        Ok(Attendance {
            id,
            institute_id,
            student_id,
            date: parse_date(&self.date)?,
            status: parse_status(&self.status)?,
            marked_by: parse_marked_by(self.marked_by.as_deref())?,
            sms_status: parse_sms_status(&self.sms_status)?,
            created_at: self.created_at,
        })
    }
}

/// SurrealDB implementation of the Attendance repository.
#[derive(Clone)]
pub struct SurrealAttendanceRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealAttendanceRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> AttendanceRepository for SurrealAttendanceRepository<C> {
    async fn create(&self, input: CreateAttendance) -> ClasstrackResult<Attendance> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "CREATE type::record('attendance', $id) SET \
                 institute_id = $institute_id, \
                 student_id = $student_id, date = $date, \
                 status = $status, marked_by = $marked_by, \
                 sms_status = 'NotSent'",
            )
            .bind(("id", id_str.clone()))
            .bind(("institute_id", input.institute_id.to_string()))
            .bind(("student_id", input.student_id.to_string()))
            .bind(("date", input.date.format(DATE_FMT).to_string()))
            .bind(("status", status_to_string(input.status).to_string()))
            .bind(("marked_by", input.marked_by.map(|u| u.to_string())))
            .await
            .map_err(DbError::from)?;

        let mut result = result.check().map_err(DbError::from)?;

        let rows: Vec<AttendanceRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "attendance".into(),
            id: id_str,
        })?;

        Ok(row.into_attendance(id)?)
    }

    async fn find_for_date(
        &self,
        institute_id: Uuid,
        student_id: Uuid,
        date: NaiveDate,
    ) -> ClasstrackResult<Option<Attendance>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM attendance \
                 WHERE institute_id = $institute_id \
                 AND student_id = $student_id AND date = $date",
            )
            .bind(("institute_id", institute_id.to_string()))
            .bind(("student_id", student_id.to_string()))
            .bind(("date", date.format(DATE_FMT).to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<AttendanceRowWithId> = result.take(0).map_err(DbError::from)?;
        match rows.into_iter().next() {
            Some(row) => Ok(Some(row.try_into_attendance()?)),
            None => Ok(None),
        }
    }

    async fn update(
        &self,
        institute_id: Uuid,
        id: Uuid,
        input: UpdateAttendance,
    ) -> ClasstrackResult<Attendance> {
        let id_str = id.to_string();

        let mut sets = Vec::new();
        if input.status.is_some() {
            sets.push("status = $status");
        }
        if input.marked_by.is_some() {
            sets.push("marked_by = $marked_by");
        }
        if input.sms_status.is_some() {
            sets.push("sms_status = $sms_status");
        }

        // With nothing to change, fall through to UPDATE with a no-op
        // set so the current row is still returned.
        if sets.is_empty() {
            sets.push("status = status");
        }

        let query = format!(
            "UPDATE type::record('attendance', $id) SET {} \
             WHERE institute_id = $institute_id",
            sets.join(", ")
        );

        let mut builder = self
            .db
            .query(&query)
            .bind(("id", id_str.clone()))
            .bind(("institute_id", institute_id.to_string()));

        if let Some(status) = input.status {
            builder = builder.bind(("status", status_to_string(status).to_string()));
        }
        if let Some(marked_by) = input.marked_by {
            builder = builder.bind(("marked_by", Some(marked_by.to_string())));
        }
        if let Some(sms_status) = input.sms_status {
            builder = builder.bind(("sms_status", sms_status_to_string(sms_status).to_string()));
        }

        let result = builder.await.map_err(DbError::from)?;
        let mut result = result.check().map_err(DbError::from)?;

        let rows: Vec<AttendanceRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "attendance".into(),
            id: id_str,
        })?;

        Ok(row.into_attendance(id)?)
    }

    async fn list(
        &self,
        institute_id: Uuid,
        filter: AttendanceFilter,
    ) -> ClasstrackResult<Vec<Attendance>> {
        let mut conditions = vec!["institute_id = $institute_id"];
        if filter.student_id.is_some() {
            conditions.push("student_id = $student_id");
        }
        if filter.date.is_some() {
            conditions.push("date = $date");
        }
        if filter.from.is_some() {
            conditions.push("date >= $from");
        }
        if filter.to.is_some() {
            conditions.push("date <= $to");
        }

        let query = format!(
            "SELECT meta::id(id) AS record_id, * FROM attendance \
             WHERE {} \
             ORDER BY date DESC",
            conditions.join(" AND ")
        );

        let mut builder = self
            .db
            .query(&query)
            .bind(("institute_id", institute_id.to_string()));
        if let Some(student_id) = filter.student_id {
            builder = builder.bind(("student_id", student_id.to_string()));
        }
        if let Some(date) = filter.date {
            builder = builder.bind(("date", date.format(DATE_FMT).to_string()));
        }
        if let Some(from) = filter.from {
            builder = builder.bind(("from", from.format(DATE_FMT).to_string()));
        }
        if let Some(to) = filter.to {
            builder = builder.bind(("to", to.format(DATE_FMT).to_string()));
        }

        let mut result = builder.await.map_err(DbError::from)?;
        let rows: Vec<AttendanceRowWithId> = result.take(0).map_err(DbError::from)?;
        let items = rows
            .into_iter()
            .map(|row| row.try_into_attendance())
            .collect::<Result<Vec<_>, DbError>>()?;
        Ok(items)
    }
}
