//! Daily attendance marking and absence notifications.
//!
//! Marking is an upsert on (student, date): re-marking a day updates
//! the existing record instead of creating a second one. When a
//! student is marked absent and a notifier is configured, an SMS goes
//! out to the parent and the delivery outcome is recorded on the row;
//! a failed notification never fails the marking request.

use chrono::NaiveDate;
use classtrack_core::context::TenantContext;
use classtrack_core::error::{ClasstrackError, ClasstrackResult};
use classtrack_core::models::attendance::{
    Attendance, AttendanceFilter, AttendanceStatus, CreateAttendance, SmsStatus, UpdateAttendance,
};
use classtrack_core::notify::AbsenceNotifier;
use classtrack_core::repository::{AttendanceRepository, StudentRepository};
use tracing::warn;
use uuid::Uuid;

/// One marking instruction.
#[derive(Debug, Clone)]
pub struct MarkAttendance {
    pub student_id: Uuid,
    pub date: NaiveDate,
    pub status: AttendanceStatus,
}

/// Counts for one day's sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttendanceSummary {
    pub date: NaiveDate,
    pub present: u64,
    pub absent: u64,
    /// Active students with no record for the day.
    pub not_marked: u64,
}

/// Attendance service.
#[derive(Clone)]
pub struct AttendanceService<A, S, N>
where
    A: AttendanceRepository,
    S: StudentRepository,
    N: AbsenceNotifier,
{
    attendance_repo: A,
    student_repo: S,
    notifier: Option<N>,
}

impl<A, S, N> AttendanceService<A, S, N>
where
    A: AttendanceRepository,
    S: StudentRepository,
    N: AbsenceNotifier,
{
    pub fn new(attendance_repo: A, student_repo: S, notifier: Option<N>) -> Self {
        Self {
            attendance_repo,
            student_repo,
            notifier,
        }
    }

    /// Mark one student for one day, upserting on (student, date).
    pub async fn mark(
        &self,
        ctx: &TenantContext,
        input: MarkAttendance,
        marked_by: Option<Uuid>,
    ) -> ClasstrackResult<Attendance> {
        // The student must exist in this tenant.
        let student = self
            .student_repo
            .get(ctx.institute_id, input.student_id)
            .await?;

        let record = match self
            .attendance_repo
            .find_for_date(ctx.institute_id, input.student_id, input.date)
            .await?
        {
            Some(existing) => {
                self.attendance_repo
                    .update(
                        ctx.institute_id,
                        existing.id,
                        UpdateAttendance {
                            status: Some(input.status),
                            marked_by,
                            ..UpdateAttendance::default()
                        },
                    )
                    .await?
            }
            None => {
                self.attendance_repo
                    .create(CreateAttendance {
                        institute_id: ctx.institute_id,
                        student_id: input.student_id,
                        date: input.date,
                        status: input.status,
                        marked_by,
                    })
                    .await?
            }
        };

        if input.status == AttendanceStatus::Absent {
            if let Some(notifier) = &self.notifier {
                let sms_status = match notifier
                    .notify_absence(
                        &student.name,
                        &student.contact_number,
                        input.date,
                        &ctx.institute_name,
                    )
                    .await
                {
                    Ok(()) => SmsStatus::Sent,
                    Err(e) => {
                        warn!(
                            institute = %ctx.institute_code,
                            student = %student.student_code,
                            date = %input.date,
                            error = %e,
                            "absence SMS failed"
                        );
                        SmsStatus::Failed
                    }
                };

                return self
                    .attendance_repo
                    .update(
                        ctx.institute_id,
                        record.id,
                        UpdateAttendance {
                            sms_status: Some(sms_status),
                            ..UpdateAttendance::default()
                        },
                    )
                    .await;
            }
        }

        Ok(record)
    }

    /// Mark a whole day's sheet. Entries referencing students not in
    /// the tenant are skipped with a warning; everything else goes
    /// through [`Self::mark`].
    pub async fn bulk_mark(
        &self,
        ctx: &TenantContext,
        entries: Vec<MarkAttendance>,
        marked_by: Option<Uuid>,
    ) -> ClasstrackResult<Vec<Attendance>> {
        let mut marked = Vec::with_capacity(entries.len());
        for entry in entries {
            match self.mark(ctx, entry.clone(), marked_by).await {
                Ok(record) => marked.push(record),
                Err(ClasstrackError::NotFound { .. }) => {
                    warn!(
                        institute = %ctx.institute_code,
                        student_id = %entry.student_id,
                        "skipping attendance for unknown student"
                    );
                }
                Err(e) => return Err(e),
            }
        }
        Ok(marked)
    }

    /// Present/absent/not-marked counts for one day.
    pub async fn today_summary(
        &self,
        ctx: &TenantContext,
        date: NaiveDate,
    ) -> ClasstrackResult<AttendanceSummary> {
        let records = self
            .attendance_repo
            .list(
                ctx.institute_id,
                AttendanceFilter {
                    date: Some(date),
                    ..AttendanceFilter::default()
                },
            )
            .await?;

        let present = records
            .iter()
            .filter(|r| r.status == AttendanceStatus::Present)
            .count() as u64;
        let absent = records.len() as u64 - present;

        let active = self.student_repo.count_active(ctx.institute_id).await?;
        let not_marked = active.saturating_sub(present + absent);

        Ok(AttendanceSummary {
            date,
            present,
            absent,
            not_marked,
        })
    }

    /// Attendance history for the tenant, filtered.
    pub async fn list(
        &self,
        ctx: &TenantContext,
        filter: AttendanceFilter,
    ) -> ClasstrackResult<Vec<Attendance>> {
        self.attendance_repo.list(ctx.institute_id, filter).await
    }
}
