//! Integration tests for attendance marking: the per-day upsert, SMS
//! bookkeeping, and the daily summary.

use std::sync::{Arc, Mutex};

use chrono::{Duration, NaiveDate, Utc};
use classtrack_core::TenantContext;
use classtrack_core::error::{ClasstrackError, ClasstrackResult};
use classtrack_core::models::attendance::{AttendanceStatus, SmsStatus};
use classtrack_core::models::institute::{CreateInstitute, SubscriptionStatus};
use classtrack_core::models::student::{Board, CreateStudent, Student};
use classtrack_core::notify::{AbsenceNotifier, NoopNotifier};
use classtrack_core::repository::{InstituteRepository, StudentRepository};
use classtrack_db::repository::{
    SurrealAttendanceRepository, SurrealInstituteRepository, SurrealStudentRepository,
};
use classtrack_db::run_migrations;
use classtrack_registrar::{AttendanceService, MarkAttendance};
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem};

/// Records every notification; optionally fails them all.
#[derive(Clone, Default)]
struct RecordingNotifier {
    calls: Arc<Mutex<Vec<(String, String)>>>,
    fail: bool,
}

impl AbsenceNotifier for RecordingNotifier {
    async fn notify_absence(
        &self,
        student_name: &str,
        contact_number: &str,
        _date: NaiveDate,
        _institute_name: &str,
    ) -> ClasstrackResult<()> {
        self.calls
            .lock()
            .expect("lock")
            .push((student_name.to_string(), contact_number.to_string()));
        if self.fail {
            Err(ClasstrackError::Notification("provider down".into()))
        } else {
            Ok(())
        }
    }
}

async fn setup() -> (Surreal<Db>, TenantContext) {
    let db = Surreal::new::<Mem>(()).await.expect("in-memory db");
    db.use_ns("test").use_db("test").await.expect("ns/db");
    run_migrations(&db).await.expect("migrations");

    let institutes = SurrealInstituteRepository::new(db.clone());
    let institute = institutes
        .create(CreateInstitute {
            name: "ABC Tutorials".into(),
            code: "ABC1".into(),
            address: "14 MG Road".into(),
            contact_number: "9876543210".into(),
            email: "owner@abc.example".into(),
            owner_name: "Owner".into(),
            subscription_status: SubscriptionStatus::Active,
            subscription_expiry: Utc::now() + Duration::days(365),
        })
        .await
        .expect("institute");

    let ctx = TenantContext {
        institute_id: institute.id,
        institute_code: institute.code,
        institute_name: institute.name,
    };
    (db, ctx)
}

async fn seed_student(db: &Surreal<Db>, ctx: &TenantContext, suffix: u32) -> Student {
    SurrealStudentRepository::new(db.clone())
        .create(CreateStudent {
            institute_id: ctx.institute_id,
            student_code: format!("{}-{:04}", ctx.institute_code, suffix),
            name: format!("Student {suffix}"),
            class_name: "10".into(),
            board: Board::Cbse,
            parent_name: "Parent".into(),
            contact_number: "9000000001".into(),
            email: None,
            monthly_fee: 1500,
        })
        .await
        .expect("student")
}

fn service_with<N: AbsenceNotifier>(
    db: &Surreal<Db>,
    notifier: Option<N>,
) -> AttendanceService<SurrealAttendanceRepository<Db>, SurrealStudentRepository<Db>, N> {
    AttendanceService::new(
        SurrealAttendanceRepository::new(db.clone()),
        SurrealStudentRepository::new(db.clone()),
        notifier,
    )
}

fn day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 3, 14).expect("date")
}

#[tokio::test]
async fn remarking_a_day_updates_the_same_record() {
    let (db, ctx) = setup().await;
    let service = service_with::<NoopNotifier>(&db, None);
    let student = seed_student(&db, &ctx, 1).await;

    let first = service
        .mark(
            &ctx,
            MarkAttendance {
                student_id: student.id,
                date: day(),
                status: AttendanceStatus::Present,
            },
            None,
        )
        .await
        .expect("first mark");

    let second = service
        .mark(
            &ctx,
            MarkAttendance {
                student_id: student.id,
                date: day(),
                status: AttendanceStatus::Absent,
            },
            None,
        )
        .await
        .expect("re-mark");

    assert_eq!(second.id, first.id);
    assert_eq!(second.status, AttendanceStatus::Absent);
}

#[tokio::test]
async fn absence_sends_sms_and_records_delivery() {
    let (db, ctx) = setup().await;
    let notifier = RecordingNotifier::default();
    let service = service_with(&db, Some(notifier.clone()));
    let student = seed_student(&db, &ctx, 1).await;

    let record = service
        .mark(
            &ctx,
            MarkAttendance {
                student_id: student.id,
                date: day(),
                status: AttendanceStatus::Absent,
            },
            None,
        )
        .await
        .expect("mark absent");

    assert_eq!(record.sms_status, SmsStatus::Sent);
    let calls = notifier.calls.lock().expect("lock");
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0], ("Student 1".to_string(), "9000000001".to_string()));
}

#[tokio::test]
async fn failed_sms_is_recorded_but_does_not_fail_the_mark() {
    let (db, ctx) = setup().await;
    let notifier = RecordingNotifier {
        fail: true,
        ..RecordingNotifier::default()
    };
    let service = service_with(&db, Some(notifier.clone()));
    let student = seed_student(&db, &ctx, 1).await;

    let record = service
        .mark(
            &ctx,
            MarkAttendance {
                student_id: student.id,
                date: day(),
                status: AttendanceStatus::Absent,
            },
            None,
        )
        .await
        .expect("mark succeeds despite SMS failure");

    assert_eq!(record.sms_status, SmsStatus::Failed);
}

#[tokio::test]
async fn present_marks_send_no_sms() {
    let (db, ctx) = setup().await;
    let notifier = RecordingNotifier::default();
    let service = service_with(&db, Some(notifier.clone()));
    let student = seed_student(&db, &ctx, 1).await;

    let record = service
        .mark(
            &ctx,
            MarkAttendance {
                student_id: student.id,
                date: day(),
                status: AttendanceStatus::Present,
            },
            None,
        )
        .await
        .expect("mark present");

    assert_eq!(record.sms_status, SmsStatus::NotSent);
    assert!(notifier.calls.lock().expect("lock").is_empty());
}

#[tokio::test]
async fn bulk_mark_skips_unknown_students() {
    let (db, ctx) = setup().await;
    let service = service_with::<NoopNotifier>(&db, None);
    let student = seed_student(&db, &ctx, 1).await;

    let marked = service
        .bulk_mark(
            &ctx,
            vec![
                MarkAttendance {
                    student_id: student.id,
                    date: day(),
                    status: AttendanceStatus::Present,
                },
                MarkAttendance {
                    student_id: uuid::Uuid::new_v4(),
                    date: day(),
                    status: AttendanceStatus::Absent,
                },
            ],
            None,
        )
        .await
        .expect("bulk mark");

    assert_eq!(marked.len(), 1);
    assert_eq!(marked[0].student_id, student.id);
}

#[tokio::test]
async fn today_summary_counts_the_sheet() {
    let (db, ctx) = setup().await;
    let service = service_with::<NoopNotifier>(&db, None);
    let a = seed_student(&db, &ctx, 1).await;
    let b = seed_student(&db, &ctx, 2).await;
    let _unmarked = seed_student(&db, &ctx, 3).await;

    service
        .mark(
            &ctx,
            MarkAttendance {
                student_id: a.id,
                date: day(),
                status: AttendanceStatus::Present,
            },
            None,
        )
        .await
        .expect("mark a");
    service
        .mark(
            &ctx,
            MarkAttendance {
                student_id: b.id,
                date: day(),
                status: AttendanceStatus::Absent,
            },
            None,
        )
        .await
        .expect("mark b");

    let summary = service.today_summary(&ctx, day()).await.expect("summary");
    assert_eq!(summary.present, 1);
    assert_eq!(summary.absent, 1);
    assert_eq!(summary.not_marked, 1);
}
