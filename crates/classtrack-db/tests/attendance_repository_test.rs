//! Integration tests for the attendance repository.

use chrono::NaiveDate;
use classtrack_core::error::ClasstrackError;
use classtrack_core::models::attendance::{
    AttendanceFilter, AttendanceStatus, CreateAttendance, SmsStatus, UpdateAttendance,
};
use classtrack_core::repository::AttendanceRepository;
use classtrack_db::repository::SurrealAttendanceRepository;
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem};
use uuid::Uuid;

async fn setup() -> Surreal<Db> {
    let db = Surreal::new::<Mem>(()).await.expect("in-memory db");
    db.use_ns("test").use_db("test").await.expect("ns/db");
    classtrack_db::run_migrations(&db).await.expect("migrations");
    db
}

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 3, d).expect("date")
}

fn mark_input(
    institute_id: Uuid,
    student_id: Uuid,
    date: NaiveDate,
    status: AttendanceStatus,
) -> CreateAttendance {
    CreateAttendance {
        institute_id,
        student_id,
        date,
        status,
        marked_by: None,
    }
}

#[tokio::test]
async fn create_and_find_roundtrip() {
    let db = setup().await;
    let repo = SurrealAttendanceRepository::new(db);
    let institute_id = Uuid::new_v4();
    let student_id = Uuid::new_v4();

    let created = repo
        .create(mark_input(
            institute_id,
            student_id,
            day(14),
            AttendanceStatus::Present,
        ))
        .await
        .expect("create");
    assert_eq!(created.date, day(14));
    assert_eq!(created.sms_status, SmsStatus::NotSent);

    let found = repo
        .find_for_date(institute_id, student_id, day(14))
        .await
        .expect("find");
    assert_eq!(found.map(|a| a.id), Some(created.id));

    let other_day = repo
        .find_for_date(institute_id, student_id, day(15))
        .await
        .expect("find other day");
    assert!(other_day.is_none());
}

#[tokio::test]
async fn one_record_per_student_per_day() {
    let db = setup().await;
    let repo = SurrealAttendanceRepository::new(db);
    let institute_id = Uuid::new_v4();
    let student_id = Uuid::new_v4();

    repo.create(mark_input(
        institute_id,
        student_id,
        day(14),
        AttendanceStatus::Present,
    ))
    .await
    .expect("first");

    let err = repo
        .create(mark_input(
            institute_id,
            student_id,
            day(14),
            AttendanceStatus::Absent,
        ))
        .await
        .expect_err("second record for the same day");
    assert!(matches!(err, ClasstrackError::ConstraintViolation { .. }));

    // A different day is a different record.
    repo.create(mark_input(
        institute_id,
        student_id,
        day(15),
        AttendanceStatus::Absent,
    ))
    .await
    .expect("next day");
}

#[tokio::test]
async fn update_records_sms_outcome() {
    let db = setup().await;
    let repo = SurrealAttendanceRepository::new(db);
    let institute_id = Uuid::new_v4();
    let student_id = Uuid::new_v4();

    let created = repo
        .create(mark_input(
            institute_id,
            student_id,
            day(14),
            AttendanceStatus::Absent,
        ))
        .await
        .expect("create");

    let updated = repo
        .update(
            institute_id,
            created.id,
            UpdateAttendance {
                sms_status: Some(SmsStatus::Sent),
                ..UpdateAttendance::default()
            },
        )
        .await
        .expect("update");
    assert_eq!(updated.sms_status, SmsStatus::Sent);
    // Untouched fields survive.
    assert_eq!(updated.status, AttendanceStatus::Absent);
    assert_eq!(updated.date, day(14));
}

#[tokio::test]
async fn cross_tenant_update_is_not_found() {
    let db = setup().await;
    let repo = SurrealAttendanceRepository::new(db);
    let institute_id = Uuid::new_v4();

    let created = repo
        .create(mark_input(
            institute_id,
            Uuid::new_v4(),
            day(14),
            AttendanceStatus::Present,
        ))
        .await
        .expect("create");

    let err = repo
        .update(
            Uuid::new_v4(),
            created.id,
            UpdateAttendance {
                status: Some(AttendanceStatus::Absent),
                ..UpdateAttendance::default()
            },
        )
        .await
        .expect_err("cross-tenant update");
    assert!(matches!(err, ClasstrackError::NotFound { .. }));
}

#[tokio::test]
async fn list_filters_by_date_and_range() {
    let db = setup().await;
    let repo = SurrealAttendanceRepository::new(db);
    let institute_id = Uuid::new_v4();
    let a = Uuid::new_v4();
    let b = Uuid::new_v4();

    repo.create(mark_input(institute_id, a, day(10), AttendanceStatus::Present))
        .await
        .expect("a day 10");
    repo.create(mark_input(institute_id, a, day(12), AttendanceStatus::Absent))
        .await
        .expect("a day 12");
    repo.create(mark_input(institute_id, b, day(12), AttendanceStatus::Present))
        .await
        .expect("b day 12");

    let on_the_12th = repo
        .list(
            institute_id,
            AttendanceFilter {
                date: Some(day(12)),
                ..AttendanceFilter::default()
            },
        )
        .await
        .expect("date filter");
    assert_eq!(on_the_12th.len(), 2);

    let student_a = repo
        .list(
            institute_id,
            AttendanceFilter {
                student_id: Some(a),
                from: Some(day(11)),
                to: Some(day(13)),
                ..AttendanceFilter::default()
            },
        )
        .await
        .expect("range filter");
    assert_eq!(student_a.len(), 1);
    assert_eq!(student_a[0].status, AttendanceStatus::Absent);
}
