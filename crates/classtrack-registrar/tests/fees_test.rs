//! Integration tests for fee recording: receipt numbering, the
//! one-paid-row-per-month invariant, and pending/stats reporting.

use chrono::{Datelike, Duration, Utc};
use classtrack_core::TenantContext;
use classtrack_core::error::ClasstrackError;
use classtrack_core::models::fee_payment::PaymentMode;
use classtrack_core::models::institute::{CreateInstitute, SubscriptionStatus};
use classtrack_core::models::student::{Board, CreateStudent, Student};
use classtrack_core::repository::{InstituteRepository, StudentRepository};
use classtrack_db::repository::{
    SurrealFeePaymentRepository, SurrealInstituteRepository, SurrealStudentRepository,
};
use classtrack_db::run_migrations;
use classtrack_registrar::{FeeService, RecordPayment};
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem};

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

fn fee_service(db: &Surreal<Db>) -> FeeService<SurrealFeePaymentRepository<Db>, SurrealStudentRepository<Db>> {
    FeeService::new(
        SurrealFeePaymentRepository::new(db.clone()),
        SurrealStudentRepository::new(db.clone()),
    )
}

#[tokio::test]
async fn receipts_follow_the_tenant_sequence() {
    let (db, ctx) = setup().await;
    let fees = fee_service(&db);
    let student = seed_student(&db, &ctx, 1).await;
    let other = seed_student(&db, &ctx, 2).await;
    let year = Utc::now().year();

    let first = fees
        .record_payment(
            &ctx,
            RecordPayment {
                student_id: student.id,
                month_year: "2025-03".into(),
                amount: None,
                mode: PaymentMode::Cash,
            },
        )
        .await
        .expect("first payment");
    let second = fees
        .record_payment(
            &ctx,
            RecordPayment {
                student_id: other.id,
                month_year: "2025-03".into(),
                amount: Some(2000),
                mode: PaymentMode::Upi,
            },
        )
        .await
        .expect("second payment");

    assert_eq!(
        first.receipt_number.as_deref(),
        Some(format!("ABC1-REC-{year}-00001").as_str())
    );
    assert_eq!(
        second.receipt_number.as_deref(),
        Some(format!("ABC1-REC-{year}-00002").as_str())
    );
    // Amount defaults to the student's monthly fee.
    assert_eq!(first.amount, 1500);
    assert_eq!(second.amount, 2000);
}

#[tokio::test]
async fn duplicate_month_returns_the_original_receipt() {
    let (db, ctx) = setup().await;
    let fees = fee_service(&db);
    let student = seed_student(&db, &ctx, 1).await;

    let first = fees
        .record_payment(
            &ctx,
            RecordPayment {
                student_id: student.id,
                month_year: "2025-03".into(),
                amount: None,
                mode: PaymentMode::Cash,
            },
        )
        .await
        .expect("first payment");

    let err = fees
        .record_payment(
            &ctx,
            RecordPayment {
                student_id: student.id,
                month_year: "2025-03".into(),
                amount: Some(9999),
                mode: PaymentMode::Online,
            },
        )
        .await
        .expect_err("second payment for the same month");

    match err {
        ClasstrackError::DuplicatePayment {
            receipt_number,
            amount,
            mode,
            ..
        } => {
            assert_eq!(Some(receipt_number), first.receipt_number);
            assert_eq!(amount, first.amount);
            assert_eq!(mode, first.mode);
        }
        other => panic!("expected DuplicatePayment, got {other:?}"),
    }
}

#[tokio::test]
async fn different_months_are_independent() {
    let (db, ctx) = setup().await;
    let fees = fee_service(&db);
    let student = seed_student(&db, &ctx, 1).await;

    for month in ["2025-03", "2025-04"] {
        fees.record_payment(
            &ctx,
            RecordPayment {
                student_id: student.id,
                month_year: month.into(),
                amount: None,
                mode: PaymentMode::Cash,
            },
        )
        .await
        .unwrap_or_else(|e| panic!("payment for {month}: {e}"));
    }
}

#[tokio::test]
async fn concurrent_payments_record_exactly_once() {
    let (db, ctx) = setup().await;
    let student = seed_student(&db, &ctx, 1).await;

    let mut tasks = Vec::new();
    for _ in 0..2 {
        let fees = fee_service(&db);
        let ctx = ctx.clone();
        let student_id = student.id;
        tasks.push(tokio::spawn(async move {
            // On a conflict the caller redoes the whole operation and
            // then observes the duplicate.
            loop {
                let result = fees
                    .record_payment(
                        &ctx,
                        RecordPayment {
                            student_id,
                            month_year: "2025-03".into(),
                            amount: None,
                            mode: PaymentMode::Cash,
                        },
                    )
                    .await;
                match result {
                    Err(ClasstrackError::PersistenceConflict { .. }) => continue,
                    other => return other,
                }
            }
        }));
    }

    let mut successes = 0;
    for task in tasks {
        match task.await.expect("task join") {
            Ok(_) => successes += 1,
            Err(ClasstrackError::DuplicatePayment { .. }) => {}
            Err(other) => panic!("unexpected error: {other:?}"),
        }
    }
    assert_eq!(successes, 1);
}

#[tokio::test]
async fn rejected_amount_does_not_consume_a_receipt_number() {
    let (db, ctx) = setup().await;
    let fees = fee_service(&db);
    let student = seed_student(&db, &ctx, 1).await;
    let year = Utc::now().year();

    let err = fees
        .record_payment(
            &ctx,
            RecordPayment {
                student_id: student.id,
                month_year: "2025-03".into(),
                amount: Some(0),
                mode: PaymentMode::Cash,
            },
        )
        .await
        .expect_err("zero amount");
    assert!(matches!(err, ClasstrackError::Validation { .. }));

    // The sequence is untouched, so the next valid payment still gets
    // the first receipt number.
    let payment = fees
        .record_payment(
            &ctx,
            RecordPayment {
                student_id: student.id,
                month_year: "2025-03".into(),
                amount: None,
                mode: PaymentMode::Cash,
            },
        )
        .await
        .expect("valid payment");
    assert_eq!(
        payment.receipt_number.as_deref(),
        Some(format!("ABC1-REC-{year}-00001").as_str())
    );
}

#[tokio::test]
async fn unknown_student_is_rejected() {
    let (db, ctx) = setup().await;
    let fees = fee_service(&db);

    let err = fees
        .record_payment(
            &ctx,
            RecordPayment {
                student_id: uuid::Uuid::new_v4(),
                month_year: "2025-03".into(),
                amount: None,
                mode: PaymentMode::Cash,
            },
        )
        .await
        .expect_err("payment for unknown student");
    assert!(matches!(err, ClasstrackError::NotFound { .. }));
}

#[tokio::test]
async fn pending_fees_lists_unpaid_active_students() {
    let (db, ctx) = setup().await;
    let fees = fee_service(&db);
    let paid_student = seed_student(&db, &ctx, 1).await;
    let unpaid_student = seed_student(&db, &ctx, 2).await;

    fees.record_payment(
        &ctx,
        RecordPayment {
            student_id: paid_student.id,
            month_year: "2025-03".into(),
            amount: None,
            mode: PaymentMode::Cash,
        },
    )
    .await
    .expect("payment");

    let pending = fees.pending_fees(&ctx, "2025-03").await.expect("pending");
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].student.id, unpaid_student.id);
    assert_eq!(pending[0].amount, 1500);
}

#[tokio::test]
async fn collection_stats_sum_the_month() {
    let (db, ctx) = setup().await;
    let fees = fee_service(&db);
    let a = seed_student(&db, &ctx, 1).await;
    let _b = seed_student(&db, &ctx, 2).await;

    fees.record_payment(
        &ctx,
        RecordPayment {
            student_id: a.id,
            month_year: "2025-03".into(),
            amount: Some(1800),
            mode: PaymentMode::Cheque,
        },
    )
    .await
    .expect("payment");

    let stats = fees
        .collection_stats(&ctx, "2025-03")
        .await
        .expect("stats");
    assert_eq!(stats.collected, 1800);
    assert_eq!(stats.payment_count, 1);
    assert_eq!(stats.pending_count, 1);
    assert_eq!(stats.pending_amount, 1500);
}
