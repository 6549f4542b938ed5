//! Fee recording and reporting.
//!
//! The invariant: at most one `Paid` row per (institute, student,
//! month), ever. The service checks first so duplicates get a precise
//! error carrying the original receipt, but the store's unique index
//! is the authority — two racing calls both pass the check, and the
//! index rejects the loser.

use std::collections::HashSet;

use chrono::{Datelike, Utc};
use classtrack_core::context::TenantContext;
use classtrack_core::error::{ClasstrackError, ClasstrackResult};
use classtrack_core::models::fee_payment::{
    CreateFeePayment, FeeFilter, FeePayment, PaymentMode, PaymentStatus,
};
use classtrack_core::models::student::Student;
use classtrack_core::repository::{FeePaymentRepository, StudentRepository};
use tracing::info;
use uuid::Uuid;

/// Input for recording a paid fee.
#[derive(Debug, Clone)]
pub struct RecordPayment {
    pub student_id: Uuid,
    /// Billing period, `YYYY-MM`.
    pub month_year: String,
    /// Amount in whole rupees; defaults to the student's monthly fee.
    pub amount: Option<i64>,
    pub mode: PaymentMode,
}

/// A student with no paid row for a month.
#[derive(Debug, Clone)]
pub struct PendingFee {
    pub student: Student,
    pub month_year: String,
    /// Amount due (the student's monthly fee).
    pub amount: i64,
}

/// Collection figures for one month.
#[derive(Debug, Clone)]
pub struct FeeStats {
    pub month_year: String,
    /// Rupees collected.
    pub collected: i64,
    /// Number of paid rows.
    pub payment_count: u64,
    /// Active students without a paid row.
    pub pending_count: u64,
    /// Rupees outstanding across pending students.
    pub pending_amount: i64,
}

/// Fee recording and reporting service.
#[derive(Clone)]
pub struct FeeService<F: FeePaymentRepository, S: StudentRepository> {
    fee_repo: F,
    student_repo: S,
}

fn validate_month_year(month_year: &str) -> ClasstrackResult<()> {
    let ok = month_year.is_ascii()
        && month_year.len() == 7
        && month_year.as_bytes()[4] == b'-'
        && month_year[..4].chars().all(|c| c.is_ascii_digit())
        && month_year[5..].chars().all(|c| c.is_ascii_digit())
        && month_year[5..]
            .parse::<u32>()
            .is_ok_and(|m| (1..=12).contains(&m));
    if ok {
        Ok(())
    } else {
        Err(ClasstrackError::Validation {
            message: format!("month must be YYYY-MM, got `{month_year}`"),
        })
    }
}

/// Current billing period, `YYYY-MM`.
pub fn current_month() -> String {
    let now = Utc::now();
    format!("{:04}-{:02}", now.year(), now.month())
}

impl<F: FeePaymentRepository, S: StudentRepository> FeeService<F, S> {
    pub fn new(fee_repo: F, student_repo: S) -> Self {
        Self {
            fee_repo,
            student_repo,
        }
    }

    /// Record a paid fee for a student and month, assigning a receipt
    /// number.
    ///
    /// Fails with [`ClasstrackError::DuplicatePayment`] (carrying the
    /// existing receipt) if the month is already paid, and with
    /// [`ClasstrackError::PersistenceConflict`] if a racing call won
    /// between the check and the insert — the caller retries the whole
    /// operation and then observes the duplicate.
    pub async fn record_payment(
        &self,
        ctx: &TenantContext,
        input: RecordPayment,
    ) -> ClasstrackResult<FeePayment> {
        validate_month_year(&input.month_year)?;

        // 1. The student must exist in this tenant.
        let student = self
            .student_repo
            .get(ctx.institute_id, input.student_id)
            .await?;

        // 2. Duplicate check, for a precise error.
        if let Some(existing) = self
            .fee_repo
            .find_paid(ctx.institute_id, input.student_id, &input.month_year)
            .await?
        {
            return Err(ClasstrackError::DuplicatePayment {
                receipt_number: existing.receipt_number.unwrap_or_default(),
                amount: existing.amount,
                paid_at: existing.payment_date,
                mode: existing.mode,
            });
        }

        let amount = input.amount.unwrap_or(student.monthly_fee);
        if amount <= 0 {
            return Err(ClasstrackError::Validation {
                message: "amount must be positive".into(),
            });
        }

        // 3. Receipt number from the per-tenant atomic counter. Never
        //    rolled back: a failed insert burns the sequence value,
        //    which is acceptable — receipts stay unique either way.
        let seq = self.fee_repo.next_receipt_seq(ctx.institute_id).await?;
        let receipt_number = format!(
            "{}-REC-{}-{:05}",
            ctx.institute_code,
            Utc::now().year(),
            seq
        );

        // 4. Insert. The paid-key unique index backstops the step-2
        //    check.
        let payment = self
            .fee_repo
            .create(CreateFeePayment {
                institute_id: ctx.institute_id,
                student_id: input.student_id,
                month_year: input.month_year.clone(),
                amount,
                payment_date: Some(Utc::now()),
                mode: input.mode,
                status: PaymentStatus::Paid,
                receipt_number: Some(receipt_number.clone()),
            })
            .await
            .map_err(|e| match e {
                ClasstrackError::ConstraintViolation { .. } => {
                    ClasstrackError::PersistenceConflict {
                        entity: "fee_payment".into(),
                    }
                }
                other => other,
            })?;

        info!(
            institute = %ctx.institute_code,
            student = %student.student_code,
            month = %input.month_year,
            receipt = %receipt_number,
            amount,
            "fee payment recorded"
        );

        Ok(payment)
    }

    /// Payments for the tenant, filtered.
    pub async fn list_payments(
        &self,
        ctx: &TenantContext,
        filter: FeeFilter,
    ) -> ClasstrackResult<Vec<FeePayment>> {
        self.fee_repo.list(ctx.institute_id, filter).await
    }

    /// Active students with no paid row for `month_year`.
    pub async fn pending_fees(
        &self,
        ctx: &TenantContext,
        month_year: &str,
    ) -> ClasstrackResult<Vec<PendingFee>> {
        validate_month_year(month_year)?;

        let paid: HashSet<Uuid> = self
            .fee_repo
            .list(
                ctx.institute_id,
                FeeFilter {
                    month_year: Some(month_year.to_string()),
                    status: Some(PaymentStatus::Paid),
                    ..FeeFilter::default()
                },
            )
            .await?
            .into_iter()
            .map(|p| p.student_id)
            .collect();

        let pending = self
            .student_repo
            .list_active(ctx.institute_id)
            .await?
            .into_iter()
            .filter(|s| !paid.contains(&s.id))
            .map(|student| PendingFee {
                month_year: month_year.to_string(),
                amount: student.monthly_fee,
                student,
            })
            .collect();

        Ok(pending)
    }

    /// Collection figures for `month_year`.
    pub async fn collection_stats(
        &self,
        ctx: &TenantContext,
        month_year: &str,
    ) -> ClasstrackResult<FeeStats> {
        validate_month_year(month_year)?;

        let paid = self
            .fee_repo
            .list(
                ctx.institute_id,
                FeeFilter {
                    month_year: Some(month_year.to_string()),
                    status: Some(PaymentStatus::Paid),
                    ..FeeFilter::default()
                },
            )
            .await?;
        let collected: i64 = paid.iter().map(|p| p.amount).sum();
        let paid_ids: HashSet<Uuid> = paid.iter().map(|p| p.student_id).collect();

        let mut pending_count = 0u64;
        let mut pending_amount = 0i64;
        for student in self.student_repo.list_active(ctx.institute_id).await? {
            if !paid_ids.contains(&student.id) {
                pending_count += 1;
                pending_amount += student.monthly_fee;
            }
        }

        Ok(FeeStats {
            month_year: month_year.to_string(),
            collected,
            payment_count: paid.len() as u64,
            pending_count,
            pending_amount,
        })
    }
}
