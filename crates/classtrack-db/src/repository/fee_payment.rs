//! SurrealDB implementation of [`FeePaymentRepository`].
//!
//! Two store-level mechanisms carry the idempotency contract:
//!
//! - `paid_key`: Paid rows store `{student_id}/{month_year}`, all other
//!   rows store their own record id, so the unique index
//!   `(institute_id, paid_key)` constrains exactly the Paid rows.
//! - `receipt_counter`: one record per institute, advanced with a
//!   single `UPSERT ... += 1`, so concurrent receipt allocations never
//!   collide.

use chrono::{DateTime, Utc};
use classtrack_core::error::ClasstrackResult;
use classtrack_core::models::fee_payment::{
    CreateFeePayment, FeeFilter, FeePayment, PaymentMode, PaymentStatus,
};
use classtrack_core::repository::FeePaymentRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::DbError;

/// DB-side row struct for queries where the UUID is already known.
#[derive(Debug, SurrealValue)]
struct FeePaymentRow {
    institute_id: String,
    student_id: String,
    month_year: String,
    amount: i64,
    payment_date: Option<DateTime<Utc>>,
    mode: String,
    status: String,
    receipt_number: Option<String>,
    created_at: DateTime<Utc>,
}

/// DB-side row struct that includes the record ID via `meta::id(id)`.
#[derive(Debug, SurrealValue)]
struct FeePaymentRowWithId {
    record_id: String,
    institute_id: String,
    student_id: String,
    month_year: String,
    amount: i64,
    payment_date: Option<DateTime<Utc>>,
    mode: String,
    status: String,
    receipt_number: Option<String>,
    created_at: DateTime<Utc>,
}

/// Row struct for the counter UPSERT.
#[derive(Debug, SurrealValue)]
struct CounterRow {
    value: u64,
}

fn parse_mode(s: &str) -> Result<PaymentMode, DbError> {
    match s {
        "Cash" => Ok(PaymentMode::Cash),
        "Online" => Ok(PaymentMode::Online),
        "Cheque" => Ok(PaymentMode::Cheque),
        "Upi" => Ok(PaymentMode::Upi),
        other => Err(DbError::Decode(format!("unknown payment mode: {other}"))),
    }
}

fn mode_to_string(m: PaymentMode) -> &'static str {
    match m {
        PaymentMode::Cash => "Cash",
        PaymentMode::Online => "Online",
        PaymentMode::Cheque => "Cheque",
        PaymentMode::Upi => "Upi",
    }
}

fn parse_status(s: &str) -> Result<PaymentStatus, DbError> {
    match s {
        "Paid" => Ok(PaymentStatus::Paid),
        "Pending" => Ok(PaymentStatus::Pending),
        "Overdue" => Ok(PaymentStatus::Overdue),
        other => Err(DbError::Decode(format!(
            "unknown payment status: {other}"
        ))),
    }
}

fn status_to_string(s: PaymentStatus) -> &'static str {
    match s {
        PaymentStatus::Paid => "Paid",
        PaymentStatus::Pending => "Pending",
        PaymentStatus::Overdue => "Overdue",
    }
}

impl FeePaymentRow {
    fn into_payment(self, id: Uuid) -> Result<FeePayment, DbError> {
        let institute_id = Uuid::parse_str(&self.institute_id)
            .map_err(|e| DbError::Decode(format!("invalid institute UUID: {e}")))?;
        let student_id = Uuid::parse_str(&self.student_id)
            .map_err(|e| DbError::Decode(format!("invalid student UUID: {e}")))?;
        Ok(FeePayment {
            id,
            institute_id,
            student_id,
            month_year: self.month_year,
            amount: self.amount,
            payment_date: self.payment_date,
            mode: parse_mode(&self.mode)?,
            status: parse_status(&self.status)?,
            receipt_number: self.receipt_number,
            created_at: self.created_at,
        })
    }
}

impl FeePaymentRowWithId {
    fn try_into_payment(self) -> Result<FeePayment, DbError> {
        let id = Uuid::parse_str(&self.record_id)
            .map_err(|e| DbError::Decode(format!("invalid UUID: {e}")))?;
        let institute_id = Uuid::parse_str(&self.institute_id)
            .map_err(|e| DbError::Decode(format!("invalid institute UUID: {e}")))?;
        let student_id = Uuid::parse_str(&self.student_id)
            .map_err(|e| DbError::Decode(format!("invalid student UUID: {e}")))?;
        Ok(FeePayment {
            id,
            institute_id,
            student_id,
            month_year: self.month_year,
            amount: self.amount,
            payment_date: self.payment_date,
            mode: parse_mode(&self.mode)?,
            status: parse_status(&self.status)?,
            receipt_number: self.receipt_number,
            created_at: self.created_at,
        })
    }
}

/// SurrealDB implementation of the FeePayment repository.
#[derive(Clone)]
pub struct SurrealFeePaymentRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealFeePaymentRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> FeePaymentRepository for SurrealFeePaymentRepository<C> {
    async fn create(&self, input: CreateFeePayment) -> ClasstrackResult<FeePayment> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        // Paid rows compete on (student, month); everything else gets a
        // key unique by construction so the index ignores it.
        let paid_key = match input.status {
            PaymentStatus::Paid => format!("{}/{}", input.student_id, input.month_year),
            _ => id_str.clone(),
        };

        let result = self
            .db
            .query(
                "CREATE type::record('fee_payment', $id) SET \
                 institute_id = $institute_id, \
                 student_id = $student_id, \
                 month_year = $month_year, amount = $amount, \
                 payment_date = $payment_date, mode = $mode, \
                 status = $status, receipt_number = $receipt_number, \
                 paid_key = $paid_key",
            )
            .bind(("id", id_str.clone()))
            .bind(("institute_id", input.institute_id.to_string()))
            .bind(("student_id", input.student_id.to_string()))
            .bind(("month_year", input.month_year))
            .bind(("amount", input.amount))
            .bind(("payment_date", input.payment_date))
            .bind(("mode", mode_to_string(input.mode).to_string()))
            .bind(("status", status_to_string(input.status).to_string()))
            .bind(("receipt_number", input.receipt_number))
            .bind(("paid_key", paid_key))
            .await
            .map_err(DbError::from)?;

        let mut result = result.check().map_err(DbError::from)?;

        let rows: Vec<FeePaymentRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "fee_payment".into(),
            id: id_str,
        })?;

        Ok(row.into_payment(id)?)
    }

    async fn find_paid(
        &self,
        institute_id: Uuid,
        student_id: Uuid,
        month_year: &str,
    ) -> ClasstrackResult<Option<FeePayment>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM fee_payment \
                 WHERE institute_id = $institute_id \
                 AND student_id = $student_id \
                 AND month_year = $month_year \
                 AND status = 'Paid'",
            )
            .bind(("institute_id", institute_id.to_string()))
            .bind(("student_id", student_id.to_string()))
            .bind(("month_year", month_year.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<FeePaymentRowWithId> = result.take(0).map_err(DbError::from)?;
        match rows.into_iter().next() {
            Some(row) => Ok(Some(row.try_into_payment()?)),
            None => Ok(None),
        }
    }

    async fn list(&self, institute_id: Uuid, filter: FeeFilter) -> ClasstrackResult<Vec<FeePayment>> {
        let mut conditions = vec!["institute_id = $institute_id"];
        if filter.student_id.is_some() {
            conditions.push("student_id = $student_id");
        }
        if filter.month_year.is_some() {
            conditions.push("month_year = $month_year");
        }
        if filter.status.is_some() {
            conditions.push("status = $status");
        }

        let query = format!(
            "SELECT meta::id(id) AS record_id, * FROM fee_payment \
             WHERE {} \
             ORDER BY created_at DESC",
            conditions.join(" AND ")
        );

        let mut builder = self
            .db
            .query(&query)
            .bind(("institute_id", institute_id.to_string()));
        if let Some(student_id) = filter.student_id {
            builder = builder.bind(("student_id", student_id.to_string()));
        }
        if let Some(month_year) = filter.month_year {
            builder = builder.bind(("month_year", month_year));
        }
        if let Some(status) = filter.status {
            builder = builder.bind(("status", status_to_string(status).to_string()));
        }

        let mut result = builder.await.map_err(DbError::from)?;
        let rows: Vec<FeePaymentRowWithId> = result.take(0).map_err(DbError::from)?;
        let items = rows
            .into_iter()
            .map(|row| row.try_into_payment())
            .collect::<Result<Vec<_>, DbError>>()?;
        Ok(items)
    }

    async fn next_receipt_seq(&self, institute_id: Uuid) -> ClasstrackResult<u64> {
        // Single-statement atomic increment; the store serializes
        // concurrent bumps on the same counter record.
        let mut result = self
            .db
            .query(
                "UPSERT type::record('receipt_counter', $institute_id) \
                 SET value += 1 RETURN AFTER",
            )
            .bind(("institute_id", institute_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<CounterRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "receipt_counter".into(),
            id: institute_id.to_string(),
        })?;

        Ok(row.value)
    }
}
