//! Repository trait definitions for data access abstraction.
//!
//! All repository operations are async. Tenant-scoped repositories
//! require an `institute_id` parameter to enforce data isolation.
//! Implementations back every uniqueness rule with a store-level
//! unique index and report rejections as
//! [`ClasstrackError::ConstraintViolation`] — the read-then-write
//! sequences in the registrar are optimistic and rely on that as the
//! sole serialization point.
//!
//! [`ClasstrackError::ConstraintViolation`]: crate::error::ClasstrackError::ConstraintViolation

use chrono::NaiveDate;
use uuid::Uuid;

use crate::error::ClasstrackResult;
use crate::models::{
    attendance::{Attendance, AttendanceFilter, CreateAttendance, UpdateAttendance},
    fee_payment::{CreateFeePayment, FeeFilter, FeePayment},
    institute::{CreateInstitute, Institute, UpdateInstitute},
    student::{Board, CreateStudent, Student, StudentFilter, UpdateStudent},
    user::{CreateUser, User},
};

/// Pagination parameters for list queries.
#[derive(Debug, Clone)]
pub struct Pagination {
    pub offset: u64,
    pub limit: u64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: 20,
        }
    }
}

/// A paginated result set.
#[derive(Debug, Clone)]
pub struct PaginatedResult<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub offset: u64,
    pub limit: u64,
}

// ---------------------------------------------------------------------------
// Global scope
// ---------------------------------------------------------------------------

pub trait InstituteRepository: Send + Sync {
    /// Create an institute. Fails with `ConstraintViolation` if the
    /// institute code is already taken.
    fn create(
        &self,
        input: CreateInstitute,
    ) -> impl Future<Output = ClasstrackResult<Institute>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = ClasstrackResult<Institute>> + Send;
    fn get_by_code(&self, code: &str) -> impl Future<Output = ClasstrackResult<Institute>> + Send;
    fn update(
        &self,
        id: Uuid,
        input: UpdateInstitute,
    ) -> impl Future<Output = ClasstrackResult<Institute>> + Send;
}

pub trait UserRepository: Send + Sync {
    /// Create a user, hashing the raw password. Fails with
    /// `ConstraintViolation` if the email is already registered.
    fn create(&self, input: CreateUser) -> impl Future<Output = ClasstrackResult<User>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = ClasstrackResult<User>> + Send;
    /// Email lookup is global: login does not know the tenant yet.
    fn get_by_email(&self, email: &str) -> impl Future<Output = ClasstrackResult<User>> + Send;
}

// ---------------------------------------------------------------------------
// Tenant-scoped repositories
// ---------------------------------------------------------------------------

pub trait StudentRepository: Send + Sync {
    /// Insert a student under the `(institute_id, student_code)` unique
    /// index. A `ConstraintViolation` here means a concurrent
    /// allocation won the race for this code.
    fn create(&self, input: CreateStudent)
    -> impl Future<Output = ClasstrackResult<Student>> + Send;
    fn get(
        &self,
        institute_id: Uuid,
        id: Uuid,
    ) -> impl Future<Output = ClasstrackResult<Student>> + Send;
    fn update(
        &self,
        institute_id: Uuid,
        id: Uuid,
        input: UpdateStudent,
    ) -> impl Future<Output = ClasstrackResult<Student>> + Send;
    fn list(
        &self,
        institute_id: Uuid,
        filter: StudentFilter,
        pagination: Pagination,
    ) -> impl Future<Output = ClasstrackResult<PaginatedResult<Student>>> + Send;
    /// Every student code ever assigned for the institute, including
    /// inactive students. Input to the allocator's max-suffix scan.
    fn student_codes(
        &self,
        institute_id: Uuid,
    ) -> impl Future<Output = ClasstrackResult<Vec<String>>> + Send;
    fn count_active(&self, institute_id: Uuid)
    -> impl Future<Output = ClasstrackResult<u64>> + Send;
    fn count_active_by_board(
        &self,
        institute_id: Uuid,
        board: Board,
    ) -> impl Future<Output = ClasstrackResult<u64>> + Send;
    /// All active students, unpaginated — used for pending-fee sweeps.
    fn list_active(
        &self,
        institute_id: Uuid,
    ) -> impl Future<Output = ClasstrackResult<Vec<Student>>> + Send;
}

pub trait FeePaymentRepository: Send + Sync {
    /// Insert a payment row. Paid rows are constrained by the
    /// `(institute_id, paid_key)` unique index; a rejection there is
    /// the authoritative duplicate-payment signal.
    fn create(
        &self,
        input: CreateFeePayment,
    ) -> impl Future<Output = ClasstrackResult<FeePayment>> + Send;
    /// The paid row for (student, month), if any.
    fn find_paid(
        &self,
        institute_id: Uuid,
        student_id: Uuid,
        month_year: &str,
    ) -> impl Future<Output = ClasstrackResult<Option<FeePayment>>> + Send;
    fn list(
        &self,
        institute_id: Uuid,
        filter: FeeFilter,
    ) -> impl Future<Output = ClasstrackResult<Vec<FeePayment>>> + Send;
    /// Atomically advance and return the institute's receipt sequence.
    /// The increment is a single store operation, so concurrent calls
    /// never observe the same value.
    fn next_receipt_seq(
        &self,
        institute_id: Uuid,
    ) -> impl Future<Output = ClasstrackResult<u64>> + Send;
}

pub trait AttendanceRepository: Send + Sync {
    /// Insert a record under the `(institute_id, student_id, date)`
    /// unique index.
    fn create(
        &self,
        input: CreateAttendance,
    ) -> impl Future<Output = ClasstrackResult<Attendance>> + Send;
    fn find_for_date(
        &self,
        institute_id: Uuid,
        student_id: Uuid,
        date: NaiveDate,
    ) -> impl Future<Output = ClasstrackResult<Option<Attendance>>> + Send;
    fn update(
        &self,
        institute_id: Uuid,
        id: Uuid,
        input: UpdateAttendance,
    ) -> impl Future<Output = ClasstrackResult<Attendance>> + Send;
    fn list(
        &self,
        institute_id: Uuid,
        filter: AttendanceFilter,
    ) -> impl Future<Output = ClasstrackResult<Vec<Attendance>>> + Send;
}
