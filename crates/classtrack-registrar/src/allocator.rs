//! Student code allocation.
//!
//! Codes have the form `{institute_code}-{NNNN}` with a zero-padded
//! numeric suffix that is unique per institute, strictly increasing,
//! and never reused — inactive students keep their code on record and
//! their suffix stays burned.
//!
//! Allocation is optimistic: scan the tenant's existing codes, take
//! max suffix + 1, and let the `(institute_id, student_code)` unique
//! index arbitrate races. A rejected insert means another allocation
//! won the same suffix; recompute and retry.

use classtrack_core::context::TenantContext;
use classtrack_core::error::{ClasstrackError, ClasstrackResult};
use classtrack_core::models::student::{Board, CreateStudent, Student};
use classtrack_core::repository::StudentRepository;
use tracing::debug;

/// Default number of insert attempts before giving up.
const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// Enrollment input. The student code is assigned here, never by the
/// caller.
#[derive(Debug, Clone)]
pub struct EnrollStudent {
    pub name: String,
    pub class_name: String,
    pub board: Board,
    pub parent_name: String,
    pub contact_number: String,
    pub email: Option<String>,
    pub monthly_fee: i64,
}

/// Allocates student codes and creates student records.
#[derive(Clone)]
pub struct StudentAllocator<S: StudentRepository> {
    repo: S,
    max_attempts: u32,
}

/// Numeric suffix of `code` under `prefix` ("ABC1-" style). Codes that
/// do not parse count as suffix 0 so they can never collide with a
/// fresh allocation.
fn code_suffix(code: &str, prefix: &str) -> u32 {
    code.strip_prefix(prefix)
        .and_then(|s| s.parse::<u32>().ok())
        .unwrap_or(0)
}

/// Highest suffix among the tenant's existing codes.
fn max_suffix(codes: &[String], prefix: &str) -> u32 {
    codes.iter().map(|c| code_suffix(c, prefix)).max().unwrap_or(0)
}

impl<S: StudentRepository> StudentAllocator<S> {
    pub fn new(repo: S) -> Self {
        Self {
            repo,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }

    /// Override the attempt bound. Useful under heavy concurrent
    /// enrollment, where more than the default number of allocations
    /// may race for the same suffix.
    pub fn with_max_attempts(repo: S, max_attempts: u32) -> Self {
        Self { repo, max_attempts }
    }

    /// Enroll a student, allocating the next free code for the tenant.
    ///
    /// Retries on unique-index rejections and transient write
    /// conflicts; fails with [`ClasstrackError::AllocationExhausted`]
    /// when the attempt bound is hit.
    pub async fn register(
        &self,
        ctx: &TenantContext,
        input: EnrollStudent,
    ) -> ClasstrackResult<Student> {
        let prefix = format!("{}-", ctx.institute_code);

        for attempt in 1..=self.max_attempts {
            // Recomputed every attempt: a lost race means the scan was
            // stale.
            let codes = self.repo.student_codes(ctx.institute_id).await?;
            let candidate = max_suffix(&codes, &prefix) + 1;
            let student_code = format!("{}{:04}", prefix, candidate);

            let result = self
                .repo
                .create(CreateStudent {
                    institute_id: ctx.institute_id,
                    student_code: student_code.clone(),
                    name: input.name.clone(),
                    class_name: input.class_name.clone(),
                    board: input.board,
                    parent_name: input.parent_name.clone(),
                    contact_number: input.contact_number.clone(),
                    email: input.email.clone(),
                    monthly_fee: input.monthly_fee,
                })
                .await;

            match result {
                Ok(student) => return Ok(student),
                Err(
                    ClasstrackError::ConstraintViolation { .. }
                    | ClasstrackError::PersistenceConflict { .. },
                ) => {
                    debug!(
                        institute = %ctx.institute_code,
                        %student_code,
                        attempt,
                        "student code lost allocation race, retrying"
                    );
                }
                Err(e) => return Err(e),
            }
        }

        Err(ClasstrackError::AllocationExhausted {
            attempts: self.max_attempts,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn suffix_parses_zero_padded_numbers() {
        assert_eq!(code_suffix("ABC1-0001", "ABC1-"), 1);
        assert_eq!(code_suffix("ABC1-0042", "ABC1-"), 42);
        assert_eq!(code_suffix("ABC1-9999", "ABC1-"), 9999);
    }

    #[test]
    fn suffix_of_foreign_or_malformed_codes_is_zero() {
        // Wrong prefix.
        assert_eq!(code_suffix("XYZ9-0007", "ABC1-"), 0);
        // Non-numeric tail.
        assert_eq!(code_suffix("ABC1-LEGACY", "ABC1-"), 0);
        // No separator at all.
        assert_eq!(code_suffix("ABC10001", "ABC1-"), 0);
    }

    #[test]
    fn max_suffix_ignores_unparsable_entries() {
        let codes = vec![
            "ABC1-0001".to_string(),
            "ABC1-0003".to_string(),
            "ABC1-oops".to_string(),
        ];
        assert_eq!(max_suffix(&codes, "ABC1-"), 3);
    }

    #[test]
    fn max_suffix_of_empty_tenant_is_zero() {
        assert_eq!(max_suffix(&[], "ABC1-"), 0);
    }
}
