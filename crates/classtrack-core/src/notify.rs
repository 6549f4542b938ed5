//! Outbound notification trait.

use chrono::NaiveDate;

use crate::error::ClasstrackResult;

/// Fire-and-forget absence notification to a student's parent.
///
/// Callers log failures and move on; a notification result never
/// blocks or fails the request that triggered it.
pub trait AbsenceNotifier: Send + Sync {
    fn notify_absence(
        &self,
        student_name: &str,
        contact_number: &str,
        date: NaiveDate,
        institute_name: &str,
    ) -> impl Future<Output = ClasstrackResult<()>> + Send;
}

/// Notifier that does nothing. Used when no SMS provider is
/// configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopNotifier;

impl AbsenceNotifier for NoopNotifier {
    async fn notify_absence(
        &self,
        _student_name: &str,
        _contact_number: &str,
        _date: NaiveDate,
        _institute_name: &str,
    ) -> ClasstrackResult<()> {
        Ok(())
    }
}
