//! SurrealDB repository implementations.

mod attendance;
mod fee_payment;
mod institute;
mod student;
mod user;

pub use attendance::SurrealAttendanceRepository;
pub use fee_payment::SurrealFeePaymentRepository;
pub use institute::SurrealInstituteRepository;
pub use student::SurrealStudentRepository;
pub use user::SurrealUserRepository;
