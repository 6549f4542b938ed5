//! CLASSTRACK Registrar — the tenant-scoped services behind the admin
//! panel: student enrollment with code allocation, idempotent fee
//! recording with receipt numbering, and daily attendance with absence
//! notifications.
//!
//! Every operation takes a [`TenantContext`] produced by the auth
//! layer; nothing here ever crosses an institute boundary.
//!
//! [`TenantContext`]: classtrack_core::TenantContext

pub mod allocator;
pub mod attendance;
pub mod fees;

pub use allocator::{EnrollStudent, StudentAllocator};
pub use attendance::{AttendanceService, AttendanceSummary, MarkAttendance};
pub use fees::{FeeService, FeeStats, PendingFee, RecordPayment};
