//! Domain models for CLASSTRACK.
//!
//! These are the core types shared across all crates. Every record
//! except [`institute::Institute`] and [`user::User`] is scoped to one
//! institute — the unit of data isolation.

pub mod attendance;
pub mod fee_payment;
pub mod institute;
pub mod student;
pub mod user;
