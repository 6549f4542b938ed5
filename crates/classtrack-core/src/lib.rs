//! CLASSTRACK Core — domain models, repository traits, and error types
//! shared across all crates.
//!
//! This crate has no I/O dependencies: persistence lives behind the
//! traits in [`repository`], and outbound SMS behind [`notify`].

pub mod context;
pub mod error;
pub mod models;
pub mod notify;
pub mod repository;

pub use context::TenantContext;
pub use error::{ClasstrackError, ClasstrackResult};
