//! Institute domain model.
//!
//! An institute is the tenant: all students, payments, and attendance
//! records carry an institute reference and every query is scoped to
//! exactly one institute.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Subscription state of an institute.
///
/// `Inactive` institutes are rejected at the authentication boundary;
/// no registrar operation ever runs for them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SubscriptionStatus {
    Trial,
    Active,
    Inactive,
}

/// A registered tuition institute.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Institute {
    pub id: Uuid,
    /// Display name of the institute.
    pub name: String,
    /// Short uppercase alphanumeric code, globally unique and immutable
    /// after creation. Embedded into every student code and receipt
    /// number, so it must never change.
    pub code: String,
    pub address: String,
    pub contact_number: String,
    pub email: String,
    pub owner_name: String,
    pub subscription_status: SubscriptionStatus,
    pub subscription_expiry: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// Fields required to register a new institute.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateInstitute {
    pub name: String,
    pub code: String,
    pub address: String,
    pub contact_number: String,
    pub email: String,
    pub owner_name: String,
    pub subscription_status: SubscriptionStatus,
    pub subscription_expiry: DateTime<Utc>,
}

/// Fields that can be updated on an existing institute.
///
/// The institute code is deliberately absent: it is immutable.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateInstitute {
    pub name: Option<String>,
    pub address: Option<String>,
    pub contact_number: Option<String>,
    pub subscription_status: Option<SubscriptionStatus>,
    pub subscription_expiry: Option<DateTime<Utc>>,
}
