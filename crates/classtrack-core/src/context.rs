//! Tenant context attached to every authorized request.

use uuid::Uuid;

/// Identity of the institute an operation runs under.
///
/// Produced by the auth layer after the subscription gate has passed;
/// registrar services trust it and never re-check the subscription.
/// The institute code is carried because it is embedded into generated
/// identifiers and receipt numbers.
#[derive(Debug, Clone)]
pub struct TenantContext {
    pub institute_id: Uuid,
    pub institute_code: String,
    pub institute_name: String,
}
