//! CLASSTRACK Notify — outbound parent notifications over SMS.
//!
//! The only implementation is [`Fast2SmsNotifier`]; code that needs to
//! run without a provider uses `classtrack_core::notify::NoopNotifier`.

mod fast2sms;

pub use fast2sms::{Fast2SmsConfig, Fast2SmsNotifier};
