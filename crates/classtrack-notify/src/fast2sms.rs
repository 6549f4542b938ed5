//! Absence SMS delivery through the Fast2SMS bulk API.

use chrono::NaiveDate;
use classtrack_core::error::{ClasstrackError, ClasstrackResult};
use classtrack_core::notify::AbsenceNotifier;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

const DEFAULT_ENDPOINT: &str = "https://www.fast2sms.com/dev/bulkV2";

/// Fast2SMS provider configuration.
#[derive(Debug, Clone)]
pub struct Fast2SmsConfig {
    /// API key, sent in the `authorization` header.
    pub api_key: String,
    /// Bulk endpoint URL. Overridable so tests can point at a local
    /// server.
    pub endpoint: String,
    pub sender_id: String,
    /// Fast2SMS route. `v3` is the plain-text transactional route.
    pub route: String,
    pub timeout_secs: u64,
}

impl Fast2SmsConfig {
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            sender_id: "TXTIND".to_string(),
            route: "v3".to_string(),
            timeout_secs: 10,
        }
    }

    /// Read `CLASSTRACK_SMS_API_KEY` from the environment; `None`
    /// disables SMS.
    pub fn from_env() -> Option<Self> {
        std::env::var("CLASSTRACK_SMS_API_KEY")
            .ok()
            .filter(|k| !k.is_empty())
            .map(Self::new)
    }
}

#[derive(Serialize)]
struct BulkRequest<'a> {
    route: &'a str,
    sender_id: &'a str,
    message: &'a str,
    language: &'a str,
    numbers: &'a str,
}

#[derive(Deserialize)]
struct BulkResponse {
    #[serde(rename = "return")]
    accepted: bool,
    #[serde(default)]
    message: serde_json::Value,
}

/// [`AbsenceNotifier`] backed by the Fast2SMS bulk endpoint.
#[derive(Clone)]
pub struct Fast2SmsNotifier {
    client: reqwest::Client,
    config: Fast2SmsConfig,
}

fn absence_message(student_name: &str, date: NaiveDate, institute_name: &str) -> String {
    format!(
        "Dear Parent, your child {} is absent from {} today ({}). Please contact the institute if this is unexpected.",
        student_name,
        institute_name,
        date.format("%d-%m-%Y")
    )
}

impl Fast2SmsNotifier {
    pub fn new(config: Fast2SmsConfig) -> ClasstrackResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ClasstrackError::Notification(format!("http client: {e}")))?;
        Ok(Self { client, config })
    }
}

impl AbsenceNotifier for Fast2SmsNotifier {
    async fn notify_absence(
        &self,
        student_name: &str,
        contact_number: &str,
        date: NaiveDate,
        institute_name: &str,
    ) -> ClasstrackResult<()> {
        let message = absence_message(student_name, date, institute_name);
        let body = BulkRequest {
            route: &self.config.route,
            sender_id: &self.config.sender_id,
            message: &message,
            language: "english",
            numbers: contact_number,
        };

        debug!(number = %contact_number, "sending absence SMS");

        let response = self
            .client
            .post(&self.config.endpoint)
            .header("authorization", &self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| ClasstrackError::Notification(format!("fast2sms request: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ClasstrackError::Notification(format!(
                "fast2sms returned HTTP {status}"
            )));
        }

        let parsed: BulkResponse = response
            .json()
            .await
            .map_err(|e| ClasstrackError::Notification(format!("fast2sms response: {e}")))?;
        if !parsed.accepted {
            return Err(ClasstrackError::Notification(format!(
                "fast2sms rejected the message: {}",
                parsed.message
            )));
        }

        info!(number = %contact_number, "absence SMS accepted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_names_the_student_and_date() {
        let date = NaiveDate::from_ymd_opt(2025, 3, 14).unwrap();
        let msg = absence_message("Ravi Kumar", date, "ABC Tutorials");
        assert!(msg.contains("Ravi Kumar"));
        assert!(msg.contains("ABC Tutorials"));
        assert!(msg.contains("14-03-2025"));
    }

    #[test]
    fn config_defaults_target_the_bulk_endpoint() {
        let config = Fast2SmsConfig::new("key".into());
        assert_eq!(config.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(config.sender_id, "TXTIND");
        assert_eq!(config.route, "v3");
    }
}
