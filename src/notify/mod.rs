//! Guardian SMS notifications.

use crate::config::SmsConfig;
use crate::core::ports::{AuditLog, DeliveryAttempt, DeliveryStatus, Notifier};
use crate::errors::AppResult;
use crate::models::NotificationMessage;
use chrono::Local;
use reqwest::blocking::Client;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

/// Sends one SMS per call through the provider's JSON API and audits every
/// attempt that reaches the network.
pub struct SmsClient {
    http: Client,
    endpoint: String,
    auth_token: String,
    audit: Arc<dyn AuditLog>,
}

impl SmsClient {
    pub fn new(cfg: &SmsConfig, audit: Arc<dyn AuditLog>) -> AppResult<Self> {
        let timeout = Duration::from_secs(cfg.timeout_secs.max(1));
        let http = Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .build()?;

        let endpoint = format!(
            "{}/v1/{}/messages/single",
            cfg.base_url.trim_end_matches('/'),
            cfg.account_id
        );

        Ok(Self {
            http,
            endpoint,
            auth_token: cfg.auth_token.clone(),
            audit,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn audit(
        &self,
        message: &NotificationMessage,
        status: Option<u16>,
        response: String,
        outcome: &'static str,
    ) {
        let attempt = DeliveryAttempt {
            recipient: message.recipient_phone.clone(),
            message: message.body.clone(),
            http_status: status,
            response,
            outcome,
            attempted_at: Local::now().naive_local(),
        };
        if let Err(e) = self.audit.record_delivery(&attempt) {
            tracing::error!(error = %e, "failed to record SMS attempt");
        }
    }
}

impl Notifier for SmsClient {
    fn send(&self, message: &NotificationMessage) -> DeliveryStatus {
        let recipient = message.recipient_phone.trim();
        if recipient.is_empty() {
            tracing::error!("SMS recipient phone number is missing or empty");
            return DeliveryStatus::InvalidRecipient;
        }

        let payload = json!({ "message": message.body, "recipients": recipient });
        let result = self
            .http
            .post(&self.endpoint)
            .header("AuthToken", &self.auth_token)
            .json(&payload)
            .send();

        match result {
            Ok(resp) => {
                let status = resp.status();
                let body = resp.text().unwrap_or_default();
                tracing::info!(status = status.as_u16(), response = %body, "SMS API response");

                if status.is_success() {
                    self.audit(message, Some(status.as_u16()), body, "sent");
                    DeliveryStatus::Delivered(status.as_u16())
                } else {
                    self.audit(message, Some(status.as_u16()), body, "rejected");
                    DeliveryStatus::Rejected(status.as_u16())
                }
            }
            Err(e) => {
                tracing::error!(error = %e, "SMS sending error");
                self.audit(message, None, e.to_string(), "failed");
                DeliveryStatus::Failed(e.to_string())
            }
        }
    }
}
