use super::{render_sms, ChannelError, ChannelReceipt, NotificationChannel};
use crate::config::Msg91Config;
use crate::models::{Bill, BusinessProfile, ChannelKind};
use crate::services::composer::{is_valid_indian_mobile, normalize_phone};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use service_core::observability::TracedClientExt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Sends the bill SMS through Msg91's transactional route.
pub struct Msg91SmsChannel {
    config: Msg91Config,
    client: Client,
}

#[derive(Debug, Serialize)]
struct Msg91Request {
    sender: String,
    route: String,
    country: String,
    sms: Vec<Msg91Sms>,
}

#[derive(Debug, Serialize)]
struct Msg91Sms {
    message: String,
    to: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct Msg91Response {
    #[serde(rename = "type")]
    response_type: String,
    message: String,
    #[serde(default)]
    request_id: Option<String>,
}

impl Msg91SmsChannel {
    pub fn new(config: Msg91Config, timeout: Duration) -> Result<Self, ChannelError> {
        if config.auth_key.is_empty() || config.sender_id.is_empty() {
            return Err(ChannelError::Configuration(
                "Msg91 auth_key and sender_id must be set".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ChannelError::Configuration(format!("HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }
}

#[async_trait]
impl NotificationChannel for Msg91SmsChannel {
    fn kind(&self) -> ChannelKind {
        ChannelKind::Sms
    }

    fn provider(&self) -> &'static str {
        "msg91"
    }

    async fn send(
        &self,
        recipient: &str,
        bill: &Bill,
        profile: &BusinessProfile,
    ) -> Result<ChannelReceipt, ChannelError> {
        if !is_valid_indian_mobile(recipient) {
            return Err(ChannelError::InvalidRecipient(
                "Invalid Indian mobile number".to_string(),
            ));
        }

        let request = Msg91Request {
            sender: self.config.sender_id.clone(),
            route: "4".to_string(), // transactional
            country: "91".to_string(),
            sms: vec![Msg91Sms {
                message: render_sms(bill, profile),
                to: vec![normalize_phone(recipient)],
            }],
        };

        let response = self
            .client
            .traced_post(&self.config.api_url)
            .header("authkey", &self.config.auth_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| ChannelError::Connection(format!("Failed to connect to Msg91: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ChannelError::SendFailed(format!(
                "Msg91 API returned error status {}: {}",
                status, body
            )));
        }

        let msg91_response: Msg91Response = response.json().await.map_err(|e| {
            ChannelError::SendFailed(format!("Failed to parse Msg91 response: {}", e))
        })?;

        if msg91_response.response_type != "success" {
            return Err(ChannelError::SendFailed(format!(
                "Msg91 error: {}",
                msg91_response.message
            )));
        }

        tracing::info!(
            to = %recipient,
            bill_number = %bill.bill_number(),
            "Bill SMS sent via Msg91"
        );

        Ok(ChannelReceipt::new(msg91_response.request_id))
    }
}

/// Deterministic SMS channel for tests and local runs. Applies the same
/// recipient check as the real provider.
pub struct MockSmsChannel {
    enabled: bool,
    delay: Option<Duration>,
    send_count: AtomicU64,
}

impl MockSmsChannel {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            delay: None,
            send_count: AtomicU64::new(0),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn send_count(&self) -> u64 {
        self.send_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl NotificationChannel for MockSmsChannel {
    fn kind(&self) -> ChannelKind {
        ChannelKind::Sms
    }

    fn provider(&self) -> &'static str {
        "mock"
    }

    async fn send(
        &self,
        recipient: &str,
        bill: &Bill,
        profile: &BusinessProfile,
    ) -> Result<ChannelReceipt, ChannelError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if !self.enabled {
            return Err(ChannelError::NotEnabled(
                "Mock SMS channel is not enabled".to_string(),
            ));
        }

        if !is_valid_indian_mobile(recipient) {
            return Err(ChannelError::InvalidRecipient(
                "Invalid Indian mobile number".to_string(),
            ));
        }

        let count = self.send_count.fetch_add(1, Ordering::SeqCst) + 1;

        tracing::info!(
            to = %recipient,
            body_length = %render_sms(bill, profile).len(),
            "[MOCK] Bill SMS would be sent"
        );

        Ok(ChannelReceipt::new(Some(format!("mock-sms-{}", count))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DeliveryChannel, LineItem};
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    fn bill() -> Bill {
        Bill::new(
            "INV-000043".to_string(),
            "Vikram Singh".to_string(),
            None,
            Some("91234 56789".to_string()),
            vec![LineItem::new("Geyser", 1, Decimal::from(6500))],
            DeliveryChannel::Sms,
            NaiveDate::from_ymd_opt(2026, 2, 2).unwrap(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn mock_rejects_non_indian_numbers() {
        let channel = MockSmsChannel::new(true);
        let result = channel
            .send("12345", &bill(), &BusinessProfile::default())
            .await;

        assert!(matches!(result, Err(ChannelError::InvalidRecipient(_))));
        assert_eq!(channel.send_count(), 0);
    }

    #[tokio::test]
    async fn mock_accepts_spaced_number() {
        let channel = MockSmsChannel::new(true);
        let receipt = channel
            .send("91234 56789", &bill(), &BusinessProfile::default())
            .await
            .unwrap();

        assert_eq!(receipt.message_id.as_deref(), Some("mock-sms-1"));
    }

    #[test]
    fn msg91_requires_credentials() {
        let config = Msg91Config {
            auth_key: String::new(),
            sender_id: "SHRMEL".to_string(),
            api_url: "http://localhost".to_string(),
            enabled: true,
        };
        assert!(matches!(
            Msg91SmsChannel::new(config, Duration::from_secs(1)),
            Err(ChannelError::Configuration(_))
        ));
    }
}
