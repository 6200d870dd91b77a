//! Test helper module for billing-service integration tests.
//!
//! Spawns the HTTP server on a random port with a wiremock server standing in
//! for the aggregation webhook and inspectable mock notification channels.

#![allow(dead_code)]

use billing_service::config::{
    BillingConfig, DispatchConfig, Msg91Config, SmtpConfig, StoreConfig, WebhookConfig,
};
use billing_service::models::BusinessProfile;
use billing_service::services::channels::{MockEmailChannel, MockSmsChannel};
use billing_service::services::{init_metrics, AmountFormat, BillStore, ItemsFormat};
use billing_service::startup::{Application, Channels};
use serde_json::{json, Value};
use service_core::config::Config as CoreConfig;
use std::sync::Arc;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const WEBHOOK_PATH: &str = "/hooks/bills";

/// Test application wrapper for integration tests.
pub struct TestApp {
    pub http_address: String,
    pub http_port: u16,
    pub webhook: MockServer,
    pub email: Arc<MockEmailChannel>,
    pub sms: Arc<MockSmsChannel>,
    pub store: BillStore,
    pub client: reqwest::Client,
}

/// Knobs for a single test application.
pub struct TestOptions {
    pub webhook_status: u16,
    pub email_enabled: bool,
    pub sms_enabled: bool,
    pub seed_fixtures: bool,
}

impl Default for TestOptions {
    fn default() -> Self {
        Self {
            webhook_status: 200,
            email_enabled: true,
            sms_enabled: true,
            seed_fixtures: false,
        }
    }
}

impl TestApp {
    /// Spawn with an accepting webhook and working channels.
    pub async fn spawn() -> Self {
        Self::spawn_with(TestOptions::default()).await
    }

    pub async fn spawn_with(options: TestOptions) -> Self {
        init_metrics();

        let webhook = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(WEBHOOK_PATH))
            .respond_with(ResponseTemplate::new(options.webhook_status))
            .mount(&webhook)
            .await;

        let config = test_config(
            format!("{}{}", webhook.uri(), WEBHOOK_PATH),
            options.seed_fixtures,
        );

        let email = Arc::new(MockEmailChannel::new(options.email_enabled));
        let sms = Arc::new(MockSmsChannel::new(options.sms_enabled));
        let channels = Channels {
            email: email.clone(),
            sms: sms.clone(),
        };

        let app = Application::build_with_channels(config, channels)
            .await
            .expect("Failed to build test application");

        let http_port = app.http_port();
        let store = app.store().clone();
        let http_address = format!("http://127.0.0.1:{}", http_port);

        tokio::spawn(async move {
            app.run_until_stopped().await.ok();
        });

        // Wait for HTTP server to be ready by polling health endpoint
        let client = reqwest::Client::new();
        let health_url = format!("{}/health", http_address);
        for _ in 0..50 {
            if client.get(&health_url).send().await.is_ok() {
                break;
            }
            tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;
        }

        TestApp {
            http_address,
            http_port,
            webhook,
            email,
            sms,
            store,
            client,
        }
    }

    pub async fn post_bill(&self, body: &Value) -> reqwest::Response {
        self.client
            .post(format!("{}/bills", self.http_address))
            .json(body)
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn get(&self, path: &str) -> reqwest::Response {
        self.client
            .get(format!("{}{}", self.http_address, path))
            .send()
            .await
            .expect("Failed to execute request")
    }

    /// Bodies received by the mock webhook, in arrival order.
    pub async fn webhook_payloads(&self) -> Vec<Value> {
        self.webhook
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .filter_map(|r| serde_json::from_slice(&r.body).ok())
            .collect()
    }
}

pub fn test_config(webhook_url: String, seed_fixtures: bool) -> BillingConfig {
    BillingConfig {
        common: CoreConfig { port: 0 }, // Random port
        service_name: "billing-service-test".to_string(),
        log_level: "warn".to_string(),
        otlp_endpoint: None,
        webhook: WebhookConfig {
            url: webhook_url,
            amount_format: AmountFormat::Rupees,
            items_format: ItemsFormat::Text,
        },
        dispatch: DispatchConfig { timeout_secs: 5 },
        business: BusinessProfile::default(),
        smtp: SmtpConfig {
            host: "localhost".to_string(),
            port: 2525,
            user: String::new(),
            password: String::new(),
            from_email: "noreply@example.com".to_string(),
            enabled: false,
        },
        msg91: Msg91Config {
            auth_key: String::new(),
            sender_id: String::new(),
            api_url: "http://localhost:9/".to_string(),
            enabled: false,
        },
        store: StoreConfig { seed_fixtures },
    }
}

/// Two items, 2 × ₹500 and 1 × ₹1000, sent to both channels.
pub fn sample_bill(bill_number: &str) -> Value {
    json!({
        "bill_number": bill_number,
        "customer_name": "Rajesh Kumar",
        "customer_email": "rajesh.kumar@gmail.com",
        "customer_phone": "98765 43210",
        "channel": "both",
        "items": [
            { "description": "Electric kettle", "quantity": 2, "unit_price": "500" },
            { "description": "Pop-up toaster", "quantity": 1, "unit_price": "1000" }
        ]
    })
}
