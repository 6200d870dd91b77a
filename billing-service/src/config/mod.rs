use crate::models::BusinessProfile;
use crate::services::aggregation::{AmountFormat, ItemsFormat};
use serde::Deserialize;
use service_core::config as core_config;
use service_core::error::AppError;
use std::env;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct BillingConfig {
    #[serde(flatten)]
    pub common: core_config::Config,
    pub service_name: String,
    pub log_level: String,
    pub otlp_endpoint: Option<String>,
    pub webhook: WebhookConfig,
    pub dispatch: DispatchConfig,
    pub business: BusinessProfile,
    pub smtp: SmtpConfig,
    pub msg91: Msg91Config,
    pub store: StoreConfig,
}

/// The aggregation endpoint every bill is posted to before the customer is
/// notified.
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookConfig {
    pub url: String,
    pub amount_format: AmountFormat,
    pub items_format: ItemsFormat,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DispatchConfig {
    /// Upper bound for each outbound call (webhook, email, SMS).
    pub timeout_secs: u64,
}

impl DispatchConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub from_email: String,
    pub enabled: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Msg91Config {
    pub auth_key: String,
    pub sender_id: String,
    pub api_url: String,
    pub enabled: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    /// Start the history with the two sample bills.
    pub seed_fixtures: bool,
}

impl BillingConfig {
    pub fn load() -> Result<Self, AppError> {
        let common_config = core_config::Config::load()?;
        let is_prod = env::var("ENVIRONMENT").unwrap_or_else(|_| "dev".to_string()) == "prod";
        let shop = BusinessProfile::default();

        Ok(BillingConfig {
            common: common_config,
            service_name: get_env("SERVICE_NAME", Some("billing-service"), is_prod)?,
            log_level: get_env("LOG_LEVEL", Some("info"), is_prod)?,
            otlp_endpoint: env::var("OTLP_ENDPOINT").ok().filter(|v| !v.is_empty()),
            webhook: WebhookConfig {
                url: get_env(
                    "WEBHOOK_URL",
                    Some("http://localhost:5678/webhook/bills"),
                    is_prod,
                )?,
                amount_format: parse_setting(
                    "WEBHOOK_AMOUNT_FORMAT",
                    &get_env("WEBHOOK_AMOUNT_FORMAT", Some("rupees"), is_prod)?,
                )?,
                items_format: parse_setting(
                    "WEBHOOK_ITEMS_FORMAT",
                    &get_env("WEBHOOK_ITEMS_FORMAT", Some("text"), is_prod)?,
                )?,
            },
            dispatch: DispatchConfig {
                timeout_secs: parse_timeout_secs(&get_env(
                    "DISPATCH_TIMEOUT_SECS",
                    Some("10"),
                    is_prod,
                )?)?,
            },
            business: BusinessProfile {
                name: get_env("BUSINESS_NAME", Some(&shop.name), is_prod)?,
                address: get_env("BUSINESS_ADDRESS", Some(&shop.address), is_prod)?,
                phone: get_env("BUSINESS_PHONE", Some(&shop.phone), is_prod)?,
                email: get_env("BUSINESS_EMAIL", Some(&shop.email), is_prod)?,
                gst_number: get_env("BUSINESS_GST_NUMBER", Some(&shop.gst_number), is_prod)?,
                payment_method: get_env(
                    "BUSINESS_PAYMENT_METHOD",
                    Some(&shop.payment_method),
                    is_prod,
                )?,
            },
            smtp: SmtpConfig {
                host: get_env("SMTP_HOST", Some("smtp.gmail.com"), is_prod)?,
                port: parse_setting("SMTP_PORT", &get_env("SMTP_PORT", Some("587"), is_prod)?)?,
                user: get_env("SMTP_USER", Some(""), is_prod)?,
                password: get_env("SMTP_PASSWORD", Some(""), is_prod)?,
                from_email: get_env("SMTP_FROM_EMAIL", Some("noreply@example.com"), is_prod)?,
                enabled: env_flag("SMTP_ENABLED", false),
            },
            msg91: Msg91Config {
                auth_key: get_env("MSG91_AUTH_KEY", Some(""), is_prod)?,
                sender_id: get_env("MSG91_SENDER_ID", Some(""), is_prod)?,
                api_url: get_env(
                    "MSG91_API_URL",
                    Some("https://api.msg91.com/api/v5/flow/"),
                    is_prod,
                )?,
                enabled: env_flag("MSG91_ENABLED", false),
            },
            store: StoreConfig {
                seed_fixtures: env_flag("STORE_SEED_FIXTURES", true),
            },
        })
    }
}

fn env_flag(key: &str, default: bool) -> bool {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn parse_setting<T>(key: &str, value: &str) -> Result<T, AppError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| AppError::ConfigError(anyhow::anyhow!("{}: {} ({:?})", key, e, value)))
}

/// A zero timeout would fail every outbound call immediately.
fn parse_timeout_secs(value: &str) -> Result<u64, AppError> {
    match parse_setting("DISPATCH_TIMEOUT_SECS", value)? {
        0 => Err(AppError::ConfigError(anyhow::anyhow!(
            "DISPATCH_TIMEOUT_SECS must be at least 1"
        ))),
        secs => Ok(secs),
    }
}

fn get_env(key: &str, default: Option<&str>, is_prod: bool) -> Result<String, AppError> {
    match env::var(key) {
        Ok(val) => Ok(val),
        Err(_) => {
            if is_prod {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required in production but not set",
                    key
                )))
            } else if let Some(def) = default {
                Ok(def.to_string())
            } else {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required but not set",
                    key
                )))
            }
        }
    }
}
