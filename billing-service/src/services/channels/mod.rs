//! Customer notification channels.
//!
//! The dispatcher only talks to [`NotificationChannel`]; which transport sits
//! behind it (SMTP, Msg91, or a mock) is decided at startup.

pub mod email;
pub mod sms;

use crate::models::{to_display_amount, Bill, BusinessProfile, ChannelKind};
use async_trait::async_trait;
use thiserror::Error;

pub use email::{MockEmailChannel, SmtpEmailChannel};
pub use sms::{MockSmsChannel, Msg91SmsChannel};

#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("Channel not enabled: {0}")]
    NotEnabled(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Send error: {0}")]
    SendFailed(String),

    #[error("Invalid recipient: {0}")]
    InvalidRecipient(String),
}

/// What a provider hands back on acceptance.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChannelReceipt {
    pub message_id: Option<String>,
}

impl ChannelReceipt {
    pub fn new(message_id: Option<String>) -> Self {
        Self { message_id }
    }
}

#[async_trait]
pub trait NotificationChannel: Send + Sync {
    fn kind(&self) -> ChannelKind;

    /// Short provider name for logs and metrics labels.
    fn provider(&self) -> &'static str;

    async fn send(
        &self,
        recipient: &str,
        bill: &Bill,
        profile: &BusinessProfile,
    ) -> Result<ChannelReceipt, ChannelError>;
}

pub fn render_email_subject(bill: &Bill, profile: &BusinessProfile) -> String {
    format!("Your bill {} from {}", bill.bill_number(), profile.name)
}

/// Plain-text invoice body.
pub fn render_email_body(bill: &Bill, profile: &BusinessProfile) -> String {
    let totals = bill.totals().rounded();
    let mut body = String::new();

    body.push_str(&format!("{}\n{}\n", profile.name, profile.address));
    body.push_str(&format!("Phone: {} | Email: {}\n", profile.phone, profile.email));
    body.push_str(&format!("GSTIN: {}\n\n", profile.gst_number));
    body.push_str(&format!("Bill #: {}\n", bill.bill_number()));
    body.push_str(&format!("Date: {}\n", bill.display_date()));
    body.push_str(&format!("Billed to: {}\n\n", bill.customer_name()));

    // Bill construction already checked every line total.
    for item in bill.items() {
        body.push_str(&format!(
            "{} x{} @ ₹{}",
            item.description,
            item.quantity,
            to_display_amount(item.unit_price),
        ));
        if let Ok(line_total) = item.line_total() {
            body.push_str(&format!(" = ₹{}", to_display_amount(line_total)));
        }
        body.push('\n');
    }

    body.push_str(&format!("\nSubtotal: ₹{}\n", totals.subtotal));
    body.push_str(&format!("GST (18%): ₹{}\n", totals.tax));
    body.push_str(&format!("Total: ₹{}\n\n", totals.total));
    body.push_str("Thank you for your business!\n");
    body
}

/// Short SMS receipt.
pub fn render_sms(bill: &Bill, profile: &BusinessProfile) -> String {
    format!(
        "🧾 Bill from {}\nBill #: {}\nAmount: ₹{}\nItems: {}\nDate: {}\n\nThank you for your business!\n- {}",
        profile.name,
        bill.bill_number(),
        bill.totals().rounded().total,
        bill.items().len(),
        bill.display_date(),
        profile.name,
    )
}
