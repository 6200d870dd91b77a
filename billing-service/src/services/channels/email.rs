use super::{
    render_email_body, render_email_subject, ChannelError, ChannelReceipt, NotificationChannel,
};
use crate::config::SmtpConfig;
use crate::models::{Bill, BusinessProfile, ChannelKind};
use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Emails the bill through an SMTP relay (STARTTLS).
pub struct SmtpEmailChannel {
    config: SmtpConfig,
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpEmailChannel {
    pub fn new(config: SmtpConfig) -> Result<Self, ChannelError> {
        let creds = Credentials::new(config.user.clone(), config.password.clone());

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
            .map_err(|e| ChannelError::Configuration(format!("Failed to create SMTP relay: {}", e)))?
            .port(config.port)
            .credentials(creds)
            .build();

        Ok(Self { config, transport })
    }
}

#[async_trait]
impl NotificationChannel for SmtpEmailChannel {
    fn kind(&self) -> ChannelKind {
        ChannelKind::Email
    }

    fn provider(&self) -> &'static str {
        "smtp"
    }

    async fn send(
        &self,
        recipient: &str,
        bill: &Bill,
        profile: &BusinessProfile,
    ) -> Result<ChannelReceipt, ChannelError> {
        // Mail goes out under the shop's name from the relay's address;
        // replies land in the shop's inbox.
        let from_mailbox: Mailbox = format!("{} <{}>", profile.name, self.config.from_email)
            .parse()
            .map_err(|e| ChannelError::Configuration(format!("Invalid from address: {}", e)))?;

        let to_mailbox: Mailbox = recipient
            .parse()
            .map_err(|e| ChannelError::InvalidRecipient(format!("{}: {}", recipient, e)))?;

        let mut builder = Message::builder()
            .from(from_mailbox)
            .to(to_mailbox)
            .subject(render_email_subject(bill, profile));

        if let Ok(reply_to) = profile.email.parse::<Mailbox>() {
            builder = builder.reply_to(reply_to);
        }

        let message = builder
            .header(ContentType::TEXT_PLAIN)
            .body(render_email_body(bill, profile))
            .map_err(|e| ChannelError::SendFailed(format!("Failed to build message: {}", e)))?;

        let response = self
            .transport
            .send(message)
            .await
            .map_err(|e| ChannelError::SendFailed(format!("Failed to send email: {}", e)))?;

        let message_id = response.message().next().map(|s| s.to_string());

        tracing::info!(
            to = %recipient,
            bill_number = %bill.bill_number(),
            "Bill emailed"
        );

        Ok(ChannelReceipt::new(message_id))
    }
}

/// Deterministic email channel for tests and local runs.
pub struct MockEmailChannel {
    enabled: bool,
    delay: Option<Duration>,
    send_count: AtomicU64,
}

impl MockEmailChannel {
    /// A disabled mock fails every send.
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            delay: None,
            send_count: AtomicU64::new(0),
        }
    }

    /// Sleep before answering; used to exercise send timeouts.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn send_count(&self) -> u64 {
        self.send_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl NotificationChannel for MockEmailChannel {
    fn kind(&self) -> ChannelKind {
        ChannelKind::Email
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
                "Mock email channel is not enabled".to_string(),
            ));
        }

        let count = self.send_count.fetch_add(1, Ordering::SeqCst) + 1;

        tracing::info!(
            to = %recipient,
            subject = %render_email_subject(bill, profile),
            "[MOCK] Bill email would be sent"
        );

        Ok(ChannelReceipt::new(Some(format!("mock-email-{}", count))))
    }
}
