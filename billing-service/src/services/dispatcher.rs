//! Delivery dispatcher.
//!
//! A dispatch runs in two stages. The bill is first posted to the aggregation
//! webhook; if that fails nothing else happens. Otherwise the selected
//! customer channels are notified concurrently and each result is captured
//! independently.

use super::aggregation::AggregationClient;
use super::channels::NotificationChannel;
use super::error::DispatchError;
use super::metrics;
use crate::models::{
    Bill, BusinessProfile, ChannelKind, DeliveryChannel, DeliveryOutcome, DispatchOutcome,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::{instrument, Span};

/// Where a bill currently is in its lifecycle. Recorded on the dispatch span.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchStage {
    Composing,
    Validating,
    AggregatingUpstream,
    Notifying,
    Completed,
    Failed,
}

impl DispatchStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            DispatchStage::Composing => "composing",
            DispatchStage::Validating => "validating",
            DispatchStage::AggregatingUpstream => "aggregating_upstream",
            DispatchStage::Notifying => "notifying",
            DispatchStage::Completed => "completed",
            DispatchStage::Failed => "failed",
        }
    }
}

pub const EMAIL_FAILURE_MESSAGE: &str =
    "Failed to send email. Please check the email address and try again.";

#[derive(Clone)]
pub struct Dispatcher {
    aggregation: AggregationClient,
    email: Arc<dyn NotificationChannel>,
    sms: Arc<dyn NotificationChannel>,
    timeout: Duration,
}

impl Dispatcher {
    pub fn new(
        aggregation: AggregationClient,
        email: Arc<dyn NotificationChannel>,
        sms: Arc<dyn NotificationChannel>,
        timeout: Duration,
    ) -> Self {
        Self {
            aggregation,
            email,
            sms,
            timeout,
        }
    }

    /// Submit the bill upstream, then notify the customer.
    ///
    /// Only the aggregation step can fail the call. Channel errors and
    /// timeouts are folded into the returned outcomes. A channel that is not
    /// selected, or has no recipient, is left as `None`.
    #[instrument(
        skip(self, bill, profile, channel, email, phone),
        fields(bill_number = %bill.bill_number(), channel = %channel, stage)
    )]
    pub async fn dispatch(
        &self,
        bill: &Bill,
        profile: &BusinessProfile,
        channel: DeliveryChannel,
        email: Option<&str>,
        phone: Option<&str>,
    ) -> Result<DispatchOutcome, DispatchError> {
        enter_stage(DispatchStage::AggregatingUpstream);

        if let Err(e) = self.aggregation.submit(bill, profile).await {
            enter_stage(DispatchStage::Failed);
            let result = match &e {
                DispatchError::UpstreamRejected { .. } => "upstream_rejected",
                DispatchError::UpstreamUnavailable(_) => "upstream_unavailable",
                DispatchError::InvalidPayload(_) => "invalid_payload",
            };
            metrics::record_dispatch_result(result);
            metrics::record_error(result, "dispatch");
            tracing::error!(error = %e, "Dispatch aborted before notifying customer");
            return Err(e);
        }

        enter_stage(DispatchStage::Notifying);

        let email_target = email.filter(|_| channel.includes_email());
        let sms_target = phone.filter(|_| channel.includes_sms());

        let email_send = async {
            match email_target {
                Some(to) => Some(self.notify(self.email.as_ref(), to, bill, profile).await),
                None => None,
            }
        };
        let sms_send = async {
            match sms_target {
                Some(to) => Some(self.notify(self.sms.as_ref(), to, bill, profile).await),
                None => None,
            }
        };

        let (email, sms) = tokio::join!(email_send, sms_send);

        enter_stage(DispatchStage::Completed);
        metrics::record_dispatch_result("completed");

        let outcome = DispatchOutcome { email, sms };
        tracing::info!(
            all_delivered = outcome.all_delivered(),
            "Dispatch completed"
        );
        Ok(outcome)
    }

    async fn notify(
        &self,
        channel: &dyn NotificationChannel,
        recipient: &str,
        bill: &Bill,
        profile: &BusinessProfile,
    ) -> DeliveryOutcome {
        let kind = channel.kind();
        let result = tokio::time::timeout(self.timeout, channel.send(recipient, bill, profile)).await;

        let outcome = match result {
            Ok(Ok(receipt)) => DeliveryOutcome::delivered(
                kind,
                success_message(kind, recipient),
                receipt.message_id,
            ),
            Ok(Err(e)) => {
                tracing::warn!(channel = %kind, provider = channel.provider(), error = %e, "Notification failed");
                DeliveryOutcome::failed(kind, failure_message(kind, e.to_string()))
            }
            Err(_) => {
                tracing::warn!(
                    channel = %kind,
                    provider = channel.provider(),
                    timeout_secs = self.timeout.as_secs_f64(),
                    "Notification timed out"
                );
                DeliveryOutcome::failed(
                    kind,
                    failure_message(kind, format!("Timed out after {:?}", self.timeout)),
                )
            }
        };

        metrics::record_delivery(kind.as_str(), channel.provider(), outcome.success);
        outcome
    }
}

pub(crate) fn enter_stage(stage: DispatchStage) {
    Span::current().record("stage", stage.as_str());
    tracing::debug!(stage = stage.as_str(), "Dispatch stage");
}

fn success_message(kind: ChannelKind, recipient: &str) -> String {
    match kind {
        ChannelKind::Email => format!("Bill successfully sent to {}", recipient),
        ChannelKind::Sms => format!("Bill SMS sent to {}", recipient),
    }
}

fn failure_message(kind: ChannelKind, error: String) -> String {
    match kind {
        ChannelKind::Email => EMAIL_FAILURE_MESSAGE.to_string(),
        ChannelKind::Sms => error,
    }
}
