//! Per-channel delivery results.

use serde::{Deserialize, Serialize};

/// A single notification medium. `both` is a selection, not a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelKind {
    Email,
    Sms,
}

impl ChannelKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChannelKind::Email => "email",
            ChannelKind::Sms => "sms",
        }
    }
}

impl std::fmt::Display for ChannelKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of attempting one channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveryOutcome {
    pub channel: ChannelKind,
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
}

impl DeliveryOutcome {
    pub fn delivered(channel: ChannelKind, message: String, message_id: Option<String>) -> Self {
        Self {
            channel,
            success: true,
            message,
            message_id,
        }
    }

    pub fn failed(channel: ChannelKind, message: String) -> Self {
        Self {
            channel,
            success: false,
            message,
            message_id: None,
        }
    }
}

/// Outcomes keyed by channel. `None` means the channel was not attempted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DispatchOutcome {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<DeliveryOutcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sms: Option<DeliveryOutcome>,
}

impl DispatchOutcome {
    pub fn get(&self, channel: ChannelKind) -> Option<&DeliveryOutcome> {
        match channel {
            ChannelKind::Email => self.email.as_ref(),
            ChannelKind::Sms => self.sms.as_ref(),
        }
    }

    pub fn attempted(&self) -> impl Iterator<Item = &DeliveryOutcome> {
        self.email.iter().chain(self.sms.iter())
    }

    /// True when every attempted channel succeeded (vacuously true if none ran).
    pub fn all_delivered(&self) -> bool {
        self.attempted().all(|o| o.success)
    }
}
