//! Client for the aggregation webhook that records every bill centrally.

use super::error::DispatchError;
use crate::models::{to_display_amount, Bill, BusinessProfile, LineItem};
use reqwest::Client;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use service_core::observability::TracedClientExt;
use std::str::FromStr;
use std::time::{Duration, Instant};

/// How `amount` is encoded in the payload.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AmountFormat {
    /// Decimal rupees, two places.
    #[default]
    Rupees,
    /// Integer paise.
    Paise,
}

impl FromStr for AmountFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "rupees" => Ok(AmountFormat::Rupees),
            "paise" => Ok(AmountFormat::Paise),
            other => Err(format!("unknown amount format '{}'", other)),
        }
    }
}

/// How `items` is encoded in the payload.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemsFormat {
    /// `"Kettle x2 @ ₹500.00, Toaster x1 @ ₹1000.00"`
    #[default]
    Text,
    /// The item array serialized to a JSON string.
    Json,
}

impl FromStr for ItemsFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" => Ok(ItemsFormat::Text),
            "json" => Ok(ItemsFormat::Json),
            other => Err(format!("unknown items format '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PayloadAmount {
    #[serde(with = "rust_decimal::serde::float")]
    Rupees(Decimal),
    Paise(i64),
}

/// Body POSTed to the webhook.
#[derive(Debug, Clone, Serialize)]
pub struct AggregationPayload {
    pub brand: String,
    pub store_location: String,
    pub order_id: String,
    pub amount: PayloadAmount,
    pub date: String,
    pub delivery_date: String,
    pub payment_method: String,
    pub items: String,
    pub customer_name: String,
    pub delivery_method: String,
}

impl AggregationPayload {
    /// Fails rather than sending a wrong amount when the total does not fit
    /// the configured encoding.
    pub fn build(
        bill: &Bill,
        profile: &BusinessProfile,
        amount_format: AmountFormat,
        items_format: ItemsFormat,
    ) -> Result<Self, DispatchError> {
        let total = to_display_amount(bill.total());
        let amount = match amount_format {
            AmountFormat::Rupees => PayloadAmount::Rupees(total),
            AmountFormat::Paise => PayloadAmount::Paise(to_paise(total)?),
        };

        let date = bill.display_date();

        Ok(Self {
            brand: profile.name.clone(),
            store_location: profile.address.clone(),
            order_id: bill.bill_number().to_string(),
            amount,
            delivery_date: date.clone(),
            date,
            payment_method: profile.payment_method.clone(),
            items: encode_items(bill.items(), items_format)?,
            customer_name: bill.customer_name().to_string(),
            delivery_method: bill.channel().as_str().to_string(),
        })
    }
}

fn to_paise(rupees: Decimal) -> Result<i64, DispatchError> {
    rupees
        .checked_mul(Decimal::ONE_HUNDRED)
        .and_then(|paise| paise.trunc().to_i64())
        .ok_or_else(|| {
            DispatchError::InvalidPayload(format!("amount ₹{} does not fit in paise", rupees))
        })
}

fn encode_items(items: &[LineItem], format: ItemsFormat) -> Result<String, DispatchError> {
    match format {
        ItemsFormat::Text => Ok(items
            .iter()
            .map(|item| {
                format!(
                    "{} x{} @ ₹{}",
                    item.description,
                    item.quantity,
                    to_display_amount(item.unit_price)
                )
            })
            .collect::<Vec<_>>()
            .join(", ")),
        ItemsFormat::Json => serde_json::to_string(items)
            .map_err(|e| DispatchError::InvalidPayload(format!("items: {}", e))),
    }
}

/// Posts bills to the aggregation webhook.
#[derive(Clone)]
pub struct AggregationClient {
    client: Client,
    url: String,
    amount_format: AmountFormat,
    items_format: ItemsFormat,
}

impl AggregationClient {
    pub fn new(
        url: impl Into<String>,
        timeout: Duration,
        amount_format: AmountFormat,
        items_format: ItemsFormat,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: url.into(),
            amount_format,
            items_format,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn payload(
        &self,
        bill: &Bill,
        profile: &BusinessProfile,
    ) -> Result<AggregationPayload, DispatchError> {
        AggregationPayload::build(bill, profile, self.amount_format, self.items_format)
    }

    /// Any 2xx counts as accepted; the response body is ignored.
    pub async fn submit(
        &self,
        bill: &Bill,
        profile: &BusinessProfile,
    ) -> Result<(), DispatchError> {
        let payload = self.payload(bill, profile).inspect_err(|e| {
            tracing::error!(error = %e, bill_number = %bill.bill_number(), "Aggregation payload rejected");
        })?;
        let start = Instant::now();

        let result = self
            .client
            .traced_post(&self.url)
            .json(&payload)
            .send()
            .await;

        super::metrics::record_upstream_duration(start.elapsed().as_secs_f64());

        let response = result.map_err(|e| {
            tracing::warn!(error = %e, bill_number = %bill.bill_number(), "Aggregation webhook unreachable");
            DispatchError::UpstreamUnavailable(e.to_string())
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(
                status = status.as_u16(),
                bill_number = %bill.bill_number(),
                "Aggregation webhook rejected bill"
            );
            return Err(DispatchError::UpstreamRejected {
                status: status.as_u16(),
                body,
            });
        }

        tracing::debug!(bill_number = %bill.bill_number(), "Bill accepted by aggregation webhook");
        Ok(())
    }
}
