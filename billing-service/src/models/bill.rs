//! Bill model and the draft it is composed from.

use super::LineItem;
use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Goods and services tax applied to every bill (18%).
pub const GST_RATE: Decimal = Decimal::from_parts(18, 0, 0, false, 2);

/// Largest bill total accepted, ₹10^15. Keeps every amount, including the
/// paise value of the total, well inside `i64`.
pub const MAX_BILL_TOTAL: Decimal = Decimal::from_parts(2_764_472_320, 232_830, 0, false, 0);

/// Bill arithmetic left the supported range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Bill total exceeds the maximum of ₹{}", MAX_BILL_TOTAL)]
pub struct AmountOverflow;

/// Where a bill is delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryChannel {
    Email,
    Sms,
    Both,
}

impl DeliveryChannel {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeliveryChannel::Email => "email",
            DeliveryChannel::Sms => "sms",
            DeliveryChannel::Both => "both",
        }
    }

    pub fn includes_email(&self) -> bool {
        matches!(self, DeliveryChannel::Email | DeliveryChannel::Both)
    }

    pub fn includes_sms(&self) -> bool {
        matches!(self, DeliveryChannel::Sms | DeliveryChannel::Both)
    }
}

impl std::fmt::Display for DeliveryChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unvalidated bill input as submitted by the shop owner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BillDraft {
    /// Generated when absent.
    #[serde(default)]
    pub bill_number: Option<String>,
    #[serde(default)]
    pub customer_name: String,
    #[serde(default)]
    pub customer_email: Option<String>,
    #[serde(default)]
    pub customer_phone: Option<String>,
    #[serde(alias = "delivery_method")]
    pub channel: DeliveryChannel,
    #[serde(default)]
    pub items: Vec<LineItem>,
}

/// Subtotal, tax and total of a set of line items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Totals {
    pub subtotal: Decimal,
    pub tax: Decimal,
    pub total: Decimal,
}

impl Totals {
    /// Sum the items and apply GST. No rounding happens here.
    ///
    /// Fails when any intermediate overflows or the total magnitude is above
    /// [`MAX_BILL_TOTAL`].
    pub fn from_items(items: &[LineItem]) -> Result<Self, AmountOverflow> {
        let subtotal = items.iter().try_fold(Decimal::ZERO, |acc, item| {
            acc.checked_add(item.line_total()?).ok_or(AmountOverflow)
        })?;
        let tax = subtotal.checked_mul(GST_RATE).ok_or(AmountOverflow)?;
        let total = subtotal.checked_add(tax).ok_or(AmountOverflow)?;

        if total.abs() > MAX_BILL_TOTAL {
            return Err(AmountOverflow);
        }

        Ok(Self {
            subtotal,
            tax,
            total,
        })
    }

    /// Presentation form: every amount at exactly two decimal places.
    pub fn rounded(&self) -> Self {
        Self {
            subtotal: to_display_amount(self.subtotal),
            tax: to_display_amount(self.tax),
            total: to_display_amount(self.total),
        }
    }
}

/// Round half away from zero to two places and pin the scale, so `2000`
/// renders as `2000.00`.
pub fn to_display_amount(amount: Decimal) -> Decimal {
    let mut rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(2);
    rounded
}

/// A validated bill. Totals are derived from `items` on construction and
/// cannot be set independently.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bill {
    bill_number: String,
    customer_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    customer_email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    customer_phone: Option<String>,
    items: Vec<LineItem>,
    subtotal: Decimal,
    tax_amount: Decimal,
    total: Decimal,
    issue_date: NaiveDate,
    channel: DeliveryChannel,
}

impl Bill {
    pub fn new(
        bill_number: String,
        customer_name: String,
        customer_email: Option<String>,
        customer_phone: Option<String>,
        items: Vec<LineItem>,
        channel: DeliveryChannel,
        issue_date: NaiveDate,
    ) -> Result<Self, AmountOverflow> {
        let totals = Totals::from_items(&items)?;
        Ok(Self {
            bill_number,
            customer_name,
            customer_email,
            customer_phone,
            items,
            subtotal: totals.subtotal,
            tax_amount: totals.tax,
            total: totals.total,
            issue_date,
            channel,
        })
    }

    pub fn bill_number(&self) -> &str {
        &self.bill_number
    }

    pub fn customer_name(&self) -> &str {
        &self.customer_name
    }

    pub fn customer_email(&self) -> Option<&str> {
        self.customer_email.as_deref()
    }

    pub fn customer_phone(&self) -> Option<&str> {
        self.customer_phone.as_deref()
    }

    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    pub fn subtotal(&self) -> Decimal {
        self.subtotal
    }

    pub fn tax_amount(&self) -> Decimal {
        self.tax_amount
    }

    pub fn total(&self) -> Decimal {
        self.total
    }

    pub fn totals(&self) -> Totals {
        Totals {
            subtotal: self.subtotal,
            tax: self.tax_amount,
            total: self.total,
        }
    }

    pub fn issue_date(&self) -> NaiveDate {
        self.issue_date
    }

    pub fn channel(&self) -> DeliveryChannel {
        self.channel
    }

    /// Issue date in the `en-IN` short form used on receipts, e.g. `5/1/2026`.
    pub fn display_date(&self) -> String {
        self.issue_date.format("%-d/%-m/%Y").to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gst_rate_is_eighteen_percent() {
        assert_eq!(GST_RATE, Decimal::new(18, 2));
    }

    #[test]
    fn rounded_pins_two_decimal_places() {
        let totals = Totals::from_items(&[LineItem::new("Cable", 1, Decimal::from(2000))]).unwrap();
        let rounded = totals.rounded();
        assert_eq!(rounded.subtotal.to_string(), "2000.00");
        assert_eq!(rounded.tax.to_string(), "360.00");
        assert_eq!(rounded.total.to_string(), "2360.00");
    }

    #[test]
    fn rounding_only_happens_at_presentation() {
        // 3 × 0.333 = 0.999; tax = 0.17982
        let totals = Totals::from_items(&[LineItem::new("Washer", 3, Decimal::new(333, 3))]).unwrap();
        assert_eq!(totals.tax, Decimal::new(17982, 5));
        assert_eq!(totals.rounded().tax.to_string(), "0.18");
    }

    #[test]
    fn bill_totals_follow_items() {
        let bill = Bill::new(
            "INV-000001".to_string(),
            "Rajesh Kumar".to_string(),
            None,
            None,
            vec![LineItem::new("Mixer grinder", 1, Decimal::from(1000))],
            DeliveryChannel::Email,
            NaiveDate::from_ymd_opt(2026, 1, 5).unwrap(),
        )
        .unwrap();
        assert_eq!(bill.total(), Decimal::from(1180));
        assert_eq!(bill.display_date(), "5/1/2026");
    }

    #[test]
    fn totals_reject_overflowing_items() {
        let items = [LineItem::new("Television", 2, Decimal::MAX)];
        assert_eq!(Totals::from_items(&items), Err(AmountOverflow));

        let items = [
            LineItem::new("Gold bar", 1, Decimal::MAX),
            LineItem::new("Gold bar", 1, Decimal::MAX),
        ];
        assert_eq!(Totals::from_items(&items), Err(AmountOverflow));
    }

    #[test]
    fn totals_cap_at_max_bill_total() {
        // subtotal × 1.18 must stay at or under the cap
        let at_cap = [LineItem::new("Warehouse", 1, Decimal::from(100_000_000_000_000_u64))];
        assert!(Totals::from_items(&at_cap).is_ok());

        let over_cap = [LineItem::new("Warehouse", 1, MAX_BILL_TOTAL)];
        assert_eq!(Totals::from_items(&over_cap), Err(AmountOverflow));
    }

    #[test]
    fn channel_membership() {
        assert!(DeliveryChannel::Both.includes_email());
        assert!(DeliveryChannel::Both.includes_sms());
        assert!(!DeliveryChannel::Email.includes_sms());
        assert!(!DeliveryChannel::Sms.includes_email());
    }

    #[test]
    fn draft_accepts_delivery_method_alias() {
        let draft: BillDraft = serde_json::from_str(
            r#"{"customer_name":"Priya","delivery_method":"sms","items":[]}"#,
        )
        .unwrap();
        assert_eq!(draft.channel, DeliveryChannel::Sms);
        assert!(draft.bill_number.is_none());
    }
}
