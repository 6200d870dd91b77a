//! Bill composition: draft validation and totals.
//!
//! Everything here is pure. The dispatcher only ever sees bills that came out
//! of [`compose`].

use super::error::ValidationError;
use crate::models::{Bill, BillDraft, LineItem, Totals};
use chrono::{DateTime, NaiveDate, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex"));

/// Indian mobile numbering: ten digits, leading 6-9.
static INDIAN_MOBILE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[6-9]\d{9}$").expect("valid phone regex"));

/// subtotal = Σ quantity × unit_price, tax = 18% of subtotal,
/// total = subtotal + tax. Full precision; round with [`Totals::rounded`].
pub fn compute_totals(items: &[LineItem]) -> Result<Totals, ValidationError> {
    Ok(Totals::from_items(items)?)
}

/// Strip everything but ASCII digits.
pub fn normalize_phone(phone: &str) -> String {
    phone.chars().filter(|c| c.is_ascii_digit()).collect()
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

pub fn is_valid_indian_mobile(phone: &str) -> bool {
    INDIAN_MOBILE_RE.is_match(&normalize_phone(phone))
}

/// Display form `98765 43210`. Longer input is cut to ten digits; shorter
/// input is returned as bare digits.
pub fn format_phone(phone: &str) -> String {
    let digits = normalize_phone(phone);
    if digits.len() < 10 {
        return digits;
    }
    format!("{} {}", &digits[..5], &digits[5..10])
}

/// `INV-` plus the last six digits of the millisecond timestamp.
pub fn generate_bill_number(now: DateTime<Utc>) -> String {
    let millis = now.timestamp_millis().unsigned_abs();
    format!("INV-{:06}", millis % 1_000_000)
}

fn present(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Check a draft in the order the billing form reports problems.
pub fn validate(draft: &BillDraft) -> Result<(), ValidationError> {
    if draft.customer_name.trim().is_empty() {
        return Err(ValidationError::MissingField {
            field: "customer_name",
        });
    }

    if draft.channel.includes_email() {
        let email = present(draft.customer_email.as_deref()).ok_or(
            ValidationError::MissingField {
                field: "customer_email",
            },
        )?;
        if !is_valid_email(email) {
            return Err(ValidationError::InvalidFormat {
                field: "customer_email",
                reason: "Please enter a valid email address".to_string(),
            });
        }
    }

    if draft.channel.includes_sms() {
        let phone = present(draft.customer_phone.as_deref()).ok_or(
            ValidationError::MissingField {
                field: "customer_phone",
            },
        )?;
        if !is_valid_indian_mobile(phone) {
            return Err(ValidationError::InvalidFormat {
                field: "customer_phone",
                reason: "Please enter a valid Indian mobile number (10 digits starting with 6-9)"
                    .to_string(),
            });
        }
    }

    if draft.items.is_empty() {
        return Err(ValidationError::MissingField { field: "items" });
    }

    if let Some(index) = draft
        .items
        .iter()
        .position(|item| item.description.trim().is_empty())
    {
        return Err(ValidationError::EmptyDescription { index });
    }

    if let Some(index) = draft.items.iter().position(|item| item.quantity == 0) {
        return Err(ValidationError::InvalidFormat {
            field: "quantity",
            reason: format!("Item {} must have a quantity of at least 1", index + 1),
        });
    }

    if let Some(index) = draft
        .items
        .iter()
        .position(|item| item.unit_price < Decimal::ZERO)
    {
        return Err(ValidationError::InvalidFormat {
            field: "unit_price",
            reason: format!("Item {} cannot have a negative price", index + 1),
        });
    }

    if compute_totals(&draft.items)?.total <= Decimal::ZERO {
        return Err(ValidationError::NonPositiveTotal);
    }

    Ok(())
}

/// Validate and build the bill. Contact fields the channel does not use are
/// kept if supplied, so history search still finds them.
pub fn compose(draft: &BillDraft, now: DateTime<Utc>) -> Result<Bill, ValidationError> {
    validate(draft)?;

    let bill_number = present(draft.bill_number.as_deref())
        .map(str::to_string)
        .unwrap_or_else(|| generate_bill_number(now));

    let items = draft
        .items
        .iter()
        .map(|item| LineItem {
            description: item.description.trim().to_string(),
            ..item.clone()
        })
        .collect();

    let issue_date: NaiveDate = now.date_naive();

    let bill = Bill::new(
        bill_number,
        draft.customer_name.trim().to_string(),
        present(draft.customer_email.as_deref()).map(str::to_string),
        present(draft.customer_phone.as_deref()).map(str::to_string),
        items,
        draft.channel,
        issue_date,
    )?;
    Ok(bill)
}
