//! Line item model.

use super::AmountOverflow;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One row on a bill.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub description: String,
    pub quantity: u32,
    /// Price of a single unit in rupees.
    #[serde(alias = "price")]
    pub unit_price: Decimal,
}

impl LineItem {
    pub fn new(description: impl Into<String>, quantity: u32, unit_price: Decimal) -> Self {
        Self {
            description: description.into(),
            quantity,
            unit_price,
        }
    }

    /// quantity × unit_price, at full precision.
    pub fn line_total(&self) -> Result<Decimal, AmountOverflow> {
        Decimal::from(self.quantity)
            .checked_mul(self.unit_price)
            .ok_or(AmountOverflow)
    }
}
