//! Bill history entries.

use super::Bill;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Delivery status shown in the history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BillStatus {
    Sent,
    Pending,
    Failed,
}

impl BillStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BillStatus::Sent => "sent",
            BillStatus::Pending => "pending",
            BillStatus::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "sent" => Some(BillStatus::Sent),
            "pending" => Some(BillStatus::Pending),
            "failed" => Some(BillStatus::Failed),
            _ => None,
        }
    }
}

/// Immutable history entry created once a dispatch completes. The full bill
/// is kept and serialized inline, so a lookup returns the items, subtotal,
/// tax and issue date alongside the record metadata.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BillRecord {
    pub id: Uuid,
    #[serde(flatten)]
    pub bill: Bill,
    /// Rounded total shown in the history list.
    pub amount: Decimal,
    pub status: BillStatus,
    pub file_name: String,
    pub created_at: DateTime<Utc>,
}

impl BillRecord {
    pub fn from_bill(bill: &Bill, status: BillStatus) -> Self {
        Self::new(
            bill.clone(),
            status,
            format!("{}.pdf", bill.bill_number()),
            Utc::now(),
        )
    }

    pub fn new(
        bill: Bill,
        status: BillStatus,
        file_name: String,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            amount: bill.totals().rounded().total,
            bill,
            status,
            file_name,
            created_at,
        }
    }

    pub fn bill_number(&self) -> &str {
        self.bill.bill_number()
    }

    /// Case-insensitive match over email, name and file name; plain substring
    /// match over the phone number.
    pub fn matches_search(&self, term: &str) -> bool {
        let needle = term.to_lowercase();
        let contains = |field: &str| field.to_lowercase().contains(&needle);

        self.bill.customer_email().is_some_and(contains)
            || contains(self.bill.customer_name())
            || contains(&self.file_name)
            || self
                .bill
                .customer_phone()
                .is_some_and(|phone| phone.contains(term))
    }
}

/// History listing filter.
#[derive(Debug, Clone, Default)]
pub struct BillFilter {
    pub status: Option<BillStatus>,
    pub search: Option<String>,
}

impl BillFilter {
    pub fn matches(&self, record: &BillRecord) -> bool {
        let status_ok = self.status.is_none_or(|status| record.status == status);
        let search_ok = match self.search.as_deref().map(str::trim) {
            Some(term) if !term.is_empty() => record.matches_search(term),
            _ => true,
        };
        status_ok && search_ok
    }
}
