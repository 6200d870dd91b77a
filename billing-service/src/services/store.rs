//! In-memory bill history.

use crate::models::{
    AmountOverflow, Bill, BillFilter, BillRecord, BillStatus, DeliveryChannel, LineItem,
};
use chrono::{NaiveDate, TimeZone, Utc};
use rust_decimal::Decimal;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Shared handle to the history. Clones see the same records. Newest first.
#[derive(Clone, Default)]
pub struct BillStore {
    records: Arc<RwLock<Vec<BillRecord>>>,
}

impl BillStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with the two sample bills the shop dashboard ships with.
    pub fn with_fixtures() -> Result<Self, AmountOverflow> {
        Ok(Self {
            records: Arc::new(RwLock::new(fixtures()?)),
        })
    }

    pub async fn append(&self, record: BillRecord) {
        let mut records = self.records.write().await;
        records.insert(0, record);
    }

    /// Matching records, newest first.
    pub async fn list(&self, filter: &BillFilter) -> Vec<BillRecord> {
        let records = self.records.read().await;
        records
            .iter()
            .filter(|r| filter.matches(r))
            .cloned()
            .collect()
    }

    pub async fn get(&self, bill_number: &str) -> Option<BillRecord> {
        let records = self.records.read().await;
        records
            .iter()
            .find(|r| r.bill_number() == bill_number)
            .cloned()
    }

    pub async fn contains(&self, bill_number: &str) -> bool {
        let records = self.records.read().await;
        records.iter().any(|r| r.bill_number() == bill_number)
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

fn fixtures() -> Result<Vec<BillRecord>, AmountOverflow> {
    let rajesh = Bill::new(
        "TXN_001".to_string(),
        "Rajesh Kumar".to_string(),
        Some("rajesh.kumar@gmail.com".to_string()),
        Some("+91 98765 43210".to_string()),
        vec![LineItem::new("Mixer grinder", 1, Decimal::from(2000))],
        DeliveryChannel::Both,
        fixture_date(15),
    )?;
    let priya = Bill::new(
        "TXN_002".to_string(),
        "Priya Sharma".to_string(),
        Some("priya.sharma@yahoo.com".to_string()),
        Some("+91 87654 32109".to_string()),
        vec![LineItem::new("Table lamp", 2, Decimal::from(500))],
        DeliveryChannel::Email,
        fixture_date(14),
    )?;

    Ok(vec![
        fixture_record(rajesh, "invoice_001.pdf", 15),
        fixture_record(priya, "receipt_002.jpg", 14),
    ])
}

fn fixture_date(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, day).unwrap_or_default()
}

fn fixture_record(bill: Bill, file_name: &str, day: u32) -> BillRecord {
    let created_at = Utc
        .with_ymd_and_hms(2024, 1, day, 0, 0, 0)
        .single()
        .unwrap_or_default();
    BillRecord::new(bill, BillStatus::Sent, file_name.to_string(), created_at)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(bill_number: &str, name: &str) -> BillRecord {
        let bill = Bill::new(
            bill_number.to_string(),
            name.to_string(),
            None,
            Some("99887 76655".to_string()),
            vec![LineItem::new("LED bulb", 4, Decimal::from(120))],
            DeliveryChannel::Sms,
            NaiveDate::from_ymd_opt(2026, 5, 20).unwrap(),
        )
        .unwrap();
        BillRecord::from_bill(&bill, BillStatus::Sent)
    }

    #[tokio::test]
    async fn fixtures_are_seeded() {
        let store = BillStore::with_fixtures().unwrap();
        assert_eq!(store.len().await, 2);
        let first = store.get("TXN_001").await.unwrap();
        assert_eq!(first.amount.to_string(), "2360.00");
        assert_eq!(first.file_name, "invoice_001.pdf");
        assert_eq!(first.bill.items()[0].description, "Mixer grinder");
        assert_eq!(first.bill.display_date(), "15/1/2024");
    }

    #[tokio::test]
    async fn append_puts_newest_first() {
        let store = BillStore::with_fixtures().unwrap();
        store.append(record("INV-000001", "Meena Iyer")).await;

        let all = store.list(&BillFilter::default()).await;
        assert_eq!(all.len(), 3);
        assert_eq!(all[0].bill_number(), "INV-000001");
        assert!(store.contains("INV-000001").await);
    }

    #[tokio::test]
    async fn list_applies_search() {
        let store = BillStore::with_fixtures().unwrap();
        let filter = BillFilter {
            status: None,
            search: Some("YAHOO".to_string()),
        };
        let found = store.list(&filter).await;
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].bill.customer_name(), "Priya Sharma");
    }

    #[tokio::test]
    async fn empty_store() {
        let store = BillStore::new();
        assert!(store.is_empty().await);
        assert!(store.get("TXN_001").await.is_none());
    }
}
