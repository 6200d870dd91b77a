//! Bill sending workflow: compose, dispatch, record.

use super::composer;
use super::dispatcher::{enter_stage, DispatchStage, Dispatcher};
use super::error::{BillingError, DispatchError};
use super::metrics;
use super::store::BillStore;
use crate::models::{
    Bill, BillDraft, BillRecord, BillStatus, BusinessProfile, DeliveryChannel, DispatchOutcome,
    Totals,
};
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::instrument;

/// What the caller gets back after a bill went out.
#[derive(Debug, Clone, Serialize)]
pub struct SendBillResult {
    pub record: BillRecord,
    pub delivery: DispatchOutcome,
    pub totals: Totals,
}

#[derive(Clone)]
pub struct BillingService {
    dispatcher: Dispatcher,
    store: BillStore,
    profile: Arc<RwLock<BusinessProfile>>,
}

impl BillingService {
    pub fn new(dispatcher: Dispatcher, store: BillStore, profile: BusinessProfile) -> Self {
        Self {
            dispatcher,
            store,
            profile: Arc::new(RwLock::new(profile)),
        }
    }

    pub fn store(&self) -> &BillStore {
        &self.store
    }

    /// Validate the draft, send it, and record it as sent.
    ///
    /// Nothing is recorded when validation or the aggregation step fails.
    /// Customer channel failures do not fail the call; they are reported in
    /// the returned outcomes.
    #[instrument(skip(self, draft), fields(channel = %draft.channel, bill_number, stage))]
    pub async fn send_bill(&self, draft: BillDraft) -> Result<SendBillResult, BillingError> {
        enter_stage(DispatchStage::Composing);
        enter_stage(DispatchStage::Validating);
        let bill = composer::compose(&draft, Utc::now()).map_err(|e| {
            enter_stage(DispatchStage::Failed);
            metrics::record_error(e.code(), "send_bill");
            tracing::info!(code = e.code(), error = %e, "Bill draft rejected");
            e
        })?;

        tracing::Span::current().record("bill_number", bill.bill_number());

        if self.store.contains(bill.bill_number()).await {
            enter_stage(DispatchStage::Failed);
            metrics::record_error("duplicate_bill_number", "send_bill");
            return Err(BillingError::DuplicateBillNumber(
                bill.bill_number().to_string(),
            ));
        }

        let delivery = self
            .dispatch_bill(
                &bill,
                bill.channel(),
                bill.customer_email(),
                bill.customer_phone(),
            )
            .await?;

        let record = self.add_bill_record(&bill).await;
        metrics::record_bill_sent(bill.channel().as_str());
        enter_stage(DispatchStage::Completed);

        tracing::info!(
            record_id = %record.id,
            amount = %record.amount,
            "Bill sent"
        );

        Ok(SendBillResult {
            record,
            delivery,
            totals: bill.totals().rounded(),
        })
    }

    /// Dispatch an already composed bill with the current business profile.
    pub async fn dispatch_bill(
        &self,
        bill: &Bill,
        channel: DeliveryChannel,
        email: Option<&str>,
        phone: Option<&str>,
    ) -> Result<DispatchOutcome, DispatchError> {
        let profile = self.business_profile().await;
        self.dispatcher
            .dispatch(bill, &profile, channel, email, phone)
            .await
    }

    /// Record the bill in history as sent.
    pub async fn add_bill_record(&self, bill: &Bill) -> BillRecord {
        let record = BillRecord::from_bill(bill, BillStatus::Sent);
        self.store.append(record.clone()).await;
        record
    }

    pub async fn business_profile(&self) -> BusinessProfile {
        self.profile.read().await.clone()
    }

    pub async fn update_business_profile(&self, profile: BusinessProfile) -> BusinessProfile {
        let mut current = self.profile.write().await;
        *current = profile;
        tracing::info!(business = %current.name, "Business profile updated");
        current.clone()
    }
}
