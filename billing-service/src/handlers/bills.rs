//! Bill endpoints: totals preview, validation, sending and history.

use crate::models::{BillDraft, BillFilter, BillRecord, BillStatus, LineItem, Totals};
use crate::services::composer;
use crate::services::error::BillingError;
use crate::services::SendBillResult;
use crate::startup::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use service_core::error::AppError;

#[derive(Debug, Deserialize)]
pub struct TotalsRequest {
    #[serde(default)]
    pub items: Vec<LineItem>,
}

#[derive(Debug, Serialize)]
pub struct ValidationResponse {
    pub valid: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct HistoryQuery {
    /// `sent`, `pending`, `failed` or `all`.
    pub status: Option<String>,
    pub search: Option<String>,
}

impl TryFrom<HistoryQuery> for BillFilter {
    type Error = AppError;

    fn try_from(query: HistoryQuery) -> Result<Self, Self::Error> {
        let status = match query.status.as_deref() {
            None | Some("") | Some("all") => None,
            Some(s) => Some(BillStatus::parse(s).ok_or_else(|| {
                AppError::BadRequest(anyhow::anyhow!("Unknown status filter '{}'", s))
            })?),
        };

        Ok(BillFilter {
            status,
            search: query.search,
        })
    }
}

/// Rounded totals for a set of items, for live preview while editing.
pub async fn compute_totals(
    Json(request): Json<TotalsRequest>,
) -> Result<Json<Totals>, AppError> {
    let totals = composer::compute_totals(&request.items).map_err(BillingError::from)?;
    Ok(Json(totals.rounded()))
}

pub async fn validate_bill(
    Json(draft): Json<BillDraft>,
) -> Result<Json<ValidationResponse>, AppError> {
    composer::validate(&draft).map_err(BillingError::from)?;
    Ok(Json(ValidationResponse { valid: true }))
}

pub async fn send_bill(
    State(state): State<AppState>,
    Json(draft): Json<BillDraft>,
) -> Result<(StatusCode, Json<SendBillResult>), AppError> {
    tracing::info!(
        channel = %draft.channel,
        items = draft.items.len(),
        "Sending bill"
    );

    let result = state.billing.send_bill(draft).await?;
    Ok((StatusCode::CREATED, Json(result)))
}

pub async fn list_bills(
    State(state): State<AppState>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<Vec<BillRecord>>, AppError> {
    let filter = BillFilter::try_from(query)?;
    Ok(Json(state.billing.store().list(&filter).await))
}

pub async fn get_bill(
    State(state): State<AppState>,
    Path(bill_number): Path<String>,
) -> Result<Json<BillRecord>, AppError> {
    let record = state
        .billing
        .store()
        .get(&bill_number)
        .await
        .ok_or(BillingError::NotFound(bill_number))?;

    Ok(Json(record))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_status_means_no_filter() {
        let filter = BillFilter::try_from(HistoryQuery {
            status: Some("all".to_string()),
            search: None,
        })
        .unwrap();
        assert!(filter.status.is_none());
    }

    #[tokio::test]
    async fn totals_preview_rejects_overflowing_items() {
        let request = TotalsRequest {
            items: vec![LineItem::new("Television", 2, rust_decimal::Decimal::MAX)],
        };
        let result = compute_totals(Json(request)).await;
        assert!(matches!(
            result,
            Err(AppError::UnprocessableEntity { ref code, .. }) if code == "amount_too_large"
        ));
    }

    #[test]
    fn unknown_status_is_bad_request() {
        let result = BillFilter::try_from(HistoryQuery {
            status: Some("archived".to_string()),
            search: None,
        });
        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }
}
