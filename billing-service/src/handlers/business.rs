use crate::models::BusinessProfile;
use crate::startup::AppState;
use crate::utils::ValidatedJson;
use axum::{extract::State, Json};

pub async fn get_business(State(state): State<AppState>) -> Json<BusinessProfile> {
    Json(state.billing.business_profile().await)
}

/// Replace the profile used for every subsequent bill.
pub async fn update_business(
    State(state): State<AppState>,
    ValidatedJson(profile): ValidatedJson<BusinessProfile>,
) -> Json<BusinessProfile> {
    Json(state.billing.update_business_profile(profile).await)
}
