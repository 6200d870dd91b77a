//! Error taxonomy for bill composition and dispatch.

use crate::models::AmountOverflow;
use service_core::error::AppError;
use thiserror::Error;

/// Local validation failures. Raised before any network activity.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{}", missing_field_message(.field))]
    MissingField { field: &'static str },

    #[error("{reason}")]
    InvalidFormat { field: &'static str, reason: String },

    #[error("All items must have a description (item {})", .index + 1)]
    EmptyDescription { index: usize },

    #[error("Bill total must be greater than zero")]
    NonPositiveTotal,

    #[error("{0}")]
    AmountTooLarge(AmountOverflow),
}

impl From<AmountOverflow> for ValidationError {
    fn from(err: AmountOverflow) -> Self {
        ValidationError::AmountTooLarge(err)
    }
}

fn missing_field_message(field: &str) -> String {
    match field {
        "customer_name" => "Customer name is required".to_string(),
        "customer_email" => "Customer email is required for email delivery".to_string(),
        "customer_phone" => "Customer phone number is required for SMS delivery".to_string(),
        "items" => "At least one item is required".to_string(),
        other => format!("{} is required", other),
    }
}

impl ValidationError {
    /// Stable identifier returned to API callers.
    pub fn code(&self) -> &'static str {
        match self {
            ValidationError::MissingField { .. } => "missing_field",
            ValidationError::InvalidFormat { .. } => "invalid_format",
            ValidationError::EmptyDescription { .. } => "empty_description",
            ValidationError::NonPositiveTotal => "non_positive_total",
            ValidationError::AmountTooLarge(_) => "amount_too_large",
        }
    }
}

/// Failures of the mandatory aggregation step. Either one aborts the dispatch
/// before any customer notification is attempted.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("Aggregation webhook rejected bill with status {status}: {body}")]
    UpstreamRejected { status: u16, body: String },

    #[error("Aggregation webhook unreachable: {0}")]
    UpstreamUnavailable(String),

    /// The bill could not be encoded in the configured webhook format.
    #[error("Aggregation payload could not be built: {0}")]
    InvalidPayload(String),
}

#[derive(Debug, Error)]
pub enum BillingError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    #[error("Bill number {0} has already been used")]
    DuplicateBillNumber(String),

    #[error("Bill {0} not found")]
    NotFound(String),
}

impl From<BillingError> for AppError {
    fn from(err: BillingError) -> Self {
        match err {
            BillingError::Validation(e) => AppError::UnprocessableEntity {
                code: e.code().to_string(),
                message: e.to_string(),
            },
            BillingError::Dispatch(DispatchError::InvalidPayload(reason)) => {
                AppError::InternalError(anyhow::anyhow!("{}", reason))
            }
            BillingError::Dispatch(e) => AppError::BadGateway(e.to_string()),
            BillingError::DuplicateBillNumber(_) => AppError::Conflict(anyhow::anyhow!("{}", err)),
            BillingError::NotFound(_) => AppError::NotFound(anyhow::anyhow!("{}", err)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_match_what_the_form_shows() {
        assert_eq!(
            ValidationError::MissingField {
                field: "customer_email"
            }
            .to_string(),
            "Customer email is required for email delivery"
        );
        assert_eq!(
            ValidationError::EmptyDescription { index: 1 }.to_string(),
            "All items must have a description (item 2)"
        );
    }

    #[test]
    fn codes_are_snake_case_variant_names() {
        assert_eq!(ValidationError::NonPositiveTotal.code(), "non_positive_total");
        assert_eq!(
            ValidationError::InvalidFormat {
                field: "customer_phone",
                reason: "bad".to_string()
            }
            .code(),
            "invalid_format"
        );
        assert_eq!(
            ValidationError::from(AmountOverflow).code(),
            "amount_too_large"
        );
    }

    #[test]
    fn unencodable_payload_is_an_internal_error() {
        let err = BillingError::Dispatch(DispatchError::InvalidPayload("paise".to_string()));
        assert!(matches!(AppError::from(err), AppError::InternalError(_)));
    }
}
