//! The shop issuing bills.

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Business identity printed on every bill and sent to the aggregation
/// webhook as `brand` / `store_location`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct BusinessProfile {
    #[validate(length(min = 1, max = 120, message = "Business name is required"))]
    pub name: String,

    #[validate(length(min = 1, max = 300, message = "Business address is required"))]
    pub address: String,

    #[validate(length(min = 1, max = 32, message = "Business phone is required"))]
    pub phone: String,

    #[validate(email(message = "Invalid business email"))]
    pub email: String,

    #[validate(length(min = 1, max = 32, message = "GST number is required"))]
    pub gst_number: String,

    #[serde(default = "default_payment_method")]
    #[validate(length(min = 1, max = 32, message = "Payment method is required"))]
    pub payment_method: String,
}

fn default_payment_method() -> String {
    "UPI".to_string()
}

impl Default for BusinessProfile {
    fn default() -> Self {
        Self {
            name: "Sharma Electronics".to_string(),
            address: "Shop No. 15, Connaught Place, New Delhi - 110001".to_string(),
            phone: "+91 11 2334 5678".to_string(),
            email: "contact@sharmaelectronics.in".to_string(),
            gst_number: "GST07AABCS1234F1Z5".to_string(),
            payment_method: default_payment_method(),
        }
    }
}
