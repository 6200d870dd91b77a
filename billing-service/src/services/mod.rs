//! Services module for billing-service.

pub mod aggregation;
pub mod billing;
pub mod channels;
pub mod composer;
pub mod dispatcher;
pub mod error;
pub mod metrics;
pub mod store;

pub use aggregation::{AggregationClient, AggregationPayload, AmountFormat, ItemsFormat};
pub use billing::{BillingService, SendBillResult};
pub use dispatcher::{DispatchStage, Dispatcher};
pub use error::{BillingError, DispatchError, ValidationError};
pub use metrics::{get_metrics, init_metrics};
pub use store::BillStore;
