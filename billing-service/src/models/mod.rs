//! Domain models for billing-service.

mod bill;
mod business;
mod line_item;
mod outcome;
mod record;

pub use bill::{
    to_display_amount, AmountOverflow, Bill, BillDraft, DeliveryChannel, Totals, GST_RATE,
    MAX_BILL_TOTAL,
};
pub use business::BusinessProfile;
pub use line_item::LineItem;
pub use outcome::{ChannelKind, DeliveryOutcome, DispatchOutcome};
pub use record::{BillFilter, BillRecord, BillStatus};
