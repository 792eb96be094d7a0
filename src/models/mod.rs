pub mod alert;
pub mod trade;

pub use alert::{Alert, AlertReason};
pub use trade::{LedgerEntry, TradeRecord};
