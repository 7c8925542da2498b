use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Advisory fee/refund breakdown shown before a paid booking is cancelled.
/// The backend records the authoritative numbers when it commits.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RefundQuote {
    pub fee_pct: Decimal,
    pub fee_amount: Decimal,
    pub refund_amount: Decimal,
    pub currency: String,
}
