use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PaymentMethod {
    pub id: i64,
    pub name: String,
    /// Processor code, e.g. `vnpay`, `card`, `bank`.
    #[serde(default)]
    pub provider: String,
    pub rule_min: Decimal,
    /// Zero means no upper bound.
    pub rule_max: Decimal,
    pub currency: String,
    #[serde(default)]
    pub position: i64,
}

impl PaymentMethod {
    pub fn has_upper_bound(&self) -> bool {
        self.rule_max > Decimal::ZERO
    }
}
