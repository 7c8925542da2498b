use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Booking {
    pub id: i64,
    pub tour_name: String,
    pub customer_name: Option<String>,
    pub customer_email: Option<String>,
    pub status: BookingStatus,
    pub payment_status: PaymentStatus,
    pub total_amount: Decimal,
    pub currency: String,
    pub hold_expires_at: Option<DateTime<Utc>>,
    pub departure_at: Option<DateTime<Utc>>,
    pub payment_method_id: Option<i64>,
    /// Stored payment-card details exist for this booking.
    #[serde(default)]
    pub has_saved_card: bool,
    pub cancel_reason: Option<String>,
    pub fee_amount: Option<Decimal>,
    pub refund_amount: Option<Decimal>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields accepted when the back-office opens a new booking.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewBooking {
    pub tour_name: String,
    pub customer_name: Option<String>,
    pub customer_email: Option<String>,
    pub total_amount: Decimal,
    pub currency: String,
    pub hold_expires_at: Option<DateTime<Utc>>,
    pub departure_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    PendingPayment,
    PendingConfirm,
    WaitingSupplier,
    Confirmed,
    Cancelled,
    Expired,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::PendingPayment => "pending_payment",
            BookingStatus::PendingConfirm => "pending_confirm",
            BookingStatus::WaitingSupplier => "waiting_supplier",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Cancelled => "cancelled",
            BookingStatus::Expired => "expired",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending_payment" => Some(BookingStatus::PendingPayment),
            "pending_confirm" => Some(BookingStatus::PendingConfirm),
            "waiting_supplier" => Some(BookingStatus::WaitingSupplier),
            "confirmed" => Some(BookingStatus::Confirmed),
            "cancelled" => Some(BookingStatus::Cancelled),
            "expired" => Some(BookingStatus::Expired),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, BookingStatus::Cancelled | BookingStatus::Expired)
    }
}

impl std::fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Unpaid,
    Paid,
    Refunded,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Unpaid => "unpaid",
            PaymentStatus::Paid => "paid",
            PaymentStatus::Refunded => "refunded",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "unpaid" => Some(PaymentStatus::Unpaid),
            "paid" => Some(PaymentStatus::Paid),
            "refunded" => Some(PaymentStatus::Refunded),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trips_through_str() {
        for status in [
            BookingStatus::PendingPayment,
            BookingStatus::PendingConfirm,
            BookingStatus::WaitingSupplier,
            BookingStatus::Confirmed,
            BookingStatus::Cancelled,
            BookingStatus::Expired,
        ] {
            assert_eq!(BookingStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(BookingStatus::parse("pending"), None);
    }

    #[test]
    fn test_terminal_states() {
        assert!(BookingStatus::Cancelled.is_terminal());
        assert!(BookingStatus::Expired.is_terminal());
        assert!(!BookingStatus::Confirmed.is_terminal());
        assert!(!BookingStatus::PendingPayment.is_terminal());
    }

    #[test]
    fn test_status_serializes_snake_case() {
        let json = serde_json::to_string(&BookingStatus::WaitingSupplier).unwrap();
        assert_eq!(json, "\"waiting_supplier\"");
        let json = serde_json::to_string(&PaymentStatus::Refunded).unwrap();
        assert_eq!(json, "\"refunded\"");
    }
}
