pub mod http;
pub mod sqlite;

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::models::{Booking, NewBooking, PaymentMethod};
use crate::services::lifecycle::TransitionError;

#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("booking {0} not found")]
    NotFound(i64),

    #[error(transparent)]
    Transition(#[from] TransitionError),

    #[error("hold on booking {0} has expired")]
    HoldExpired(i64),

    #[error("rejected: {0}")]
    Rejected(String),

    #[error("unavailable: {0}")]
    Unavailable(String),

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("backend request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// The authoritative booking/payment store behind the rule components.
#[async_trait]
pub trait BookingBackend: Send + Sync {
    async fn get_booking(&self, id: i64) -> Result<Option<Booking>, BackendError>;

    /// Methods in the order checkout should offer them.
    async fn list_payment_methods(&self) -> Result<Vec<PaymentMethod>, BackendError>;

    /// Fee percentage the cancellation policy assigns to this booking right now.
    async fn cancellation_fee_pct(&self, booking_id: i64) -> Result<Decimal, BackendError>;

    async fn commit_cancellation(&self, booking_id: i64, reason: &str) -> Result<Booking, BackendError>;

    /// `Ok(false)` means the processor declined the card.
    async fn register_card(&self, booking_id: i64, card_token: &str) -> Result<bool, BackendError>;

    async fn submit_checkout(&self, booking_id: i64, payment_method_id: i64) -> Result<Booking, BackendError>;

    async fn create_booking(&self, booking: &NewBooking) -> Result<Booking, BackendError>;

    async fn list_bookings(&self, status: Option<&str>, limit: i64) -> Result<Vec<Booking>, BackendError>;

    async fn confirm_booking(&self, booking_id: i64) -> Result<Booking, BackendError>;

    async fn record_payment(&self, booking_id: i64) -> Result<Booking, BackendError>;

    async fn save_payment_method(&self, method: &PaymentMethod) -> Result<(), BackendError>;

    /// Marks pending bookings whose hold has lapsed as expired.
    async fn sweep_expired_holds(&self) -> Result<usize, BackendError>;
}
