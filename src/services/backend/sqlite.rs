use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use rusqlite::Connection;
use rust_decimal::Decimal;

use super::{BackendError, BookingBackend};
use crate::db::queries::{self, CancellationRecord};
use crate::models::{Booking, NewBooking, PaymentMethod, PaymentStatus};
use crate::services::hold_timer::{Clock, HoldTimer};
use crate::services::lifecycle::{transition, BookingEvent};
use crate::services::refund::{compute_quote, refund_applicable};

const MAX_CARD_TOKEN_LEN: usize = 255;

/// Local authoritative store.
pub struct SqliteBackend {
    db: Arc<Mutex<Connection>>,
    clock: Arc<dyn Clock>,
}

impl SqliteBackend {
    pub fn new(db: Arc<Mutex<Connection>>, clock: Arc<dyn Clock>) -> Self {
        Self { db, clock }
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, BackendError> {
        self.db
            .lock()
            .map_err(|_| BackendError::Other(anyhow::anyhow!("database lock poisoned")))
    }

    fn load(conn: &Connection, id: i64) -> Result<Booking, BackendError> {
        queries::get_booking_by_id(conn, id)?.ok_or(BackendError::NotFound(id))
    }

    fn fee_pct(&self, conn: &Connection, booking: &Booking) -> Result<Decimal, BackendError> {
        let departure = booking.departure_at.ok_or_else(|| {
            BackendError::Unavailable(format!("booking {} has no departure date", booking.id))
        })?;
        let notice = departure - self.clock.now();
        if notice <= chrono::Duration::zero() {
            return Err(BackendError::Unavailable(format!(
                "booking {} has already departed",
                booking.id
            )));
        }
        let hours_before = notice.num_hours();

        queries::fee_pct_for_notice(conn, hours_before)?.ok_or_else(|| {
            BackendError::Unavailable(format!(
                "no cancellation rule covers {hours_before}h before departure"
            ))
        })
    }
}

#[async_trait]
impl BookingBackend for SqliteBackend {
    async fn get_booking(&self, id: i64) -> Result<Option<Booking>, BackendError> {
        let conn = self.conn()?;
        Ok(queries::get_booking_by_id(&conn, id)?)
    }

    async fn list_payment_methods(&self) -> Result<Vec<PaymentMethod>, BackendError> {
        let conn = self.conn()?;
        Ok(queries::list_payment_methods(&conn)?)
    }

    async fn cancellation_fee_pct(&self, booking_id: i64) -> Result<Decimal, BackendError> {
        let conn = self.conn()?;
        let booking = Self::load(&conn, booking_id)?;
        self.fee_pct(&conn, &booking)
    }

    async fn commit_cancellation(&self, booking_id: i64, reason: &str) -> Result<Booking, BackendError> {
        let mut conn = self.conn()?;
        let now = self.clock.now();
        let tx = conn.transaction()?;

        let booking = Self::load(&tx, booking_id)?;
        transition(booking.status, BookingEvent::Cancel)?;

        let record = if refund_applicable(&booking) {
            let fee_pct = self.fee_pct(&tx, &booking)?;
            let quote = compute_quote(booking.total_amount, fee_pct, &booking.currency)
                .map_err(|e| BackendError::Rejected(e.to_string()))?;
            let payment_status = if quote.refund_amount > Decimal::ZERO {
                PaymentStatus::Refunded
            } else {
                PaymentStatus::Paid
            };
            CancellationRecord {
                reason,
                payment_status,
                fee_amount: Some(quote.fee_amount),
                refund_amount: Some(quote.refund_amount),
            }
        } else {
            CancellationRecord {
                reason,
                payment_status: booking.payment_status,
                fee_amount: None,
                refund_amount: None,
            }
        };

        queries::record_cancellation(&tx, booking_id, &record, &now)?;
        let updated = Self::load(&tx, booking_id)?;
        tx.commit()?;

        tracing::info!(
            booking_id,
            fee_amount = ?updated.fee_amount,
            refund_amount = ?updated.refund_amount,
            "booking cancelled"
        );
        Ok(updated)
    }

    async fn register_card(&self, booking_id: i64, card_token: &str) -> Result<bool, BackendError> {
        let token = card_token.trim();
        if token.is_empty() || token.len() > MAX_CARD_TOKEN_LEN {
            tracing::warn!(booking_id, "card token rejected");
            return Ok(false);
        }

        let conn = self.conn()?;
        let booking = Self::load(&conn, booking_id)?;
        if booking.status.is_terminal() {
            return Err(BackendError::Rejected(format!(
                "booking {booking_id} is {}",
                booking.status
            )));
        }

        let card_id = queries::insert_saved_card(&conn, booking_id, token)?;
        tracing::info!(booking_id, card_id = %card_id, "card saved");
        Ok(true)
    }

    async fn submit_checkout(&self, booking_id: i64, payment_method_id: i64) -> Result<Booking, BackendError> {
        let conn = self.conn()?;
        let booking = Self::load(&conn, booking_id)?;
        let next = transition(booking.status, BookingEvent::SubmitPayment)?;

        let now = self.clock.now();
        if HoldTimer::new(booking.hold_expires_at).poll(now).is_expired() {
            tracing::info!(booking_id, "checkout refused: hold expired");
            return Err(BackendError::HoldExpired(booking_id));
        }

        queries::set_payment_method(&conn, booking_id, payment_method_id, next, &now)?;
        Self::load(&conn, booking_id)
    }

    async fn create_booking(&self, booking: &NewBooking) -> Result<Booking, BackendError> {
        if booking.total_amount < Decimal::ZERO {
            return Err(BackendError::Rejected("total_amount must be non-negative".to_string()));
        }
        let conn = self.conn()?;
        let id = queries::create_booking(&conn, booking, &self.clock.now())?;
        Self::load(&conn, id)
    }

    async fn list_bookings(&self, status: Option<&str>, limit: i64) -> Result<Vec<Booking>, BackendError> {
        let conn = self.conn()?;
        Ok(queries::get_all_bookings(&conn, status, limit)?)
    }

    async fn confirm_booking(&self, booking_id: i64) -> Result<Booking, BackendError> {
        let conn = self.conn()?;
        let booking = Self::load(&conn, booking_id)?;
        let next = transition(booking.status, BookingEvent::Confirm)?;

        queries::update_booking_status(&conn, booking_id, next, &self.clock.now())?;
        Self::load(&conn, booking_id)
    }

    async fn record_payment(&self, booking_id: i64) -> Result<Booking, BackendError> {
        let conn = self.conn()?;
        let booking = Self::load(&conn, booking_id)?;
        if booking.status.is_terminal() || booking.payment_status != PaymentStatus::Unpaid {
            return Err(BackendError::Rejected(format!(
                "cannot record payment for a {} booking that is {}",
                booking.status,
                booking.payment_status.as_str()
            )));
        }

        queries::update_payment_status(&conn, booking_id, PaymentStatus::Paid, &self.clock.now())?;
        Self::load(&conn, booking_id)
    }

    async fn save_payment_method(&self, method: &PaymentMethod) -> Result<(), BackendError> {
        if method.rule_min < Decimal::ZERO || method.rule_max < Decimal::ZERO {
            return Err(BackendError::Rejected("rule bounds must be non-negative".to_string()));
        }
        let conn = self.conn()?;
        queries::save_payment_method(&conn, method)?;
        Ok(())
    }

    async fn sweep_expired_holds(&self) -> Result<usize, BackendError> {
        let conn = self.conn()?;
        Ok(queries::expire_lapsed_holds(&conn, &self.clock.now())?)
    }
}
