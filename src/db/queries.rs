use std::str::FromStr;

use chrono::{DateTime, NaiveDateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::models::{Booking, BookingStatus, NewBooking, PaymentMethod, PaymentStatus};

// Fixed-width millis keep TEXT comparisons in SQL chronological.
const TS_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";
const TS_PARSE_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

const BOOKING_COLUMNS: &str = "b.id, b.tour_name, b.customer_name, b.customer_email, b.status, \
     b.payment_status, b.total_amount, b.currency, b.hold_expires_at, b.departure_at, \
     b.payment_method_id, b.cancel_reason, b.fee_amount, b.refund_amount, b.created_at, \
     b.updated_at, EXISTS(SELECT 1 FROM saved_cards c WHERE c.booking_id = b.id)";

pub fn format_ts(ts: &DateTime<Utc>) -> String {
    ts.naive_utc().format(TS_FORMAT).to_string()
}

fn parse_ts(s: &str) -> anyhow::Result<DateTime<Utc>> {
    Ok(NaiveDateTime::parse_from_str(s, TS_PARSE_FORMAT)?.and_utc())
}

fn parse_decimal(s: &str) -> anyhow::Result<Decimal> {
    Decimal::from_str(s).map_err(|e| anyhow::anyhow!("invalid decimal {s:?}: {e}"))
}

// ── Bookings ──

pub fn create_booking(
    conn: &Connection,
    booking: &NewBooking,
    now: &DateTime<Utc>,
) -> anyhow::Result<i64> {
    let now = format_ts(now);
    conn.execute(
        "INSERT INTO bookings (tour_name, customer_name, customer_email, status, payment_status,
                               total_amount, currency, hold_expires_at, departure_at, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?10)",
        params![
            booking.tour_name,
            booking.customer_name,
            booking.customer_email,
            BookingStatus::PendingPayment.as_str(),
            PaymentStatus::Unpaid.as_str(),
            booking.total_amount.to_string(),
            booking.currency,
            booking.hold_expires_at.as_ref().map(format_ts),
            booking.departure_at.as_ref().map(format_ts),
            now,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get_booking_by_id(conn: &Connection, id: i64) -> anyhow::Result<Option<Booking>> {
    let sql = format!("SELECT {BOOKING_COLUMNS} FROM bookings b WHERE b.id = ?1");
    let row = conn
        .query_row(&sql, params![id], |row| Ok(parse_booking_row(row)))
        .optional()?;
    row.transpose()
}

pub fn get_all_bookings(
    conn: &Connection,
    status_filter: Option<&str>,
    limit: i64,
) -> anyhow::Result<Vec<Booking>> {
    let sql = format!(
        "SELECT {BOOKING_COLUMNS} FROM bookings b
         WHERE (?1 IS NULL OR b.status = ?1)
         ORDER BY b.created_at DESC, b.id DESC LIMIT ?2"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![status_filter, limit], |row| Ok(parse_booking_row(row)))?;

    let mut bookings = vec![];
    for row in rows {
        bookings.push(row??);
    }
    Ok(bookings)
}

pub fn update_booking_status(
    conn: &Connection,
    id: i64,
    status: BookingStatus,
    now: &DateTime<Utc>,
) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE bookings SET status = ?1, updated_at = ?2 WHERE id = ?3",
        params![status.as_str(), format_ts(now), id],
    )?;
    Ok(count > 0)
}

pub fn update_payment_status(
    conn: &Connection,
    id: i64,
    payment_status: PaymentStatus,
    now: &DateTime<Utc>,
) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE bookings SET payment_status = ?1, updated_at = ?2 WHERE id = ?3",
        params![payment_status.as_str(), format_ts(now), id],
    )?;
    Ok(count > 0)
}

pub fn set_payment_method(
    conn: &Connection,
    id: i64,
    payment_method_id: i64,
    status: BookingStatus,
    now: &DateTime<Utc>,
) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE bookings SET payment_method_id = ?1, status = ?2, updated_at = ?3 WHERE id = ?4",
        params![payment_method_id, status.as_str(), format_ts(now), id],
    )?;
    Ok(count > 0)
}

pub struct CancellationRecord<'a> {
    pub reason: &'a str,
    pub payment_status: PaymentStatus,
    pub fee_amount: Option<Decimal>,
    pub refund_amount: Option<Decimal>,
}

pub fn record_cancellation(
    conn: &Connection,
    id: i64,
    record: &CancellationRecord<'_>,
    now: &DateTime<Utc>,
) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE bookings
         SET status = ?1, payment_status = ?2, cancel_reason = ?3,
             fee_amount = ?4, refund_amount = ?5, updated_at = ?6
         WHERE id = ?7",
        params![
            BookingStatus::Cancelled.as_str(),
            record.payment_status.as_str(),
            record.reason,
            record.fee_amount.map(|d| d.to_string()),
            record.refund_amount.map(|d| d.to_string()),
            format_ts(now),
            id,
        ],
    )?;
    Ok(count > 0)
}

pub fn expire_lapsed_holds(conn: &Connection, now: &DateTime<Utc>) -> anyhow::Result<usize> {
    let now = format_ts(now);
    let count = conn.execute(
        "UPDATE bookings SET status = ?1, updated_at = ?2
         WHERE status = ?3 AND hold_expires_at IS NOT NULL AND hold_expires_at <= ?2",
        params![
            BookingStatus::Expired.as_str(),
            now,
            BookingStatus::PendingPayment.as_str(),
        ],
    )?;
    Ok(count)
}

fn parse_booking_row(row: &rusqlite::Row) -> anyhow::Result<Booking> {
    let status_str: String = row.get(4)?;
    let payment_status_str: String = row.get(5)?;
    let total_str: String = row.get(6)?;
    let hold_str: Option<String> = row.get(8)?;
    let departure_str: Option<String> = row.get(9)?;
    let fee_str: Option<String> = row.get(12)?;
    let refund_str: Option<String> = row.get(13)?;
    let created_at_str: String = row.get(14)?;
    let updated_at_str: String = row.get(15)?;

    let status = BookingStatus::parse(&status_str)
        .ok_or_else(|| anyhow::anyhow!("unknown booking status: {status_str}"))?;
    let payment_status = PaymentStatus::parse(&payment_status_str)
        .ok_or_else(|| anyhow::anyhow!("unknown payment status: {payment_status_str}"))?;

    Ok(Booking {
        id: row.get(0)?,
        tour_name: row.get(1)?,
        customer_name: row.get(2)?,
        customer_email: row.get(3)?,
        status,
        payment_status,
        total_amount: parse_decimal(&total_str)?,
        currency: row.get(7)?,
        hold_expires_at: hold_str.as_deref().map(parse_ts).transpose()?,
        departure_at: departure_str.as_deref().map(parse_ts).transpose()?,
        payment_method_id: row.get(10)?,
        has_saved_card: row.get(16)?,
        cancel_reason: row.get(11)?,
        fee_amount: fee_str.as_deref().map(parse_decimal).transpose()?,
        refund_amount: refund_str.as_deref().map(parse_decimal).transpose()?,
        created_at: parse_ts(&created_at_str)?,
        updated_at: parse_ts(&updated_at_str)?,
    })
}

// ── Payment Methods ──

pub fn list_payment_methods(conn: &Connection) -> anyhow::Result<Vec<PaymentMethod>> {
    let mut stmt = conn.prepare(
        "SELECT id, name, provider, rule_min, rule_max, currency, position
         FROM payment_methods ORDER BY position ASC, id ASC",
    )?;

    let rows = stmt.query_map([], |row| {
        Ok((
            row.get::<_, i64>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
            row.get::<_, String>(3)?,
            row.get::<_, String>(4)?,
            row.get::<_, String>(5)?,
            row.get::<_, i64>(6)?,
        ))
    })?;

    let mut methods = vec![];
    for row in rows {
        let (id, name, provider, rule_min, rule_max, currency, position) = row?;
        methods.push(PaymentMethod {
            id,
            name,
            provider,
            rule_min: parse_decimal(&rule_min)?,
            rule_max: parse_decimal(&rule_max)?,
            currency,
            position,
        });
    }
    Ok(methods)
}

pub fn save_payment_method(conn: &Connection, method: &PaymentMethod) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO payment_methods (id, name, provider, rule_min, rule_max, currency, position)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
         ON CONFLICT(id) DO UPDATE SET
           name = excluded.name,
           provider = excluded.provider,
           rule_min = excluded.rule_min,
           rule_max = excluded.rule_max,
           currency = excluded.currency,
           position = excluded.position",
        params![
            method.id,
            method.name,
            method.provider,
            method.rule_min.to_string(),
            method.rule_max.to_string(),
            method.currency,
            method.position,
        ],
    )?;
    Ok(())
}

// ── Saved Cards ──

pub fn insert_saved_card(conn: &Connection, booking_id: i64, card_token: &str) -> anyhow::Result<String> {
    let id = Uuid::new_v4().to_string();
    conn.execute(
        "INSERT INTO saved_cards (id, booking_id, card_token) VALUES (?1, ?2, ?3)",
        params![id, booking_id, card_token],
    )?;
    Ok(id)
}

// ── Cancellation Policy ──

/// Fee of the strictest rule whose notice threshold is met.
pub fn fee_pct_for_notice(conn: &Connection, hours_before: i64) -> anyhow::Result<Option<Decimal>> {
    let fee: Option<String> = conn
        .query_row(
            "SELECT fee_pct FROM cancellation_fee_rules
             WHERE min_hours_before <= ?1
             ORDER BY min_hours_before DESC LIMIT 1",
            params![hours_before],
            |row| row.get(0),
        )
        .optional()?;
    fee.as_deref().map(parse_decimal).transpose()
}
