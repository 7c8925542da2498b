use std::time::Duration;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;

use crate::models::{Booking, BookingStatus, PaymentStatus, RefundQuote};
use crate::services::backend::BookingBackend;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RefundError {
    #[error("unable to calculate refund: {0}")]
    Unavailable(String),

    #[error("cancellation fee percentage {0} is outside 0-100")]
    InvalidFeePct(Decimal),

    #[error("refund calculation overflowed")]
    Overflow,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RefundOutcome {
    /// Unpaid or unconfirmed: cancelling is a plain status change.
    NotRequired,
    Quoted(RefundQuote),
}

pub fn refund_applicable(booking: &Booking) -> bool {
    booking.status == BookingStatus::Confirmed && booking.payment_status == PaymentStatus::Paid
}

/// Decimal places a currency is displayed (and settled) with.
pub fn currency_precision(currency: &str) -> u32 {
    match currency.trim().to_uppercase().as_str() {
        "VND" | "₫" | "JPY" | "KRW" | "IDR" => 0,
        _ => 2,
    }
}

pub fn compute_quote(
    total: Decimal,
    fee_pct: Decimal,
    currency: &str,
) -> Result<RefundQuote, RefundError> {
    if fee_pct < Decimal::ZERO || fee_pct > Decimal::ONE_HUNDRED {
        return Err(RefundError::InvalidFeePct(fee_pct));
    }

    let fee_amount = total
        .checked_mul(fee_pct)
        .and_then(|v| v.checked_div(Decimal::ONE_HUNDRED))
        .ok_or(RefundError::Overflow)?
        .round_dp_with_strategy(
            currency_precision(currency),
            RoundingStrategy::MidpointAwayFromZero,
        );
    let refund_amount = (total - fee_amount).max(Decimal::ZERO);

    Ok(RefundQuote {
        fee_pct,
        fee_amount,
        refund_amount,
        currency: currency.to_string(),
    })
}

/// Quote for a cancellation dialog. The fee lookup may fail or stall; either
/// way the caller gets `Unavailable`, never a guessed percentage.
pub async fn quote_for_booking(
    backend: &dyn BookingBackend,
    booking: &Booking,
    timeout: Duration,
) -> Result<RefundOutcome, RefundError> {
    if !refund_applicable(booking) {
        return Ok(RefundOutcome::NotRequired);
    }

    let fee_pct = match tokio::time::timeout(timeout, backend.cancellation_fee_pct(booking.id)).await {
        Ok(Ok(pct)) => pct,
        Ok(Err(e)) => {
            tracing::warn!(booking_id = booking.id, error = %e, "cancellation fee lookup failed");
            return Err(RefundError::Unavailable(e.to_string()));
        }
        Err(_) => {
            tracing::warn!(booking_id = booking.id, "cancellation fee lookup timed out");
            return Err(RefundError::Unavailable("fee lookup timed out".to_string()));
        }
    };

    compute_quote(booking.total_amount, fee_pct, &booking.currency).map(RefundOutcome::Quoted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_ten_percent_of_a_million() {
        let q = compute_quote(dec("1000000"), dec("10"), "VND").unwrap();
        assert_eq!(q.fee_amount, dec("100000"));
        assert_eq!(q.refund_amount, dec("900000"));
        assert_eq!(q.currency, "VND");
    }

    #[test]
    fn test_parts_always_sum_to_total() {
        let totals = ["1000000", "999999", "1", "0", "1234567"];
        for total in totals {
            for pct in 0..=100 {
                let q = compute_quote(dec(total), Decimal::from(pct), "VND").unwrap();
                assert_eq!(q.fee_amount + q.refund_amount, dec(total), "{total} @ {pct}%");
                assert!(q.refund_amount >= Decimal::ZERO);
            }
        }
    }

    #[test]
    fn test_rounds_to_currency_precision() {
        // 333.33 * 15% = 49.9995
        let q = compute_quote(dec("333.33"), dec("15"), "USD").unwrap();
        assert_eq!(q.fee_amount, dec("50.00"));
        assert_eq!(q.refund_amount, dec("283.33"));

        // 12345 * 12.5% = 1543.125
        let q = compute_quote(dec("12345"), dec("12.5"), "VND").unwrap();
        assert_eq!(q.fee_amount, dec("1543"));
        assert_eq!(q.refund_amount, dec("10802"));
    }

    #[test]
    fn test_full_fee_leaves_nothing() {
        let q = compute_quote(dec("500"), dec("100"), "USD").unwrap();
        assert_eq!(q.fee_amount, dec("500"));
        assert_eq!(q.refund_amount, Decimal::ZERO);
    }

    #[test]
    fn test_rejects_out_of_range_pct() {
        assert_eq!(
            compute_quote(dec("500"), dec("-1"), "USD"),
            Err(RefundError::InvalidFeePct(dec("-1")))
        );
        assert!(compute_quote(dec("500"), dec("100.01"), "USD").is_err());
    }

    #[test]
    fn test_identical_inputs_identical_quotes() {
        let a = compute_quote(dec("777.77"), dec("33"), "EUR").unwrap();
        let b = compute_quote(dec("777.77"), dec("33"), "EUR").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_precision_table() {
        assert_eq!(currency_precision("vnd"), 0);
        assert_eq!(currency_precision("JPY"), 0);
        assert_eq!(currency_precision("USD"), 2);
    }
}
