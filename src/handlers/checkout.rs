use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::Json;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::models::{Booking, Locale};
use crate::services::eligibility::{self, Checkout};
use crate::services::hold_timer::HoldView;
use crate::services::lifecycle::{transition, BookingEvent};
use crate::state::AppState;

use super::bookings::{current_hold, load_booking};

#[derive(Deserialize)]
pub struct LocaleQuery {
    pub locale: Option<String>,
}

#[derive(Serialize)]
pub struct PaymentOption {
    id: i64,
    name: String,
    provider: String,
    eligible: bool,
    message: Option<String>,
    notice: Option<String>,
    requires_saved_card: bool,
}

#[derive(Serialize)]
pub struct PaymentOptionsResponse {
    booking_id: i64,
    total_amount: Decimal,
    currency: String,
    /// 0 when no method is eligible.
    default_method_id: i64,
    card_saved: bool,
    hold: HoldView,
    methods: Vec<PaymentOption>,
}

// GET /api/bookings/:id/payment-options
pub async fn payment_options(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Query(query): Query<LocaleQuery>,
) -> Result<Json<PaymentOptionsResponse>, AppError> {
    let locale = query.locale.as_deref().map(Locale::parse).unwrap_or_default();
    let booking = load_booking(&state, id).await?;
    let methods = state.backend.list_payment_methods().await?;
    let checkout = Checkout::for_booking(&booking, state.config.credit_card_method_id);
    let total = booking.total_amount;

    let options = methods
        .iter()
        .map(|m| PaymentOption {
            id: m.id,
            name: m.name.clone(),
            provider: m.provider.clone(),
            eligible: eligibility::is_eligible(m, total),
            message: eligibility::eligibility_message(m, total, locale),
            notice: eligibility::checkout_notice(m, locale),
            requires_saved_card: checkout.is_credit_card(m.id),
        })
        .collect();

    Ok(Json(PaymentOptionsResponse {
        booking_id: booking.id,
        total_amount: total,
        currency: booking.currency.clone(),
        default_method_id: eligibility::default_method(&methods, total).unwrap_or(0),
        card_saved: checkout.card_saved,
        hold: current_hold(&state, &booking),
        methods: options,
    }))
}

#[derive(Deserialize)]
pub struct CheckoutRequest {
    pub payment_method_id: i64,
    pub locale: Option<String>,
}

// POST /api/bookings/:id/checkout
pub async fn submit_checkout(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(body): Json<CheckoutRequest>,
) -> Result<Json<Booking>, AppError> {
    let locale = body.locale.as_deref().map(Locale::parse).unwrap_or_default();
    let booking = load_booking(&state, id).await?;

    if current_hold(&state, &booking).expired {
        tracing::info!(booking_id = id, "checkout blocked: hold expired");
        return Err(AppError::HoldExpired);
    }
    transition(booking.status, BookingEvent::SubmitPayment)?;

    let methods = state.backend.list_payment_methods().await?;
    let mut checkout = Checkout::for_booking(&booking, state.config.credit_card_method_id);
    checkout.select(body.payment_method_id);

    let method = checkout
        .validate(&methods, booking.total_amount, locale)
        .map_err(|e| {
            tracing::info!(booking_id = id, error = %e, "checkout rejected");
            AppError::from(e)
        })?;

    let updated = state.backend.submit_checkout(id, method.id).await?;
    state.holds.unwatch(id);
    tracing::info!(booking_id = id, payment_method_id = method.id, "checkout submitted");

    Ok(Json(updated))
}
