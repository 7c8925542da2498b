use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::Json;
use serde::Deserialize;

use crate::errors::AppError;
use crate::models::{Booking, BookingStatus, NewBooking, PaymentMethod};
use crate::state::AppState;

fn check_auth(headers: &HeaderMap, expected_token: &str) -> Result<(), AppError> {
    let auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    let token = auth.strip_prefix("Bearer ").unwrap_or("");
    if token.is_empty() || token != expected_token {
        return Err(AppError::Unauthorized);
    }
    Ok(())
}

// GET /api/admin/bookings
#[derive(Deserialize)]
pub struct BookingsQuery {
    pub status: Option<String>,
    pub limit: Option<i64>,
}

pub async fn get_bookings(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<BookingsQuery>,
) -> Result<Json<Vec<Booking>>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let status_filter = match query.status.as_deref() {
        Some(s) => Some(
            BookingStatus::parse(s)
                .ok_or_else(|| AppError::Validation(format!("unknown status: {s}")))?,
        ),
        None => None,
    };
    let limit = query.limit.unwrap_or(50).clamp(1, 500);

    let bookings = state
        .backend
        .list_bookings(status_filter.as_ref().map(BookingStatus::as_str), limit)
        .await?;
    Ok(Json(bookings))
}

// POST /api/admin/bookings
pub async fn create_booking(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<NewBooking>,
) -> Result<Json<Booking>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    if body.tour_name.trim().is_empty() {
        return Err(AppError::Validation("tour_name is required".to_string()));
    }
    if body.currency.trim().is_empty() {
        return Err(AppError::Validation("currency is required".to_string()));
    }

    let booking = state.backend.create_booking(&body).await?;
    tracing::info!(booking_id = booking.id, "booking created");
    Ok(Json(booking))
}

// POST /api/admin/bookings/:id/confirm
pub async fn confirm_booking(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<Json<Booking>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let booking = state.backend.confirm_booking(id).await?;
    state.holds.unwatch(id);
    tracing::info!(booking_id = id, "booking confirmed");
    Ok(Json(booking))
}

// POST /api/admin/bookings/:id/payment
pub async fn record_payment(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<Json<Booking>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let booking = state.backend.record_payment(id).await?;
    tracing::info!(booking_id = id, "payment recorded");
    Ok(Json(booking))
}

// GET /api/admin/payment-methods
pub async fn get_payment_methods(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Vec<PaymentMethod>>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;
    Ok(Json(state.backend.list_payment_methods().await?))
}

// POST /api/admin/payment-methods
pub async fn save_payment_method(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<PaymentMethod>,
) -> Result<Json<serde_json::Value>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    if body.has_upper_bound() && body.rule_max < body.rule_min {
        tracing::warn!(
            method_id = body.id,
            "payment method max is below min; minimum message will take precedence"
        );
    }

    state.backend.save_payment_method(&body).await?;
    Ok(Json(serde_json::json!({"ok": true})))
}

// POST /api/admin/holds/sweep
pub async fn sweep_holds(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let expired = state.backend.sweep_expired_holds().await?;
    tracing::info!(expired, "hold sweep finished");
    Ok(Json(serde_json::json!({"ok": true, "expired": expired})))
}
