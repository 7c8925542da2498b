use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;

use crate::errors::AppError;
use crate::models::Booking;
use crate::services::lifecycle::{transition, BookingEvent};
use crate::services::refund::{self, RefundOutcome};
use crate::state::AppState;

use super::bookings::load_booking;

const MAX_REASON_LEN: usize = 1000;

// GET /api/bookings/:id/refund-quote
pub async fn refund_quote(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<RefundOutcome>, AppError> {
    let booking = load_booking(&state, id).await?;
    transition(booking.status, BookingEvent::Cancel)?;

    let outcome =
        refund::quote_for_booking(state.backend.as_ref(), &booking, state.upstream_timeout()).await?;
    Ok(Json(outcome))
}

#[derive(Deserialize)]
pub struct CancelRequest {
    pub reason: String,
}

// POST /api/bookings/:id/cancel
pub async fn cancel_booking(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(body): Json<CancelRequest>,
) -> Result<Json<Booking>, AppError> {
    let reason = body.reason.trim();
    if reason.is_empty() {
        return Err(AppError::Validation("a cancellation reason is required".to_string()));
    }
    if reason.chars().count() > MAX_REASON_LEN {
        return Err(AppError::Validation(format!(
            "cancellation reason must be at most {MAX_REASON_LEN} characters"
        )));
    }

    let booking = load_booking(&state, id).await?;
    transition(booking.status, BookingEvent::Cancel)?;

    let commit = state.backend.commit_cancellation(id, reason);
    let updated = match tokio::time::timeout(state.upstream_timeout(), commit).await {
        Ok(result) => result?,
        Err(_) => {
            tracing::warn!(booking_id = id, "cancellation commit timed out");
            return Err(AppError::Upstream("cancellation timed out; please retry".to_string()));
        }
    };

    state.holds.unwatch(id);
    tracing::info!(booking_id = id, status = %updated.status, "cancellation confirmed");
    Ok(Json(updated))
}
