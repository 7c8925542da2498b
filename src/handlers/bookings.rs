use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Path, State};
use axum::response::sse::{Event, Sse};
use axum::Json;
use tokio_stream::wrappers::WatchStream;
use tokio_stream::StreamExt;

use crate::errors::AppError;
use crate::models::{Booking, BookingStatus};
use crate::services::hold_timer::{HoldTimer, HoldView};
use crate::state::AppState;

pub(crate) async fn load_booking(state: &AppState, id: i64) -> Result<Booking, AppError> {
    state
        .backend
        .get_booking(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("booking {id}")))
}

/// Only a booking still awaiting payment has a live hold.
fn active_hold(booking: &Booking) -> Option<chrono::DateTime<chrono::Utc>> {
    match booking.status {
        BookingStatus::PendingPayment => booking.hold_expires_at,
        _ => None,
    }
}

pub(crate) fn current_hold(state: &AppState, booking: &Booking) -> HoldView {
    let expires_at = active_hold(booking);
    let hold = HoldTimer::new(expires_at).poll(state.clock.now());
    HoldView::new(hold, expires_at)
}

// GET /api/bookings/:id
pub async fn get_booking(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<Booking>, AppError> {
    Ok(Json(load_booking(&state, id).await?))
}

// GET /api/bookings/:id/hold
pub async fn get_hold(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<HoldView>, AppError> {
    let booking = load_booking(&state, id).await?;
    Ok(Json(current_hold(&state, &booking)))
}

// GET /api/bookings/:id/hold/events (SSE countdown)
pub async fn hold_events(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Sse<impl tokio_stream::Stream<Item = Result<Event, Infallible>>>, AppError> {
    let booking = load_booking(&state, id).await?;
    let expires_at = active_hold(&booking);

    // Dropping the stream on disconnect drops the receiver, which ends the task.
    let rx = state.holds.watch(id, expires_at);
    let stream = WatchStream::new(rx).map(move |hold| {
        let view = HoldView::new(hold, expires_at);
        let data = serde_json::to_string(&view).unwrap_or_default();
        Ok::<_, Infallible>(Event::default().data(data).event("hold"))
    });

    Ok(Sse::new(stream).keep_alive(
        axum::response::sse::KeepAlive::new().interval(Duration::from_secs(30)),
    ))
}
