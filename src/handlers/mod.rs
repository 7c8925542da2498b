pub mod admin;
pub mod bookings;
pub mod cancellation;
pub mod cards;
pub mod checkout;
pub mod health;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .route("/api/bookings/:id", get(bookings::get_booking))
        .route("/api/bookings/:id/hold", get(bookings::get_hold))
        .route("/api/bookings/:id/hold/events", get(bookings::hold_events))
        .route(
            "/api/bookings/:id/payment-options",
            get(checkout::payment_options),
        )
        .route("/api/bookings/:id/checkout", post(checkout::submit_checkout))
        .route("/api/bookings/:id/cards", post(cards::register_card))
        .route(
            "/api/bookings/:id/refund-quote",
            get(cancellation::refund_quote),
        )
        .route("/api/bookings/:id/cancel", post(cancellation::cancel_booking))
        .route(
            "/webhook/card-registered",
            post(cards::card_registered_webhook),
        )
        .route(
            "/api/admin/bookings",
            get(admin::get_bookings).post(admin::create_booking),
        )
        .route(
            "/api/admin/bookings/:id/confirm",
            post(admin::confirm_booking),
        )
        .route(
            "/api/admin/bookings/:id/payment",
            post(admin::record_payment),
        )
        .route(
            "/api/admin/payment-methods",
            get(admin::get_payment_methods).post(admin::save_payment_method),
        )
        .route("/api/admin/holds/sweep", post(admin::sweep_holds))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
