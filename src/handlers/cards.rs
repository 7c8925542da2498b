use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::Json;
use base64::Engine;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha1::Sha1;

use crate::errors::AppError;
use crate::state::AppState;

use super::bookings::load_booking;

pub const SIGNATURE_HEADER: &str = "x-card-signature";

#[derive(Deserialize)]
pub struct RegisterCardRequest {
    pub card_token: String,
}

#[derive(Serialize)]
pub struct CardSavedResponse {
    booking_id: i64,
    card_saved: bool,
}

async fn register(state: &AppState, booking_id: i64, card_token: &str) -> Result<CardSavedResponse, AppError> {
    load_booking(state, booking_id).await?;

    if !state.backend.register_card(booking_id, card_token).await? {
        tracing::info!(booking_id, "card registration declined");
        return Err(AppError::CardDeclined);
    }

    Ok(CardSavedResponse {
        booking_id,
        card_saved: true,
    })
}

// POST /api/bookings/:id/cards
pub async fn register_card(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(body): Json<RegisterCardRequest>,
) -> Result<Json<CardSavedResponse>, AppError> {
    Ok(Json(register(&state, id, &body.card_token).await?))
}

pub fn sign_card_callback(secret: &str, booking_id: i64, card_token: &str) -> Option<String> {
    let mut mac = Hmac::<Sha1>::new_from_slice(secret.as_bytes()).ok()?;
    mac.update(format!("{booking_id}:{card_token}").as_bytes());
    Some(base64::engine::general_purpose::STANDARD.encode(mac.finalize().into_bytes()))
}

fn validate_signature(secret: &str, signature: &str, booking_id: i64, card_token: &str) -> bool {
    let Ok(provided) = base64::engine::general_purpose::STANDARD.decode(signature) else {
        return false;
    };
    let Ok(mut mac) = Hmac::<Sha1>::new_from_slice(secret.as_bytes()) else {
        return false;
    };
    mac.update(format!("{booking_id}:{card_token}").as_bytes());
    mac.verify_slice(&provided).is_ok()
}

#[derive(Deserialize)]
pub struct CardWebhookPayload {
    pub booking_id: i64,
    pub card_token: String,
}

// POST /webhook/card-registered
pub async fn card_registered_webhook(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(payload): Json<CardWebhookPayload>,
) -> Result<Json<CardSavedResponse>, AppError> {
    tracing::info!(booking_id = payload.booking_id, "card registration callback");

    // Skip verification when no secret is configured (dev mode)
    if !state.config.card_webhook_secret.is_empty() {
        let signature = headers
            .get(SIGNATURE_HEADER)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");

        if signature.is_empty() {
            tracing::warn!("missing X-Card-Signature header");
            return Err(AppError::InvalidSignature);
        }
        if !validate_signature(
            &state.config.card_webhook_secret,
            signature,
            payload.booking_id,
            &payload.card_token,
        ) {
            tracing::warn!(booking_id = payload.booking_id, "invalid card callback signature");
            return Err(AppError::InvalidSignature);
        }
    }

    Ok(Json(register(&state, payload.booking_id, &payload.card_token).await?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signature_round_trip() {
        let sig = sign_card_callback("s3cret", 12, "tok_visa").unwrap();
        assert!(validate_signature("s3cret", &sig, 12, "tok_visa"));
    }

    #[test]
    fn test_signature_rejects_tampering() {
        let sig = sign_card_callback("s3cret", 12, "tok_visa").unwrap();
        assert!(!validate_signature("s3cret", &sig, 13, "tok_visa"));
        assert!(!validate_signature("other", &sig, 12, "tok_visa"));
        assert!(!validate_signature("s3cret", "not base64!", 12, "tok_visa"));
    }
}
