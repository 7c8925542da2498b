use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::services::backend::BackendError;
use crate::services::eligibility::CheckoutError;
use crate::services::lifecycle::TransitionError;
use crate::services::refund::RefundError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Checkout(#[from] CheckoutError),

    #[error("the booking hold has expired")]
    HoldExpired,

    #[error(transparent)]
    InvalidTransition(#[from] TransitionError),

    #[error(transparent)]
    Refund(#[from] RefundError),

    #[error("card registration was declined")]
    CardDeclined,

    #[error("upstream error: {0}")]
    Upstream(String),

    #[error("internal error: {0}")]
    Internal(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("unauthorized")]
    Unauthorized,

    #[error("invalid signature")]
    InvalidSignature,
}

impl From<BackendError> for AppError {
    fn from(err: BackendError) -> Self {
        match err {
            BackendError::NotFound(id) => AppError::NotFound(format!("booking {id}")),
            BackendError::Transition(e) => AppError::InvalidTransition(e),
            BackendError::HoldExpired(_) => AppError::HoldExpired,
            BackendError::Rejected(msg) => AppError::Validation(msg),
            e @ (BackendError::Unavailable(_) | BackendError::Http(_)) => AppError::Upstream(e.to_string()),
            e @ (BackendError::Database(_) | BackendError::Other(_)) => AppError::Internal(e.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Checkout(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::HoldExpired => StatusCode::CONFLICT,
            AppError::InvalidTransition(_) => StatusCode::CONFLICT,
            AppError::Refund(RefundError::Unavailable(_)) => StatusCode::BAD_GATEWAY,
            AppError::Refund(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::CardDeclined => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Upstream(_) => StatusCode::BAD_GATEWAY,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::InvalidSignature => StatusCode::FORBIDDEN,
        };

        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }

        let body = serde_json::json!({ "error": self.to_string() });
        (status, axum::Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::BookingStatus;
    use crate::services::lifecycle::BookingEvent;

    #[test]
    fn test_backend_errors_map_to_status() {
        let cases = [
            (BackendError::NotFound(3), StatusCode::NOT_FOUND),
            (
                BackendError::Transition(TransitionError {
                    from: BookingStatus::Expired,
                    event: BookingEvent::Cancel,
                }),
                StatusCode::CONFLICT,
            ),
            (BackendError::Rejected("no".into()), StatusCode::UNPROCESSABLE_ENTITY),
            (BackendError::HoldExpired(3), StatusCode::CONFLICT),
            (BackendError::Unavailable("down".into()), StatusCode::BAD_GATEWAY),
            (
                BackendError::Database(rusqlite::Error::QueryReturnedNoRows),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                BackendError::Other(anyhow::anyhow!("bad row")),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, expected) in cases {
            assert_eq!(AppError::from(err).into_response().status(), expected);
        }
    }

    #[test]
    fn test_refund_unavailable_is_bad_gateway() {
        let err = AppError::from(RefundError::Unavailable("timeout".into()));
        assert!(err.to_string().starts_with("unable to calculate refund"));
        assert_eq!(err.into_response().status(), StatusCode::BAD_GATEWAY);
    }
}
