use async_trait::async_trait;
use reqwest::{RequestBuilder, StatusCode};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;

use super::{BackendError, BookingBackend};
use crate::models::{Booking, NewBooking, PaymentMethod};

/// Remote booking backend reached over REST.
pub struct HttpBackend {
    base_url: String,
    token: String,
    client: reqwest::Client,
}

#[derive(Deserialize)]
struct FeeResponse {
    fee_pct: Decimal,
}

#[derive(Deserialize)]
struct CardResponse {
    success: bool,
}

#[derive(Deserialize)]
struct SweepResponse {
    expired: usize,
}

impl HttpBackend {
    pub fn new(base_url: String, token: String) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
            client: reqwest::Client::new(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authed(&self, req: RequestBuilder) -> RequestBuilder {
        if self.token.is_empty() {
            req
        } else {
            req.bearer_auth(&self.token)
        }
    }

    async fn send<T: DeserializeOwned>(
        &self,
        req: RequestBuilder,
        booking_id: Option<i64>,
    ) -> Result<T, BackendError> {
        let resp = self.authed(req).send().await?;
        let status = resp.status();

        match status {
            StatusCode::NOT_FOUND => {
                if let Some(id) = booking_id {
                    return Err(BackendError::NotFound(id));
                }
                Err(BackendError::Unavailable("backend endpoint not found".to_string()))
            }
            StatusCode::CONFLICT | StatusCode::UNPROCESSABLE_ENTITY => {
                let body: serde_json::Value = resp.json().await.unwrap_or_default();
                let message = body["error"].as_str().unwrap_or("request rejected").to_string();
                Err(BackendError::Rejected(message))
            }
            s if !s.is_success() => {
                let body = resp.text().await.unwrap_or_default();
                Err(BackendError::Unavailable(format!("backend returned {s}: {body}")))
            }
            _ => resp.json::<T>().await.map_err(|e| {
                BackendError::Unavailable(format!("failed to parse backend response: {e}"))
            }),
        }
    }
}

#[async_trait]
impl BookingBackend for HttpBackend {
    async fn get_booking(&self, id: i64) -> Result<Option<Booking>, BackendError> {
        let req = self.client.get(self.url(&format!("/bookings/{id}")));
        match self.send::<Booking>(req, Some(id)).await {
            Ok(booking) => Ok(Some(booking)),
            Err(BackendError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn list_payment_methods(&self) -> Result<Vec<PaymentMethod>, BackendError> {
        let req = self.client.get(self.url("/payment-methods"));
        self.send(req, None).await
    }

    async fn cancellation_fee_pct(&self, booking_id: i64) -> Result<Decimal, BackendError> {
        let req = self
            .client
            .get(self.url(&format!("/bookings/{booking_id}/cancellation-fee")));
        let resp: FeeResponse = self.send(req, Some(booking_id)).await?;
        Ok(resp.fee_pct)
    }

    async fn commit_cancellation(&self, booking_id: i64, reason: &str) -> Result<Booking, BackendError> {
        let req = self
            .client
            .post(self.url(&format!("/bookings/{booking_id}/cancel")))
            .json(&json!({ "reason": reason }));
        self.send(req, Some(booking_id)).await
    }

    async fn register_card(&self, booking_id: i64, card_token: &str) -> Result<bool, BackendError> {
        let req = self
            .client
            .post(self.url(&format!("/bookings/{booking_id}/cards")))
            .json(&json!({ "card_token": card_token }));
        let resp: CardResponse = self.send(req, Some(booking_id)).await?;
        Ok(resp.success)
    }

    async fn submit_checkout(&self, booking_id: i64, payment_method_id: i64) -> Result<Booking, BackendError> {
        let req = self
            .client
            .post(self.url(&format!("/bookings/{booking_id}/checkout")))
            .json(&json!({ "payment_method_id": payment_method_id }));
        self.send(req, Some(booking_id)).await
    }

    async fn create_booking(&self, booking: &NewBooking) -> Result<Booking, BackendError> {
        let req = self.client.post(self.url("/bookings")).json(booking);
        self.send(req, None).await
    }

    async fn list_bookings(&self, status: Option<&str>, limit: i64) -> Result<Vec<Booking>, BackendError> {
        let mut query: Vec<(&str, String)> = vec![("limit", limit.to_string())];
        if let Some(status) = status {
            query.push(("status", status.to_string()));
        }
        let req = self.client.get(self.url("/bookings")).query(&query);
        self.send(req, None).await
    }

    async fn confirm_booking(&self, booking_id: i64) -> Result<Booking, BackendError> {
        let req = self
            .client
            .post(self.url(&format!("/bookings/{booking_id}/confirm")));
        self.send(req, Some(booking_id)).await
    }

    async fn record_payment(&self, booking_id: i64) -> Result<Booking, BackendError> {
        let req = self
            .client
            .post(self.url(&format!("/bookings/{booking_id}/payment")));
        self.send(req, Some(booking_id)).await
    }

    async fn save_payment_method(&self, method: &PaymentMethod) -> Result<(), BackendError> {
        let req = self
            .client
            .put(self.url(&format!("/payment-methods/{}", method.id)))
            .json(method);
        let _: serde_json::Value = self.send(req, None).await?;
        Ok(())
    }

    async fn sweep_expired_holds(&self) -> Result<usize, BackendError> {
        let req = self.client.post(self.url("/holds/sweep"));
        let resp: SweepResponse = self.send(req, None).await?;
        Ok(resp.expired)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_is_normalized() {
        let backend = HttpBackend::new("https://api.example.com/v1/".to_string(), String::new());
        assert_eq!(backend.url("/bookings/3"), "https://api.example.com/v1/bookings/3");
    }

    #[test]
    fn test_fee_response_accepts_string_or_number() {
        let a: FeeResponse = serde_json::from_str(r#"{"fee_pct":"12.5"}"#).unwrap();
        let b: FeeResponse = serde_json::from_str(r#"{"fee_pct":10}"#).unwrap();
        assert_eq!(a.fee_pct, Decimal::new(125, 1));
        assert_eq!(b.fee_pct, Decimal::from(10));
    }
}
