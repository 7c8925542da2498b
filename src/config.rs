use std::env;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub port: u16,
    pub database_url: String,
    pub admin_token: String,
    pub backend_provider: String,
    pub backend_url: String,
    pub backend_token: String,
    pub credit_card_method_id: i64,
    pub card_webhook_secret: String,
    pub hold_tick_ms: u64,
    pub sweep_interval_secs: u64,
    pub upstream_timeout_ms: u64,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3000),
            database_url: env::var("DATABASE_URL").unwrap_or_else(|_| "tourdesk.db".to_string()),
            admin_token: env::var("ADMIN_TOKEN").unwrap_or_else(|_| "changeme".to_string()),
            backend_provider: env::var("BACKEND_PROVIDER").unwrap_or_else(|_| "sqlite".to_string()),
            backend_url: env::var("BACKEND_URL").unwrap_or_default(),
            backend_token: env::var("BACKEND_TOKEN").unwrap_or_default(),
            credit_card_method_id: env::var("CREDIT_CARD_METHOD_ID")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(1),
            card_webhook_secret: env::var("CARD_WEBHOOK_SECRET").unwrap_or_default(),
            hold_tick_ms: env::var("HOLD_TICK_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|ms| *ms > 0)
                .unwrap_or(1000),
            sweep_interval_secs: env::var("SWEEP_INTERVAL_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(60),
            upstream_timeout_ms: env::var("UPSTREAM_TIMEOUT_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(5000),
        }
    }
}
