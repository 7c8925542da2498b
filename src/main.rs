use std::sync::{Arc, Mutex};
use std::time::Duration;

use tracing_subscriber::EnvFilter;

use tourdesk::config::AppConfig;
use tourdesk::db;
use tourdesk::handlers;
use tourdesk::services::backend::http::HttpBackend;
use tourdesk::services::backend::sqlite::SqliteBackend;
use tourdesk::services::backend::BookingBackend;
use tourdesk::services::hold_timer::{Clock, SystemClock};
use tourdesk::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::from_env();
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let backend: Arc<dyn BookingBackend> = match config.backend_provider.as_str() {
        "http" => {
            anyhow::ensure!(
                !config.backend_url.is_empty(),
                "BACKEND_URL must be set when BACKEND_PROVIDER=http"
            );
            tracing::info!("using remote booking backend (url: {})", config.backend_url);
            Arc::new(HttpBackend::new(
                config.backend_url.clone(),
                config.backend_token.clone(),
            ))
        }
        _ => {
            tracing::info!("using SQLite booking backend (path: {})", config.database_url);
            let conn = db::init_db(&config.database_url)?;
            Arc::new(SqliteBackend::new(Arc::new(Mutex::new(conn)), Arc::clone(&clock)))
        }
    };

    let state = Arc::new(AppState::new(config.clone(), backend, clock));

    if config.sweep_interval_secs > 0 {
        let sweeper = Arc::clone(&state);
        tokio::spawn(async move {
            let mut interval =
                tokio::time::interval(Duration::from_secs(sweeper.config.sweep_interval_secs));
            loop {
                interval.tick().await;
                match sweeper.backend.sweep_expired_holds().await {
                    Ok(0) => {}
                    Ok(n) => tracing::info!(expired = n, "expired lapsed booking holds"),
                    Err(e) => tracing::warn!(error = %e, "hold sweep failed"),
                }
            }
        });
    }

    let app = handlers::router(Arc::clone(&state));

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("starting server on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("shutting down");
        })
        .await?;

    state.holds.shutdown();
    Ok(())
}
