use std::sync::Arc;
use std::time::Duration;

use crate::config::AppConfig;
use crate::services::backend::BookingBackend;
use crate::services::hold_timer::Clock;
use crate::services::hold_watch::HoldRegistry;

pub struct AppState {
    pub config: AppConfig,
    pub backend: Arc<dyn BookingBackend>,
    pub clock: Arc<dyn Clock>,
    pub holds: HoldRegistry,
}

impl AppState {
    pub fn new(config: AppConfig, backend: Arc<dyn BookingBackend>, clock: Arc<dyn Clock>) -> Self {
        let holds = HoldRegistry::new(
            Arc::clone(&clock),
            Duration::from_millis(config.hold_tick_ms),
        );
        Self {
            config,
            backend,
            clock,
            holds,
        }
    }

    pub fn upstream_timeout(&self) -> Duration {
        Duration::from_millis(self.config.upstream_timeout_ms)
    }
}
