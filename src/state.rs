use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};

use crate::config::{AppConfig, IngestConfig};
use crate::jwt_auth::JwtConfig;
use crate::rate_limit::RateLimiter;
use crate::security_headers::SecurityHeaders;
use crate::store::LocationStore;

/// Shared handles passed to every request handler.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn LocationStore>,
    pub ingest: Arc<IngestConfig>,
    pub clock: Arc<MonotonicClock>,
    /// Held from stamping `createdAt` until the append returns, so append order
    /// and `createdAt` order agree under concurrent ingestion.
    pub ingest_lock: Arc<tokio::sync::Mutex<()>>,
    pub limiter: Arc<RateLimiter>,
    pub security: Arc<SecurityHeaders>,
    pub admin_auth: Option<Arc<JwtConfig>>,
}

impl AppState {
    pub fn new(
        config: &AppConfig,
        store: Arc<dyn LocationStore>,
    ) -> Result<Self, crate::models::error::StartupError> {
        Ok(Self {
            store,
            ingest: Arc::new(config.ingest.clone()),
            clock: Arc::new(MonotonicClock::default()),
            ingest_lock: Arc::new(tokio::sync::Mutex::new(())),
            limiter: Arc::new(RateLimiter::new(&config.rate_limit)),
            security: Arc::new(SecurityHeaders::from_config(&config.security)?),
            admin_auth: config
                .admin
                .jwt_secret
                .as_ref()
                .map(|secret| Arc::new(JwtConfig::new(secret.clone()))),
        })
    }
}

/// Wall clock that never hands out a time earlier than one it already returned.
#[derive(Debug, Default)]
pub struct MonotonicClock {
    last: Mutex<Option<DateTime<Utc>>>,
}

impl MonotonicClock {
    pub fn now(&self) -> DateTime<Utc> {
        self.next(Utc::now())
    }

    fn next(&self, wall: DateTime<Utc>) -> DateTime<Utc> {
        let mut last = self.last.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let stamp = match *last {
            Some(prev) if prev > wall => prev,
            _ => wall,
        };
        *last = Some(stamp);
        stamp
    }
}
