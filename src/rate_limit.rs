//! Per-address request quota over a fixed window.

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::extract::{ConnectInfo, State};
use axum::http::Request;
use axum::middleware::Next;
use axum::response::Response;
use dashmap::DashMap;
use tracing::{debug, warn};

use crate::config::RateLimitConfig;
use crate::models::error::AppError;

#[derive(Debug, Clone, Copy)]
struct Window {
    started: Instant,
    hits: u32,
}

#[derive(Debug)]
pub struct RateLimiter {
    max_requests: u32,
    window: Duration,
    windows: DashMap<IpAddr, Window>,
}

impl RateLimiter {
    pub fn new(config: &RateLimitConfig) -> Self {
        Self {
            max_requests: config.max_requests,
            window: config.window,
            windows: DashMap::new(),
        }
    }

    /// Counts one request from `addr`. Returns the time until the window resets
    /// when the quota is already used up.
    pub fn check(&self, addr: IpAddr) -> Result<(), Duration> {
        self.check_at(addr, Instant::now())
    }

    fn check_at(&self, addr: IpAddr, now: Instant) -> Result<(), Duration> {
        let mut entry = self.windows.entry(addr).or_insert(Window {
            started: now,
            hits: 0,
        });

        if now.duration_since(entry.started) >= self.window {
            *entry = Window {
                started: now,
                hits: 0,
            };
        }

        if entry.hits >= self.max_requests {
            let elapsed = now.duration_since(entry.started);
            return Err(self.window.saturating_sub(elapsed));
        }

        entry.hits += 1;
        Ok(())
    }

    /// Drops windows that have already expired.
    pub fn prune(&self) {
        self.prune_at(Instant::now());
    }

    fn prune_at(&self, now: Instant) {
        let window = self.window;
        self.windows
            .retain(|_, w| now.duration_since(w.started) < window);
    }

    pub fn tracked_addresses(&self) -> usize {
        self.windows.len()
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    pub fn max_requests(&self) -> u32 {
        self.max_requests
    }
}

/// Periodically forgets expired windows so the map does not grow without bound.
pub async fn run_pruner(limiter: Arc<RateLimiter>) {
    let mut interval = tokio::time::interval(limiter.window());
    loop {
        interval.tick().await;
        limiter.prune();
        debug!(
            "Rate limiter tracking {} addresses",
            limiter.tracked_addresses()
        );
    }
}

pub async fn enforce<B>(
    State(limiter): State<Arc<RateLimiter>>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    req: Request<B>,
    next: Next<B>,
) -> Result<Response, AppError> {
    if let Err(retry_after) = limiter.check(addr.ip()) {
        warn!("Rate limit exceeded for {}", addr.ip());
        return Err(AppError::RateLimited {
            limit: limiter.max_requests(),
            window_minutes: limiter.window().as_secs() / 60,
            retry_after,
        });
    }
    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    fn limiter(max_requests: u32, secs: u64) -> RateLimiter {
        RateLimiter::new(&RateLimitConfig {
            max_requests,
            window: Duration::from_secs(secs),
        })
    }

    const A: IpAddr = IpAddr::V4(Ipv4Addr::new(192, 168, 1, 10));
    const B: IpAddr = IpAddr::V4(Ipv4Addr::new(192, 168, 1, 11));

    #[test]
    fn allows_up_to_the_limit() {
        let limiter = limiter(3, 60);
        let now = Instant::now();
        for _ in 0..3 {
            assert!(limiter.check_at(A, now).is_ok());
        }
        let retry = limiter.check_at(A, now).unwrap_err();
        assert_eq!(retry, Duration::from_secs(60));
    }

    #[test]
    fn addresses_are_counted_separately() {
        let limiter = limiter(1, 60);
        let now = Instant::now();
        assert!(limiter.check_at(A, now).is_ok());
        assert!(limiter.check_at(A, now).is_err());
        assert!(limiter.check_at(B, now).is_ok());
    }

    #[test]
    fn window_resets_after_expiry() {
        let limiter = limiter(2, 60);
        let start = Instant::now();
        assert!(limiter.check_at(A, start).is_ok());
        assert!(limiter.check_at(A, start).is_ok());

        let later = start + Duration::from_secs(45);
        assert_eq!(
            limiter.check_at(A, later).unwrap_err(),
            Duration::from_secs(15)
        );

        let next_window = start + Duration::from_secs(60);
        assert!(limiter.check_at(A, next_window).is_ok());
    }

    #[test]
    fn prune_drops_expired_windows() {
        let limiter = limiter(5, 60);
        let start = Instant::now();
        limiter.check_at(A, start).unwrap();
        limiter.check_at(B, start + Duration::from_secs(30)).unwrap();

        limiter.prune_at(start + Duration::from_secs(61));
        assert_eq!(limiter.tracked_addresses(), 1);
    }
}
