//! Per-client admission control.
//!
//! Each client key gets a fixed budget of `burst` requests. The budget only
//! shrinks; idle visitors are evicted by a periodic sweep and start fresh on
//! their next request. This is a fixed-window-reset policy, so a throttled
//! client may wait up to the full idle TTL rather than refilling gradually.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{DateTime, Duration, Utc};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    pub burst: u32,
    pub idle_ttl: Duration,
    pub sweep_interval: StdDuration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            burst: 10,
            idle_ttl: Duration::minutes(5),
            sweep_interval: StdDuration::from_secs(60),
        }
    }
}

#[derive(Debug)]
struct Visitor {
    remaining: u32,
    last_seen: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allowed,
    Throttled,
}

pub struct RateLimiter {
    visitors: Mutex<HashMap<String, Visitor>>,
    config: RateLimitConfig,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            visitors: Mutex::new(HashMap::new()),
            config,
        }
    }

    /// Admit or reject one request from `key`. Lookup, lazy creation, and
    /// the budget decrement all happen under a single lock acquisition.
    pub async fn check_and_consume(&self, key: &str) -> Decision {
        let mut visitors = self.visitors.lock().await;

        let visitor = visitors.entry(key.to_string()).or_insert_with(|| Visitor {
            remaining: self.config.burst,
            last_seen: Utc::now(),
        });

        if visitor.remaining == 0 {
            // last_seen is not refreshed here, so a fully-throttled client
            // is still evicted idle_ttl after its last allowed request.
            return Decision::Throttled;
        }

        visitor.remaining -= 1;
        visitor.last_seen = Utc::now();
        Decision::Allowed
    }

    /// Evict visitors idle longer than the configured TTL.
    pub async fn sweep(&self) {
        let cutoff = Utc::now() - self.config.idle_ttl;
        let mut visitors = self.visitors.lock().await;
        let before = visitors.len();
        visitors.retain(|_, v| v.last_seen > cutoff);
        let evicted = before - visitors.len();
        if evicted > 0 {
            debug!("Evicted {} idle rate-limit visitors", evicted);
        }
    }

    /// Spawn the periodic sweep task. The returned handle owns the task;
    /// call `shutdown` to stop it when the server exits.
    pub fn start_sweeper(self: Arc<Self>) -> SweeperHandle {
        let interval = self.config.sweep_interval;
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // The first tick of a tokio interval completes immediately.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                self.sweep().await;
            }
        });

        SweeperHandle { handle }
    }
}

pub struct SweeperHandle {
    handle: JoinHandle<()>,
}

impl SweeperHandle {
    pub fn shutdown(self) {
        self.handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::{sleep, Duration as TokioDuration};

    fn limiter(burst: u32, idle_ttl: Duration) -> RateLimiter {
        RateLimiter::new(RateLimitConfig {
            burst,
            idle_ttl,
            sweep_interval: StdDuration::from_secs(60),
        })
    }

    #[tokio::test]
    async fn test_budget_exhaustion() {
        let limiter = limiter(5, Duration::minutes(5));

        for _ in 0..5 {
            assert_eq!(limiter.check_and_consume("10.0.0.1").await, Decision::Allowed);
        }

        // Budget is spent; further requests are rejected until eviction.
        assert_eq!(limiter.check_and_consume("10.0.0.1").await, Decision::Throttled);
        assert_eq!(limiter.check_and_consume("10.0.0.1").await, Decision::Throttled);
    }

    #[tokio::test]
    async fn test_keys_do_not_interfere() {
        let limiter = limiter(2, Duration::minutes(5));

        assert_eq!(limiter.check_and_consume("10.0.0.1").await, Decision::Allowed);
        assert_eq!(limiter.check_and_consume("10.0.0.1").await, Decision::Allowed);
        assert_eq!(limiter.check_and_consume("10.0.0.1").await, Decision::Throttled);

        // A different client keeps its own full budget.
        assert_eq!(limiter.check_and_consume("10.0.0.2").await, Decision::Allowed);
        assert_eq!(limiter.check_and_consume("10.0.0.2").await, Decision::Allowed);
    }

    #[tokio::test]
    async fn test_idle_eviction_restores_budget() {
        let limiter = limiter(1, Duration::milliseconds(50));

        assert_eq!(limiter.check_and_consume("10.0.0.1").await, Decision::Allowed);
        assert_eq!(limiter.check_and_consume("10.0.0.1").await, Decision::Throttled);

        sleep(TokioDuration::from_millis(80)).await;
        limiter.sweep().await;

        assert_eq!(limiter.check_and_consume("10.0.0.1").await, Decision::Allowed);
    }

    #[tokio::test]
    async fn test_sweep_keeps_recent_visitors() {
        let limiter = limiter(2, Duration::minutes(5));

        assert_eq!(limiter.check_and_consume("10.0.0.1").await, Decision::Allowed);
        limiter.sweep().await;

        // Still the same window: the second request spends the remaining
        // budget rather than starting a fresh one.
        assert_eq!(limiter.check_and_consume("10.0.0.1").await, Decision::Allowed);
        assert_eq!(limiter.check_and_consume("10.0.0.1").await, Decision::Throttled);
    }

    #[tokio::test]
    async fn test_throttled_requests_do_not_extend_lifetime() {
        let limiter = limiter(1, Duration::milliseconds(50));

        assert_eq!(limiter.check_and_consume("10.0.0.1").await, Decision::Allowed);

        // Hammering while throttled must not refresh last_seen.
        sleep(TokioDuration::from_millis(80)).await;
        assert_eq!(limiter.check_and_consume("10.0.0.1").await, Decision::Throttled);

        limiter.sweep().await;
        assert_eq!(limiter.check_and_consume("10.0.0.1").await, Decision::Allowed);
    }

    #[tokio::test]
    async fn test_sweeper_handle_shutdown() {
        let limiter = Arc::new(RateLimiter::new(RateLimitConfig {
            burst: 1,
            idle_ttl: Duration::milliseconds(10),
            sweep_interval: StdDuration::from_millis(20),
        }));

        assert_eq!(limiter.check_and_consume("10.0.0.1").await, Decision::Allowed);

        let sweeper = limiter.clone().start_sweeper();
        sleep(TokioDuration::from_millis(60)).await;

        // The background sweep evicted the idle visitor.
        assert_eq!(limiter.check_and_consume("10.0.0.1").await, Decision::Allowed);

        sweeper.shutdown();
    }
}
