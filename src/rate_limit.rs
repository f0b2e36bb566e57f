//! Join/take-seat attempt throttling (spec.md §7 "ingress guards"). Keyed
//! by participant `Uid` rather than by IP — this engine has no inbound
//! HTTP auth layer, so the uid presented in `HELLO`/`TAKE_SEAT` is the only
//! identity available. Room creation has no separate limit: a room is
//! created once by its host via the `/rooms` endpoint, not a
//! rate-limited repeated operation like the precedent's room-creation
//! flood guard (dropped — see DESIGN.md).

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use tokio::time::{Duration, Instant};

use crate::config::server::RateLimitConfig;
use crate::protocol::types::Uid;

#[derive(Debug, Clone)]
struct RateLimitEntry {
    attempts: u32,
    window_start: Instant,
}

impl RateLimitEntry {
    fn new() -> Self {
        Self {
            attempts: 0,
            window_start: Instant::now(),
        }
    }

    fn maybe_reset_window(&mut self, config: &RateLimitConfig) {
        if self.window_start.elapsed() >= Duration::from_secs(config.time_window) {
            self.attempts = 0;
            self.window_start = Instant::now();
        }
    }

    fn try_attempt(&mut self, config: &RateLimitConfig) -> bool {
        self.maybe_reset_window(config);
        if self.attempts < config.max_join_attempts {
            self.attempts += 1;
            true
        } else {
            false
        }
    }

    fn time_until_reset(&self, config: &RateLimitConfig) -> Duration {
        let elapsed = self.window_start.elapsed();
        Duration::from_secs(config.time_window).saturating_sub(elapsed)
    }
}

/// Per-participant join/take-seat throttle.
pub struct JoinRateLimiter {
    config: RateLimitConfig,
    entries: RwLock<HashMap<Uid, RateLimitEntry>>,
}

impl JoinRateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub async fn check(&self, uid: Uid) -> Result<(), RateLimitError> {
        let mut entries = self.entries.write().await;
        let entry = entries.entry(uid).or_insert_with(RateLimitEntry::new);
        if entry.try_attempt(&self.config) {
            Ok(())
        } else {
            Err(RateLimitError::JoinLimitExceeded {
                retry_after: entry.time_until_reset(&self.config),
            })
        }
    }

    /// Drop entries untouched for two full windows, so the map doesn't grow
    /// without bound across the lifetime of a long-running process.
    pub async fn cleanup_stale_entries(&self) {
        let mut entries = self.entries.write().await;
        let now = Instant::now();
        let threshold = Duration::from_secs(self.config.time_window) * 2;
        entries.retain(|_, entry| now.duration_since(entry.window_start) < threshold);
    }

    pub fn start_cleanup_task(self: Arc<Self>) {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(
                self.config.time_window.max(1),
            ));
            loop {
                interval.tick().await;
                self.cleanup_stale_entries().await;
            }
        });
    }
}

#[derive(Debug, Clone)]
pub enum RateLimitError {
    JoinLimitExceeded { retry_after: Duration },
}

impl std::fmt::Display for RateLimitError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::JoinLimitExceeded { retry_after } => write!(
                f,
                "join attempt rate limit exceeded, try again in {} seconds",
                retry_after.as_secs()
            ),
        }
    }
}

impl std::error::Error for RateLimitError {}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> RateLimitConfig {
        RateLimitConfig {
            time_window: 60,
            max_join_attempts: 3,
        }
    }

    #[tokio::test]
    async fn allows_attempts_up_to_the_limit_then_rejects() {
        let limiter = JoinRateLimiter::new(test_config());
        let uid = Uid::from_u128(1);
        assert!(limiter.check(uid).await.is_ok());
        assert!(limiter.check(uid).await.is_ok());
        assert!(limiter.check(uid).await.is_ok());
        assert!(limiter.check(uid).await.is_err());
    }

    #[tokio::test]
    async fn different_participants_have_independent_limits() {
        let limiter = JoinRateLimiter::new(test_config());
        let a = Uid::from_u128(1);
        let b = Uid::from_u128(2);
        for _ in 0..3 {
            assert!(limiter.check(a).await.is_ok());
        }
        assert!(limiter.check(a).await.is_err());
        assert!(limiter.check(b).await.is_ok());
    }

    #[tokio::test]
    async fn cleanup_drops_stale_entries() {
        let limiter = JoinRateLimiter::new(RateLimitConfig {
            time_window: 0,
            max_join_attempts: 1,
        });
        let uid = Uid::from_u128(1);
        let _ = limiter.check(uid).await;
        assert!(limiter.entries.read().await.contains_key(&uid));
        tokio::time::sleep(Duration::from_millis(10)).await;
        limiter.cleanup_stale_entries().await;
        assert!(!limiter.entries.read().await.contains_key(&uid));
    }
}
