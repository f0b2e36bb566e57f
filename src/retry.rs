//! Bounded-backoff retry helper for the handful of operations that talk to
//! something outside the per-room actor's own memory: the durable store and
//! the outbound WebSocket sink. Both are best-effort per spec.md §4.7/§7 —
//! nothing here is allowed to block a night step, so callers always bound
//! attempts and never retry forever.

use std::time::Duration;

use rand::Rng;
use tokio::time::sleep;
use tracing::{debug, warn};

#[derive(Debug, Clone)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub backoff_multiplier: f64,
    pub jitter_factor: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_delay: Duration::from_millis(50),
            max_delay: Duration::from_secs(2),
            backoff_multiplier: 2.0,
            jitter_factor: 0.1,
        }
    }
}

impl RetryConfig {
    /// Used for the durable-store save path: a handful of quick attempts,
    /// since a failure there just means the in-memory `Room` carries on
    /// uncheckpointed until the next transition.
    pub fn storage() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(10),
            max_delay: Duration::from_millis(250),
            backoff_multiplier: 2.0,
            jitter_factor: 0.15,
        }
    }
}

/// Runs `operation` until it succeeds or `config.max_attempts` is reached,
/// sleeping with exponential backoff plus jitter between attempts.
pub async fn retry<T, E, F, Fut>(config: &RetryConfig, operation_name: &str, operation: F) -> Result<T, E>
where
    F: Fn() -> Fut,
    Fut: std::future::Future<Output = Result<T, E>>,
    E: std::fmt::Debug,
{
    let mut attempt = 1;
    let mut delay = config.initial_delay;

    loop {
        match operation().await {
            Ok(result) => {
                if attempt > 1 {
                    debug!(operation = operation_name, attempt, "succeeded after retry");
                }
                return Ok(result);
            }
            Err(error) => {
                if attempt >= config.max_attempts {
                    warn!(operation = operation_name, attempt, error = ?error, "giving up after max attempts");
                    return Err(error);
                }
                warn!(operation = operation_name, attempt, delay_ms = delay.as_millis(), error = ?error, "retrying after delay");
                sleep(delay).await;

                let next_delay = Duration::from_millis(
                    (delay.as_millis() as f64 * config.backoff_multiplier) as u64,
                );
                delay = std::cmp::min(next_delay, config.max_delay);
                if config.jitter_factor > 0.0 {
                    let jitter_ceiling = (delay.as_millis() as f64 * config.jitter_factor) as u64;
                    let jitter = rand::rng().random_range(0..=jitter_ceiling.max(1));
                    delay += Duration::from_millis(jitter);
                }
                attempt += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn succeeds_on_first_try_without_sleeping() {
        let result = retry(&RetryConfig::storage(), "t", || async { Ok::<_, anyhow::Error>(7) }).await;
        assert_eq!(result.unwrap(), 7);
    }

    #[tokio::test]
    async fn retries_until_success_within_budget() {
        let counter = Arc::new(AtomicU32::new(0));
        let counter_clone = counter.clone();
        let result = retry(&RetryConfig::storage(), "t", move || {
            let counter = counter_clone.clone();
            async move {
                let attempt = counter.fetch_add(1, Ordering::Relaxed) + 1;
                if attempt < 2 {
                    Err(anyhow::anyhow!("transient"))
                } else {
                    Ok(attempt)
                }
            }
        })
        .await;
        assert_eq!(result.unwrap(), 2);
    }

    #[tokio::test]
    async fn gives_up_after_max_attempts() {
        let config = RetryConfig {
            max_attempts: 2,
            ..RetryConfig::storage()
        };
        let result = retry(&config, "t", || async {
            Err::<i32, anyhow::Error>(anyhow::anyhow!("always fails"))
        })
        .await;
        assert!(result.is_err());
    }
}
