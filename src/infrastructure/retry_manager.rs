//! Retry manager - bounded-attempt exponential backoff around a [`Transport`]
//!
//! The same policy is used for listing pages and detail pages. A permanent
//! failure is logged here and surfaces to callers only as `None`.

use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::infrastructure::config::{HarvestConfig, defaults};
use crate::infrastructure::http_client::{RawPayload, Transport, TransportError};

/// How many times to try and how long to wait in between
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts including the first one
    pub max_attempts: u32,
    /// Wait after the first failed attempt; doubles after each further one
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn from_harvest_config(config: &HarvestConfig) -> Self {
        Self {
            max_attempts: config.max_attempts,
            base_delay: config.base_delay(),
        }
    }

    /// Delay slept after the given failed attempt (1-based): `base * 2^(attempt - 1)`
    pub fn backoff_after(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(31);
        self.base_delay.saturating_mul(1_u32 << exponent)
    }

    /// Sum of the sleeps of a fetch that exhausts every attempt
    pub fn total_backoff(&self) -> Duration {
        (1..self.max_attempts).map(|attempt| self.backoff_after(attempt)).sum()
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: defaults::MAX_ATTEMPTS,
            base_delay: Duration::from_millis(defaults::BASE_DELAY_MS),
        }
    }
}

/// [`Transport`] wrapper that retries transient failures
#[derive(Clone)]
pub struct RetryingFetcher {
    transport: Arc<dyn Transport>,
    policy: RetryPolicy,
}

impl RetryingFetcher {
    pub fn new(transport: Arc<dyn Transport>, policy: RetryPolicy) -> Self {
        Self { transport, policy }
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Fetch `url`, retrying timeouts, connection errors and retryable statuses.
    ///
    /// Returns `None` once a non-retryable status is seen or every attempt
    /// failed. Nothing is slept after the last attempt.
    pub async fn fetch(&self, url: &str) -> Option<RawPayload> {
        let max_attempts = self.policy.max_attempts.max(1);

        for attempt in 1..=max_attempts {
            match self.transport.get(url).await {
                Ok(payload) => {
                    if attempt > 1 {
                        debug!("✅ Fetched {} on attempt {}/{}", url, attempt, max_attempts);
                    }
                    return Some(payload);
                }
                Err(error) if !error.is_retryable() => {
                    log_permanent_failure(url, &error);
                    return None;
                }
                Err(error) if attempt == max_attempts => {
                    warn!(
                        "❌ Request failed for {} after {} attempts: {}",
                        url, max_attempts, error
                    );
                    return None;
                }
                Err(error) => {
                    let delay = self.policy.backoff_after(attempt);
                    debug!(
                        "🔁 Attempt {}/{} failed for {}: {} (retrying in {:?})",
                        attempt, max_attempts, url, error, delay
                    );
                    sleep(delay).await;
                }
            }
        }

        None
    }
}

fn log_permanent_failure(url: &str, error: &TransportError) {
    match error {
        TransportError::HttpStatus { status, body } => {
            warn!("HTTP {} for {}: {}", status, url, body);
        }
        other => warn!("Request failed for {}: {}", url, other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::ScriptedTransport;
    use serde_json::json;
    use tokio::time::Instant;

    const URL: &str = "http://swapi.test/api/people/1";

    fn fetcher(transport: &Arc<ScriptedTransport>, max_attempts: u32) -> RetryingFetcher {
        RetryingFetcher::new(
            transport.clone(),
            RetryPolicy {
                max_attempts,
                base_delay: Duration::from_millis(500),
            },
        )
    }

    #[test]
    fn backoff_doubles_from_base() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.backoff_after(1), Duration::from_millis(500));
        assert_eq!(policy.backoff_after(2), Duration::from_millis(1000));
        assert_eq!(policy.backoff_after(3), Duration::from_millis(2000));
        assert_eq!(policy.total_backoff(), Duration::from_millis(1500));
    }

    #[tokio::test(start_paused = true)]
    async fn always_503_exhausts_attempts_then_returns_none() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.respond(URL, Err(TransportError::HttpStatus { status: 503, body: "busy".into() }));

        let started = Instant::now();
        let result = fetcher(&transport, 3).fetch(URL).await;
        let elapsed = started.elapsed();

        assert!(result.is_none());
        assert_eq!(transport.calls_to(URL), 3);
        // base * (2^0 + 2^1)
        assert!(elapsed >= Duration::from_millis(1500), "elapsed {:?}", elapsed);
        assert!(elapsed < Duration::from_millis(1600), "elapsed {:?}", elapsed);
    }

    #[tokio::test(start_paused = true)]
    async fn not_found_short_circuits_after_one_attempt() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.respond(URL, Err(TransportError::HttpStatus { status: 404, body: "not found".into() }));

        let started = Instant::now();
        assert!(fetcher(&transport, 3).fetch(URL).await.is_none());
        assert_eq!(transport.calls_to(URL), 1);
        assert_eq!(started.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn recovers_after_transient_failures() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.respond(URL, Err(TransportError::Timeout));
        transport.respond(URL, Err(TransportError::Connection("reset".into())));
        transport.respond(URL, Ok(json!({"result": {"uid": "1"}})));

        let payload = fetcher(&transport, 3).fetch(URL).await;
        assert_eq!(payload, Some(json!({"result": {"uid": "1"}})));
        assert_eq!(transport.calls_to(URL), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn timeouts_exhaust_like_retryable_statuses() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.respond(URL, Err(TransportError::Timeout));

        assert!(fetcher(&transport, 4).fetch(URL).await.is_none());
        assert_eq!(transport.calls_to(URL), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn zero_attempts_still_tries_once() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.respond(URL, Ok(json!({"ok": true})));

        assert!(fetcher(&transport, 0).fetch(URL).await.is_some());
        assert_eq!(transport.calls_to(URL), 1);
    }
}
