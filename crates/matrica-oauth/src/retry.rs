//! Retry with exponential backoff for transient failures.

use std::future::Future;
use std::time::Duration;

use rand::Rng;

use crate::config::ClientConfig;
use crate::error::OAuthError;

/// Backoff parameters for outbound requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,
    /// Delay before the first retry; doubles per attempt
    pub base_delay: Duration,
    /// Cap on the exponential part of the delay
    pub max_delay: Duration,
    /// Upper bound of the uniform random delay added to each wait
    pub jitter: Duration,
}

impl RetryPolicy {
    pub const DEFAULT_BASE_DELAY: Duration = Duration::from_secs(1);
    pub const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(30);
    pub const DEFAULT_JITTER: Duration = Duration::from_secs(1);

    pub fn new(max_retries: u32) -> Self {
        Self {
            max_retries,
            base_delay: Self::DEFAULT_BASE_DELAY,
            max_delay: Self::DEFAULT_MAX_DELAY,
            jitter: Self::DEFAULT_JITTER,
        }
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(config.max_retries)
    }

    /// Single attempt, no waiting.
    pub fn none() -> Self {
        Self::new(0)
    }

    pub fn with_base_delay(mut self, base_delay: Duration) -> Self {
        self.base_delay = base_delay;
        self
    }

    pub fn with_max_delay(mut self, max_delay: Duration) -> Self {
        self.max_delay = max_delay;
        self
    }

    pub fn with_jitter(mut self, jitter: Duration) -> Self {
        self.jitter = jitter;
        self
    }

    /// Exponential part of the wait before retry number `attempt + 1`.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.min(31));
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }

    /// Full wait before retry number `attempt + 1`, jitter included.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let backoff = self.backoff(attempt);
        if self.jitter.is_zero() {
            return backoff;
        }
        let jitter_ms = rand::thread_rng().gen_range(0..=self.jitter.as_millis() as u64);
        backoff.saturating_add(Duration::from_millis(jitter_ms))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_MAX_RETRIES)
    }
}

/// Run `operation` until it succeeds, fails with a non-retryable error, or
/// the policy's retries are spent.
#[cfg_attr(not(feature = "tracing"), allow(unused_variables))]
pub(crate) async fn with_retry<F, Fut, T>(
    policy: &RetryPolicy,
    name: &str,
    mut operation: F,
) -> Result<T, OAuthError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, OAuthError>>,
{
    let mut attempt = 0u32;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(e) if !e.is_retryable() => return Err(e),
            Err(e) if attempt >= policy.max_retries => {
                #[cfg(feature = "tracing")]
                tracing::error!(
                    operation = name,
                    attempts = attempt + 1,
                    error = %e,
                    "giving up after retries"
                );
                return Err(e.exhausted());
            }
            Err(_e) => {
                let delay = policy.delay_for(attempt);
                attempt += 1;
                #[cfg(feature = "tracing")]
                tracing::debug!(
                    operation = name,
                    attempt,
                    max_retries = policy.max_retries,
                    delay_ms = delay.as_millis() as u64,
                    error = %_e,
                    "retrying request"
                );
                tokio::time::sleep(delay).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::OAuthError;
    use http::StatusCode;
    use matrica_common::TransportError;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn flat(max_retries: u32) -> RetryPolicy {
        RetryPolicy::new(max_retries).with_jitter(Duration::ZERO)
    }

    #[test]
    fn backoff_doubles_and_caps() {
        let policy = flat(10).with_max_delay(Duration::from_secs(5));
        assert_eq!(policy.delay_for(0), Duration::from_secs(1));
        assert_eq!(policy.delay_for(1), Duration::from_secs(2));
        assert_eq!(policy.delay_for(2), Duration::from_secs(4));
        assert_eq!(policy.delay_for(3), Duration::from_secs(5));
        assert_eq!(policy.delay_for(u32::MAX), Duration::from_secs(5));
    }

    #[test]
    fn jitter_stays_in_bounds() {
        let policy = RetryPolicy::new(3);
        for _ in 0..50 {
            let d = policy.delay_for(1);
            assert!(d >= Duration::from_secs(2) && d <= Duration::from_secs(3));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn succeeds_after_transient_failures() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let start = tokio::time::Instant::now();
        let out = with_retry(&flat(3), "test", move || async move {
            if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                Err(OAuthError::from(TransportError::Timeout))
            } else {
                Ok(7)
            }
        })
        .await
        .unwrap();
        assert_eq!(out, 7);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(start.elapsed(), Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn gives_up_after_max_retries() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let err = with_retry(&flat(2), "test", move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err::<(), _>(OAuthError::from(TransportError::Connect("refused".into())))
        })
        .await
        .unwrap_err();
        assert_eq!(err.code(), "NETWORK_ERROR");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn malformed_bodies_surface_as_network_failures() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let err = with_retry(&flat(1), "test", move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            let source = serde_json::from_slice::<u32>(b"{").unwrap_err();
            Err::<(), _>(OAuthError::decode("profile", source))
        })
        .await
        .unwrap_err();
        assert_eq!(err.code(), "NETWORK_ERROR");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn provider_errors_are_terminal() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let start = tokio::time::Instant::now();
        let err = with_retry(&flat(3), "test", move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err::<(), _>(OAuthError::provider(
                StatusCode::BAD_REQUEST,
                Some("invalid_grant".into()),
                "bad code",
            ))
        })
        .await
        .unwrap_err();
        assert_eq!(err.code(), "invalid_grant");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(start.elapsed(), Duration::ZERO);
    }
}
