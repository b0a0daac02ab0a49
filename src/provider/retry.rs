// src/provider/retry.rs — Retry with randomized exponential backoff
//
// `with_retry` is the combinator: it re-runs an async operation until it
// succeeds, the error is classified as not worth retrying, or the attempt
// budget runs out. `RetryProvider` applies it to any ModelProvider.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{ChatRequest, ChatResponse, ModelProvider};
use crate::infra::config::RetrySection;
use crate::infra::errors::ReflectError;

/// Default retry configuration.
const MAX_ATTEMPTS: u32 = 6;
const MIN_DELAY_SECS: f64 = 1.0;
const MAX_DELAY_SECS: f64 = 60.0;
const MULTIPLIER_SECS: f64 = 1.0;

/// Which failures consume the attempt budget.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetryOn {
    /// Every provider error is retried until the budget is spent.
    #[default]
    AnyError,
    /// Only transient errors are retried; the rest surface immediately.
    TransientOnly,
}

/// Configuration for retry behavior.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Total calls allowed, including the first.
    pub max_attempts: u32,
    pub min_delay: Duration,
    pub max_delay: Duration,
    pub multiplier: Duration,
    pub retry_on: RetryOn,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: MAX_ATTEMPTS,
            min_delay: Duration::from_secs_f64(MIN_DELAY_SECS),
            max_delay: Duration::from_secs_f64(MAX_DELAY_SECS),
            multiplier: Duration::from_secs_f64(MULTIPLIER_SECS),
            retry_on: RetryOn::AnyError,
        }
    }
}

impl From<&RetrySection> for RetryConfig {
    fn from(section: &RetrySection) -> Self {
        Self {
            max_attempts: section.max_attempts,
            min_delay: secs(section.min_delay_secs),
            max_delay: secs(section.max_delay_secs),
            multiplier: secs(section.multiplier_secs),
            retry_on: section.retry_on,
        }
    }
}

fn secs(value: f64) -> Duration {
    Duration::try_from_secs_f64(value.max(0.0)).unwrap_or(Duration::MAX)
}

impl RetryConfig {
    /// Same attempt budget, no waiting between attempts.
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            min_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            multiplier: Duration::ZERO,
            retry_on: RetryOn::AnyError,
        }
    }

    pub fn with_retry_on(mut self, retry_on: RetryOn) -> Self {
        self.retry_on = retry_on;
        self
    }

    fn should_retry(&self, error: &ReflectError) -> bool {
        match self.retry_on {
            RetryOn::AnyError => true,
            RetryOn::TransientOnly => error.is_retriable(),
        }
    }

    /// Delay after the given failed attempt (1-indexed).
    ///
    /// `unit` is a jitter sample in `[0, 1]`. The result is uniform over
    /// `[min, clamp(multiplier * 2^(attempt-1), min, max)]`. A server-supplied
    /// rate-limit hint replaces the computed value, kept within `[min, max]`.
    fn delay_for_attempt(&self, attempt: u32, rate_limit: Option<Duration>, unit: f64) -> Duration {
        if let Some(hint) = rate_limit {
            return hint.clamp(self.min_delay, self.max_delay.max(self.min_delay));
        }

        let min = self.min_delay.as_secs_f64();
        let max = self.max_delay.as_secs_f64().max(min);
        let exp = 2f64.powi(attempt.saturating_sub(1).min(i32::MAX as u32) as i32);
        let ceiling = (self.multiplier.as_secs_f64() * exp).min(max).max(min);

        secs(min + (ceiling - min) * unit.clamp(0.0, 1.0))
    }
}

/// Extract rate-limit retry delay from the error, if available.
fn rate_limit_delay(error: &ReflectError) -> Option<Duration> {
    match error {
        ReflectError::RateLimited { retry_after_ms, .. } if *retry_after_ms > 0 => {
            Some(Duration::from_millis(*retry_after_ms))
        }
        _ => None,
    }
}

/// Uniform sample in `[0, 1]` from the OS RNG. Falls back to the midpoint
/// if the RNG is unavailable; jitter is not security-relevant.
fn random_unit() -> f64 {
    let mut buf = [0u8; 8];
    match getrandom::getrandom(&mut buf) {
        Ok(()) => u64::from_le_bytes(buf) as f64 / u64::MAX as f64,
        Err(_) => 0.5,
    }
}

/// Run `op` until it succeeds or the retry policy gives up.
///
/// Exhausting the budget yields `RequestExhausted` carrying the last error.
/// Under `RetryOn::TransientOnly`, a non-transient error is returned as-is
/// after the first failing call.
pub async fn with_retry<T, F, Fut>(
    config: &RetryConfig,
    label: &str,
    mut op: F,
) -> Result<T, ReflectError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ReflectError>>,
{
    let max_attempts = config.max_attempts.max(1);
    let mut attempt = 0;

    loop {
        attempt += 1;
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) => {
                if !config.should_retry(&e) {
                    return Err(e);
                }
                if attempt >= max_attempts {
                    tracing::warn!(
                        label,
                        attempts = attempt,
                        "Giving up after error: {}",
                        e
                    );
                    return Err(ReflectError::RequestExhausted {
                        attempts: attempt,
                        last: Box::new(e),
                    });
                }

                let delay = config.delay_for_attempt(attempt, rate_limit_delay(&e), random_unit());

                tracing::warn!(
                    label,
                    attempt,
                    max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    "Retrying after error: {}",
                    e
                );

                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
}

/// A provider wrapper that adds retry with exponential backoff to `chat()`.
pub struct RetryProvider {
    inner: Arc<dyn ModelProvider>,
    config: RetryConfig,
}

impl RetryProvider {
    pub fn with_config(inner: Arc<dyn ModelProvider>, config: RetryConfig) -> Self {
        Self { inner, config }
    }

    pub fn config(&self) -> &RetryConfig {
        &self.config
    }
}

#[async_trait]
impl ModelProvider for RetryProvider {
    fn id(&self) -> &str {
        self.inner.id()
    }

    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse, ReflectError> {
        let inner = self.inner.clone();
        with_retry(&self.config, self.inner.id(), move || {
            let inner = inner.clone();
            let request = request.clone();
            async move { inner.chat(request).await }
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::TokenUsage;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn transient() -> ReflectError {
        ReflectError::Provider {
            provider: "test".into(),
            message: "HTTP 503".into(),
            retriable: true,
        }
    }

    fn fatal() -> ReflectError {
        ReflectError::Provider {
            provider: "test".into(),
            message: "HTTP 401".into(),
            retriable: false,
        }
    }

    #[test]
    fn test_default_config() {
        let cfg = RetryConfig::default();
        assert_eq!(cfg.max_attempts, 6);
        assert_eq!(cfg.min_delay, Duration::from_secs(1));
        assert_eq!(cfg.max_delay, Duration::from_secs(60));
        assert_eq!(cfg.retry_on, RetryOn::AnyError);
    }

    #[test]
    fn test_from_section() {
        let section = RetrySection {
            max_attempts: 3,
            min_delay_secs: 0.5,
            max_delay_secs: 4.0,
            multiplier_secs: 2.0,
            retry_on: RetryOn::TransientOnly,
        };
        let cfg = RetryConfig::from(&section);
        assert_eq!(cfg.max_attempts, 3);
        assert_eq!(cfg.min_delay, Duration::from_millis(500));
        assert_eq!(cfg.max_delay, Duration::from_secs(4));
        assert_eq!(cfg.retry_on, RetryOn::TransientOnly);
    }

    #[test]
    fn test_negative_delay_clamped_to_zero() {
        assert_eq!(secs(-3.0), Duration::ZERO);
    }

    #[test]
    fn test_delay_bounds_grow_exponentially() {
        let cfg = RetryConfig::default();
        // Upper bound after attempt n is min(60, 2^(n-1)) seconds, never below 1s.
        assert_eq!(cfg.delay_for_attempt(1, None, 1.0), Duration::from_secs(1));
        assert_eq!(cfg.delay_for_attempt(2, None, 1.0), Duration::from_secs(2));
        assert_eq!(cfg.delay_for_attempt(3, None, 1.0), Duration::from_secs(4));
        assert_eq!(cfg.delay_for_attempt(5, None, 1.0), Duration::from_secs(16));
    }

    #[test]
    fn test_delay_lower_bound_is_min() {
        let cfg = RetryConfig::default();
        for attempt in 1..10 {
            assert_eq!(
                cfg.delay_for_attempt(attempt, None, 0.0),
                Duration::from_secs(1)
            );
        }
    }

    #[test]
    fn test_delay_capped_at_max() {
        let cfg = RetryConfig::default();
        assert_eq!(cfg.delay_for_attempt(12, None, 1.0), Duration::from_secs(60));
        assert_eq!(cfg.delay_for_attempt(u32::MAX, None, 1.0), Duration::from_secs(60));
    }

    #[test]
    fn test_delay_uses_rate_limit_hint() {
        let cfg = RetryConfig::default();
        let d = cfg.delay_for_attempt(1, Some(Duration::from_millis(2500)), 0.9);
        assert_eq!(d, Duration::from_millis(2500));
        let capped = cfg.delay_for_attempt(1, Some(Duration::from_secs(600)), 0.9);
        assert_eq!(capped, Duration::from_secs(60));
    }

    #[test]
    fn test_short_rate_limit_hint_raised_to_min() {
        let cfg = RetryConfig::default();
        let d = cfg.delay_for_attempt(3, Some(Duration::from_millis(100)), 0.0);
        assert_eq!(d, Duration::from_secs(1));
    }

    #[test]
    fn test_rate_limit_delay_zero_ignored() {
        let err = ReflectError::RateLimited {
            provider: "test".into(),
            retry_after_ms: 0,
        };
        assert!(rate_limit_delay(&err).is_none());
    }

    #[test]
    fn test_random_unit_range() {
        for _ in 0..32 {
            let u = random_unit();
            assert!((0.0..=1.0).contains(&u), "{u} out of range");
        }
    }

    #[test]
    fn test_should_retry_policies() {
        let any = RetryConfig::immediate(6);
        assert!(any.should_retry(&transient()));
        assert!(any.should_retry(&fatal()));

        let transient_only = RetryConfig::immediate(6).with_retry_on(RetryOn::TransientOnly);
        assert!(transient_only.should_retry(&transient()));
        assert!(!transient_only.should_retry(&fatal()));
    }

    #[tokio::test]
    async fn test_with_retry_succeeds_after_k_failures() {
        let calls = AtomicU32::new(0);
        let cfg = RetryConfig::immediate(6);

        let result = with_retry(&cfg, "test", || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 3 {
                    Err(transient())
                } else {
                    Ok("done")
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), "done");
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_with_retry_exhausts_budget() {
        let calls = AtomicU32::new(0);
        let cfg = RetryConfig::immediate(6);

        let result: Result<(), _> = with_retry(&cfg, "test", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(transient()) }
        })
        .await;

        assert_eq!(calls.load(Ordering::SeqCst), 6);
        match result.unwrap_err() {
            ReflectError::RequestExhausted { attempts, last } => {
                assert_eq!(attempts, 6);
                assert!(last.is_retriable());
            }
            other => panic!("expected RequestExhausted, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_with_retry_any_error_retries_fatal_too() {
        let calls = AtomicU32::new(0);
        let cfg = RetryConfig::immediate(6);

        let result: Result<(), _> = with_retry(&cfg, "test", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(fatal()) }
        })
        .await;

        assert_eq!(calls.load(Ordering::SeqCst), 6);
        assert!(matches!(
            result.unwrap_err(),
            ReflectError::RequestExhausted { .. }
        ));
    }

    #[tokio::test]
    async fn test_with_retry_transient_only_surfaces_fatal_immediately() {
        let calls = AtomicU32::new(0);
        let cfg = RetryConfig::immediate(6).with_retry_on(RetryOn::TransientOnly);

        let result: Result<(), _> = with_retry(&cfg, "test", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(fatal()) }
        })
        .await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(matches!(
            result.unwrap_err(),
            ReflectError::Provider {
                retriable: false,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_with_retry_zero_attempts_still_calls_once() {
        let calls = AtomicU32::new(0);
        let cfg = RetryConfig::immediate(0);

        let result: Result<(), _> = with_retry(&cfg, "test", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(transient()) }
        })
        .await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(result.is_err());
    }

    // Provider that fails a fixed number of times before answering.
    struct FlakyProvider {
        failures: u32,
        calls: AtomicU32,
    }

    #[async_trait]
    impl ModelProvider for FlakyProvider {
        fn id(&self) -> &str {
            "flaky"
        }
        fn name(&self) -> &str {
            "Flaky"
        }
        async fn chat(&self, _req: ChatRequest) -> Result<ChatResponse, ReflectError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if n < self.failures {
                Err(ReflectError::RateLimited {
                    provider: "flaky".into(),
                    retry_after_ms: 0,
                })
            } else {
                Ok(ChatResponse {
                    content: "ok".into(),
                    usage: TokenUsage::default(),
                })
            }
        }
    }

    #[tokio::test]
    async fn test_retry_provider_delegates() {
        let flaky = Arc::new(FlakyProvider {
            failures: 2,
            calls: AtomicU32::new(0),
        });
        let provider = RetryProvider::with_config(flaky.clone(), RetryConfig::immediate(6));

        let resp = provider.chat(ChatRequest::default()).await.unwrap();
        assert_eq!(resp.content, "ok");
        assert_eq!(flaky.calls.load(Ordering::SeqCst), 3);
        assert_eq!(provider.id(), "flaky");
        assert_eq!(provider.config().max_attempts, 6);
    }
}
