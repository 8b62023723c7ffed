//! Rate limiting and retry around any provider.

use async_trait::async_trait;
use backoff::ExponentialBackoffBuilder;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use std::num::NonZeroU32;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{ChatMessage, ChatOptions, RateLimitConfig, RetryConfig};
use crate::domain::ports::AiProvider;

/// Decorator that waits on a token bucket before each call and retries
/// transient failures with exponential backoff. Permanent failures are
/// returned immediately.
pub struct GuardedProvider {
    inner: Arc<dyn AiProvider>,
    limiter: DefaultDirectRateLimiter,
    retry: RetryConfig,
}

impl GuardedProvider {
    pub fn new(inner: Arc<dyn AiProvider>, rate_limit: &RateLimitConfig, retry: &RetryConfig) -> Self {
        let per_second = NonZeroU32::new(rate_limit.requests_per_second).unwrap_or(NonZeroU32::MIN);
        let burst = NonZeroU32::new(rate_limit.burst_size).unwrap_or(per_second);
        Self {
            inner,
            limiter: RateLimiter::direct(Quota::per_second(per_second).allow_burst(burst)),
            retry: retry.clone(),
        }
    }

    fn backoff(&self) -> backoff::ExponentialBackoff {
        ExponentialBackoffBuilder::new()
            .with_initial_interval(Duration::from_millis(self.retry.initial_backoff_ms))
            .with_max_interval(Duration::from_millis(self.retry.max_backoff_ms))
            .with_max_elapsed_time(None)
            .build()
    }
}

#[async_trait]
impl AiProvider for GuardedProvider {
    fn name(&self) -> &'static str {
        self.inner.name()
    }

    fn is_configured(&self) -> bool {
        self.inner.is_configured()
    }

    async fn chat(&self, messages: &[ChatMessage], options: &ChatOptions) -> DomainResult<String> {
        let attempts = AtomicU32::new(0);
        let max_retries = self.retry.max_retries;

        let operation = || async {
            self.limiter.until_ready().await;
            let attempt = attempts.fetch_add(1, Ordering::SeqCst);
            match self.inner.chat(messages, options).await {
                Ok(text) => Ok(text),
                Err(err) if err.is_transient() && attempt < max_retries => {
                    Err(backoff::Error::transient(err))
                }
                Err(err) => Err(backoff::Error::permanent(err)),
            }
        };

        let provider = self.inner.name();
        backoff::future::retry_notify(self.backoff(), operation, |err: DomainError, wait: Duration| {
            warn!(
                provider,
                error = %err,
                wait_ms = wait.as_millis() as u64,
                "Transient provider failure, retrying"
            );
        })
        .await
    }
}
