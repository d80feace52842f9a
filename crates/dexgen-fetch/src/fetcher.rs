use crate::HttpTransport;
use async_trait::async_trait;
use dexgen_core::{FetchConfig, FetchError, JsonFetcher, TransportError};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

/// Retry and pacing parameters for [`RetryingFetcher`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub max_retries: u32,
    /// Base delay; the wait after failed attempt `n` (0-based) is `retry_delay * (n + 1)`.
    pub retry_delay: Duration,
    /// Pause after every successful request.
    pub request_delay: Duration,
}

impl RetryPolicy {
    pub fn delay_after_failure(&self, attempt: u32) -> Duration {
        self.retry_delay * (attempt + 1)
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&FetchConfig::default())
    }
}

impl From<&FetchConfig> for RetryPolicy {
    fn from(config: &FetchConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            retry_delay: Duration::from_millis(config.retry_delay_ms),
            request_delay: Duration::from_millis(config.request_delay_ms),
        }
    }
}

/// Wraps a transport with linear back-off retries and post-success pacing.
pub struct RetryingFetcher<T> {
    transport: T,
    policy: RetryPolicy,
}

impl<T: HttpTransport> RetryingFetcher<T> {
    pub fn new(transport: T, policy: RetryPolicy) -> Self {
        Self { transport, policy }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }
}

#[async_trait]
impl<T: HttpTransport> JsonFetcher for RetryingFetcher<T> {
    async fn fetch_json(&self, url: &str) -> Result<Value, FetchError> {
        let mut last_error: Option<TransportError> = None;

        for attempt in 0..=self.policy.max_retries {
            if attempt > 0 {
                tokio::time::sleep(self.policy.delay_after_failure(attempt - 1)).await;
            }

            match self.transport.get_json(url).await {
                Ok(value) => {
                    if !self.policy.request_delay.is_zero() {
                        tokio::time::sleep(self.policy.request_delay).await;
                    }
                    return Ok(value);
                }
                Err(e) => {
                    if attempt < self.policy.max_retries {
                        warn!(
                            "{} (attempt {}/{}), retrying...",
                            e,
                            attempt + 1,
                            self.policy.max_attempts()
                        );
                    } else {
                        debug!("giving up on {}: {}", url, e);
                    }
                    last_error = Some(e);
                }
            }
        }

        Err(FetchError {
            url: url.to_string(),
            attempts: self.policy.max_attempts(),
            source: last_error.unwrap_or_else(|| TransportError::Network {
                url: url.to_string(),
                message: "no attempt was made".to_string(),
            }),
        })
    }
}
