//! Retry decorator: bounded retries with a per-attempt timeout.
//!
//! Wraps any provider. Each attempt runs under `tokio::time::timeout`; expiry
//! becomes [`ProviderError::Timeout`]. Only transient failures are retried
//! (see [`ProviderError::is_transient`]), with exponential backoff.

use async_trait::async_trait;
use agromie_core::error::ProviderError;
use agromie_core::provider::*;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

/// How hard to try before giving up.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,
    /// Delay before the first retry; doubles each time
    pub base_delay: Duration,
    /// Deadline for a single attempt
    pub attempt_timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            base_delay: Duration::from_millis(500),
            attempt_timeout: Duration::from_secs(60),
        }
    }
}

impl RetryPolicy {
    /// Backoff before retry number `retry` (0-based).
    fn delay(&self, retry: u32) -> Duration {
        self.base_delay.saturating_mul(2u32.saturating_pow(retry))
    }
}

/// A provider that retries transient failures of an inner provider.
pub struct RetryProvider {
    inner: Arc<dyn agromie_core::Provider>,
    policy: RetryPolicy,
}

impl RetryProvider {
    pub fn new(inner: Arc<dyn agromie_core::Provider>, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }
}

#[async_trait]
impl agromie_core::Provider for RetryProvider {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn complete(
        &self,
        request: ProviderRequest,
    ) -> std::result::Result<ProviderResponse, ProviderError> {
        let mut retry = 0;
        loop {
            let attempt = tokio::time::timeout(
                self.policy.attempt_timeout,
                self.inner.complete(request.clone()),
            )
            .await
            .unwrap_or_else(|_| {
                Err(ProviderError::Timeout(format!(
                    "Provider '{}' did not answer within {}s",
                    self.inner.name(),
                    self.policy.attempt_timeout.as_secs()
                )))
            });

            match attempt {
                Ok(response) => return Ok(response),
                Err(e) if e.is_transient() && retry < self.policy.max_retries => {
                    let delay = self.policy.delay(retry);
                    retry += 1;
                    warn!(
                        provider = %self.inner.name(),
                        error = %e,
                        retry,
                        max_retries = self.policy.max_retries,
                        delay_ms = delay.as_millis() as u64,
                        "Transient provider failure, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agromie_core::Provider;
    use agromie_core::message::Message;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Plays back a fixed sequence of results, then keeps failing.
    struct SequenceProvider {
        results: Mutex<VecDeque<Result<&'static str, ProviderError>>>,
        calls: Mutex<usize>,
    }

    impl SequenceProvider {
        fn new(results: Vec<Result<&'static str, ProviderError>>) -> Self {
            Self {
                results: Mutex::new(results.into()),
                calls: Mutex::new(0),
            }
        }

        fn calls(&self) -> usize {
            *self.calls.lock().unwrap()
        }
    }

    #[async_trait]
    impl agromie_core::Provider for SequenceProvider {
        fn name(&self) -> &str {
            "sequence"
        }

        async fn complete(
            &self,
            _request: ProviderRequest,
        ) -> std::result::Result<ProviderResponse, ProviderError> {
            *self.calls.lock().unwrap() += 1;
            let next = self
                .results
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Err(ProviderError::Network("exhausted".into())));
            next.map(|text| ProviderResponse {
                message: Message::assistant(text),
                usage: None,
                model: "test-model".into(),
            })
        }
    }

    /// A provider that hangs forever (for timeout testing).
    struct HangingProvider;

    #[async_trait]
    impl agromie_core::Provider for HangingProvider {
        fn name(&self) -> &str {
            "hanging"
        }

        async fn complete(
            &self,
            _request: ProviderRequest,
        ) -> std::result::Result<ProviderResponse, ProviderError> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Err(ProviderError::EmptyResponse)
        }
    }

    fn test_request() -> ProviderRequest {
        ProviderRequest {
            model: "test".into(),
            messages: vec![Message::user("oi")],
            temperature: 0.3,
            max_tokens: None,
            tools: vec![],
            tool_choice: ToolChoice::Auto,
        }
    }

    fn policy(max_retries: u32) -> RetryPolicy {
        RetryPolicy {
            max_retries,
            base_delay: Duration::from_millis(1),
            attempt_timeout: Duration::from_secs(5),
        }
    }

    fn server_error() -> ProviderError {
        ProviderError::ApiError {
            status_code: 503,
            message: "unavailable".into(),
        }
    }

    #[tokio::test]
    async fn retries_transient_then_succeeds() {
        let inner = Arc::new(SequenceProvider::new(vec![
            Err(server_error()),
            Err(ProviderError::Network("reset".into())),
            Ok("pronto"),
        ]));
        let provider = RetryProvider::new(inner.clone(), policy(2));

        let response = provider.complete(test_request()).await.unwrap();
        assert_eq!(response.message.content, "pronto");
        assert_eq!(inner.calls(), 3);
    }

    #[tokio::test]
    async fn gives_up_after_max_retries() {
        let inner = Arc::new(SequenceProvider::new(vec![
            Err(server_error()),
            Err(server_error()),
            Err(server_error()),
        ]));
        let provider = RetryProvider::new(inner.clone(), policy(1));

        let err = provider.complete(test_request()).await.unwrap_err();
        assert!(matches!(err, ProviderError::ApiError { status_code: 503, .. }));
        assert_eq!(inner.calls(), 2);
    }

    #[tokio::test]
    async fn client_errors_are_not_retried() {
        let inner = Arc::new(SequenceProvider::new(vec![Err(ProviderError::ApiError {
            status_code: 400,
            message: "bad request".into(),
        })]));
        let provider = RetryProvider::new(inner.clone(), policy(3));

        assert!(provider.complete(test_request()).await.is_err());
        assert_eq!(inner.calls(), 1);
    }

    #[tokio::test]
    async fn auth_errors_are_not_retried() {
        let inner = Arc::new(SequenceProvider::new(vec![Err(
            ProviderError::AuthenticationFailed("bad key".into()),
        )]));
        let provider = RetryProvider::new(inner.clone(), policy(3));

        assert!(provider.complete(test_request()).await.is_err());
        assert_eq!(inner.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn hung_attempt_becomes_timeout() {
        let provider = RetryProvider::new(
            Arc::new(HangingProvider),
            RetryPolicy {
                max_retries: 0,
                base_delay: Duration::from_millis(1),
                attempt_timeout: Duration::from_secs(30),
            },
        );
        let err = provider.complete(test_request()).await.unwrap_err();
        assert!(matches!(err, ProviderError::Timeout(_)));
    }

    #[test]
    fn backoff_doubles() {
        let policy = RetryPolicy {
            base_delay: Duration::from_millis(500),
            ..RetryPolicy::default()
        };
        assert_eq!(policy.delay(0), Duration::from_millis(500));
        assert_eq!(policy.delay(2), Duration::from_millis(2000));
    }
}
