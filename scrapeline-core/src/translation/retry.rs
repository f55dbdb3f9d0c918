use std::{future::Future, time::Duration};

use scrapeline_config::constants::DEFAULT_TRANSLATION_RETRY_COUNT;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use super::error::{ProviderError, TranslationError};

const DEFAULT_BASE_DELAY: Duration = Duration::from_secs(1);

/// Longest `Retry-After` hint honoured between attempts.
pub const MAX_RETRY_AFTER: Duration = Duration::from_secs(60);

/// Linear backoff for translation calls.
///
/// After failed attempt `i` (1-based, not the last) the client waits
/// `i * base_delay`, or longer if the provider sent a `Retry-After` hint.
/// Hints are clamped to [`MAX_RETRY_AFTER`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_TRANSLATION_RETRY_COUNT, DEFAULT_BASE_DELAY)
    }
}

impl RetryPolicy {
    /// `max_attempts` below one is raised to one.
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
        }
    }

    /// Policy for a configured retry count with the default one second
    /// base delay.
    pub fn from_retry_count(retry_count: u32) -> Self {
        Self::new(retry_count, DEFAULT_BASE_DELAY)
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn base_delay(&self) -> Duration {
        self.base_delay
    }

    pub fn delay_after(&self, attempt: u32, hint: Option<Duration>) -> Duration {
        let linear = self.base_delay.saturating_mul(attempt);
        hint.map_or(linear, |hint| hint.min(MAX_RETRY_AFTER).max(linear))
    }

    /// Drive `call` until it succeeds, attempts run out or `cancel` fires.
    ///
    /// Both the in-flight attempt and the backoff sleep race the token.
    pub(crate) async fn run<F, Fut>(
        &self,
        provider: &str,
        cancel: &CancellationToken,
        mut call: F,
    ) -> Result<String, TranslationError>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<String, ProviderError>>,
    {
        let mut attempt = 1;
        loop {
            if cancel.is_cancelled() {
                return Err(TranslationError::Cancelled);
            }

            let outcome = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(TranslationError::Cancelled),
                outcome = call(attempt) => outcome,
            };

            let err = match outcome {
                Ok(translated) => return Ok(translated),
                Err(err) => err,
            };

            if attempt >= self.max_attempts {
                return Err(TranslationError::Exhausted {
                    provider: provider.to_string(),
                    attempts: attempt,
                    source: err,
                });
            }

            let hint = err.retry_after();
            if let Some(hint) = hint.filter(|hint| *hint > MAX_RETRY_AFTER) {
                warn!(
                    "{} asked to retry after {:?}; capping at {:?}",
                    provider, hint, MAX_RETRY_AFTER
                );
            }
            let delay = self.delay_after(attempt, hint);
            warn!(
                "Translation attempt {}/{} via {} failed: {}. Retrying in {:?}",
                attempt, self.max_attempts, provider, err, delay
            );

            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(TranslationError::Cancelled),
                _ = tokio::time::sleep(delay) => {}
            }
            attempt += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{
        Arc,
        atomic::{AtomicU32, Ordering},
    };
    use tokio::time::Instant;

    fn failure() -> ProviderError {
        ProviderError::Status {
            status: 500,
            body: "boom".into(),
        }
    }

    #[test]
    fn zero_attempts_means_one() {
        assert_eq!(RetryPolicy::from_retry_count(0).max_attempts(), 1);
    }

    #[test]
    fn delay_grows_linearly_and_respects_hints() {
        let policy = RetryPolicy::from_retry_count(3);
        assert_eq!(policy.delay_after(1, None), Duration::from_secs(1));
        assert_eq!(policy.delay_after(2, None), Duration::from_secs(2));
        assert_eq!(
            policy.delay_after(1, Some(Duration::from_secs(5))),
            Duration::from_secs(5)
        );
        assert_eq!(
            policy.delay_after(2, Some(Duration::from_millis(10))),
            Duration::from_secs(2)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn exhausts_after_max_attempts_with_linear_sleeps() {
        let calls = Arc::new(AtomicU32::new(0));
        let policy = RetryPolicy::from_retry_count(3);
        let start = Instant::now();

        let result = policy
            .run("deepseek", &CancellationToken::new(), |_| {
                let calls = Arc::clone(&calls);
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Err::<String, _>(failure())
                }
            })
            .await;

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        // 1s after the first failure, 2s after the second, none after the last.
        assert_eq!(start.elapsed(), Duration::from_secs(3));
        match result {
            Err(TranslationError::Exhausted {
                provider, attempts, ..
            }) => {
                assert_eq!(provider, "deepseek");
                assert_eq!(attempts, 3);
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn single_attempt_never_sleeps() {
        let policy = RetryPolicy::from_retry_count(1);
        let start = Instant::now();

        let result = policy
            .run("openai", &CancellationToken::new(), |_| async {
                Err::<String, _>(failure())
            })
            .await;

        assert!(matches!(result, Err(TranslationError::Exhausted { attempts: 1, .. })));
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn succeeds_on_a_later_attempt() {
        let policy = RetryPolicy::from_retry_count(2);

        let result = policy
            .run("deepseek", &CancellationToken::new(), |attempt| async move {
                if attempt == 1 {
                    Err(failure())
                } else {
                    Ok("你好".to_string())
                }
            })
            .await;

        assert_eq!(result.unwrap(), "你好");
    }

    #[tokio::test(start_paused = true)]
    async fn rate_limit_hint_extends_the_wait() {
        let policy = RetryPolicy::from_retry_count(2);
        let start = Instant::now();

        let _ = policy
            .run("deepseek", &CancellationToken::new(), |_| async {
                Err::<String, _>(ProviderError::RateLimited {
                    retry_after: Some(Duration::from_secs(7)),
                })
            })
            .await;

        assert_eq!(start.elapsed(), Duration::from_secs(7));
    }

    #[test]
    fn oversized_hints_are_capped() {
        let policy = RetryPolicy::from_retry_count(3);
        assert_eq!(
            policy.delay_after(1, Some(Duration::from_secs(86_400))),
            MAX_RETRY_AFTER
        );
        assert_eq!(
            policy.delay_after(2, Some(Duration::MAX)),
            MAX_RETRY_AFTER
        );
    }

    #[tokio::test(start_paused = true)]
    async fn day_long_retry_after_waits_at_most_the_cap() {
        let policy = RetryPolicy::from_retry_count(2);
        let start = Instant::now();

        let result = policy
            .run("deepseek", &CancellationToken::new(), |_| async {
                Err::<String, _>(ProviderError::RateLimited {
                    retry_after: Some(Duration::from_secs(86_400)),
                })
            })
            .await;

        assert!(matches!(result, Err(TranslationError::Exhausted { attempts: 2, .. })));
        assert_eq!(start.elapsed(), MAX_RETRY_AFTER);
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_interrupts_backoff() {
        let policy = RetryPolicy::from_retry_count(5);
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(1500)).await;
            trigger.cancel();
        });
        let start = Instant::now();

        let result = policy
            .run("deepseek", &cancel, |_| async { Err::<String, _>(failure()) })
            .await;

        assert!(matches!(result, Err(TranslationError::Cancelled)));
        assert!(start.elapsed() < Duration::from_secs(3));
    }

    #[tokio::test]
    async fn cancelled_token_stops_before_the_first_call() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let calls = AtomicU32::new(0);

        let result = RetryPolicy::default()
            .run("deepseek", &cancel, |_| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Ok("never".to_string()) }
            })
            .await;

        assert!(matches!(result, Err(TranslationError::Cancelled)));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }
}
