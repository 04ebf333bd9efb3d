//! Polling with backoff
//!
//! One loop shared by every wait in a run: the staged-object visibility wait
//! and the load-job status wait. A check returns `Ok(Some(_))` when done,
//! `Ok(None)` to poll again, and `Err(_)` to abort the loop immediately.

use crate::error::{Error, Result};
use crate::types::BackoffType;
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Default delay between polls
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Configuration for a polling loop
#[derive(Debug, Clone)]
pub struct PollConfig {
    /// Delay before the second attempt (the first attempt is immediate)
    pub interval: Duration,
    /// How the delay grows between attempts
    pub backoff: BackoffType,
    /// Upper bound on any single delay
    pub max_interval: Duration,
    /// Give up after this many attempts
    pub max_attempts: Option<u32>,
    /// Give up after this much time
    pub timeout: Option<Duration>,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            backoff: BackoffType::Constant,
            max_interval: Duration::from_secs(60),
            max_attempts: None,
            timeout: None,
        }
    }
}

impl PollConfig {
    /// Create an unbounded config polling at a fixed interval
    pub fn every(interval: Duration) -> Self {
        Self {
            interval,
            ..Self::default()
        }
    }

    /// Set the backoff strategy
    #[must_use]
    pub fn with_backoff(mut self, backoff: BackoffType, max_interval: Duration) -> Self {
        self.backoff = backoff;
        self.max_interval = max_interval;
        self
    }

    /// Bound the number of attempts
    #[must_use]
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = Some(attempts);
        self
    }

    /// Bound the total wait
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Delay after the given zero-based attempt
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let delay = match self.backoff {
            BackoffType::Constant => self.interval,
            BackoffType::Linear => self.interval.saturating_mul(attempt + 1),
            BackoffType::Exponential => {
                let factor = 2u32.saturating_pow(attempt);
                self.interval.saturating_mul(factor)
            }
        };

        std::cmp::min(delay, self.max_interval.max(self.interval))
    }
}

/// Runs polling loops with a shared cancellation token
#[derive(Debug, Clone)]
pub struct Poller {
    config: PollConfig,
    cancel: CancellationToken,
}

impl Poller {
    /// Create a poller
    pub fn new(config: PollConfig, cancel: CancellationToken) -> Self {
        Self { config, cancel }
    }

    /// Get the configuration
    pub fn config(&self) -> &PollConfig {
        &self.config
    }

    /// Poll `check` until it yields a value.
    ///
    /// `what` names the wait in errors and logs. The check receives the
    /// zero-based attempt number.
    pub async fn poll_until<T, F, Fut>(&self, what: &str, mut check: F) -> Result<T>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<Option<T>>>,
    {
        let started = Instant::now();
        let deadline = self.config.timeout.map(|t| started + t);
        let mut attempt = 0u32;

        loop {
            if self.cancel.is_cancelled() {
                return Err(Error::Cancelled {
                    what: what.to_string(),
                });
            }

            if let Some(value) = check(attempt).await? {
                return Ok(value);
            }
            attempt += 1;

            if let Some(max) = self.config.max_attempts {
                if attempt >= max {
                    return Err(Error::PollExhausted {
                        what: what.to_string(),
                        attempts: attempt,
                    });
                }
            }

            let mut delay = self.config.delay_after(attempt - 1);
            if let Some(deadline) = deadline {
                let now = Instant::now();
                if now >= deadline {
                    return Err(self.timed_out(what));
                }
                delay = delay.min(deadline - now);
            }

            debug!("{what}: not ready after attempt {attempt}, retrying in {delay:?}");

            tokio::select! {
                () = self.cancel.cancelled() => {
                    return Err(Error::Cancelled { what: what.to_string() });
                }
                () = tokio::time::sleep(delay) => {}
            }

            if deadline.is_some_and(|d| Instant::now() >= d) {
                return Err(self.timed_out(what));
            }
        }
    }

    fn timed_out(&self, what: &str) -> Error {
        Error::Timeout {
            what: what.to_string(),
            timeout_secs: self.config.timeout.map_or(0, |t| t.as_secs()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn fast() -> PollConfig {
        PollConfig::every(Duration::from_millis(1))
    }

    #[test]
    fn test_delay_after() {
        let constant = PollConfig::every(Duration::from_secs(5));
        assert_eq!(constant.delay_after(0), Duration::from_secs(5));
        assert_eq!(constant.delay_after(7), Duration::from_secs(5));

        let linear = PollConfig::every(Duration::from_secs(1))
            .with_backoff(BackoffType::Linear, Duration::from_secs(3));
        assert_eq!(linear.delay_after(0), Duration::from_secs(1));
        assert_eq!(linear.delay_after(1), Duration::from_secs(2));
        assert_eq!(linear.delay_after(5), Duration::from_secs(3));

        let exponential = PollConfig::every(Duration::from_millis(100))
            .with_backoff(BackoffType::Exponential, Duration::from_secs(1));
        assert_eq!(exponential.delay_after(0), Duration::from_millis(100));
        assert_eq!(exponential.delay_after(2), Duration::from_millis(400));
        assert_eq!(exponential.delay_after(10), Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_poll_until_ready() {
        let poller = Poller::new(fast(), CancellationToken::new());
        let calls = Arc::new(AtomicU32::new(0));

        let counter = calls.clone();
        let result = poller
            .poll_until("thing", move |attempt| {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok((attempt == 2).then_some("ready"))
                }
            })
            .await
            .unwrap();

        assert_eq!(result, "ready");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_poll_error_aborts() {
        let poller = Poller::new(fast(), CancellationToken::new());
        let result: Result<()> = poller
            .poll_until("thing", |_| async { Err(Error::Other("boom".to_string())) })
            .await;
        assert!(matches!(result, Err(Error::Other(msg)) if msg == "boom"));
    }

    #[tokio::test]
    async fn test_poll_max_attempts() {
        let poller = Poller::new(fast().with_max_attempts(3), CancellationToken::new());
        let result: Result<()> = poller.poll_until("thing", |_| async { Ok(None) }).await;
        assert!(matches!(
            result,
            Err(Error::PollExhausted { attempts: 3, .. })
        ));
    }

    #[tokio::test]
    async fn test_poll_timeout() {
        let config = PollConfig::every(Duration::from_millis(5)).with_timeout(Duration::from_millis(20));
        let poller = Poller::new(config, CancellationToken::new());
        let result: Result<()> = poller.poll_until("thing", |_| async { Ok(None) }).await;
        assert!(matches!(result, Err(Error::Timeout { .. })));
    }

    #[tokio::test]
    async fn test_poll_cancelled() {
        let cancel = CancellationToken::new();
        let poller = Poller::new(PollConfig::every(Duration::from_secs(60)), cancel.clone());

        let handle = tokio::spawn(async move {
            let result: Result<()> = poller.poll_until("thing", |_| async { Ok(None) }).await;
            result
        });
        tokio::time::sleep(Duration::from_millis(10)).await;
        cancel.cancel();

        let result = handle.await.unwrap();
        assert!(matches!(result, Err(Error::Cancelled { .. })));
    }
}
