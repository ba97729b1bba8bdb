use crate::config::LedgerSettings;
use crate::error::Result;
use crate::observability::get_metrics;
use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// Bounded retry for ledger transactions that lost a serialization race.
///
/// The whole read-validate-write closure is re-run; business-rule failures
/// are returned immediately.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_settings(&LedgerSettings::default())
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, backoff: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff,
        }
    }

    pub fn from_settings(settings: &LedgerSettings) -> Self {
        Self::new(settings.max_transaction_attempts, settings.retry_backoff())
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Runs `op` until it succeeds, fails with a non-retryable error, or the
    /// attempt budget is spent. Backoff grows linearly with the attempt number.
    pub async fn run<T, F, Fut>(&self, operation: &'static str, mut op: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut attempt = 1;
        loop {
            match op().await {
                Err(err) if err.is_retryable() && attempt < self.max_attempts => {
                    warn!(
                        operation,
                        attempt,
                        max_attempts = self.max_attempts,
                        error = %err,
                        "Ledger transaction conflict, retrying"
                    );
                    get_metrics().record_transaction_retry(operation);

                    let delay = self.backoff * attempt;
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                    attempt += 1;
                }
                result => return result,
            }
        }
    }
}
