//! Caller-side retry with exponential back-off and jitter.
//!
//! Nothing inside the pipeline retries on its own. [`retry_with_backoff`]
//! wraps a whole operation (usually a full analysis run) and re-runs it only
//! for failures [`AnalysisError::is_retriable`] accepts.

use std::future::Future;
use std::ops::RangeInclusive;
use std::time::Duration;

use crate::error::AnalysisError;

/// Delay schedule: `base_ms × 2^(retry-1)`, capped, with ±25 % jitter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
    pub base_ms: u64,
    pub max_delay_ms: u64,
}

impl Backoff {
    pub const DEFAULT_MAX_DELAY_MS: u64 = 60_000;

    #[must_use]
    pub fn new(base_ms: u64) -> Self {
        Self {
            base_ms,
            max_delay_ms: Self::DEFAULT_MAX_DELAY_MS,
        }
    }

    /// Jitter window for the sleep before 1-based retry number `retry`.
    #[must_use]
    pub fn window(&self, retry: u32) -> RangeInclusive<u64> {
        let exponent = retry.saturating_sub(1).min(16);
        let nominal = self
            .base_ms
            .saturating_mul(1u64 << exponent)
            .min(self.max_delay_ms);
        let spread = nominal / 4;
        nominal - spread..=nominal.saturating_add(spread)
    }

    fn delay(&self, retry: u32) -> Duration {
        let window = self.window(retry);
        let ms = if window.start() == window.end() {
            *window.start()
        } else {
            rand::random_range(window)
        };
        Duration::from_millis(ms)
    }
}

/// Runs `operation` with up to `max_retries` additional attempts on retriable
/// errors.
///
/// With `backoff_base_ms = 1_000` the sleeps are about 1 s, 2 s, 4 s, capped
/// at 60 s. Non-retriable errors return immediately.
///
/// # Errors
///
/// Returns the last error once retries are exhausted, or the first
/// non-retriable error.
pub async fn retry_with_backoff<T, F, Fut>(
    max_retries: u32,
    backoff_base_ms: u64,
    mut operation: F,
) -> Result<T, AnalysisError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, AnalysisError>>,
{
    let backoff = Backoff::new(backoff_base_ms);
    let mut retry = 0u32;

    loop {
        let err = match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };
        if retry >= max_retries || !err.is_retriable() {
            return Err(err);
        }

        retry += 1;
        let delay = backoff.delay(retry);
        tracing::warn!(
            retry,
            max_retries,
            delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
            error = %err,
            "analysis failed, retrying"
        );
        tokio::time::sleep(delay).await;
    }
}
