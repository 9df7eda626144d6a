//! Bounded retry for transient store failures
//!
//! Only errors classified [`ErrorKind::Transient`] are retried, with
//! exponential backoff. Retry wraps single store accesses (checkpoint
//! writes); it never wraps a lending atomic unit, so a stock or debt
//! change cannot be double-applied by a retry.

use std::time::Duration;

use circ_core::{ErrorKind, Result};

/// Configuration for transient-error retry behavior
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of retry attempts (0 = no retries)
    pub max_retries: usize,
    /// Base delay between retries in milliseconds (exponential backoff)
    pub base_delay_ms: u64,
    /// Maximum delay between retries in milliseconds
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay_ms: 10,
            max_delay_ms: 100,
        }
    }
}

impl RetryConfig {
    /// Create a RetryConfig with no retries
    pub fn no_retry() -> Self {
        Self {
            max_retries: 0,
            ..Default::default()
        }
    }

    /// Delay for a given attempt (exponential backoff)
    pub(crate) fn calculate_delay(&self, attempt: usize) -> Duration {
        // Cap the shift to prevent overflow
        let shift = attempt.min(63);
        let multiplier = 1u64 << shift;
        let delay_ms = self.base_delay_ms.saturating_mul(multiplier);
        Duration::from_millis(delay_ms.min(self.max_delay_ms))
    }
}

/// Run `op`, retrying transient failures up to the configured bound
///
/// Non-transient errors and exhaustion of the bound return the last error.
pub fn run_with_retry<T>(config: &RetryConfig, mut op: impl FnMut() -> Result<T>) -> Result<T> {
    let mut attempt = 0;
    loop {
        match op() {
            Err(e) if e.kind() == ErrorKind::Transient && attempt < config.max_retries => {
                std::thread::sleep(config.calculate_delay(attempt));
                attempt += 1;
            }
            other => return other,
        }
    }
}
