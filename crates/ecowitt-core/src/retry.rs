//! Retry logic for gateway commands.
//!
//! The gateway drops or garbles the occasional response, so every command is
//! attempted several times with a fixed wait in between.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use ecowitt_core::{Error, RetryConfig, with_retry};
//!
//! let config = RetryConfig::new(3).retry_wait(Duration::from_millis(1));
//!
//! let mut calls = 0;
//! let result = with_retry(&config, "read_sensor", || {
//!     calls += 1;
//!     if calls < 2 {
//!         Err(Error::timeout("read_sensor", Duration::from_secs(2)))
//!     } else {
//!         Ok(42)
//!     }
//! });
//! assert_eq!(result.unwrap(), 42);
//! ```

use std::thread::sleep;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{Error, Result};

/// Configuration for retry behavior.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Total number of attempts, including the first. Zero is treated as one.
    pub max_tries: u32,
    /// Wait between attempts.
    #[serde(with = "crate::config::duration_secs")]
    pub retry_wait: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_tries: 3,
            retry_wait: Duration::from_secs(10),
        }
    }
}

impl RetryConfig {
    /// Create a retry config making `max_tries` attempts.
    pub fn new(max_tries: u32) -> Self {
        Self {
            max_tries,
            ..Default::default()
        }
    }

    /// A single attempt.
    pub fn none() -> Self {
        Self {
            max_tries: 1,
            retry_wait: Duration::ZERO,
        }
    }

    /// Short waits, for interactive use.
    pub fn quick() -> Self {
        Self {
            max_tries: 3,
            retry_wait: Duration::from_millis(500),
        }
    }

    /// Set the number of attempts.
    #[must_use]
    pub fn max_tries(mut self, tries: u32) -> Self {
        self.max_tries = tries;
        self
    }

    /// Set the wait between attempts.
    #[must_use]
    pub fn retry_wait(mut self, wait: Duration) -> Self {
        self.retry_wait = wait;
        self
    }

    fn attempts(&self) -> u32 {
        self.max_tries.max(1)
    }
}

/// Run `operation` until it succeeds, fails with a non-retryable error or
/// the attempt budget is spent.
///
/// The last error is returned unchanged when every attempt fails.
pub fn with_retry<F, T>(config: &RetryConfig, operation_name: &str, mut operation: F) -> Result<T>
where
    F: FnMut() -> Result<T>,
{
    let attempts = config.attempts();
    let mut attempt = 1;

    loop {
        match operation() {
            Ok(result) => {
                if attempt > 1 {
                    debug!("{} succeeded after {} retries", operation_name, attempt - 1);
                }
                return Ok(result);
            }
            Err(e) if !e.is_retryable() || attempt >= attempts => return Err(e),
            Err(e) => {
                warn!(
                    "{} failed (attempt {}/{}), retrying in {:?}: {}",
                    operation_name, attempt, attempts, config.retry_wait, e
                );
                if !config.retry_wait.is_zero() {
                    sleep(config.retry_wait);
                }
                attempt += 1;
            }
        }
    }
}

/// Like [`with_retry`], wrapping the final error in
/// [`Error::RetriesExhausted`] when the budget is spent.
pub(crate) fn with_retry_exhausted<F, T>(
    config: &RetryConfig,
    command: &'static str,
    mut operation: F,
) -> Result<T>
where
    F: FnMut() -> Result<T>,
{
    let attempts = config.attempts();
    let mut made = 0;
    let result = with_retry(config, command, || {
        made += 1;
        operation()
    });
    match result {
        Err(e) if e.is_retryable() && made >= attempts => Err(Error::RetriesExhausted {
            command,
            attempts,
            source: Box::new(e),
        }),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn fast(tries: u32) -> RetryConfig {
        RetryConfig::new(tries).retry_wait(Duration::ZERO)
    }

    fn transient() -> Error {
        Error::InvalidChecksum {
            expected: 1,
            actual: 2,
        }
    }

    #[test]
    fn test_retry_config_default() {
        let config = RetryConfig::default();
        assert_eq!(config.max_tries, 3);
        assert_eq!(config.retry_wait, Duration::from_secs(10));
    }

    #[test]
    fn test_retry_config_presets() {
        assert_eq!(RetryConfig::none().max_tries, 1);
        assert_eq!(RetryConfig::quick().retry_wait, Duration::from_millis(500));
        assert_eq!(RetryConfig::new(0).attempts(), 1);
    }

    #[test]
    fn test_with_retry_success_first_try() {
        let calls = Cell::new(0);
        let result = with_retry(&fast(3), "test", || {
            calls.set(calls.get() + 1);
            Ok::<_, Error>(7)
        });
        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_with_retry_eventually_succeeds() {
        let calls = Cell::new(0);
        let result = with_retry(&fast(3), "test", || {
            calls.set(calls.get() + 1);
            if calls.get() < 3 { Err(transient()) } else { Ok(calls.get()) }
        });
        assert_eq!(result.unwrap(), 3);
    }

    #[test]
    fn test_with_retry_exhausts_budget() {
        let calls = Cell::new(0);
        let result: Result<()> = with_retry(&fast(3), "test", || {
            calls.set(calls.get() + 1);
            Err(transient())
        });
        assert!(matches!(result, Err(Error::InvalidChecksum { .. })));
        assert_eq!(calls.get(), 3);
    }

    #[test]
    fn test_non_retryable_returns_immediately() {
        let calls = Cell::new(0);
        let result: Result<()> = with_retry(&fast(5), "test", || {
            calls.set(calls.get() + 1);
            Err(Error::UnknownApiCommand(0x99))
        });
        assert!(matches!(result, Err(Error::UnknownApiCommand(0x99))));
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_retries_exhausted_wraps_last_error() {
        let result: Result<()> = with_retry_exhausted(&fast(2), "CMD_READ_SSSS", || Err(transient()));
        let err = result.unwrap_err();
        assert_eq!(
            err.to_string(),
            "Failed to obtain response to command 'CMD_READ_SSSS' after 2 attempts"
        );
        let Error::RetriesExhausted { source, attempts, .. } = err else {
            panic!("expected RetriesExhausted");
        };
        assert_eq!(attempts, 2);
        assert!(matches!(*source, Error::InvalidChecksum { .. }));
    }

    #[test]
    fn test_retries_exhausted_passes_fatal_errors() {
        let result: Result<()> =
            with_retry_exhausted(&fast(2), "CMD_READ_SSSS", || Err(Error::NoDeviceFound));
        assert!(matches!(result, Err(Error::NoDeviceFound)));
    }
}
