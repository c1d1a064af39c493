//! Bounded retry with exponential backoff for transient storage failures
//!
//! Up to three attempts with doubling delay, then the last error surfaces
//! as a single failure. Only `StorageUnavailable` is retried; definitive
//! outcomes (missing record, rejected feedback) surface immediately. The
//! retry count and base delay come from `RetryConfig`.

use anyhow::Result;
use std::time::Duration;

use crate::config::RetryConfig;
use crate::error::RecallError;

/// Run `op` up to `config.max_attempts` times, backing off between attempts.
///
/// Retries only errors classified `StorageUnavailable`; any other failure
/// is returned on the first attempt.
pub fn with_retry<T, F>(config: &RetryConfig, mut op: F) -> Result<T>
where
    F: FnMut() -> Result<T>,
{
    let attempts = config.max_attempts.max(1);
    let mut last_err = None;

    for attempt in 0..attempts {
        match op() {
            Ok(value) => return Ok(value),
            Err(e) => {
                if !matches!(
                    e.downcast_ref::<RecallError>(),
                    Some(RecallError::StorageUnavailable(_))
                ) {
                    return Err(e);
                }
                log::warn!("attempt {} failed: {}", attempt + 1, e);
                last_err = Some(e);
                if attempt + 1 < attempts {
                    let delay = config.base_delay_ms * (1 << attempt);
                    std::thread::sleep(Duration::from_millis(delay));
                }
            }
        }
    }

    // attempts >= 1, so last_err is always set here
    Err(last_err.unwrap())
}
