//! Retry policy for the remote processing exchange.

use vestia_core::constants::MAX_AUTOMATIC_RETRIES;
use vestia_core::ErrorCode;

/// Bounded automatic retry policy, decoupled from transport specifics.
///
/// A retried request is re-issued byte-identically, including the
/// idempotency key; the policy only decides whether another attempt may be
/// made, never how the request is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Automatic retries on top of the first attempt.
    pub max_retries: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: MAX_AUTOMATIC_RETRIES,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32) -> Self {
        Self { max_retries }
    }

    /// No automatic retries; every failure is terminal.
    pub fn none() -> Self {
        Self { max_retries: 0 }
    }

    /// Whether a further attempt may be made after `failed_attempts`
    /// attempts have already failed with `code`.
    pub fn should_retry(&self, code: ErrorCode, failed_attempts: u32) -> bool {
        code.is_transient() && failed_attempts <= self.max_retries
    }
}
