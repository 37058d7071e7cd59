//! Retry policy types.
//!
//! A [`RetryPolicy`] classifies which status codes and which error
//! categories warrant a re-dispatch, how many attempts to make, and how
//! long to wait between attempts. Policies are resolved once per call:
//! a method-level policy overrides the API-group default.

use std::time::Duration;

use crate::Error;

/// An inclusive status code range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusRange {
    /// Lower bound, inclusive.
    pub from: u16,
    /// Upper bound, inclusive.
    pub to: u16,
}

impl StatusRange {
    /// 2xx success class.
    pub const OK: Self = Self::new(200, 299);
    /// 3xx redirect class.
    pub const REDIRECT: Self = Self::new(300, 399);
    /// 4xx not-found class.
    pub const NOT_FOUND: Self = Self::new(400, 499);
    /// 5xx server-error class.
    pub const SERVER_ERROR: Self = Self::new(500, 599);

    /// Create a range.
    #[must_use]
    pub const fn new(from: u16, to: u16) -> Self {
        Self { from, to }
    }

    /// Returns `true` if the status falls within this range.
    #[must_use]
    pub const fn contains(&self, status: u16) -> bool {
        status >= self.from && status <= self.to
    }
}

/// Error categories a policy may retry on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryOn {
    /// Connection and TLS failures, and timeouts.
    Transport,
    /// Timeouts only.
    Timeout,
}

impl RetryOn {
    /// Returns `true` if the error belongs to this category.
    #[must_use]
    pub const fn matches(&self, error: &Error) -> bool {
        match self {
            Self::Transport => error.is_transport(),
            Self::Timeout => error.is_timeout(),
        }
    }
}

/// Retry policy for a declared call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempt budget. `0` means call once with no retry handling.
    pub attempts: u32,
    /// Error categories that warrant a retry.
    pub retry_on: Vec<RetryOn>,
    /// Status ranges that warrant a retry.
    pub retry_on_status: Vec<StatusRange>,
    /// Fixed wait between attempts. Zero means no wait.
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            retry_on: vec![RetryOn::Transport],
            retry_on_status: vec![
                StatusRange::REDIRECT,
                StatusRange::NOT_FOUND,
                StatusRange::SERVER_ERROR,
            ],
            backoff: Duration::ZERO,
        }
    }
}

impl RetryPolicy {
    /// Create a policy with the given attempt budget and defaults for
    /// everything else.
    #[must_use]
    pub fn attempts(attempts: u32) -> Self {
        Self {
            attempts,
            ..Self::default()
        }
    }

    /// Replace the retryable error categories.
    #[must_use]
    pub fn retry_on(mut self, retry_on: Vec<RetryOn>) -> Self {
        self.retry_on = retry_on;
        self
    }

    /// Replace the retryable status ranges.
    #[must_use]
    pub fn retry_on_status(mut self, ranges: Vec<StatusRange>) -> Self {
        self.retry_on_status = ranges;
        self
    }

    /// Set the fixed backoff between attempts.
    #[must_use]
    pub const fn backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }

    /// Returns `true` if the status code warrants a retry.
    #[must_use]
    pub fn should_retry_status(&self, status: u16) -> bool {
        self.retry_on_status.iter().any(|r| r.contains(status))
    }

    /// Returns `true` if the error warrants a retry.
    #[must_use]
    pub fn should_retry_error(&self, error: &Error) -> bool {
        self.retry_on.iter().any(|category| category.matches(error))
    }
}
