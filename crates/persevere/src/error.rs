//! Error types for the retry engine
//!
//! Only two failure shapes ever escape an engine call: the budget ran out
//! while every failure was expected, or a single unexpected failure cut the
//! loop short.

use std::error::Error;
use std::fmt;
use std::slice;
use std::time::Duration;

/// Failure surfaced by a loud engine call.
///
/// Generic over `E`, the failure type produced by the operation being
/// retried.
#[derive(Debug)]
pub enum RetryError<E> {
    /// The repeat budget was consumed while only expected failures occurred.
    ///
    /// Carries the complete failure history in attempt order.
    Exhausted {
        /// Every failure, in the order the attempts produced them
        failures: Vec<E>,
        /// Cumulative time spent suspended between attempts
        waited: Duration,
    },

    /// A failure no registered handler claimed.
    ///
    /// Surfaced on first occurrence regardless of remaining budget, and
    /// never wrapped in an aggregate.
    Unexpected(E),
}

impl<E> RetryError<E> {
    /// Create an exhaustion error from the full failure history.
    pub fn exhausted(failures: Vec<E>, waited: Duration) -> Self {
        RetryError::Exhausted { failures, waited }
    }

    /// Create an error for a failure nothing claimed.
    pub fn unexpected(failure: E) -> Self {
        RetryError::Unexpected(failure)
    }

    /// Whether the budget ran out on expected failures.
    pub fn is_exhausted(&self) -> bool {
        matches!(self, RetryError::Exhausted { .. })
    }

    /// Whether an unexpected failure cut the loop short.
    pub fn is_unexpected(&self) -> bool {
        matches!(self, RetryError::Unexpected(_))
    }

    /// Number of failed attempts behind this error.
    pub fn attempts(&self) -> u32 {
        match self {
            RetryError::Exhausted { failures, .. } => failures.len() as u32,
            RetryError::Unexpected(_) => 1,
        }
    }

    /// The failures behind this error, in attempt order.
    pub fn failures(&self) -> &[E] {
        match self {
            RetryError::Exhausted { failures, .. } => failures,
            RetryError::Unexpected(failure) => slice::from_ref(failure),
        }
    }

    /// The most recent failure, if any attempt ran at all.
    pub fn last_failure(&self) -> Option<&E> {
        self.failures().last()
    }

    /// Consumes the error, returning the failures in attempt order.
    pub fn into_failures(self) -> Vec<E> {
        match self {
            RetryError::Exhausted { failures, .. } => failures,
            RetryError::Unexpected(failure) => vec![failure],
        }
    }
}

impl<E: fmt::Display> fmt::Display for RetryError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RetryError::Exhausted { failures, waited } => match failures.last() {
                Some(last) => write!(
                    f,
                    "gave up after {} failed attempts and {:.2}s of waiting: {}",
                    failures.len(),
                    waited.as_secs_f64(),
                    last
                ),
                None => write!(f, "gave up without attempting: the repeat budget permits none"),
            },
            RetryError::Unexpected(failure) => {
                write!(f, "unexpected failure: {}", failure)
            }
        }
    }
}

impl<E: Error + 'static> Error for RetryError<E> {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            RetryError::Exhausted { failures, .. } => failures
                .last()
                .map(|failure| failure as &(dyn Error + 'static)),
            RetryError::Unexpected(failure) => Some(failure),
        }
    }
}
