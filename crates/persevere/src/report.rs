//! Per-invocation attempt history
//!
//! An [`ExecutionReport`] is created by the engine for each call, mutated as
//! attempts run, and handed to the caller when the loop terminates.

use std::time::Duration;

use crate::error::RetryError;

/// Everything the engine learned while driving one operation: the ordered
/// failure history, the cumulative time spent suspended between attempts,
/// and the produced value once an attempt succeeds.
///
/// A report belongs to exactly one engine call and is never reused. Callers
/// in quiet mode inspect it instead of matching on an error:
/// [`is_success`](Self::is_success), [`failed_count`](Self::failed_count),
/// [`last_failure`](Self::last_failure), and [`waited`](Self::waited).
#[derive(Debug)]
pub struct ExecutionReport<T, E> {
    failures: Vec<E>,
    waited: Duration,
    succeeded: bool,
    result: Option<T>,
}

impl<T, E> ExecutionReport<T, E> {
    /// A fresh report for one engine call: no attempts, no waiting, failing
    /// until proven otherwise.
    pub(crate) fn new() -> Self {
        Self {
            failures: Vec::new(),
            waited: Duration::ZERO,
            succeeded: false,
            result: None,
        }
    }

    /// Whether the most recent attempt completed without failure.
    pub fn is_success(&self) -> bool {
        self.succeeded
    }

    /// Number of failed attempts so far.
    pub fn failed_count(&self) -> u32 {
        self.failures.len() as u32
    }

    /// Every failure encountered, in the order the attempts produced them.
    pub fn failures(&self) -> &[E] {
        &self.failures
    }

    /// The most recent failure, or `None` if no attempt has failed yet.
    pub fn last_failure(&self) -> Option<&E> {
        self.failures.last()
    }

    /// Cumulative time spent suspended between attempts.
    pub fn waited(&self) -> Duration {
        self.waited
    }

    /// The value produced by the successful attempt, if any.
    pub fn value(&self) -> Option<&T> {
        self.result.as_ref()
    }

    /// Consumes the report and returns the produced value, if any.
    pub fn into_value(self) -> Option<T> {
        self.result
    }

    /// Consumes the report and returns the failure history.
    pub fn into_failures(self) -> Vec<E> {
        self.failures
    }

    /// Consumes the report, yielding the produced value on success and an
    /// [`RetryError::Exhausted`] carrying the full failure history otherwise.
    pub fn into_result(self) -> Result<T, RetryError<E>> {
        match self.result {
            Some(value) => Ok(value),
            None => Err(RetryError::exhausted(self.failures, self.waited)),
        }
    }

    pub(crate) fn record_failure(&mut self, failure: E) {
        self.failures.push(failure);
    }

    pub(crate) fn record_wait(&mut self, delay: Duration) {
        self.waited += delay;
    }

    pub(crate) fn mark_success(&mut self, value: T) {
        self.succeeded = true;
        self.result = Some(value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_report_is_failing_and_empty() {
        let report: ExecutionReport<(), &str> = ExecutionReport::new();

        assert!(!report.is_success());
        assert_eq!(report.failed_count(), 0);
        assert!(report.failures().is_empty());
        assert_eq!(report.last_failure(), None);
        assert_eq!(report.waited(), Duration::ZERO);
        assert_eq!(report.value(), None);
    }

    #[test]
    fn failure_count_tracks_history_length() {
        let mut report: ExecutionReport<(), &str> = ExecutionReport::new();

        report.record_failure("first");
        report.record_failure("second");

        assert_eq!(report.failed_count(), 2);
        assert_eq!(report.failures(), &["first", "second"]);
        assert_eq!(report.last_failure(), Some(&"second"));
    }

    #[test]
    fn waited_accumulates() {
        let mut report: ExecutionReport<(), &str> = ExecutionReport::new();

        report.record_wait(Duration::from_millis(10));
        report.record_wait(Duration::from_millis(5));

        assert_eq!(report.waited(), Duration::from_millis(15));
    }

    #[test]
    fn into_result_returns_value_on_success() {
        let mut report: ExecutionReport<&str, &str> = ExecutionReport::new();
        report.mark_success("done");

        assert!(report.is_success());
        assert_eq!(report.into_result().unwrap(), "done");
    }

    #[test]
    fn into_result_wraps_history_on_failure() {
        let mut report: ExecutionReport<(), &str> = ExecutionReport::new();
        report.record_failure("boom");
        report.record_wait(Duration::from_millis(3));

        let err = report.into_result().unwrap_err();
        assert!(err.is_exhausted());
        assert_eq!(err.failures(), &["boom"]);
    }
}
