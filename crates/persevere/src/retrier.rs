//! The retry engine
//!
//! A [`Retrier`] is configured through chained builder methods, then drives
//! an operation to success or exhaustion. Configuration is read-only while a
//! call runs, so one configured engine can serve any number of sequential
//! calls.

use std::fmt;
use std::future::Future;

use crate::error::RetryError;
use crate::handler::{CallbackHandler, ExpectAny, ExpectKind, FailureHandler, Fault};
use crate::policy::{DelayPolicy, RepeatPolicy};
use crate::report::ExecutionReport;

/// Policy-driven retry engine.
///
/// Holds one repeat policy, one delay policy, a quiet flag, and an ordered
/// chain of failure handlers. Failures claimed by a handler drive a retry
/// while the repeat budget lasts; failures nothing claims end the call
/// immediately.
///
/// # Example
///
/// ```rust,no_run
/// use persevere::Retrier;
/// use std::io;
///
/// async fn fetch() -> Result<String, persevere::RetryError<io::Error>> {
///     Retrier::new()
///         .expect(io::ErrorKind::TimedOut)
///         .repeat(3)
///         .backoff_linear(100, 0)
///         .run(|_| async { Ok("payload".to_string()) })
///         .await
/// }
/// ```
pub struct Retrier<E> {
    repeat: RepeatPolicy,
    delay: DelayPolicy,
    quiet: bool,
    handlers: Vec<Box<dyn FailureHandler<E>>>,
}

impl<E> Retrier<E> {
    /// An engine with no handlers registered: up to 4 failures, loud, and
    /// exponential backoff with a 50 ms base and no initial delay.
    ///
    /// Every failure is fatal until an expectation is registered; see
    /// [`Retrier::default`] for the recover-from-anything configuration.
    pub fn new() -> Self {
        Self {
            repeat: RepeatPolicy::attempts(4),
            delay: DelayPolicy::exponential(50, 0),
            quiet: false,
            handlers: Vec::new(),
        }
    }

    /// Permit up to `max_failures` failed attempts.
    pub fn repeat(mut self, max_failures: u32) -> Self {
        self.repeat = RepeatPolicy::attempts(max_failures);
        self
    }

    /// Permit up to `max_failures` failed attempts within `max_wait_ms` of
    /// cumulative waiting, whichever runs out first.
    pub fn repeat_within(mut self, max_failures: u32, max_wait_ms: u64) -> Self {
        self.repeat = RepeatPolicy::attempts_within(max_failures, max_wait_ms);
        self
    }

    /// Replace the repeat policy.
    pub fn with_repeat(mut self, policy: RepeatPolicy) -> Self {
        self.repeat = policy;
        self
    }

    /// Replace the delay policy.
    pub fn with_delay(mut self, policy: DelayPolicy) -> Self {
        self.delay = policy;
        self
    }

    /// Wait the same amount between all attempts.
    pub fn backoff_constant(self, base_delay_ms: u64, initial_delay_ms: u64) -> Self {
        self.with_delay(DelayPolicy::constant(base_delay_ms, initial_delay_ms))
    }

    /// Wait a linearly growing amount between attempts.
    pub fn backoff_linear(self, base_delay_ms: u64, initial_delay_ms: u64) -> Self {
        self.with_delay(DelayPolicy::linear(base_delay_ms, initial_delay_ms))
    }

    /// Back off quadratically between attempts.
    pub fn backoff_exponential(self, base_delay_ms: u64, initial_delay_ms: u64) -> Self {
        self.with_delay(DelayPolicy::exponential(base_delay_ms, initial_delay_ms))
    }

    /// Choose between returning an unsuccessful report (quiet) and
    /// surfacing an error (loud, the default).
    pub fn quietly(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }

    /// Append a handler to the classification chain.
    pub fn with_handler<H>(mut self, handler: H) -> Self
    where
        H: FailureHandler<E> + 'static,
    {
        self.handlers.push(Box::new(handler));
        self
    }

    /// Treat any failure whatsoever as expected.
    pub fn expect_any(self) -> Self {
        self.with_handler(ExpectAny)
    }

    /// Treat failures of the given kind as expected.
    pub fn expect(self, kind: E::Kind) -> Self
    where
        E: Fault,
        E::Kind: PartialEq + Send + Sync + 'static,
    {
        self.with_handler(ExpectKind::new(kind))
    }

    /// Treat failures of the given kind as expected, running `callback` with
    /// each occurrence.
    pub fn expect_with<F>(self, kind: E::Kind, callback: F) -> Self
    where
        E: Fault,
        E::Kind: PartialEq + Send + Sync + 'static,
        F: Fn(&E) + Send + Sync + 'static,
    {
        self.with_handler(CallbackHandler::new(kind, callback))
    }

    /// The configured repeat policy.
    pub fn repeat_policy(&self) -> RepeatPolicy {
        self.repeat
    }

    /// The configured delay policy.
    pub fn delay_policy(&self) -> DelayPolicy {
        self.delay
    }

    /// Whether the engine returns unsuccessful reports instead of errors.
    pub fn is_quiet(&self) -> bool {
        self.quiet
    }

    /// Runs every handler over the failure, in registration order, and ORs
    /// the answers. No short-circuit: all matching callbacks must fire.
    fn classify(&self, failure: &E) -> bool {
        let mut handled = false;
        for handler in &self.handlers {
            handled |= handler.handle(failure);
        }
        handled
    }
}

impl<E: fmt::Display> Retrier<E> {
    /// Drive `op` to success or exhaustion and return the full report.
    ///
    /// The operation receives the current report, so it can inspect the
    /// failure count or history of earlier attempts. When the engine is
    /// quiet the report is returned even on failure; when loud, exhaustion
    /// surfaces as [`RetryError::Exhausted`] and an unclaimed failure as
    /// [`RetryError::Unexpected`].
    pub async fn execute<T, F, Fut>(&self, op: F) -> Result<ExecutionReport<T, E>, RetryError<E>>
    where
        F: FnMut(&ExecutionReport<T, E>) -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        self.drive(self.quiet, op).await
    }

    /// Drive `op` to success and return the produced value.
    ///
    /// Always loud, whatever the quiet flag says: any terminal failure
    /// surfaces as the error instead of an unsuccessful report.
    pub async fn run<T, F, Fut>(&self, op: F) -> Result<T, RetryError<E>>
    where
        F: FnMut(&ExecutionReport<T, E>) -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        self.drive(false, op).await?.into_result()
    }

    async fn drive<T, F, Fut>(
        &self,
        quiet: bool,
        mut op: F,
    ) -> Result<ExecutionReport<T, E>, RetryError<E>>
    where
        F: FnMut(&ExecutionReport<T, E>) -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let mut report = ExecutionReport::new();

        while self.repeat.should_continue(&report) {
            tracing::debug!(attempt = report.failed_count() + 1, "starting attempt");

            match op(&report).await {
                Ok(value) => {
                    if report.failed_count() > 0 {
                        tracing::info!(
                            failures = report.failed_count(),
                            waited_ms = report.waited().as_millis() as u64,
                            "succeeded after retry"
                        );
                    } else {
                        tracing::debug!("succeeded on first attempt");
                    }
                    report.mark_success(value);
                    return Ok(report);
                }
                Err(failure) => {
                    let expected = self.classify(&failure);
                    if !expected {
                        tracing::warn!(error = %failure, "unexpected failure, giving up");
                        if !quiet {
                            return Err(RetryError::unexpected(failure));
                        }
                        report.record_failure(failure);
                        break;
                    }
                    tracing::warn!(
                        error = %failure,
                        failures = report.failed_count() + 1,
                        "attempt failed"
                    );
                    report.record_failure(failure);
                }
            }

            // no reason to wait when no further attempt is permitted
            if !self.repeat.should_continue(&report) {
                break;
            }

            let delay = self.delay.delay_after(report.failed_count());
            tracing::debug!(delay_ms = delay.as_millis() as u64, "backing off");
            tokio::time::sleep(delay).await;
            report.record_wait(delay);
        }

        if !quiet && !report.is_success() {
            tracing::error!(failures = report.failed_count(), "retry budget exhausted");
            let waited = report.waited();
            return Err(RetryError::exhausted(report.into_failures(), waited));
        }
        Ok(report)
    }
}

impl<E> Default for Retrier<E> {
    /// The ready-made configuration: [`Retrier::new`] plus an [`ExpectAny`]
    /// handler, so any failure is treated as recoverable.
    fn default() -> Self {
        Self::new().expect_any()
    }
}

impl<E> fmt::Debug for Retrier<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Retrier")
            .field("repeat", &self.repeat)
            .field("delay", &self.delay)
            .field("quiet", &self.quiet)
            .field("handlers", &self.handlers.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::Backoff;
    use std::io;

    #[test]
    fn fresh_engine_matches_documented_defaults() {
        let engine: Retrier<io::Error> = Retrier::new();

        assert_eq!(engine.repeat_policy(), RepeatPolicy::attempts(4));
        assert_eq!(engine.delay_policy(), DelayPolicy::exponential(50, 0));
        assert_eq!(engine.delay_policy().curve, Backoff::Exponential);
        assert!(!engine.is_quiet());
    }

    #[test]
    fn builder_methods_overwrite_configuration() {
        let engine: Retrier<io::Error> = Retrier::new()
            .repeat_within(7, 900)
            .backoff_constant(25, 5)
            .quietly(true);

        assert_eq!(engine.repeat_policy(), RepeatPolicy::attempts_within(7, 900));
        assert_eq!(engine.delay_policy(), DelayPolicy::constant(25, 5));
        assert!(engine.is_quiet());
    }

    #[test]
    fn classify_ors_across_the_whole_chain() {
        let engine: Retrier<io::Error> = Retrier::new()
            .expect(io::ErrorKind::NotFound)
            .expect(io::ErrorKind::TimedOut);

        assert!(engine.classify(&io::Error::new(io::ErrorKind::TimedOut, "late")));
        assert!(engine.classify(&io::Error::new(io::ErrorKind::NotFound, "gone")));
        assert!(!engine.classify(&io::Error::new(io::ErrorKind::PermissionDenied, "no")));
    }

    #[test]
    fn default_engine_classifies_anything() {
        let engine: Retrier<io::Error> = Retrier::default();
        assert!(engine.classify(&io::Error::new(io::ErrorKind::PermissionDenied, "no")));
    }
}
