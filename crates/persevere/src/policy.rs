//! Repeat and delay policies
//!
//! Both policies are plain serde-ready value types so applications can embed
//! retry settings in their configuration files. Each exposes a single pure
//! function: [`RepeatPolicy::should_continue`] decides whether another
//! attempt is permitted, [`DelayPolicy::delay_after`] computes how long to
//! suspend before it.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::report::ExecutionReport;

/// Decides whether the engine may start another attempt.
///
/// Side-effect free; the engine calls it at least twice per loop iteration
/// (before attempting, and again after a failure before waiting).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RepeatPolicy {
    /// Maximum number of failed attempts before the budget is spent
    #[serde(default = "default_max_failures")]
    pub max_failures: u32,

    /// Optional cap on cumulative wait time, in milliseconds
    #[serde(default)]
    pub max_wait_ms: Option<u64>,
}

impl RepeatPolicy {
    /// Permit up to `max_failures` failed attempts.
    pub fn attempts(max_failures: u32) -> Self {
        Self {
            max_failures,
            max_wait_ms: None,
        }
    }

    /// Permit up to `max_failures` failed attempts, but stop earlier once
    /// `max_wait_ms` of cumulative waiting has accrued.
    pub fn attempts_within(max_failures: u32, max_wait_ms: u64) -> Self {
        Self {
            max_failures,
            max_wait_ms: Some(max_wait_ms),
        }
    }

    /// Whether another attempt is permitted given the history so far.
    ///
    /// The time check takes precedence: once the wait budget is consumed the
    /// answer is no regardless of remaining attempts.
    pub fn should_continue<T, E>(&self, report: &ExecutionReport<T, E>) -> bool {
        if let Some(limit) = self.max_wait_ms {
            if report.waited() >= Duration::from_millis(limit) {
                return false;
            }
        }
        report.failed_count() < self.max_failures
    }
}

impl Default for RepeatPolicy {
    fn default() -> Self {
        Self::attempts(default_max_failures())
    }
}

/// Computes the delay before the next attempt.
///
/// Evaluated only immediately after a failure that will be followed by a
/// retry, keyed off the failure count at that moment. After the very first
/// failure every curve yields the configured initial delay.
///
/// # Example
///
/// ```rust
/// use persevere::DelayPolicy;
/// use std::time::Duration;
///
/// let policy = DelayPolicy::exponential(50, 0);
/// assert_eq!(policy.delay_after(1), Duration::ZERO);
/// assert_eq!(policy.delay_after(3), Duration::from_millis(9 * 50));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct DelayPolicy {
    /// Growth curve applied from the second failure onward
    #[serde(default)]
    pub curve: Backoff,

    /// Base delay in milliseconds fed into the growth curve
    #[serde(default = "default_base_delay")]
    pub base_delay_ms: u64,

    /// Delay in milliseconds applied after the first failure, for every curve
    #[serde(default)]
    pub initial_delay_ms: u64,
}

impl DelayPolicy {
    /// Wait the same `base_delay_ms` after every failure but the first.
    pub fn constant(base_delay_ms: u64, initial_delay_ms: u64) -> Self {
        Self {
            curve: Backoff::Constant,
            base_delay_ms,
            initial_delay_ms,
        }
    }

    /// Wait one base step longer after each failure: `T, 2T, 3T, ...`
    pub fn linear(base_delay_ms: u64, initial_delay_ms: u64) -> Self {
        Self {
            curve: Backoff::Linear,
            base_delay_ms,
            initial_delay_ms,
        }
    }

    /// Wait `k * k * T` after the k-th failure.
    ///
    /// The curve is quadratic, not `2^k`; downstream expectations are written
    /// against exactly this formula.
    pub fn exponential(base_delay_ms: u64, initial_delay_ms: u64) -> Self {
        Self {
            curve: Backoff::Exponential,
            base_delay_ms,
            initial_delay_ms,
        }
    }

    /// The delay to suspend for, given the number of failures so far.
    ///
    /// `failures` counts the failure that just occurred, so it is at least 1
    /// whenever the engine calls this.
    pub fn delay_after(&self, failures: u32) -> Duration {
        if failures <= 1 {
            return Duration::from_millis(self.initial_delay_ms);
        }
        let k = u64::from(failures);
        let ms = match self.curve {
            Backoff::Constant => self.base_delay_ms,
            Backoff::Linear => self.base_delay_ms.saturating_mul(k - 1),
            Backoff::Exponential => self.base_delay_ms.saturating_mul(k * k),
        };
        Duration::from_millis(ms)
    }
}

impl Default for DelayPolicy {
    fn default() -> Self {
        Self::exponential(default_base_delay(), 0)
    }
}

/// Delay growth curve
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum Backoff {
    /// Same delay after every failure
    Constant,

    /// Delay grows by one base step per failure
    Linear,

    /// Delay grows with the square of the failure count (default)
    #[default]
    Exponential,
}

fn default_max_failures() -> u32 {
    4
}
fn default_base_delay() -> u64 {
    50
}
