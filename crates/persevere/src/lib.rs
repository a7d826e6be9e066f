//! # persevere
//!
//! Policy-driven retry engine: re-executes a fallible operation according to
//! a pluggable repeat policy and delay policy, treating registered failure
//! kinds as recoverable and everything else as fatal.
//!
//! # Features
//!
//! - Repeat budgets by attempt count, optionally capped by cumulative wait
//!   time
//! - Constant, linear, and quadratic backoff with a first-failure initial
//!   override
//! - Ordered failure-handler chain with per-kind callbacks; unclaimed
//!   failures end the loop immediately
//! - Quiet mode returning an inspectable [`ExecutionReport`] instead of an
//!   error
//! - Fluent builder configuration; a configured engine is reusable across
//!   sequential calls
//! - Serde-ready policy types for embedding retry settings in configuration
//!   files
//!
//! # Example
//!
//! ```rust,no_run
//! use persevere::Retrier;
//! use std::io;
//!
//! async fn example() -> Result<String, persevere::RetryError<io::Error>> {
//!     Retrier::new()
//!         .expect(io::ErrorKind::TimedOut)
//!         .repeat_within(5, 1_000)
//!         .backoff_exponential(10, 0)
//!         .run(|_| async {
//!             // Your fallible operation here
//!             Ok("success".to_string())
//!         })
//!         .await
//! }
//! ```

mod error;
mod handler;
mod policy;
mod report;
mod retrier;

pub use error::RetryError;
pub use handler::{CallbackHandler, ClosureHandler, ExpectAny, ExpectKind, FailureHandler, Fault};
pub use policy::{Backoff, DelayPolicy, RepeatPolicy};
pub use report::ExecutionReport;
pub use retrier::Retrier;
