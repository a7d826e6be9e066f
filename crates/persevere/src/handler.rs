//! Failure classification
//!
//! A failure is either expected (some registered handler claims it and the
//! engine keeps retrying) or unexpected (nothing claims it and the engine
//! gives up immediately). Handlers are matched against an explicit kind
//! discriminator rather than by downcasting.

use std::io;

/// Gives a failure type an explicit kind for handlers to match against.
///
/// # Example
///
/// ```rust
/// use persevere::Fault;
///
/// #[derive(Debug)]
/// enum StoreError {
///     Connection(String),
///     Corrupt,
/// }
///
/// #[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// enum StoreErrorKind {
///     Connection,
///     Corrupt,
/// }
///
/// impl Fault for StoreError {
///     type Kind = StoreErrorKind;
///
///     fn kind(&self) -> StoreErrorKind {
///         match self {
///             StoreError::Connection(_) => StoreErrorKind::Connection,
///             StoreError::Corrupt => StoreErrorKind::Corrupt,
///         }
///     }
/// }
/// ```
pub trait Fault {
    /// Discriminator compared against a handler's registered kind.
    type Kind: PartialEq;

    /// The kind of this particular failure.
    fn kind(&self) -> Self::Kind;
}

impl Fault for io::Error {
    type Kind = io::ErrorKind;

    fn kind(&self) -> io::ErrorKind {
        io::Error::kind(self)
    }
}

/// Recognizes failures the engine should treat as expected.
///
/// The engine invokes every registered handler for every failure, in
/// registration order, and ORs the results; a handler returning `true`
/// claims the failure as recoverable.
pub trait FailureHandler<E: ?Sized>: Send + Sync {
    /// Returns `true` iff this handler claims the failure.
    fn handle(&self, failure: &E) -> bool;
}

/// Claims any failure whatsoever.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExpectAny;

impl<E: ?Sized> FailureHandler<E> for ExpectAny {
    fn handle(&self, _failure: &E) -> bool {
        true
    }
}

/// Claims failures of one registered kind and silently declines the rest.
#[derive(Debug, Clone)]
pub struct ExpectKind<K> {
    kind: K,
}

impl<K> ExpectKind<K> {
    /// Binds a handler to the given failure kind.
    pub fn new(kind: K) -> Self {
        Self { kind }
    }
}

impl<E, K> FailureHandler<E> for ExpectKind<K>
where
    E: Fault<Kind = K>,
    K: PartialEq + Send + Sync,
{
    fn handle(&self, failure: &E) -> bool {
        failure.kind() == self.kind
    }
}

/// Like [`ExpectKind`], but runs a caller-supplied callback with each
/// matching failure before claiming it.
///
/// The callback fires exactly once per matching occurrence and never for a
/// kind the handler was not registered for.
pub struct CallbackHandler<K, F> {
    kind: K,
    callback: F,
}

impl<K, F> CallbackHandler<K, F> {
    /// Binds a callback to the given failure kind.
    pub fn new(kind: K, callback: F) -> Self {
        Self { kind, callback }
    }
}

impl<E, K, F> FailureHandler<E> for CallbackHandler<K, F>
where
    E: Fault<Kind = K>,
    K: PartialEq + Send + Sync,
    F: Fn(&E) + Send + Sync,
{
    fn handle(&self, failure: &E) -> bool {
        if failure.kind() != self.kind {
            return false;
        }
        (self.callback)(failure);
        true
    }
}

/// Claims whatever its predicate function claims.
///
/// The escape hatch for classification that a single kind cannot express.
pub struct ClosureHandler<F> {
    predicate: F,
}

impl<F> ClosureHandler<F> {
    /// Wraps a predicate function as a handler.
    pub fn new(predicate: F) -> Self {
        Self { predicate }
    }
}

impl<E, F> FailureHandler<E> for ClosureHandler<F>
where
    F: Fn(&E) -> bool + Send + Sync,
{
    fn handle(&self, failure: &E) -> bool {
        (self.predicate)(failure)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn expect_any_claims_everything() {
        let handler = ExpectAny;

        assert!(handler.handle(&io::Error::new(io::ErrorKind::NotFound, "not found")));
        assert!(handler.handle(&io::Error::new(io::ErrorKind::TimedOut, "timeout")));
    }

    #[test]
    fn expect_kind_claims_only_its_kind() {
        let handler = ExpectKind::new(io::ErrorKind::TimedOut);

        assert!(handler.handle(&io::Error::new(io::ErrorKind::TimedOut, "timeout")));
        assert!(!handler.handle(&io::Error::new(io::ErrorKind::NotFound, "not found")));
    }

    #[test]
    fn callback_fires_only_for_matching_kind() {
        let calls = AtomicU32::new(0);
        let handler = CallbackHandler::new(io::ErrorKind::TimedOut, |_: &io::Error| {
            calls.fetch_add(1, Ordering::SeqCst);
        });

        assert!(!handler.handle(&io::Error::new(io::ErrorKind::NotFound, "not found")));
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        assert!(handler.handle(&io::Error::new(io::ErrorKind::TimedOut, "timeout")));
        assert!(handler.handle(&io::Error::new(io::ErrorKind::TimedOut, "timeout again")));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn closure_handler_uses_predicate() {
        let handler = ClosureHandler::new(|err: &io::Error| {
            matches!(
                err.kind(),
                io::ErrorKind::TimedOut | io::ErrorKind::ConnectionReset
            )
        });

        assert!(handler.handle(&io::Error::new(io::ErrorKind::ConnectionReset, "reset")));
        assert!(!handler.handle(&io::Error::new(io::ErrorKind::PermissionDenied, "denied")));
    }
}
