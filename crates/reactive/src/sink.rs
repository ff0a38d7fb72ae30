//! Listener panic isolation.
//!
//! A panicking listener must not abort the pass it runs in. Each call is
//! wrapped in `catch_unwind` and the payload is handed to an
//! [`ExceptionSink`]. Fatal [`Error`] payloads are re-raised instead.

use ripple_core::Error;
use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};

/// A panic caught while calling a listener.
pub struct ListenerPanic {
    payload: Box<dyn Any + Send>,
}

impl ListenerPanic {
    pub fn new(payload: Box<dyn Any + Send>) -> Self {
        Self { payload }
    }

    /// Best-effort text of the panic payload.
    pub fn message(&self) -> String {
        if let Some(message) = self.payload.downcast_ref::<&str>() {
            (*message).to_string()
        } else if let Some(message) = self.payload.downcast_ref::<String>() {
            message.clone()
        } else if let Some(err) = self.payload.downcast_ref::<Error>() {
            err.to_string()
        } else {
            "listener panicked with a non-string payload".to_string()
        }
    }

    /// Returns the raw payload, e.g. to re-raise it with `resume_unwind`.
    pub fn into_payload(self) -> Box<dyn Any + Send> {
        self.payload
    }
}

impl fmt::Debug for ListenerPanic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerPanic")
            .field("message", &self.message())
            .finish()
    }
}

impl fmt::Display for ListenerPanic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "listener panicked: {}", self.message())
    }
}

/// Receives the panics of isolated listeners.
pub trait ExceptionSink {
    fn report(&self, panic: ListenerPanic);
}

impl<F> ExceptionSink for F
where
    F: Fn(ListenerPanic),
{
    fn report(&self, panic: ListenerPanic) {
        self(panic)
    }
}

/// Default sink: logs every caught panic at error level.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingSink;

impl ExceptionSink for TracingSink {
    fn report(&self, panic: ListenerPanic) {
        tracing::error!(message = %panic.message(), "listener panicked during notification");
    }
}

/// Runs `f`, reporting a panic to `sink` instead of unwinding.
///
/// Fatal errors (see [`Error::is_fatal`]) keep unwinding.
pub fn invoke_isolated<F>(sink: &dyn ExceptionSink, f: F)
where
    F: FnOnce(),
{
    if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(f)) {
        if payload.downcast_ref::<Error>().is_some_and(Error::is_fatal) {
            panic::resume_unwind(payload);
        }
        sink.report(ListenerPanic::new(payload));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[test]
    fn test_panic_goes_to_sink() {
        let caught = RefCell::new(Vec::new());
        let sink = |panic: ListenerPanic| caught.borrow_mut().push(panic.message());

        invoke_isolated(&sink, || panic!("boom"));
        invoke_isolated(&sink, || panic!("code {}", 7));
        invoke_isolated(&sink, || {});

        assert_eq!(*caught.borrow(), vec!["boom".to_string(), "code 7".to_string()]);
    }

    #[test]
    fn test_non_fatal_error_payload_is_reported() {
        let caught = RefCell::new(None);
        let sink = |panic: ListenerPanic| *caught.borrow_mut() = Some(panic.message());

        invoke_isolated(&sink, || {
            panic::panic_any(Error::conversion("bad digit"));
        });
        assert_eq!(caught.borrow().as_deref(), Some("Conversion failed: bad digit"));
    }

    #[test]
    fn test_fatal_error_is_reraised() {
        let sink = |_: ListenerPanic| unreachable!("fatal errors bypass the sink");
        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            invoke_isolated(&sink, || {
                panic::panic_any(Error::non_convergence("p", "2", "0"));
            });
        }));

        let payload = result.unwrap_err();
        assert!(matches!(
            payload.downcast_ref::<Error>(),
            Some(Error::NonConvergence { .. })
        ));
    }
}
