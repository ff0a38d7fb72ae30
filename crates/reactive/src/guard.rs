//! Non-convergence guard.
//!
//! Listeners that keep rewriting the value they are notified about recurse
//! through nested notifications. The guard counts the nesting depth of one
//! observable and raises [`Error::NonConvergence`] when it gets too deep.

use crate::observable::ObservableValue;
use ripple_core::Error;
use std::cell::{Cell, RefCell};
use std::fmt::Debug;

pub struct NonConvergenceGuard<T> {
    depth: Cell<usize>,
    max_depth: usize,
    /// Old value of the outermost notification
    original: RefCell<Option<T>>,
}

impl<T: Clone + Debug> NonConvergenceGuard<T> {
    pub fn new(max_depth: usize) -> Self {
        Self {
            depth: Cell::new(0),
            max_depth: max_depth.max(1),
            original: RefCell::new(None),
        }
    }

    /// Current nesting depth, 0 outside any notification.
    #[inline]
    pub fn depth(&self) -> usize {
        self.depth.get()
    }

    #[inline]
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Enters one notification level.
    ///
    /// # Panics
    ///
    /// Panics with an [`Error::NonConvergence`] payload when the maximum
    /// depth is already reached.
    pub fn enter(&self, observable: &dyn ObservableValue<T>, old: Option<&T>) -> DepthToken<'_, T> {
        let depth = self.depth.get();
        if depth >= self.max_depth {
            self.trip(observable);
        }
        if depth == 0 {
            *self.original.borrow_mut() = old.cloned();
        }
        self.depth.set(depth + 1);
        DepthToken { guard: self }
    }

    fn trip(&self, observable: &dyn ObservableValue<T>) -> ! {
        let original = match &*self.original.borrow() {
            Some(value) => format!("{:?}", value),
            None => "<unknown>".to_string(),
        };
        let err = Error::non_convergence(
            observable.to_string(),
            format!("{:?}", observable.value()),
            original,
        );
        tracing::error!(max_depth = self.max_depth, %err, "change listeners did not converge");
        std::panic::panic_any(err)
    }

    fn exit(&self) {
        let depth = self.depth.get().saturating_sub(1);
        self.depth.set(depth);
        if depth == 0 {
            self.original.borrow_mut().take();
        }
    }
}

/// Leaves the notification level when dropped, unwinding included.
pub struct DepthToken<'a, T: Clone + Debug> {
    guard: &'a NonConvergenceGuard<T>,
}

impl<T: Clone + Debug> Drop for DepthToken<'_, T> {
    fn drop(&mut self) {
        self.guard.exit();
    }
}
