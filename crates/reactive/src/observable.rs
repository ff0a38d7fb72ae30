//! The observable value contract.

use crate::listener::{ChangeListener, InvalidationListener};
use ripple_core::Result;
use std::any::Any;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::{Rc, Weak};

/// Values an observable can hold.
pub trait PropertyValue: Clone + PartialEq + fmt::Debug + 'static {}

impl<T: Clone + PartialEq + fmt::Debug + 'static> PropertyValue for T {}

/// A value that notifies listeners when it changes.
///
/// Listener removal takes the same `Rc` that was registered (or anything the
/// registered listener considers equal, see
/// [`ChangeListener::same_listener`]).
pub trait ObservableValue<T>: fmt::Display {
    /// Returns the current value.
    fn value(&self) -> T;

    fn add_invalidation_listener(&self, listener: Rc<dyn InvalidationListener<T>>);

    /// Registers a listener that is dropped from the registry once nothing
    /// else keeps it alive. Fails with `NullArgument` for a dead reference.
    fn add_weak_invalidation_listener(&self, listener: Weak<dyn InvalidationListener<T>>) -> Result<()>;

    fn remove_invalidation_listener(&self, listener: &dyn InvalidationListener<T>) -> bool;

    fn add_change_listener(&self, listener: Rc<dyn ChangeListener<T>>);

    /// Weak counterpart of [`ObservableValue::add_change_listener`].
    fn add_weak_change_listener(&self, listener: Weak<dyn ChangeListener<T>>) -> Result<()>;

    fn remove_change_listener(&self, listener: &dyn ChangeListener<T>) -> bool;
}

/// Identity of a shared observable that does not keep it alive.
///
/// Two identities are equal when they refer to the same allocation.
#[derive(Clone)]
pub struct ObservableIdentity(Weak<dyn Any>);

impl ObservableIdentity {
    pub(crate) fn new<T: Any>(observable: &Rc<T>) -> Self {
        let weak = Rc::downgrade(observable);
        Self(weak)
    }

    /// Returns true while the observable exists.
    #[inline]
    pub fn is_alive(&self) -> bool {
        self.0.strong_count() > 0
    }

    /// Address of the observable, stable for its lifetime.
    #[inline]
    pub fn addr(&self) -> usize {
        self.0.as_ptr() as *const () as usize
    }
}

impl PartialEq for ObservableIdentity {
    fn eq(&self, other: &Self) -> bool {
        self.addr() == other.addr()
    }
}

impl Eq for ObservableIdentity {}

impl Hash for ObservableIdentity {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.addr().hash(state);
    }
}

impl fmt::Debug for ObservableIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObservableIdentity")
            .field("addr", &format_args!("{:#x}", self.addr()))
            .field("alive", &self.is_alive())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_equality() {
        let a = Rc::new(1u8);
        let b = Rc::new(1u8);
        assert_eq!(ObservableIdentity::new(&a), ObservableIdentity::new(&a));
        assert_ne!(ObservableIdentity::new(&a), ObservableIdentity::new(&b));
    }

    #[test]
    fn test_identity_liveness() {
        let a = Rc::new(String::from("x"));
        let id = ObservableIdentity::new(&a);
        assert!(id.is_alive());
        drop(a);
        assert!(!id.is_alive());
    }
}
