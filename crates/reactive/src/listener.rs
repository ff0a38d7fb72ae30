//! Listener traits and registry handles.
//!
//! Listeners are trait objects behind `Rc`. A registry stores each one as a
//! [`Handle`], either strong (the registry keeps the listener alive) or weak
//! (the listener lives only as long as someone else holds it).

use crate::observable::ObservableValue;
use std::any::Any;
use std::fmt;
use std::rc::{Rc, Weak};

/// Notified when an observable's value becomes stale.
///
/// Closures taking `&dyn ObservableValue<T>` implement this trait.
pub trait InvalidationListener<T> {
    /// Called once per notification pass the listener is part of.
    fn invalidated(&self, observable: &dyn ObservableValue<T>);

    /// Returns true if `other` should be treated as this listener on removal.
    ///
    /// Defaults to identity.
    fn same_listener(&self, other: &dyn InvalidationListener<T>) -> bool {
        std::ptr::addr_eq(self as *const Self, other as *const dyn InvalidationListener<T>)
    }

    /// Exposes a comparison key for listeners that match by equality.
    fn as_any(&self) -> Option<&dyn Any> {
        None
    }
}

/// Notified with the old and new value after an observable changed.
///
/// Closures taking `(&dyn ObservableValue<T>, &T, &T)` implement this trait.
pub trait ChangeListener<T> {
    /// Called with the value the listener last knew and the current value.
    fn changed(&self, observable: &dyn ObservableValue<T>, old: &T, new: &T);

    /// Returns true if `other` should be treated as this listener on removal.
    ///
    /// Defaults to identity.
    fn same_listener(&self, other: &dyn ChangeListener<T>) -> bool {
        std::ptr::addr_eq(self as *const Self, other as *const dyn ChangeListener<T>)
    }

    /// Exposes a comparison key for listeners that match by equality.
    fn as_any(&self) -> Option<&dyn Any> {
        None
    }
}

impl<T, F> InvalidationListener<T> for F
where
    F: Fn(&dyn ObservableValue<T>),
{
    fn invalidated(&self, observable: &dyn ObservableValue<T>) {
        self(observable)
    }
}

impl<T, F> ChangeListener<T> for F
where
    F: Fn(&dyn ObservableValue<T>, &T, &T),
{
    fn changed(&self, observable: &dyn ObservableValue<T>, old: &T, new: &T) {
        self(observable, old, new)
    }
}

/// Wraps a closure as a shareable invalidation listener.
pub fn invalidation_listener<T, F>(f: F) -> Rc<dyn InvalidationListener<T>>
where
    F: Fn(&dyn ObservableValue<T>) + 'static,
{
    Rc::new(f)
}

/// Wraps a closure as a shareable change listener.
pub fn change_listener<T, F>(f: F) -> Rc<dyn ChangeListener<T>>
where
    F: Fn(&dyn ObservableValue<T>, &T, &T) + 'static,
{
    Rc::new(f)
}

/// A registered listener, held strongly or weakly.
pub enum Handle<L: ?Sized> {
    /// Kept alive by the registry
    Strong(Rc<L>),
    /// Reclaimable once every outside owner is gone
    Weak(Weak<L>),
}

impl<L: ?Sized> Handle<L> {
    /// Returns the listener if it is still alive.
    #[inline]
    pub fn get(&self) -> Option<Rc<L>> {
        match self {
            Handle::Strong(listener) => Some(Rc::clone(listener)),
            Handle::Weak(listener) => listener.upgrade(),
        }
    }

    /// Returns false for a weak handle whose listener has been dropped.
    #[inline]
    pub fn is_alive(&self) -> bool {
        match self {
            Handle::Strong(_) => true,
            Handle::Weak(listener) => listener.strong_count() > 0,
        }
    }

    /// Returns true for a weak handle.
    #[inline]
    pub fn is_weak(&self) -> bool {
        matches!(self, Handle::Weak(_))
    }
}

impl<L: ?Sized> Clone for Handle<L> {
    fn clone(&self) -> Self {
        match self {
            Handle::Strong(listener) => Handle::Strong(Rc::clone(listener)),
            Handle::Weak(listener) => Handle::Weak(Weak::clone(listener)),
        }
    }
}

impl<L: ?Sized> fmt::Debug for Handle<L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Handle::Strong(_) => f.write_str("Handle::Strong"),
            Handle::Weak(_) if self.is_alive() => f.write_str("Handle::Weak(alive)"),
            Handle::Weak(_) => f.write_str("Handle::Weak(dead)"),
        }
    }
}

/// One registry entry, tagged with its partition.
pub enum Entry<I: ?Sized, C: ?Sized> {
    Invalidation(Handle<I>),
    Change(Handle<C>),
}

impl<I: ?Sized, C: ?Sized> Entry<I, C> {
    /// Returns false for a dead weak handle.
    pub fn is_alive(&self) -> bool {
        match self {
            Entry::Invalidation(handle) => handle.is_alive(),
            Entry::Change(handle) => handle.is_alive(),
        }
    }
}

impl<I: ?Sized, C: ?Sized> fmt::Debug for Entry<I, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Entry::Invalidation(handle) => f.debug_tuple("Invalidation").field(handle).finish(),
            Entry::Change(handle) => f.debug_tuple("Change").field(handle).finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weak_handle_dies_with_listener() {
        let listener = invalidation_listener(|_: &dyn ObservableValue<i32>| {});
        let handle = Handle::Weak(Rc::downgrade(&listener));
        assert!(handle.is_alive());
        assert!(handle.get().is_some());

        drop(listener);
        assert!(!handle.is_alive());
        assert!(handle.get().is_none());
    }

    #[test]
    fn test_strong_handle_keeps_listener() {
        let listener = change_listener(|_: &dyn ObservableValue<i32>, _: &i32, _: &i32| {});
        let weak = Rc::downgrade(&listener);
        let handle = Handle::Strong(listener);
        assert!(handle.is_alive());
        assert!(!handle.is_weak());
        assert!(weak.upgrade().is_some());

        drop(handle);
        assert!(weak.upgrade().is_none());
    }

    #[test]
    fn test_same_listener_is_identity() {
        let a = invalidation_listener(|_: &dyn ObservableValue<i32>| {});
        let b = invalidation_listener(|_: &dyn ObservableValue<i32>| {});
        assert!(a.same_listener(&*a));
        assert!(!a.same_listener(&*b));
        assert!(a.as_any().is_none());
    }
}
