//! Value notification helpers.
//!
//! [`ListenerHelper`] owns the listeners of one observable value and runs its
//! notification passes. [`OldValueCachingHelper`] wraps it for observables
//! that do not know their previous value when they change.

use crate::config::NotifyConfig;
use crate::guard::NonConvergenceGuard;
use crate::listener::{ChangeListener, Handle, InvalidationListener};
use crate::observable::{ObservableValue, PropertyValue};
use crate::sink::{invoke_isolated, ExceptionSink};
use crate::slot::{NotificationSlot, SlotKind};
use ripple_core::{Error, Result};
use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

type ValueSlot<T> = NotificationSlot<dyn InvalidationListener<T>, dyn ChangeListener<T>>;

/// Listener storage and notification for one observable value.
///
/// Passes may nest: a listener that writes the value starts a nested pass
/// right away. A nested pass only reaches the change listeners its enclosing
/// pass has already called, so every listener sees each value at most once
/// and the ones further down the list get a single `(old, final)` delta when
/// the outer pass resumes.
pub struct ListenerHelper<T: PropertyValue> {
    slot: ValueSlot<T>,
    guard: NonConvergenceGuard<T>,
    /// Change listeners reached by the innermost running pass: `Some(0)`
    /// during its invalidation phase, `Some(i + 1)` while listener `i` runs.
    reached: Cell<Option<usize>>,
    /// Bumped by every pass, so a resumed pass can tell the value moved.
    generation: Cell<u64>,
    sink: Rc<dyn ExceptionSink>,
}

impl<T: PropertyValue> Default for ListenerHelper<T> {
    fn default() -> Self {
        Self::new(&NotifyConfig::default())
    }
}

impl<T: PropertyValue> ListenerHelper<T> {
    pub fn new(config: &NotifyConfig) -> Self {
        Self {
            slot: NotificationSlot::new(),
            guard: NonConvergenceGuard::new(config.nesting_depth()),
            reached: Cell::new(None),
            generation: Cell::new(0),
            sink: config.exception_sink(),
        }
    }

    pub fn add_invalidation_listener(&self, listener: Rc<dyn InvalidationListener<T>>) {
        self.slot.add_invalidation_listener(Handle::Strong(listener));
    }

    /// Registers a listener without keeping it alive.
    pub fn add_weak_invalidation_listener(&self, listener: Weak<dyn InvalidationListener<T>>) -> Result<()> {
        if listener.strong_count() == 0 {
            return Err(Error::null_argument("listener"));
        }
        self.slot.add_invalidation_listener(Handle::Weak(listener));
        Ok(())
    }

    pub fn remove_invalidation_listener(&self, listener: &dyn InvalidationListener<T>) -> bool {
        self.slot
            .remove_invalidation_listener(|handle| handle.get().is_some_and(|l| l.same_listener(listener)))
    }

    pub fn add_change_listener(&self, listener: Rc<dyn ChangeListener<T>>) {
        self.slot.add_change_listener(Handle::Strong(listener));
    }

    /// Registers a listener without keeping it alive.
    pub fn add_weak_change_listener(&self, listener: Weak<dyn ChangeListener<T>>) -> Result<()> {
        if listener.strong_count() == 0 {
            return Err(Error::null_argument("listener"));
        }
        self.slot.add_change_listener(Handle::Weak(listener));
        Ok(())
    }

    pub fn remove_change_listener(&self, listener: &dyn ChangeListener<T>) -> bool {
        self.slot
            .remove_change_listener(|handle| handle.get().is_some_and(|l| l.same_listener(listener)))
    }

    #[inline]
    pub fn invalidation_listeners_len(&self) -> usize {
        self.slot.invalidation_listeners_len()
    }

    #[inline]
    pub fn change_listeners_len(&self) -> usize {
        self.slot.change_listeners_len()
    }

    #[inline]
    pub fn has_change_listeners(&self) -> bool {
        self.slot.has_change_listeners()
    }

    #[inline]
    pub fn slot_kind(&self) -> SlotKind {
        self.slot.kind()
    }

    /// Current nesting depth of notification passes.
    #[inline]
    pub fn depth(&self) -> usize {
        self.guard.depth()
    }

    /// Notifies all listeners that `observable` changed from `old`.
    ///
    /// # Panics
    ///
    /// Panics with an [`Error::NonConvergence`] payload when nested changes
    /// exceed the configured depth.
    pub fn fire_value_changed(&self, observable: &dyn ObservableValue<T>, old: T) {
        self.notify(observable, Some(old));
    }

    /// Notifies invalidation listeners only.
    pub fn fire_invalidated(&self, observable: &dyn ObservableValue<T>) {
        self.notify(observable, None);
    }

    pub(crate) fn notify(&self, observable: &dyn ObservableValue<T>, old: Option<T>) {
        let _depth = self.guard.enter(observable, old.as_ref());
        self.generation.set(self.generation.get().wrapping_add(1));

        let enclosing = self.reached.get();
        let _restore = RestoreReached {
            cell: &self.reached,
            value: enclosing,
        };
        let pass = self.slot.begin_pass();
        let change_limit = match enclosing {
            Some(reached) => reached.min(pass.change_extent()),
            None => pass.change_extent(),
        };
        // What the listener that started this nested pass wrote.
        let written = match (enclosing, &old) {
            (Some(_), Some(_)) if change_limit > 0 => Some(observable.value()),
            _ => None,
        };

        self.reached.set(Some(0));
        for i in 0..pass.invalidation_extent() {
            if let Some(listener) = pass.invalidation_listener(i) {
                invoke_isolated(&*self.sink, || listener.invalidated(observable));
            }
        }

        let Some(old) = old else {
            return;
        };
        if change_limit == 0 {
            return;
        }

        let mut current = observable.value();
        for i in 0..change_limit {
            let Some(listener) = pass.change_listener(i) else {
                continue;
            };
            let generation = self.generation.get();
            // The writer already knows its own value; tell it about reverts.
            let known = match &written {
                Some(written) if enclosing == Some(i + 1) && current == old => written,
                _ => &old,
            };
            if current != *known {
                self.reached.set(Some(i + 1));
                invoke_isolated(&*self.sink, || listener.changed(observable, known, &current));
            }
            if self.generation.get() != generation {
                current = observable.value();
            }
        }
    }
}

struct RestoreReached<'a> {
    cell: &'a Cell<Option<usize>>,
    value: Option<usize>,
}

impl Drop for RestoreReached<'_> {
    fn drop(&mut self) {
        self.cell.set(self.value);
    }
}

/// A [`ListenerHelper`] that remembers the last value it reported.
///
/// The cache only exists while change listeners are registered, so an
/// observable with invalidation listeners alone never computes its value
/// just to notify.
pub struct OldValueCachingHelper<T: PropertyValue> {
    helper: ListenerHelper<T>,
    cached: RefCell<Option<T>>,
}

impl<T: PropertyValue> Default for OldValueCachingHelper<T> {
    fn default() -> Self {
        Self::new(&NotifyConfig::default())
    }
}

impl<T: PropertyValue> OldValueCachingHelper<T> {
    pub fn new(config: &NotifyConfig) -> Self {
        Self {
            helper: ListenerHelper::new(config),
            cached: RefCell::new(None),
        }
    }

    pub fn add_invalidation_listener(&self, listener: Rc<dyn InvalidationListener<T>>) {
        self.helper.add_invalidation_listener(listener);
    }

    pub fn add_weak_invalidation_listener(&self, listener: Weak<dyn InvalidationListener<T>>) -> Result<()> {
        self.helper.add_weak_invalidation_listener(listener)
    }

    pub fn remove_invalidation_listener(&self, listener: &dyn InvalidationListener<T>) -> bool {
        self.helper.remove_invalidation_listener(listener)
    }

    /// Registers a change listener, seeding the cache from `observable`.
    pub fn add_change_listener(&self, observable: &dyn ObservableValue<T>, listener: Rc<dyn ChangeListener<T>>) {
        self.seed(observable);
        self.helper.add_change_listener(listener);
    }

    pub fn add_weak_change_listener(
        &self,
        observable: &dyn ObservableValue<T>,
        listener: Weak<dyn ChangeListener<T>>,
    ) -> Result<()> {
        if listener.strong_count() == 0 {
            return Err(Error::null_argument("listener"));
        }
        self.seed(observable);
        self.helper.add_weak_change_listener(listener)
    }

    /// Removes a change listener; the cache goes with the last one.
    pub fn remove_change_listener(&self, listener: &dyn ChangeListener<T>) -> bool {
        let removed = self.helper.remove_change_listener(listener);
        if !self.helper.has_change_listeners() {
            self.cached.borrow_mut().take();
        }
        removed
    }

    #[inline]
    pub fn invalidation_listeners_len(&self) -> usize {
        self.helper.invalidation_listeners_len()
    }

    #[inline]
    pub fn change_listeners_len(&self) -> usize {
        self.helper.change_listeners_len()
    }

    /// Returns true while a value is cached.
    pub fn is_caching(&self) -> bool {
        self.cached.borrow().is_some()
    }

    /// Notifies listeners, reporting the cached value as the old one.
    pub fn fire_value_changed(&self, observable: &dyn ObservableValue<T>) {
        let old = if self.helper.has_change_listeners() {
            let current = observable.value();
            self.cached.replace(Some(current))
        } else {
            None
        };
        self.helper.notify(observable, old);
    }

    fn seed(&self, observable: &dyn ObservableValue<T>) {
        if !self.helper.has_change_listeners() || self.cached.borrow().is_none() {
            let value = observable.value();
            *self.cached.borrow_mut() = Some(value);
        }
    }
}
