//! Lazily computed values derived from another observable.

use crate::config::NotifyConfig;
use crate::helper::OldValueCachingHelper;
use crate::listener::{ChangeListener, InvalidationListener};
use crate::observable::{ObservableIdentity, ObservableValue, PropertyValue};
use ripple_core::Result;
use std::any::Any;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

/// A value computed from a source observable on demand.
///
/// `Mapped` recomputes only when read after its source changed, and notifies
/// its own listeners once per valid→invalid transition. Change listeners get
/// proper deltas through an [`OldValueCachingHelper`].
///
/// # Example
///
/// ```rust
/// use ripple_reactive::{map, Property};
///
/// let celsius = Property::new(100.0);
/// let fahrenheit = map(&celsius, |c: &f64| c * 9.0 / 5.0 + 32.0);
/// assert_eq!(fahrenheit.get(), 212.0);
///
/// celsius.set(0.0);
/// assert_eq!(fahrenheit.get(), 32.0);
/// ```
pub struct Mapped<T: PropertyValue> {
    inner: Rc<MappedInner<T>>,
}

struct MappedInner<T: PropertyValue> {
    compute: Box<dyn Fn() -> T>,
    value: RefCell<Option<T>>,
    valid: Cell<bool>,
    helper: OldValueCachingHelper<T>,
    /// Keeps the weakly registered source listener alive
    _subscription: Box<dyn Any>,
}

impl<T: PropertyValue> Clone for Mapped<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

/// Derives a value from `source` through `f`.
pub fn map<S, T, O, F>(source: &O, f: F) -> Mapped<T>
where
    S: 'static,
    T: PropertyValue,
    O: ObservableValue<S> + Clone + 'static,
    F: Fn(&S) -> T + 'static,
{
    Mapped::with_config(source, f, &NotifyConfig::default())
}

impl<T: PropertyValue> Mapped<T> {
    /// Derives a value with explicit notification settings.
    pub fn with_config<S, O, F>(source: &O, f: F, config: &NotifyConfig) -> Self
    where
        S: 'static,
        O: ObservableValue<S> + Clone + 'static,
        F: Fn(&S) -> T + 'static,
    {
        let inner = Rc::new_cyclic(|weak: &Weak<MappedInner<T>>| {
            let target = Weak::clone(weak);
            let listener: Rc<dyn InvalidationListener<S>> = Rc::new(move |_: &dyn ObservableValue<S>| {
                if let Some(inner) = target.upgrade() {
                    Mapped { inner }.invalidate();
                }
            });
            if let Err(err) = source.add_weak_invalidation_listener(Rc::downgrade(&listener)) {
                tracing::warn!(%err, %source, "mapped value could not observe its source");
            }

            let input = source.clone();
            MappedInner {
                compute: Box::new(move || f(&input.value())),
                value: RefCell::new(None),
                valid: Cell::new(false),
                helper: OldValueCachingHelper::new(config),
                _subscription: Box::new(listener),
            }
        });
        Self { inner }
    }

    /// Returns the current value, recomputing it if stale.
    pub fn get(&self) -> T {
        if !self.inner.valid.get() {
            let value = (self.inner.compute)();
            *self.inner.value.borrow_mut() = Some(value.clone());
            self.inner.valid.set(true);
            return value;
        }
        match &*self.inner.value.borrow() {
            Some(value) => value.clone(),
            None => (self.inner.compute)(),
        }
    }

    /// Returns true if the cached value is up to date.
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.inner.valid.get()
    }

    /// Returns true while change listeners keep an old value cached.
    pub fn is_caching(&self) -> bool {
        self.inner.helper.is_caching()
    }

    /// Marks the value stale and notifies listeners on the first transition.
    pub fn invalidate(&self) {
        if self.inner.valid.replace(false) {
            self.inner.value.borrow_mut().take();
            self.inner.helper.fire_value_changed(self);
        }
    }

    pub fn invalidation_listener_count(&self) -> usize {
        self.inner.helper.invalidation_listeners_len()
    }

    pub fn change_listener_count(&self) -> usize {
        self.inner.helper.change_listeners_len()
    }

    pub fn identity(&self) -> ObservableIdentity {
        ObservableIdentity::new(&self.inner)
    }
}

impl<T: PropertyValue> ObservableValue<T> for Mapped<T> {
    fn value(&self) -> T {
        self.get()
    }

    fn add_invalidation_listener(&self, listener: Rc<dyn InvalidationListener<T>>) {
        self.inner.helper.add_invalidation_listener(listener);
    }

    fn add_weak_invalidation_listener(&self, listener: Weak<dyn InvalidationListener<T>>) -> Result<()> {
        self.inner.helper.add_weak_invalidation_listener(listener)
    }

    fn remove_invalidation_listener(&self, listener: &dyn InvalidationListener<T>) -> bool {
        self.inner.helper.remove_invalidation_listener(listener)
    }

    fn add_change_listener(&self, listener: Rc<dyn ChangeListener<T>>) {
        self.inner.helper.add_change_listener(self, listener);
    }

    fn add_weak_change_listener(&self, listener: Weak<dyn ChangeListener<T>>) -> Result<()> {
        self.inner.helper.add_weak_change_listener(self, listener)
    }

    fn remove_change_listener(&self, listener: &dyn ChangeListener<T>) -> bool {
        self.inner.helper.remove_change_listener(listener)
    }
}

impl<T: PropertyValue> fmt::Display for Mapped<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.is_valid(), self.inner.value.try_borrow()) {
            (true, Ok(value)) => match &*value {
                Some(value) => write!(f, "Mapped [value: {:?}]", value),
                None => f.write_str("Mapped [invalid]"),
            },
            _ => f.write_str("Mapped [invalid]"),
        }
    }
}
