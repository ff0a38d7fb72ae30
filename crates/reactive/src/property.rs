//! Writable observable values.

use crate::config::NotifyConfig;
use crate::helper::ListenerHelper;
use crate::listener::{ChangeListener, InvalidationListener};
use crate::observable::{ObservableIdentity, ObservableValue, PropertyValue};
use crate::sink::ExceptionSink;
use ripple_core::{Error, Result};
use std::any::Any;
use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

/// A shared, writable observable value.
///
/// Cloning a `Property` yields another handle to the same value.
///
/// # Example
///
/// ```rust
/// use ripple_reactive::Property;
/// use std::cell::Cell;
/// use std::rc::Rc;
///
/// let width = Property::named("width", 10);
/// let seen = Rc::new(Cell::new(0));
/// let s = seen.clone();
/// let _listener = width.on_changed(move |_, _, new| s.set(*new));
///
/// width.set(20);
/// assert_eq!(seen.get(), 20);
/// assert_eq!(width.to_string(), "Property [name: width, value: 20]");
/// ```
pub struct Property<T: PropertyValue> {
    inner: Rc<PropertyInner<T>>,
}

struct PropertyInner<T: PropertyValue> {
    name: Option<String>,
    value: RefCell<T>,
    helper: ListenerHelper<T>,
    binding: RefCell<Option<OneWayBinding<T>>>,
}

/// A source this property follows, and the listener it follows it with.
struct OneWayBinding<T> {
    source: Box<dyn ObservableValue<T>>,
    listener: Rc<dyn InvalidationListener<T>>,
}

impl<T: PropertyValue> Clone for Property<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: PropertyValue + Default> Default for Property<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: PropertyValue> Property<T> {
    /// Creates an unnamed property with default notification settings.
    pub fn new(value: T) -> Self {
        Self::builder(value).build()
    }

    /// Creates a named property.
    pub fn named(name: impl Into<String>, value: T) -> Self {
        Self::builder(value).name(name).build()
    }

    pub fn builder(value: T) -> PropertyBuilder<T> {
        PropertyBuilder::new(value)
    }

    pub fn name(&self) -> Option<&str> {
        self.inner.name.as_deref()
    }

    /// Returns the current value.
    pub fn get(&self) -> T {
        self.inner.value.borrow().clone()
    }

    /// Sets the value, notifying listeners if it changed.
    ///
    /// # Panics
    ///
    /// Panics if the property is bound; use [`Property::try_set`] to get an
    /// error instead.
    pub fn set(&self, value: T) {
        if let Err(err) = self.try_set(value) {
            panic!("{}", err);
        }
    }

    /// Sets the value, failing with `BoundValue` if the property is bound.
    pub fn try_set(&self, value: T) -> Result<()> {
        if self.is_bound() {
            return Err(Error::bound_value(self.to_string()));
        }
        self.store(value);
        Ok(())
    }

    fn store(&self, value: T) {
        let old = {
            let mut current = self.inner.value.borrow_mut();
            if *current == value {
                return;
            }
            std::mem::replace(&mut *current, value)
        };
        self.inner.helper.fire_value_changed(self, old);
    }

    /// Makes this property follow `source`.
    ///
    /// The source only holds a weak listener, so a bound property can still
    /// be dropped. Binding again replaces the previous source.
    pub fn bind<O>(&self, source: &O) -> Result<()>
    where
        O: ObservableValue<T> + Clone + 'static,
    {
        if let Some(property) = (source as &dyn Any).downcast_ref::<Property<T>>() {
            if self.ptr_eq(property) {
                return Err(Error::self_binding(self.to_string()));
            }
        }
        self.unbind();

        let target = self.downgrade();
        let listener: Rc<dyn InvalidationListener<T>> = Rc::new(move |observable: &dyn ObservableValue<T>| {
            if let Some(target) = target.upgrade() {
                target.store(observable.value());
            }
        });
        source.add_weak_invalidation_listener(Rc::downgrade(&listener))?;
        *self.inner.binding.borrow_mut() = Some(OneWayBinding {
            source: Box::new(source.clone()),
            listener,
        });
        tracing::debug!(property = %self, "bound property to source");

        self.store(source.value());
        Ok(())
    }

    /// Stops following the bound source, if any.
    pub fn unbind(&self) {
        let binding = self.inner.binding.borrow_mut().take();
        if let Some(binding) = binding {
            binding.source.remove_invalidation_listener(&*binding.listener);
        }
    }

    pub fn is_bound(&self) -> bool {
        self.inner.binding.borrow().is_some()
    }

    /// Registers a closure as an invalidation listener.
    ///
    /// The returned handle removes it again via
    /// [`ObservableValue::remove_invalidation_listener`].
    pub fn on_invalidated<F>(&self, f: F) -> Rc<dyn InvalidationListener<T>>
    where
        F: Fn(&dyn ObservableValue<T>) + 'static,
    {
        let listener: Rc<dyn InvalidationListener<T>> = Rc::new(f);
        self.inner.helper.add_invalidation_listener(Rc::clone(&listener));
        listener
    }

    /// Registers a closure as a change listener.
    pub fn on_changed<F>(&self, f: F) -> Rc<dyn ChangeListener<T>>
    where
        F: Fn(&dyn ObservableValue<T>, &T, &T) + 'static,
    {
        let listener: Rc<dyn ChangeListener<T>> = Rc::new(f);
        self.inner.helper.add_change_listener(Rc::clone(&listener));
        listener
    }

    pub fn invalidation_listener_count(&self) -> usize {
        self.inner.helper.invalidation_listeners_len()
    }

    pub fn change_listener_count(&self) -> usize {
        self.inner.helper.change_listeners_len()
    }

    /// Returns a handle that does not keep the property alive.
    pub fn downgrade(&self) -> WeakProperty<T> {
        WeakProperty(Rc::downgrade(&self.inner))
    }

    pub fn identity(&self) -> ObservableIdentity {
        ObservableIdentity::new(&self.inner)
    }

    /// Returns true if both handles refer to the same property.
    #[inline]
    pub fn ptr_eq(&self, other: &Property<T>) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl<T: PropertyValue> ObservableValue<T> for Property<T> {
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
        self.inner.helper.add_change_listener(listener);
    }

    fn add_weak_change_listener(&self, listener: Weak<dyn ChangeListener<T>>) -> Result<()> {
        self.inner.helper.add_weak_change_listener(listener)
    }

    fn remove_change_listener(&self, listener: &dyn ChangeListener<T>) -> bool {
        self.inner.helper.remove_change_listener(listener)
    }
}

impl<T: PropertyValue> fmt::Display for Property<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Property [")?;
        if let Some(name) = self.name() {
            write!(f, "name: {}, ", name)?;
        }
        match self.inner.value.try_borrow() {
            Ok(value) => write!(f, "value: {:?}", *value)?,
            Err(_) => f.write_str("value: <updating>")?,
        }
        if self.is_bound() {
            f.write_str(", bound")?;
        }
        f.write_str("]")
    }
}

impl<T: PropertyValue> fmt::Debug for Property<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

/// A non-owning handle to a [`Property`].
pub struct WeakProperty<T: PropertyValue>(Weak<PropertyInner<T>>);

impl<T: PropertyValue> WeakProperty<T> {
    pub fn upgrade(&self) -> Option<Property<T>> {
        self.0.upgrade().map(|inner| Property { inner })
    }
}

impl<T: PropertyValue> Clone for WeakProperty<T> {
    fn clone(&self) -> Self {
        Self(Weak::clone(&self.0))
    }
}

/// Builder for [`Property`].
pub struct PropertyBuilder<T: PropertyValue> {
    value: T,
    name: Option<String>,
    config: NotifyConfig,
}

impl<T: PropertyValue> PropertyBuilder<T> {
    pub fn new(value: T) -> Self {
        Self {
            value,
            name: None,
            config: NotifyConfig::default(),
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the sink receiving listener panics.
    pub fn sink<S: ExceptionSink + 'static>(mut self, sink: S) -> Self {
        self.config = self.config.sink(sink);
        self
    }

    /// Sets the nesting depth at which listeners count as non-convergent.
    pub fn max_nesting_depth(mut self, depth: usize) -> Self {
        self.config = self.config.max_nesting_depth(depth);
        self
    }

    /// Replaces the whole notification configuration.
    pub fn config(mut self, config: NotifyConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> Property<T> {
        Property {
            inner: Rc::new(PropertyInner {
                name: self.name,
                value: RefCell::new(self.value),
                helper: ListenerHelper::new(&self.config),
                binding: RefCell::new(None),
            }),
        }
    }
}
