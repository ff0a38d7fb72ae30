//! Bidirectional value bindings.
//!
//! Each side of a binding gets one change listener that writes the other
//! side. The listeners only hold the endpoints weakly, so a binding never
//! keeps a property alive; a listener whose partner is gone removes itself
//! the next time it runs.

use crate::convert::{Converter, Identity};
use crate::pair::BidirectionalBinding;
use ripple_core::{Error, Result};
use ripple_reactive::{ChangeListener, ObservableValue, Property, PropertyValue, WeakProperty};
use std::any::Any;
use std::cell::Cell;
use std::rc::Rc;

/// Keeps `a` and `b` equal.
///
/// `a` takes `b`'s value first. Binding an already bound pair again
/// replaces the previous binding.
///
/// # Example
///
/// ```rust
/// use ripple_binding::bind_bidirectional;
/// use ripple_reactive::Property;
///
/// let a = Property::new(1);
/// let b = Property::new(2);
/// bind_bidirectional(&a, &b).unwrap();
/// assert_eq!(a.get(), 2);
///
/// a.set(5);
/// assert_eq!(b.get(), 5);
/// ```
pub fn bind_bidirectional<T: PropertyValue>(a: &Property<T>, b: &Property<T>) -> Result<BidirectionalBinding> {
    bind_bidirectional_with(a, b, Identity)
}

/// Keeps `a` and `b` in sync through `converter`.
pub fn bind_bidirectional_with<A, B, C>(a: &Property<A>, b: &Property<B>, converter: C) -> Result<BidirectionalBinding>
where
    A: PropertyValue,
    B: PropertyValue,
    C: Converter<A, B> + 'static,
{
    let record = BidirectionalBinding::new(a.identity(), b.identity());
    if record.pair().is_self_pair() {
        return Err(Error::self_binding(a.to_string()));
    }
    if a.is_bound() {
        return Err(Error::bound_value(a.to_string()));
    }
    unbind_bidirectional(a, b);

    let initial = converter.to_left(&b.get())?;
    a.try_set(initial)?;

    let core = Rc::new(BindingCore {
        record: record.clone(),
        left: a.downgrade(),
        right: b.downgrade(),
        converter: Box::new(converter),
        updating: Cell::new(false),
    });
    a.add_change_listener(Rc::new(LeftListener(Rc::clone(&core))));
    b.add_change_listener(Rc::new(RightListener(core)));
    tracing::debug!(left = %a, right = %b, "bound bidirectionally");
    Ok(record)
}

/// Removes the binding between `a` and `b`, in either order.
///
/// Returns true if a listener was removed from either side.
pub fn unbind_bidirectional<A, B>(a: &Property<A>, b: &Property<B>) -> bool
where
    A: PropertyValue,
    B: PropertyValue,
{
    let probe = BidirectionalBinding::new(a.identity(), b.identity());
    let left = a.remove_change_listener(&probe);
    let right = b.remove_change_listener(&probe);
    left || right
}

struct BindingCore<A: PropertyValue, B: PropertyValue> {
    record: BidirectionalBinding,
    left: WeakProperty<A>,
    right: WeakProperty<B>,
    converter: Box<dyn Converter<A, B>>,
    /// Set while this binding writes one side, so the echo is ignored.
    updating: Cell<bool>,
}

impl<A: PropertyValue, B: PropertyValue> BindingCore<A, B> {
    fn left_changed(&self, value: &A) {
        if self.updating.get() {
            return;
        }
        let (Some(left), Some(right)) = (self.left.upgrade(), self.right.upgrade()) else {
            tracing::debug!("bidirectional binding endpoint dropped; unregistering");
            self.dispose();
            return;
        };
        if right.is_bound() {
            tracing::debug!(target_property = %right, "bidirectional binding target is bound; discarding");
            self.dispose();
            return;
        }
        match self.converter.to_right(value) {
            Ok(converted) => self.write(|| right.try_set(converted)),
            Err(err) => tracing::warn!(%err, "bidirectional binding could not convert value"),
        }
        if left.is_bound() {
            tracing::debug!(source_property = %left, "bidirectional binding source became bound; discarding");
            self.dispose();
        }
    }

    fn right_changed(&self, value: &B) {
        if self.updating.get() {
            return;
        }
        let (Some(left), Some(right)) = (self.left.upgrade(), self.right.upgrade()) else {
            tracing::debug!("bidirectional binding endpoint dropped; unregistering");
            self.dispose();
            return;
        };
        if left.is_bound() {
            tracing::debug!(target_property = %left, "bidirectional binding target is bound; discarding");
            self.dispose();
            return;
        }
        match self.converter.to_left(value) {
            Ok(converted) => self.write(|| left.try_set(converted)),
            Err(err) => tracing::warn!(%err, "bidirectional binding could not convert value"),
        }
        if right.is_bound() {
            tracing::debug!(source_property = %right, "bidirectional binding source became bound; discarding");
            self.dispose();
        }
    }

    fn write<F: FnOnce() -> Result<()>>(&self, write: F) {
        let _guard = UpdatingGuard::enter(&self.updating);
        if let Err(err) = write() {
            tracing::warn!(%err, "bidirectional binding could not update its partner");
        }
    }

    /// Unregisters both listeners from whichever endpoints still exist.
    fn dispose(&self) {
        if let Some(left) = self.left.upgrade() {
            left.remove_change_listener(&self.record);
        }
        if let Some(right) = self.right.upgrade() {
            right.remove_change_listener(&self.record);
        }
    }

    fn same_binding(&self, other: Option<&dyn Any>) -> bool {
        other
            .and_then(|any| any.downcast_ref::<BidirectionalBinding>())
            .is_some_and(|record| *record == self.record)
    }
}

/// Holds a binding's `updating` flag for the duration of a write.
pub(crate) struct UpdatingGuard<'a>(&'a Cell<bool>);

impl<'a> UpdatingGuard<'a> {
    pub(crate) fn enter(flag: &'a Cell<bool>) -> Self {
        flag.set(true);
        Self(flag)
    }
}

impl Drop for UpdatingGuard<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

struct LeftListener<A: PropertyValue, B: PropertyValue>(Rc<BindingCore<A, B>>);

struct RightListener<A: PropertyValue, B: PropertyValue>(Rc<BindingCore<A, B>>);

impl<A: PropertyValue, B: PropertyValue> ChangeListener<A> for LeftListener<A, B> {
    fn changed(&self, _observable: &dyn ObservableValue<A>, _old: &A, new: &A) {
        self.0.left_changed(new);
    }

    fn same_listener(&self, other: &dyn ChangeListener<A>) -> bool {
        self.0.same_binding(other.as_any())
    }

    fn as_any(&self) -> Option<&dyn Any> {
        Some(&self.0.record)
    }
}

impl<A: PropertyValue, B: PropertyValue> ChangeListener<B> for RightListener<A, B> {
    fn changed(&self, _observable: &dyn ObservableValue<B>, _old: &B, new: &B) {
        self.0.right_changed(new);
    }

    fn same_listener(&self, other: &dyn ChangeListener<B>) -> bool {
        self.0.same_binding(other.as_any())
    }

    fn as_any(&self) -> Option<&dyn Any> {
        Some(&self.0.record)
    }
}
