//! Owned collections of bidirectional bindings.

use crate::bidirectional::{bind_bidirectional_with, unbind_bidirectional};
use crate::convert::{Converter, Identity};
use crate::pair::BidirectionalBinding;
use hashbrown::HashMap;
use ripple_core::Result;
use ripple_reactive::{Property, PropertyValue};

type Unbinder = Box<dyn Fn() -> bool>;

/// A set of bidirectional bindings that are released together.
///
/// Dropping the group unbinds every binding it still holds. Entries are
/// keyed by endpoint address rather than record equality, so a record
/// still finds its entry after one of its endpoints is gone, and binding
/// the same two properties twice keeps one entry.
///
/// # Example
///
/// ```rust
/// use ripple_binding::BindingGroup;
/// use ripple_reactive::Property;
///
/// let a = Property::new(0);
/// let b = Property::new(0);
/// {
///     let mut group = BindingGroup::new();
///     group.bind(&a, &b).unwrap();
///     a.set(3);
///     assert_eq!(b.get(), 3);
/// }
/// a.set(4);
/// assert_eq!(b.get(), 3);
/// ```
#[derive(Default)]
pub struct BindingGroup {
    bindings: HashMap<(usize, usize), (BidirectionalBinding, Unbinder)>,
}

impl BindingGroup {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `a` and `b` and keeps the binding in this group.
    pub fn bind<T: PropertyValue>(&mut self, a: &Property<T>, b: &Property<T>) -> Result<BidirectionalBinding> {
        self.bind_with(a, b, Identity)
    }

    /// Binds `a` and `b` through `converter` and keeps the binding.
    pub fn bind_with<A, B, C>(&mut self, a: &Property<A>, b: &Property<B>, converter: C) -> Result<BidirectionalBinding>
    where
        A: PropertyValue,
        B: PropertyValue,
        C: Converter<A, B> + 'static,
    {
        let record = bind_bidirectional_with(a, b, converter)?;
        let (left, right) = (a.downgrade(), b.downgrade());
        let unbind: Unbinder = Box::new(move || match (left.upgrade(), right.upgrade()) {
            (Some(left), Some(right)) => unbind_bidirectional(&left, &right),
            _ => false,
        });
        self.bindings.insert(record.pair().key(), (record.clone(), unbind));
        Ok(record)
    }

    /// Releases one binding. Returns true if the group held it.
    pub fn unbind(&mut self, record: &BidirectionalBinding) -> bool {
        match self.bindings.remove(&record.pair().key()) {
            Some((_, unbind)) => {
                unbind();
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, record: &BidirectionalBinding) -> bool {
        self.bindings.contains_key(&record.pair().key())
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Forgets bindings whose endpoints have been dropped.
    ///
    /// Returns the number of records removed.
    pub fn cleanup(&mut self) -> usize {
        let before = self.bindings.len();
        self.bindings.retain(|_, (record, _)| record.is_alive());
        let removed = before - self.bindings.len();
        if removed > 0 {
            tracing::trace!(removed, "binding group dropped dead records");
        }
        removed
    }

    /// Releases every binding.
    pub fn clear(&mut self) {
        for (_, (_, unbind)) in self.bindings.drain() {
            unbind();
        }
    }
}

impl Drop for BindingGroup {
    fn drop(&mut self) {
        self.clear();
    }
}

impl core::fmt::Debug for BindingGroup {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("BindingGroup")
            .field("bindings", &self.bindings.len())
            .finish()
    }
}
