//! Observable lists.

use crate::change::ListChange;
use crate::config::NotifyConfig;
use crate::listener::Handle;
use crate::observable::{ObservableIdentity, PropertyValue};
use crate::sink::{invoke_isolated, ExceptionSink};
use crate::slot::NotificationSlot;
use ripple_core::{Error, Result};
use std::any::Any;
use std::cell::RefCell;
use std::fmt;
use std::ops::Range;
use std::rc::{Rc, Weak};

/// Notified whenever a list was modified.
pub trait ListInvalidationListener<E> {
    fn invalidated(&self, list: &ObservableList<E>);

    fn same_listener(&self, other: &dyn ListInvalidationListener<E>) -> bool {
        std::ptr::addr_eq(self as *const Self, other as *const dyn ListInvalidationListener<E>)
    }
}

/// Notified with a description of every list modification.
pub trait ListChangeListener<E> {
    fn on_changed(&self, list: &ObservableList<E>, change: &ListChange<E>);

    fn same_listener(&self, other: &dyn ListChangeListener<E>) -> bool {
        std::ptr::addr_eq(self as *const Self, other as *const dyn ListChangeListener<E>)
    }

    fn as_any(&self) -> Option<&dyn Any> {
        None
    }
}

impl<E, F> ListInvalidationListener<E> for F
where
    F: Fn(&ObservableList<E>),
{
    fn invalidated(&self, list: &ObservableList<E>) {
        self(list)
    }
}

impl<E, F> ListChangeListener<E> for F
where
    F: Fn(&ObservableList<E>, &ListChange<E>),
{
    fn on_changed(&self, list: &ObservableList<E>, change: &ListChange<E>) {
        self(list, change)
    }
}

type ListSlot<E> = NotificationSlot<dyn ListInvalidationListener<E>, dyn ListChangeListener<E>>;

/// A shared list that reports every modification as a [`ListChange`].
///
/// # Example
///
/// ```rust
/// use ripple_reactive::ObservableList;
/// use std::cell::RefCell;
/// use std::rc::Rc;
///
/// let list = ObservableList::from_vec(vec![1, 2, 3]);
/// let changes = Rc::new(RefCell::new(Vec::new()));
/// let c = changes.clone();
/// let _listener = list.on_changed(move |_, change| c.borrow_mut().push(change.clone()));
///
/// list.remove(1).unwrap();
/// assert_eq!(list.to_vec(), vec![1, 3]);
/// assert_eq!(changes.borrow()[0].removed, vec![2]);
/// ```
pub struct ObservableList<E> {
    inner: Rc<ListInner<E>>,
}

struct ListInner<E> {
    items: RefCell<Vec<E>>,
    slot: ListSlot<E>,
    sink: Rc<dyn ExceptionSink>,
}

impl<E> Clone for ObservableList<E> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<E: PropertyValue> Default for ObservableList<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: PropertyValue> ObservableList<E> {
    pub fn new() -> Self {
        Self::from_vec(Vec::new())
    }

    pub fn from_vec(items: Vec<E>) -> Self {
        Self::with_config(items, &NotifyConfig::default())
    }

    pub fn with_config(items: Vec<E>, config: &NotifyConfig) -> Self {
        Self {
            inner: Rc::new(ListInner {
                items: RefCell::new(items),
                slot: NotificationSlot::new(),
                sink: config.exception_sink(),
            }),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.inner.items.borrow().len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, index: usize) -> Option<E> {
        self.inner.items.borrow().get(index).cloned()
    }

    pub fn to_vec(&self) -> Vec<E> {
        self.inner.items.borrow().clone()
    }

    pub fn push(&self, element: E) {
        let len = self.len();
        self.splice(len..len, vec![element]);
    }

    pub fn insert(&self, index: usize, element: E) -> Result<()> {
        self.replace_range(index..index, vec![element])
    }

    pub fn remove(&self, index: usize) -> Result<E> {
        let len = self.len();
        if index >= len {
            return Err(Error::index_out_of_range(index, len));
        }
        let mut removed = self.splice(index..index + 1, Vec::new());
        removed.pop().ok_or(Error::index_out_of_range(index, len))
    }

    /// Replaces the element at `index`, returning the previous one.
    pub fn set(&self, index: usize, element: E) -> Result<E> {
        let len = self.len();
        if index >= len {
            return Err(Error::index_out_of_range(index, len));
        }
        let mut removed = self.splice(index..index + 1, vec![element]);
        removed.pop().ok_or(Error::index_out_of_range(index, len))
    }

    /// Replaces the whole content.
    pub fn set_all(&self, items: Vec<E>) {
        let len = self.len();
        self.splice(0..len, items);
    }

    pub fn clear(&self) {
        self.set_all(Vec::new());
    }

    /// Replaces the elements in `range` with `items`.
    ///
    /// Listeners get exactly one [`ListChange`] unless nothing changed.
    pub fn replace_range(&self, range: Range<usize>, items: Vec<E>) -> Result<()> {
        let len = self.len();
        if range.start > range.end {
            return Err(Error::index_out_of_range(range.start, range.end));
        }
        if range.end > len {
            return Err(Error::index_out_of_range(range.end, len));
        }
        self.splice(range, items);
        Ok(())
    }

    /// Applies a checked replacement and notifies listeners.
    fn splice(&self, range: Range<usize>, items: Vec<E>) -> Vec<E> {
        let from = range.start;
        let removed: Vec<E> = self
            .inner
            .items
            .borrow_mut()
            .splice(range, items.iter().cloned())
            .collect();
        let change = ListChange::new(from, removed, items);
        if !change.is_empty() {
            self.fire(&change);
        }
        change.removed
    }

    fn fire(&self, change: &ListChange<E>) {
        let pass = self.inner.slot.begin_pass();
        let sink = &*self.inner.sink;
        for i in 0..pass.invalidation_extent() {
            if let Some(listener) = pass.invalidation_listener(i) {
                invoke_isolated(sink, || listener.invalidated(self));
            }
        }
        for i in 0..pass.change_extent() {
            if let Some(listener) = pass.change_listener(i) {
                invoke_isolated(sink, || listener.on_changed(self, change));
            }
        }
    }

    pub fn add_invalidation_listener(&self, listener: Rc<dyn ListInvalidationListener<E>>) {
        self.inner.slot.add_invalidation_listener(Handle::Strong(listener));
    }

    pub fn add_weak_invalidation_listener(&self, listener: Weak<dyn ListInvalidationListener<E>>) -> Result<()> {
        if listener.strong_count() == 0 {
            return Err(Error::null_argument("listener"));
        }
        self.inner.slot.add_invalidation_listener(Handle::Weak(listener));
        Ok(())
    }

    pub fn remove_invalidation_listener(&self, listener: &dyn ListInvalidationListener<E>) -> bool {
        self.inner
            .slot
            .remove_invalidation_listener(|handle| handle.get().is_some_and(|l| l.same_listener(listener)))
    }

    pub fn add_change_listener(&self, listener: Rc<dyn ListChangeListener<E>>) {
        self.inner.slot.add_change_listener(Handle::Strong(listener));
    }

    pub fn add_weak_change_listener(&self, listener: Weak<dyn ListChangeListener<E>>) -> Result<()> {
        if listener.strong_count() == 0 {
            return Err(Error::null_argument("listener"));
        }
        self.inner.slot.add_change_listener(Handle::Weak(listener));
        Ok(())
    }

    pub fn remove_change_listener(&self, listener: &dyn ListChangeListener<E>) -> bool {
        self.inner
            .slot
            .remove_change_listener(|handle| handle.get().is_some_and(|l| l.same_listener(listener)))
    }

    /// Registers a closure as a change listener and returns its handle.
    pub fn on_changed<F>(&self, f: F) -> Rc<dyn ListChangeListener<E>>
    where
        F: Fn(&ObservableList<E>, &ListChange<E>) + 'static,
    {
        let listener: Rc<dyn ListChangeListener<E>> = Rc::new(f);
        self.add_change_listener(Rc::clone(&listener));
        listener
    }

    pub fn invalidation_listener_count(&self) -> usize {
        self.inner.slot.invalidation_listeners_len()
    }

    pub fn change_listener_count(&self) -> usize {
        self.inner.slot.change_listeners_len()
    }

    pub fn downgrade(&self) -> WeakList<E> {
        WeakList(Rc::downgrade(&self.inner))
    }

    pub fn identity(&self) -> ObservableIdentity {
        ObservableIdentity::new(&self.inner)
    }

    #[inline]
    pub fn ptr_eq(&self, other: &ObservableList<E>) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl<E: PropertyValue> fmt::Display for ObservableList<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.inner.items.try_borrow() {
            Ok(items) => write!(f, "ObservableList {:?}", *items),
            Err(_) => f.write_str("ObservableList <updating>"),
        }
    }
}

impl<E: PropertyValue> fmt::Debug for ObservableList<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

/// A non-owning handle to an [`ObservableList`].
pub struct WeakList<E>(Weak<ListInner<E>>);

impl<E> WeakList<E> {
    pub fn upgrade(&self) -> Option<ObservableList<E>> {
        self.0.upgrade().map(|inner| ObservableList { inner })
    }
}

impl<E> Clone for WeakList<E> {
    fn clone(&self) -> Self {
        Self(Weak::clone(&self.0))
    }
}
