//! Three-state listener slot with pass bookkeeping.
//!
//! Most observables have zero or one listener, so a slot stores nothing, a
//! single entry, or a full [`ListenerRegistry`]. Promotion happens on add,
//! demotion opportunistically once nothing is iterating.

use crate::listener::{Entry, Handle};
use crate::registry::ListenerRegistry;
use std::cell::{Cell, RefCell};
use std::mem;
use std::rc::Rc;

enum SlotState<I: ?Sized, C: ?Sized> {
    Empty,
    Single(Entry<I, C>),
    Many(ListenerRegistry<I, C>),
}

/// Storage shape of a slot, for diagnostics and tests.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SlotKind {
    Empty,
    Single,
    Many,
}

/// Per-observable listener storage.
pub struct NotificationSlot<I: ?Sized, C: ?Sized> {
    state: RefCell<SlotState<I, C>>,
    /// Number of passes currently running, nested ones included
    passes: Cell<usize>,
    /// Partition extents captured by the outermost pass
    extents: Cell<(usize, usize)>,
}

impl<I: ?Sized, C: ?Sized> Default for NotificationSlot<I, C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<I: ?Sized, C: ?Sized> NotificationSlot<I, C> {
    pub fn new() -> Self {
        Self {
            state: RefCell::new(SlotState::Empty),
            passes: Cell::new(0),
            extents: Cell::new((0, 0)),
        }
    }

    /// Returns the current storage shape.
    pub fn kind(&self) -> SlotKind {
        match &*self.state.borrow() {
            SlotState::Empty => SlotKind::Empty,
            SlotState::Single(_) => SlotKind::Single,
            SlotState::Many(_) => SlotKind::Many,
        }
    }

    /// Returns true while at least one pass is running.
    #[inline]
    pub fn is_notifying(&self) -> bool {
        self.passes.get() > 0
    }

    pub fn add_invalidation_listener(&self, handle: Handle<I>) {
        self.add_entry(Entry::Invalidation(handle));
    }

    pub fn add_change_listener(&self, handle: Handle<C>) {
        self.add_entry(Entry::Change(handle));
    }

    fn add_entry(&self, entry: Entry<I, C>) {
        let notifying = self.is_notifying();
        let mut state = self.state.borrow_mut();
        let current = mem::replace(&mut *state, SlotState::Empty);
        *state = match current {
            SlotState::Empty => SlotState::Single(entry),
            SlotState::Single(existing) if !notifying && !existing.is_alive() => {
                SlotState::Single(entry)
            }
            SlotState::Single(existing) => {
                let mut registry = if notifying {
                    ListenerRegistry::new_locked()
                } else {
                    ListenerRegistry::new()
                };
                registry.add_entry(existing);
                registry.add_entry(entry);
                tracing::trace!(locked = notifying, "promoted listener slot to registry");
                SlotState::Many(registry)
            }
            SlotState::Many(mut registry) => {
                registry.add_entry(entry);
                SlotState::Many(registry)
            }
        };
    }

    /// Removes the first invalidation listener matching `predicate`.
    pub fn remove_invalidation_listener<P>(&self, mut predicate: P) -> bool
    where
        P: FnMut(&Handle<I>) -> bool,
    {
        let notifying = self.is_notifying();
        let mut state = self.state.borrow_mut();
        if notifying {
            promote_locked(&mut state);
        }
        let removed = match &mut *state {
            SlotState::Single(Entry::Invalidation(handle)) => predicate(handle),
            SlotState::Many(registry) => registry.remove_invalidation_listener(predicate),
            _ => false,
        };
        if removed {
            settle_after_removal(&mut state, notifying);
        }
        removed
    }

    /// Removes the first change listener matching `predicate`.
    pub fn remove_change_listener<P>(&self, mut predicate: P) -> bool
    where
        P: FnMut(&Handle<C>) -> bool,
    {
        let notifying = self.is_notifying();
        let mut state = self.state.borrow_mut();
        if notifying {
            promote_locked(&mut state);
        }
        let removed = match &mut *state {
            SlotState::Single(Entry::Change(handle)) => predicate(handle),
            SlotState::Many(registry) => registry.remove_change_listener(predicate),
            _ => false,
        };
        if removed {
            settle_after_removal(&mut state, notifying);
        }
        removed
    }

    pub fn invalidation_listeners_len(&self) -> usize {
        match &*self.state.borrow() {
            SlotState::Empty => 0,
            SlotState::Single(Entry::Invalidation(_)) => 1,
            SlotState::Single(Entry::Change(_)) => 0,
            SlotState::Many(registry) => registry.invalidation_listeners_len(),
        }
    }

    pub fn change_listeners_len(&self) -> usize {
        match &*self.state.borrow() {
            SlotState::Empty => 0,
            SlotState::Single(Entry::Invalidation(_)) => 0,
            SlotState::Single(Entry::Change(_)) => 1,
            SlotState::Many(registry) => registry.change_listeners_len(),
        }
    }

    #[inline]
    pub fn total_listeners(&self) -> usize {
        self.invalidation_listeners_len() + self.change_listeners_len()
    }

    #[inline]
    pub fn has_change_listeners(&self) -> bool {
        self.change_listeners_len() > 0
    }

    /// Starts a notification pass.
    ///
    /// The outermost pass locks the registry and snapshots the partition
    /// extents; nested passes reuse that snapshot. The pass ends when the
    /// returned guard is dropped.
    pub fn begin_pass(&self) -> Pass<'_, I, C> {
        if self.passes.get() == 0 {
            let mut state = self.state.borrow_mut();
            let extents = match &mut *state {
                SlotState::Empty => (0, 0),
                SlotState::Single(Entry::Invalidation(_)) => (1, 0),
                SlotState::Single(Entry::Change(_)) => (0, 1),
                SlotState::Many(registry) => {
                    registry.acquire();
                    (registry.invalidation_extent(), registry.change_extent())
                }
            };
            self.extents.set(extents);
        }
        self.passes.set(self.passes.get() + 1);
        let (invalidation_extent, change_extent) = self.extents.get();
        Pass {
            slot: self,
            invalidation_extent,
            change_extent,
        }
    }

    fn end_pass(&self) {
        let passes = self.passes.get().saturating_sub(1);
        self.passes.set(passes);
        if passes == 0 {
            let mut state = self.state.borrow_mut();
            if let SlotState::Many(registry) = &mut *state {
                registry.release();
            }
            demote(&mut state);
        }
    }

    fn invalidation_listener(&self, index: usize) -> Option<Rc<I>> {
        match &*self.state.borrow() {
            SlotState::Single(Entry::Invalidation(handle)) if index == 0 => handle.get(),
            SlotState::Many(registry) => registry.invalidation_listener(index).and_then(Handle::get),
            _ => None,
        }
    }

    fn change_listener(&self, index: usize) -> Option<Rc<C>> {
        match &*self.state.borrow() {
            SlotState::Single(Entry::Change(handle)) if index == 0 => handle.get(),
            SlotState::Many(registry) => registry.change_listener(index).and_then(Handle::get),
            _ => None,
        }
    }
}

/// Turns a single entry into a locked registry so a running pass keeps its
/// index 0 even if the entry is removed.
fn promote_locked<I: ?Sized, C: ?Sized>(state: &mut SlotState<I, C>) {
    if !matches!(state, SlotState::Single(_)) {
        return;
    }
    if let SlotState::Single(existing) = mem::replace(state, SlotState::Empty) {
        let mut registry = ListenerRegistry::new_locked();
        registry.add_entry(existing);
        *state = SlotState::Many(registry);
        tracing::trace!("promoted listener slot to locked registry");
    }
}

fn settle_after_removal<I: ?Sized, C: ?Sized>(state: &mut SlotState<I, C>, notifying: bool) {
    if matches!(state, SlotState::Single(_)) {
        *state = SlotState::Empty;
    } else if !notifying {
        demote(state);
    }
}

fn demote<I: ?Sized, C: ?Sized>(state: &mut SlotState<I, C>) {
    let SlotState::Many(registry) = state else {
        return;
    };
    if registry.is_locked() {
        return;
    }
    if registry.invalidation_extent() + registry.change_extent() == 0 {
        *state = SlotState::Empty;
        tracing::trace!("demoted listener slot to empty");
    } else if let Some(entry) = registry.take_sole_entry() {
        *state = SlotState::Single(entry);
        tracing::trace!("demoted listener slot to single entry");
    }
}

/// A running notification pass over a [`NotificationSlot`].
///
/// Listener lookups go through the slot each time, so entries removed during
/// the pass are skipped and entries added during it stay out of range.
pub struct Pass<'a, I: ?Sized, C: ?Sized> {
    slot: &'a NotificationSlot<I, C>,
    invalidation_extent: usize,
    change_extent: usize,
}

impl<I: ?Sized, C: ?Sized> Pass<'_, I, C> {
    #[inline]
    pub fn invalidation_extent(&self) -> usize {
        self.invalidation_extent
    }

    #[inline]
    pub fn change_extent(&self) -> usize {
        self.change_extent
    }

    /// Returns the live invalidation listener at `index`, if any.
    pub fn invalidation_listener(&self, index: usize) -> Option<Rc<I>> {
        if index < self.invalidation_extent {
            self.slot.invalidation_listener(index)
        } else {
            None
        }
    }

    /// Returns the live change listener at `index`, if any.
    pub fn change_listener(&self, index: usize) -> Option<Rc<C>> {
        if index < self.change_extent {
            self.slot.change_listener(index)
        } else {
            None
        }
    }
}

impl<I: ?Sized, C: ?Sized> Drop for Pass<'_, I, C> {
    fn drop(&mut self) {
        self.slot.end_pass();
    }
}
