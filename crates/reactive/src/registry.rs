//! Two-partition listener registry.
//!
//! A `ListenerRegistry` keeps invalidation listeners and change listeners in
//! two [`SlotArray`]s, so invalidation listeners always come first in the
//! logical order. While a notification pass holds the registry locked,
//! removals leave tombstones and nothing is compacted, which keeps every
//! index the pass is iterating over stable.

use crate::listener::{Entry, Handle};
use ripple_core::{Error, Result};
use ripple_slots::SlotArray;

/// Whether a notification pass currently iterates the registry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LockState {
    Unlocked,
    Locked {
        /// Tombstones written into the invalidation partition
        invalidation_tombstones: usize,
        /// Tombstones written into the change partition
        change_tombstones: usize,
    },
}

/// Ordered storage for the listeners of one observable.
pub struct ListenerRegistry<I: ?Sized, C: ?Sized> {
    invalidation: SlotArray<Handle<I>>,
    change: SlotArray<Handle<C>>,
    lock: LockState,
}

impl<I: ?Sized, C: ?Sized> Default for ListenerRegistry<I, C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<I: ?Sized, C: ?Sized> ListenerRegistry<I, C> {
    /// Creates an empty, unlocked registry.
    pub fn new() -> Self {
        Self {
            invalidation: SlotArray::new(),
            change: SlotArray::new(),
            lock: LockState::Unlocked,
        }
    }

    /// Creates an empty registry that is already locked.
    pub(crate) fn new_locked() -> Self {
        let mut registry = Self::new();
        registry.acquire();
        registry
    }

    /// Returns the current lock state.
    #[inline]
    pub fn lock_state(&self) -> LockState {
        self.lock
    }

    /// Returns true while a pass holds the registry.
    #[inline]
    pub fn is_locked(&self) -> bool {
        matches!(self.lock, LockState::Locked { .. })
    }

    /// Locks the registry for iteration.
    pub fn lock(&mut self) -> Result<()> {
        if self.is_locked() {
            return Err(Error::reentrancy_misuse("registry is already locked"));
        }
        self.acquire();
        Ok(())
    }

    /// Unlocks the registry and compacts the tombstones left by the pass.
    ///
    /// Dead weak handles are not reclaimed here.
    pub fn unlock(&mut self) -> Result<()> {
        if !self.is_locked() {
            return Err(Error::reentrancy_misuse("registry is not locked"));
        }
        self.release();
        Ok(())
    }

    pub(crate) fn acquire(&mut self) {
        if !self.is_locked() {
            self.lock = LockState::Locked {
                invalidation_tombstones: 0,
                change_tombstones: 0,
            };
        }
    }

    pub(crate) fn release(&mut self) {
        if let LockState::Locked {
            invalidation_tombstones,
            change_tombstones,
        } = self.lock
        {
            if invalidation_tombstones > 0 {
                self.invalidation.remove_if(|slot| slot.is_none());
            }
            if change_tombstones > 0 {
                self.change.remove_if(|slot| slot.is_none());
            }
            self.lock = LockState::Unlocked;
        }
    }

    /// Appends an invalidation listener.
    pub fn add_invalidation_listener(&mut self, handle: Handle<I>) {
        let locked = self.is_locked();
        self.invalidation
            .add_with(handle, |slots| reclaim_dead(slots, locked));
    }

    /// Appends a change listener.
    pub fn add_change_listener(&mut self, handle: Handle<C>) {
        let locked = self.is_locked();
        self.change.add_with(handle, |slots| reclaim_dead(slots, locked));
    }

    pub(crate) fn add_entry(&mut self, entry: Entry<I, C>) {
        match entry {
            Entry::Invalidation(handle) => self.add_invalidation_listener(handle),
            Entry::Change(handle) => self.add_change_listener(handle),
        }
    }

    /// Removes the first invalidation listener matching `predicate`.
    pub fn remove_invalidation_listener<P>(&mut self, predicate: P) -> bool
    where
        P: FnMut(&Handle<I>) -> bool,
    {
        let locked = self.is_locked();
        let removed = remove_first(&mut self.invalidation, locked, predicate);
        if removed {
            if let LockState::Locked {
                invalidation_tombstones,
                ..
            } = &mut self.lock
            {
                *invalidation_tombstones += 1;
            }
        }
        removed
    }

    /// Removes the first change listener matching `predicate`.
    pub fn remove_change_listener<P>(&mut self, predicate: P) -> bool
    where
        P: FnMut(&Handle<C>) -> bool,
    {
        let locked = self.is_locked();
        let removed = remove_first(&mut self.change, locked, predicate);
        if removed {
            if let LockState::Locked {
                change_tombstones, ..
            } = &mut self.lock
            {
                *change_tombstones += 1;
            }
        }
        removed
    }

    /// Returns the invalidation handle at `index`, `None` for a tombstone or
    /// an index past the end.
    #[inline]
    pub fn invalidation_listener(&self, index: usize) -> Option<&Handle<I>> {
        self.invalidation.get(index).ok().flatten()
    }

    /// Returns the change handle at `index`, `None` for a tombstone or an
    /// index past the end.
    #[inline]
    pub fn change_listener(&self, index: usize) -> Option<&Handle<C>> {
        self.change.get(index).ok().flatten()
    }

    /// Physical length of the invalidation partition, tombstones included.
    #[inline]
    pub fn invalidation_extent(&self) -> usize {
        self.invalidation.len()
    }

    /// Physical length of the change partition, tombstones included.
    #[inline]
    pub fn change_extent(&self) -> usize {
        self.change.len()
    }

    pub fn invalidation_listeners_len(&self) -> usize {
        match self.lock {
            LockState::Locked {
                invalidation_tombstones,
                ..
            } => self.invalidation.len() - invalidation_tombstones,
            LockState::Unlocked => self.invalidation.len(),
        }
    }

    pub fn change_listeners_len(&self) -> usize {
        match self.lock {
            LockState::Locked {
                change_tombstones, ..
            } => self.change.len() - change_tombstones,
            LockState::Unlocked => self.change.len(),
        }
    }

    /// Number of registered listeners in both partitions.
    #[inline]
    pub fn total_listeners(&self) -> usize {
        self.invalidation_listeners_len() + self.change_listeners_len()
    }

    #[inline]
    pub fn has_change_listeners(&self) -> bool {
        self.change_listeners_len() > 0
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.total_listeners() == 0
    }

    /// Iterates live slots in logical order: invalidation listeners first.
    pub fn entries(&self) -> impl Iterator<Item = Entry<I, C>> + '_ {
        let invalidation = self
            .invalidation
            .iter()
            .flatten()
            .map(|handle| Entry::Invalidation(handle.clone()));
        let change = self
            .change
            .iter()
            .flatten()
            .map(|handle| Entry::Change(handle.clone()));
        invalidation.chain(change)
    }

    /// Takes the only entry out of an unlocked registry holding exactly one.
    pub(crate) fn take_sole_entry(&mut self) -> Option<Entry<I, C>> {
        if self.is_locked() || self.invalidation.len() + self.change.len() != 1 {
            return None;
        }
        if self.invalidation.len() == 1 {
            self.invalidation
                .remove(0)
                .ok()
                .flatten()
                .map(Entry::Invalidation)
        } else {
            self.change.remove(0).ok().flatten().map(Entry::Change)
        }
    }
}

/// Compaction hook run before an unlocked partition grows.
fn reclaim_dead<L: ?Sized>(slots: &mut [Option<Handle<L>>], locked: bool) -> usize {
    if locked {
        return slots.len();
    }
    let mut kept = 0;
    for i in 0..slots.len() {
        if slots[i].as_ref().is_some_and(Handle::is_alive) {
            slots.swap(kept, i);
            kept += 1;
        }
    }
    if kept < slots.len() {
        tracing::trace!(reclaimed = slots.len() - kept, "reclaimed dead weak listeners");
    }
    kept
}

fn remove_first<L: ?Sized, P>(slots: &mut SlotArray<Handle<L>>, locked: bool, mut predicate: P) -> bool
where
    P: FnMut(&Handle<L>) -> bool,
{
    if locked {
        let Some(index) = slots.position(|slot| slot.is_some_and(|handle| predicate(handle))) else {
            return false;
        };
        return slots.set(index, None).is_ok();
    }

    let mut found = false;
    slots.remove_if(|slot| match slot {
        None => true,
        Some(handle) if !found && predicate(handle) => {
            found = true;
            true
        }
        Some(handle) => !handle.is_alive(),
    });
    found
}
