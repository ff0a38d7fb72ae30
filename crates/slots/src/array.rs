//! Growable slot array.
//!
//! A `SlotArray` is the per-owner storage value behind a listener registry:
//! an optional boxed slice of `Option<T>` slots plus an occupied count. An
//! empty array owns no allocation at all.
//!
//! `None` inside the occupied region is a tombstone. Tombstones are only
//! written through [`SlotArray::set`]; [`SlotArray::add`] always stores a
//! live element.

use alloc::boxed::Box;
use ripple_core::{Error, Result};

/// Capacity increment used while the array is small; larger arrays double.
pub const GROWTH_STEP: usize = 4;

/// Returns the capacity an array of `capacity` slots grows to when full.
#[inline]
pub fn next_capacity(capacity: usize) -> usize {
    if capacity < GROWTH_STEP {
        capacity + GROWTH_STEP
    } else {
        capacity * 2
    }
}

fn allocate<T>(capacity: usize) -> Box<[Option<T>]> {
    (0..capacity).map(|_| None).collect()
}

/// An amortized-growth, order-preserving array of optional slots.
///
/// Growth is `+4` while the capacity is below 4 and doubling afterwards.
/// When the array is full and non-empty, a caller-supplied compaction hook
/// gets a chance to drop stale entries before a larger allocation is made.
/// Removals shrink the allocation once occupancy falls below a third of the
/// capacity, and removing the last element frees it entirely.
#[derive(Clone, Debug)]
pub struct SlotArray<T> {
    /// Backing slots, `None` when nothing has been allocated
    slots: Option<Box<[Option<T>]>>,
    /// Number of occupied slots (live elements and tombstones)
    len: usize,
}

impl<T> Default for SlotArray<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> SlotArray<T> {
    /// Creates an empty array without allocating.
    pub const fn new() -> Self {
        Self { slots: None, len: 0 }
    }

    /// Returns the number of occupied slots, tombstones included.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns true if no slot is occupied.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the size of the backing allocation.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.slots.as_ref().map_or(0, |slots| slots.len())
    }

    /// Returns true if a backing allocation exists.
    #[inline]
    pub fn is_allocated(&self) -> bool {
        self.slots.is_some()
    }

    /// Appends an element without compaction.
    pub fn add(&mut self, element: T) {
        self.add_with(element, |slots| slots.len());
    }

    /// Appends an element.
    ///
    /// If the array is full and was non-empty, `compact` is called with the
    /// occupied slots first. It must move the surviving slots, in order, to the
    /// front and return their number; everything after the survivors is
    /// cleared. The array only grows if compaction freed no room.
    pub fn add_with<F>(&mut self, element: T, compact: F)
    where
        F: FnOnce(&mut [Option<T>]) -> usize,
    {
        let capacity = self.capacity();
        if self.len == capacity {
            if let Some(slots) = self.slots.as_mut() {
                let len = self.len;
                let survivors = compact(&mut slots[..len]).min(len);
                for slot in &mut slots[survivors..len] {
                    *slot = None;
                }
                self.len = survivors;
            }
            if self.len == capacity {
                self.reallocate(next_capacity(capacity));
            }
        }

        if let Some(slots) = self.slots.as_mut() {
            slots[self.len] = Some(element);
            self.len += 1;
        }
    }

    /// Returns the element at `index`, or `None` for a tombstone.
    pub fn get(&self, index: usize) -> Result<Option<&T>> {
        self.check_index(index)?;
        Ok(self
            .slots
            .as_ref()
            .and_then(|slots| slots[index].as_ref()))
    }

    /// Replaces the slot at `index`, returning its previous content.
    ///
    /// Passing `None` leaves a tombstone in place.
    pub fn set(&mut self, index: usize, element: Option<T>) -> Result<Option<T>> {
        self.check_index(index)?;
        match self.slots.as_mut() {
            Some(slots) => Ok(core::mem::replace(&mut slots[index], element)),
            None => Err(Error::index_out_of_range(index, self.len)),
        }
    }

    /// Removes the slot at `index`, shifting later slots down.
    pub fn remove(&mut self, index: usize) -> Result<Option<T>> {
        self.check_index(index)?;
        let len = self.len;
        let removed = match self.slots.as_mut() {
            Some(slots) => {
                let removed = slots[index].take();
                slots[index..len].rotate_left(1);
                removed
            }
            None => return Err(Error::index_out_of_range(index, len)),
        };
        self.len -= 1;
        self.shrink_if_sparse();
        Ok(removed)
    }

    /// Removes every slot matching `predicate`, keeping survivors in order.
    ///
    /// Returns true if anything was removed.
    pub fn remove_if<P>(&mut self, mut predicate: P) -> bool
    where
        P: FnMut(Option<&T>) -> bool,
    {
        let len = self.len;
        let Some(slots) = self.slots.as_mut() else {
            return false;
        };

        let mut kept = 0;
        for i in 0..len {
            if predicate(slots[i].as_ref()) {
                slots[i] = None;
            } else {
                if kept != i {
                    slots.swap(kept, i);
                }
                kept += 1;
            }
        }

        if kept == len {
            return false;
        }
        self.len = kept;
        self.shrink_if_sparse();
        true
    }

    /// Returns the index of the first slot matching `predicate`.
    pub fn position<P>(&self, mut predicate: P) -> Option<usize>
    where
        P: FnMut(Option<&T>) -> bool,
    {
        self.iter().position(|slot| predicate(slot))
    }

    /// Returns the occupied slots.
    #[inline]
    pub fn as_slice(&self) -> &[Option<T>] {
        match self.slots.as_deref() {
            Some(slots) => &slots[..self.len],
            None => &[],
        }
    }

    /// Iterates the occupied slots in order; tombstones yield `None`.
    pub fn iter(&self) -> impl Iterator<Item = Option<&T>> + '_ {
        self.as_slice().iter().map(Option::as_ref)
    }

    /// Drops every slot and frees the allocation.
    pub fn clear(&mut self) {
        self.slots = None;
        self.len = 0;
    }

    #[inline]
    fn check_index(&self, index: usize) -> Result<()> {
        if index < self.len {
            Ok(())
        } else {
            Err(Error::index_out_of_range(index, self.len))
        }
    }

    fn shrink_if_sparse(&mut self) {
        if self.len == 0 {
            self.slots = None;
        } else if self.len * 3 < self.capacity() {
            self.reallocate(self.len);
        }
    }

    fn reallocate(&mut self, capacity: usize) {
        let mut fresh = allocate(capacity);
        if let Some(old) = self.slots.as_mut() {
            let len = self.len.min(capacity);
            for (dst, src) in fresh.iter_mut().zip(old[..len].iter_mut()) {
                *dst = src.take();
            }
        }
        self.slots = Some(fresh);
    }
}

impl<T: PartialEq> SlotArray<T> {
    /// Returns the index of the first slot equal to `element`.
    ///
    /// `None` searches for a tombstone.
    pub fn index_of(&self, element: Option<&T>) -> Option<usize> {
        self.position(|slot| slot == element)
    }
}
