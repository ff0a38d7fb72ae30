//! Ripple Slots - Growable slot array for listener registries.
//!
//! This crate provides [`SlotArray`], the backing store every listener
//! registry is built on. It keeps per-owner overhead to a single optional
//! allocation plus a length, and lets the owner plug in a compaction step
//! that runs right before the array would otherwise grow.
//!
//! # Example
//!
//! ```rust
//! use ripple_slots::SlotArray;
//!
//! let mut slots = SlotArray::new();
//! slots.add("a");
//! slots.add("b");
//! slots.add("c");
//!
//! // Tombstone the middle slot, then compact it away.
//! slots.set(1, None).unwrap();
//! assert_eq!(slots.index_of(None), Some(1));
//! assert!(slots.remove_if(|slot| slot.is_none()));
//! assert_eq!(slots.get(1).unwrap(), Some(&"c"));
//! ```

#![no_std]

extern crate alloc;

pub mod array;

pub use array::{next_capacity, SlotArray, GROWTH_STEP};
