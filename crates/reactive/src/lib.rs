//! Ripple Reactive - Observable values and listener notification.
//!
//! This crate implements the notification core every Ripple observable is
//! built on: listener registries, per-instance notification slots, nested
//! change propagation and listener panic isolation.
//!
//! # Core Concepts
//!
//! - `ListenerRegistry`: ordered invalidation and change listeners with a
//!   lock state for iteration-safe mutation
//! - `NotificationSlot`: empty, single-listener or registry storage
//! - `ListenerHelper`: runs (possibly nested) notification passes
//! - `Property`, `Mapped`, `ObservableList`: ready-made observables
//!
//! # Example
//!
//! ```rust
//! use ripple_reactive::{map, Property};
//! use std::cell::RefCell;
//! use std::rc::Rc;
//!
//! let count = Property::new(1);
//! let label = map(&count, |n: &i32| format!("{} items", n));
//!
//! let seen = Rc::new(RefCell::new(Vec::new()));
//! let s = seen.clone();
//! let _listener = count.on_changed(move |_, old, new| s.borrow_mut().push((*old, *new)));
//!
//! count.set(2);
//! assert_eq!(label.get(), "2 items");
//! assert_eq!(*seen.borrow(), vec![(1, 2)]);
//! ```

pub mod change;
pub mod config;
pub mod expression;
pub mod guard;
pub mod helper;
pub mod list;
pub mod listener;
pub mod observable;
pub mod property;
pub mod registry;
pub mod sink;
pub mod slot;

pub use change::ListChange;
pub use config::{NotifyConfig, DEFAULT_MAX_NESTING_DEPTH};
pub use expression::{map, Mapped};
pub use helper::{ListenerHelper, OldValueCachingHelper};
pub use list::{ListChangeListener, ListInvalidationListener, ObservableList, WeakList};
pub use listener::{change_listener, invalidation_listener, ChangeListener, Entry, Handle, InvalidationListener};
pub use observable::{ObservableIdentity, ObservableValue, PropertyValue};
pub use property::{Property, PropertyBuilder, WeakProperty};
pub use registry::{ListenerRegistry, LockState};
pub use sink::{invoke_isolated, ExceptionSink, ListenerPanic, TracingSink};
pub use slot::{NotificationSlot, Pass, SlotKind};

// Re-export the shared error type
pub use ripple_core::{Error, Result};
