//! Ripple Core - Error taxonomy shared by the Ripple notification crates.
//!
//! Every fallible operation in the workspace reports one of the variants of
//! [`Error`]:
//!
//! - `NullArgument`: a required listener or endpoint is missing
//! - `IndexOutOfRange`: slot array or registry misuse
//! - `SelfBinding`: an observable was bound to itself
//! - `ReentrancyMisuse`: unbalanced registry lock/unlock
//! - `NonConvergence`: listeners never settled on a value (fatal)
//! - `BoundValue`: a write to a bound value
//! - `Conversion`: a binding converter rejected a value
//!
//! # Example
//!
//! ```rust
//! use ripple_core::{Error, Result};
//!
//! fn checked(index: usize, len: usize) -> Result<usize> {
//!     if index < len {
//!         Ok(index)
//!     } else {
//!         Err(Error::index_out_of_range(index, len))
//!     }
//! }
//!
//! assert!(checked(1, 2).is_ok());
//! assert_eq!(checked(2, 2), Err(Error::IndexOutOfRange { index: 2, len: 2 }));
//! ```

#![no_std]

extern crate alloc;

mod error;

pub use error::{Error, Result};
