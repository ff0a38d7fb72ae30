//! Ripple Binding - Bidirectional bindings between observables.
//!
//! Two properties bound bidirectionally stay equal (or converted into each
//! other); two lists bound by content stay element-wise identical. Bindings
//! hold their endpoints weakly and unregister themselves once either side
//! is dropped.
//!
//! # Example
//!
//! ```rust
//! use ripple_binding::{bind_bidirectional_with, FromStrConverter};
//! use ripple_reactive::Property;
//!
//! let text = Property::new(String::new());
//! let size = Property::new(12);
//! bind_bidirectional_with(&text, &size, FromStrConverter::<i32>::new()).unwrap();
//! assert_eq!(text.get(), "12");
//!
//! text.set("14".to_string());
//! assert_eq!(size.get(), 14);
//! ```

pub mod bidirectional;
pub mod content;
pub mod convert;
pub mod group;
pub mod pair;

pub use bidirectional::{bind_bidirectional, bind_bidirectional_with, unbind_bidirectional};
pub use content::{bind_content_bidirectional, unbind_content_bidirectional};
pub use convert::{Converter, FnConverter, FromStrConverter, Identity};
pub use group::BindingGroup;
pub use pair::{BidirectionalBinding, ContentBinding, EndpointPair};

pub use ripple_core::{Error, Result};
