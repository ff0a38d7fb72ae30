//! Error types for Ripple.

use alloc::string::String;
use core::fmt;

/// Result type alias for Ripple operations.
pub type Result<T> = core::result::Result<T, Error>;

/// Error types for listener registries, notification and bindings.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Error {
    /// A required listener or endpoint was missing (for example a weak
    /// listener whose owner is already gone).
    NullArgument {
        name: &'static str,
    },
    /// Index outside the occupied range of a slot array or registry.
    IndexOutOfRange {
        index: usize,
        len: usize,
    },
    /// An observable was bound to itself.
    SelfBinding {
        observable: String,
    },
    /// Unbalanced lock/unlock on a listener registry.
    ReentrancyMisuse {
        message: String,
    },
    /// Change listeners kept modifying the value without settling.
    ///
    /// This error is fatal: it is raised as a panic payload and unwinds to
    /// the caller of the outermost mutation.
    NonConvergence {
        observable: String,
        value: String,
        original: String,
    },
    /// A write was attempted on a value that is bound to another observable.
    BoundValue {
        observable: String,
    },
    /// A converter could not translate a value between binding endpoints.
    Conversion {
        message: String,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::NullArgument { name } => {
                write!(f, "Missing required argument: {}", name)
            }
            Error::IndexOutOfRange { index, len } => {
                write!(f, "Index {} out of range for length {}", index, len)
            }
            Error::SelfBinding { observable } => {
                write!(f, "Cannot bind observable to itself: {}", observable)
            }
            Error::ReentrancyMisuse { message } => {
                write!(f, "Reentrancy misuse: {}", message)
            }
            Error::NonConvergence {
                observable,
                value,
                original,
            } => {
                write!(
                    f,
                    "Non-convergent change listeners on {}: value is {} after nested changes, original value was {}",
                    observable, value, original
                )
            }
            Error::BoundValue { observable } => {
                write!(f, "A bound value cannot be set: {}", observable)
            }
            Error::Conversion { message } => {
                write!(f, "Conversion failed: {}", message)
            }
        }
    }
}

impl Error {
    /// Creates a null argument error.
    pub fn null_argument(name: &'static str) -> Self {
        Error::NullArgument { name }
    }

    /// Creates an index out of range error.
    pub fn index_out_of_range(index: usize, len: usize) -> Self {
        Error::IndexOutOfRange { index, len }
    }

    /// Creates a self binding error.
    pub fn self_binding(observable: impl Into<String>) -> Self {
        Error::SelfBinding {
            observable: observable.into(),
        }
    }

    /// Creates a reentrancy misuse error.
    pub fn reentrancy_misuse(message: impl Into<String>) -> Self {
        Error::ReentrancyMisuse {
            message: message.into(),
        }
    }

    /// Creates a non-convergence error.
    pub fn non_convergence(
        observable: impl Into<String>,
        value: impl Into<String>,
        original: impl Into<String>,
    ) -> Self {
        Error::NonConvergence {
            observable: observable.into(),
            value: value.into(),
            original: original.into(),
        }
    }

    /// Creates a bound value error.
    pub fn bound_value(observable: impl Into<String>) -> Self {
        Error::BoundValue {
            observable: observable.into(),
        }
    }

    /// Creates a conversion error.
    pub fn conversion(message: impl Into<String>) -> Self {
        Error::Conversion {
            message: message.into(),
        }
    }

    /// Returns true for errors that must not be caught by listener isolation.
    #[inline]
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::NonConvergence { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::ToString;

    #[test]
    fn test_error_display() {
        let err = Error::index_out_of_range(5, 3);
        assert_eq!(err.to_string(), "Index 5 out of range for length 3");

        let err = Error::null_argument("listener");
        assert!(err.to_string().contains("listener"));

        let err = Error::self_binding("Property [value: 1]");
        assert!(err.to_string().contains("Property [value: 1]"));
    }

    #[test]
    fn test_non_convergence_display() {
        let err = Error::non_convergence("Property [name: x, value: 3]", "3", "0");
        let msg = err.to_string();
        assert!(msg.contains("Property [name: x, value: 3]"));
        assert!(msg.contains("value is 3"));
        assert!(msg.contains("original value was 0"));
    }

    #[test]
    fn test_is_fatal() {
        assert!(Error::non_convergence("p", "1", "0").is_fatal());
        assert!(!Error::reentrancy_misuse("unlock without lock").is_fatal());
        assert!(!Error::bound_value("p").is_fatal());
    }

    #[test]
    fn test_error_constructors() {
        let err = Error::conversion("invalid digit");
        match err {
            Error::Conversion { message } => assert_eq!(message, "invalid digit"),
            _ => panic!("Wrong error type"),
        }
    }
}
