//! Value converters for heterogeneous bindings.

use ripple_core::{Error, Result};
use std::fmt::Display;
use std::marker::PhantomData;
use std::str::FromStr;

/// Translates values between the two sides of a binding.
pub trait Converter<A, B> {
    /// Converts a left-hand value for the right-hand side.
    fn to_right(&self, left: &A) -> Result<B>;

    /// Converts a right-hand value for the left-hand side.
    fn to_left(&self, right: &B) -> Result<A>;
}

/// Passes values through unchanged.
#[derive(Clone, Copy, Debug, Default)]
pub struct Identity;

impl<T: Clone> Converter<T, T> for Identity {
    fn to_right(&self, left: &T) -> Result<T> {
        Ok(left.clone())
    }

    fn to_left(&self, right: &T) -> Result<T> {
        Ok(right.clone())
    }
}

/// Binds a `String` to any type that parses from and displays as text.
///
/// # Example
///
/// ```rust
/// use ripple_binding::{Converter, FromStrConverter};
///
/// let converter = FromStrConverter::<i32>::new();
/// assert_eq!(converter.to_right(&"42".to_string()).unwrap(), 42);
/// assert_eq!(converter.to_left(&7).unwrap(), "7");
/// assert!(converter.to_right(&"x".to_string()).is_err());
/// ```
pub struct FromStrConverter<T> {
    _marker: PhantomData<fn() -> T>,
}

impl<T> FromStrConverter<T> {
    pub fn new() -> Self {
        Self { _marker: PhantomData }
    }
}

impl<T> Default for FromStrConverter<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Converter<String, T> for FromStrConverter<T>
where
    T: FromStr + Display,
    T::Err: Display,
{
    fn to_right(&self, left: &String) -> Result<T> {
        left.trim()
            .parse()
            .map_err(|err| Error::conversion(format!("cannot parse {:?}: {}", left, err)))
    }

    fn to_left(&self, right: &T) -> Result<String> {
        Ok(right.to_string())
    }
}

/// A converter built from two closures.
pub struct FnConverter<F, G> {
    forward: F,
    backward: G,
}

impl<F, G> FnConverter<F, G> {
    pub fn new(forward: F, backward: G) -> Self {
        Self { forward, backward }
    }
}

impl<A, B, F, G> Converter<A, B> for FnConverter<F, G>
where
    F: Fn(&A) -> B,
    G: Fn(&B) -> A,
{
    fn to_right(&self, left: &A) -> Result<B> {
        Ok((self.forward)(left))
    }

    fn to_left(&self, right: &B) -> Result<A> {
        Ok((self.backward)(right))
    }
}
