//! Notification configuration.

use crate::sink::{ExceptionSink, TracingSink};
use std::fmt;
use std::rc::Rc;

/// Nesting depth at which change listeners are considered non-convergent.
pub const DEFAULT_MAX_NESTING_DEPTH: usize = 64;

/// Per-observable notification settings.
///
/// # Example
///
/// ```rust
/// use ripple_reactive::NotifyConfig;
///
/// let config = NotifyConfig::new().max_nesting_depth(16);
/// assert_eq!(config.nesting_depth(), 16);
/// ```
#[derive(Clone)]
pub struct NotifyConfig {
    max_nesting_depth: usize,
    sink: Rc<dyn ExceptionSink>,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            max_nesting_depth: DEFAULT_MAX_NESTING_DEPTH,
            sink: Rc::new(TracingSink),
        }
    }
}

impl NotifyConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the nesting depth limit. Values below 1 are raised to 1.
    pub fn max_nesting_depth(mut self, depth: usize) -> Self {
        self.max_nesting_depth = depth.max(1);
        self
    }

    /// Sets the sink receiving listener panics.
    pub fn sink<S: ExceptionSink + 'static>(self, sink: S) -> Self {
        self.shared_sink(Rc::new(sink))
    }

    /// Sets a sink shared with other observables.
    pub fn shared_sink(mut self, sink: Rc<dyn ExceptionSink>) -> Self {
        self.sink = sink;
        self
    }

    #[inline]
    pub fn nesting_depth(&self) -> usize {
        self.max_nesting_depth
    }

    #[inline]
    pub fn exception_sink(&self) -> Rc<dyn ExceptionSink> {
        Rc::clone(&self.sink)
    }
}

impl fmt::Debug for NotifyConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NotifyConfig")
            .field("max_nesting_depth", &self.max_nesting_depth)
            .finish_non_exhaustive()
    }
}
