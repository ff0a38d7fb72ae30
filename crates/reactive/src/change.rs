//! List change descriptions.
//!
//! A `ListChange` describes one contiguous edit of an observable list: the
//! elements `removed` at `from` were replaced by `added`.

/// One contiguous replacement in a list.
#[derive(Clone, Debug, PartialEq)]
pub struct ListChange<E> {
    /// Index of the first affected element
    pub from: usize,
    /// Elements that were removed, in order
    pub removed: Vec<E>,
    /// Elements that were inserted in their place, in order
    pub added: Vec<E>,
}

impl<E> ListChange<E> {
    #[inline]
    pub fn new(from: usize, removed: Vec<E>, added: Vec<E>) -> Self {
        Self {
            from,
            removed,
            added,
        }
    }

    /// End of the added range in the new list (exclusive).
    #[inline]
    pub fn to(&self) -> usize {
        self.from + self.added.len()
    }

    /// Returns true if nothing was removed or added.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }

    #[inline]
    pub fn was_added(&self) -> bool {
        !self.added.is_empty()
    }

    #[inline]
    pub fn was_removed(&self) -> bool {
        !self.removed.is_empty()
    }

    /// Returns true if elements were both removed and added.
    #[inline]
    pub fn was_replaced(&self) -> bool {
        self.was_added() && self.was_removed()
    }
}
