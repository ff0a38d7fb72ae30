//! Unordered endpoint pairs and binding records.

use ripple_reactive::{ChangeListener, ListChange, ListChangeListener, ObservableIdentity, ObservableList, ObservableValue};
use std::any::Any;
use std::hash::{Hash, Hasher};

/// Two observables, compared without regard to order.
///
/// Endpoints are held weakly. A pair with a dead endpoint equals only
/// itself.
#[derive(Clone, Debug)]
pub struct EndpointPair {
    first: ObservableIdentity,
    second: ObservableIdentity,
}

impl EndpointPair {
    pub fn new(first: ObservableIdentity, second: ObservableIdentity) -> Self {
        Self { first, second }
    }

    #[inline]
    pub fn first(&self) -> &ObservableIdentity {
        &self.first
    }

    #[inline]
    pub fn second(&self) -> &ObservableIdentity {
        &self.second
    }

    /// Returns true if both endpoints still exist.
    pub fn is_alive(&self) -> bool {
        self.first.is_alive() && self.second.is_alive()
    }

    /// Returns true if both endpoints are the same observable.
    pub fn is_self_pair(&self) -> bool {
        self.first == self.second
    }

    pub fn contains(&self, endpoint: &ObservableIdentity) -> bool {
        self.first == *endpoint || self.second == *endpoint
    }

    fn same_endpoints(&self, other: &EndpointPair) -> bool {
        if !self.is_alive() || !other.is_alive() {
            return false;
        }
        (self.first == other.first && self.second == other.second)
            || (self.first == other.second && self.second == other.first)
    }

    /// Endpoint addresses in ascending order.
    ///
    /// Stable for as long as this pair exists, even after an endpoint is
    /// dropped, so it can key maps that must outlive the endpoints.
    pub fn key(&self) -> (usize, usize) {
        let (a, b) = (self.first.addr(), self.second.addr());
        if a <= b {
            (a, b)
        } else {
            (b, a)
        }
    }
}

impl PartialEq for EndpointPair {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self, other) || self.same_endpoints(other)
    }
}

impl Eq for EndpointPair {}

impl Hash for EndpointPair {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

macro_rules! binding_record {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Debug, PartialEq, Eq, Hash)]
        pub struct $name {
            pair: EndpointPair,
        }

        impl $name {
            pub(crate) fn new(first: ObservableIdentity, second: ObservableIdentity) -> Self {
                Self {
                    pair: EndpointPair::new(first, second),
                }
            }

            /// Returns the bound endpoints.
            #[inline]
            pub fn pair(&self) -> &EndpointPair {
                &self.pair
            }

            /// Returns true while both endpoints exist.
            #[inline]
            pub fn is_alive(&self) -> bool {
                self.pair.is_alive()
            }

            /// Returns true if `other` exposes a record equal to this one.
            pub(crate) fn matches(&self, other: Option<&dyn Any>) -> bool {
                other
                    .and_then(|any| any.downcast_ref::<$name>())
                    .is_some_and(|record| record == self)
            }
        }
    };
}

binding_record! {
    /// Record of a bidirectional value binding.
    ///
    /// Doubles as a removal probe: passing it to
    /// [`ObservableValue::remove_change_listener`] removes the listener
    /// of the binding it describes.
    BidirectionalBinding
}

binding_record! {
    /// Record of a bidirectional content binding between two lists.
    ContentBinding
}

impl<T> ChangeListener<T> for BidirectionalBinding {
    fn changed(&self, _observable: &dyn ObservableValue<T>, _old: &T, _new: &T) {}

    fn same_listener(&self, other: &dyn ChangeListener<T>) -> bool {
        self.matches(other.as_any())
    }

    fn as_any(&self) -> Option<&dyn Any> {
        Some(self)
    }
}

impl<E> ListChangeListener<E> for ContentBinding {
    fn on_changed(&self, _list: &ObservableList<E>, _change: &ListChange<E>) {}

    fn same_listener(&self, other: &dyn ListChangeListener<E>) -> bool {
        self.matches(other.as_any())
    }

    fn as_any(&self) -> Option<&dyn Any> {
        Some(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ripple_reactive::Property;
    use std::collections::hash_map::DefaultHasher;

    fn hash_of<T: Hash>(value: &T) -> u64 {
        let mut hasher = DefaultHasher::new();
        value.hash(&mut hasher);
        hasher.finish()
    }

    #[test]
    fn test_pair_is_unordered() {
        let a = Property::new(1);
        let b = Property::new(2);
        let ab = BidirectionalBinding::new(a.identity(), b.identity());
        let ba = BidirectionalBinding::new(b.identity(), a.identity());
        assert_eq!(ab, ba);
        assert_eq!(hash_of(&ab), hash_of(&ba));
    }

    #[test]
    fn test_different_pairs_differ() {
        let a = Property::new(1);
        let b = Property::new(2);
        let c = Property::new(3);
        let ab = BidirectionalBinding::new(a.identity(), b.identity());
        let ac = BidirectionalBinding::new(a.identity(), c.identity());
        assert_ne!(ab, ac);
    }

    #[test]
    fn test_dead_pair_equals_only_itself() {
        let a = Property::new(1);
        let record = {
            let b = Property::new(2);
            BidirectionalBinding::new(a.identity(), b.identity())
        };
        assert!(!record.is_alive());
        let same = &record;
        assert_eq!(&record, same);
        assert_ne!(record, record.clone());
    }

    #[test]
    fn test_key_survives_dead_endpoint() {
        let a = Property::new(1);
        let b = Property::new(2);
        let forward = EndpointPair::new(a.identity(), b.identity());
        let backward = EndpointPair::new(b.identity(), a.identity());
        assert_eq!(forward.key(), backward.key());

        drop(b);
        assert!(!forward.is_alive());
        assert_eq!(forward.key(), backward.key());
    }

    #[test]
    fn test_self_pair() {
        let a = Property::new(1);
        assert!(EndpointPair::new(a.identity(), a.identity()).is_self_pair());
    }

    #[test]
    fn test_probe_matches_equal_record() {
        let a = Property::new(1);
        let b = Property::new(2);
        let ab = BidirectionalBinding::new(a.identity(), b.identity());
        let ba = BidirectionalBinding::new(b.identity(), a.identity());
        assert!(ChangeListener::<i32>::same_listener(&ab, &ba));
    }
}
