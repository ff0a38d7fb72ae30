//! Bidirectional content bindings between observable lists.

use crate::bidirectional::UpdatingGuard;
use crate::pair::ContentBinding;
use ripple_core::{Error, Result};
use ripple_reactive::{ListChange, ListChangeListener, ObservableList, PropertyValue, WeakList};
use std::any::Any;
use std::cell::Cell;
use std::rc::Rc;

/// Keeps the elements of `a` and `b` identical.
///
/// `a` takes `b`'s elements first. Afterwards every change to either list
/// is replayed on the other one as a single range replacement.
pub fn bind_content_bidirectional<E: PropertyValue>(
    a: &ObservableList<E>,
    b: &ObservableList<E>,
) -> Result<ContentBinding> {
    let record = ContentBinding::new(a.identity(), b.identity());
    if record.pair().is_self_pair() {
        return Err(Error::self_binding(a.to_string()));
    }
    unbind_content_bidirectional(a, b);

    a.set_all(b.to_vec());

    let core = Rc::new(ContentCore {
        record: record.clone(),
        a: a.downgrade(),
        b: b.downgrade(),
        updating: Cell::new(false),
    });
    a.add_change_listener(Rc::new(ContentListener {
        core: Rc::clone(&core),
        side: Side::A,
    }));
    b.add_change_listener(Rc::new(ContentListener { core, side: Side::B }));
    tracing::debug!(left = %a, right = %b, "bound list content bidirectionally");
    Ok(record)
}

/// Removes the content binding between `a` and `b`, in either order.
pub fn unbind_content_bidirectional<E: PropertyValue>(a: &ObservableList<E>, b: &ObservableList<E>) -> bool {
    let probe = ContentBinding::new(a.identity(), b.identity());
    let left = a.remove_change_listener(&probe);
    let right = b.remove_change_listener(&probe);
    left || right
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Side {
    A,
    B,
}

struct ContentCore<E> {
    record: ContentBinding,
    a: WeakList<E>,
    b: WeakList<E>,
    updating: Cell<bool>,
}

impl<E: PropertyValue> ContentCore<E> {
    fn mirror(&self, from: Side, change: &ListChange<E>) {
        if self.updating.get() {
            return;
        }
        let target = match from {
            Side::A => self.b.upgrade(),
            Side::B => self.a.upgrade(),
        };
        let Some(target) = target else {
            tracing::debug!("content binding endpoint dropped; unregistering");
            self.dispose();
            return;
        };

        let _guard = UpdatingGuard::enter(&self.updating);
        if let Err(err) = target.replace_range(change.from..change.from + change.removed.len(), change.added.clone()) {
            tracing::warn!(%err, target_list = %target, "content binding lost sync");
        }
    }

    fn dispose(&self) {
        if let Some(a) = self.a.upgrade() {
            a.remove_change_listener(&self.record);
        }
        if let Some(b) = self.b.upgrade() {
            b.remove_change_listener(&self.record);
        }
    }
}

struct ContentListener<E> {
    core: Rc<ContentCore<E>>,
    side: Side,
}

impl<E: PropertyValue> ListChangeListener<E> for ContentListener<E> {
    fn on_changed(&self, _list: &ObservableList<E>, change: &ListChange<E>) {
        self.core.mirror(self.side, change);
    }

    fn same_listener(&self, other: &dyn ListChangeListener<E>) -> bool {
        other
            .as_any()
            .and_then(|any| any.downcast_ref::<ContentBinding>())
            .is_some_and(|record| *record == self.core.record)
    }

    fn as_any(&self) -> Option<&dyn Any> {
        Some(&self.core.record)
    }
}
