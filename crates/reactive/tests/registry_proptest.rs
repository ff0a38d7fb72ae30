//! Property-based tests for listener registries and slots using proptest.

use proptest::prelude::*;
use ripple_reactive::{Entry, Handle, ListenerRegistry, NotificationSlot};
use std::rc::Rc;

#[derive(Clone, Debug)]
enum Op {
    AddInvalidation(u8),
    AddChange(u8),
    RemoveInvalidation(u8),
    RemoveChange(u8),
    Lock,
    Unlock,
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => (0u8..8).prop_map(Op::AddInvalidation),
        3 => (0u8..8).prop_map(Op::AddChange),
        2 => (0u8..8).prop_map(Op::RemoveInvalidation),
        2 => (0u8..8).prop_map(Op::RemoveChange),
        1 => Just(Op::Lock),
        1 => Just(Op::Unlock),
    ]
}

fn matches(v: u8) -> impl FnMut(&Handle<u8>) -> bool {
    move |handle| handle.get().is_some_and(|x| *x == v)
}

#[derive(Default)]
struct Model {
    invalidation: Vec<Option<u8>>,
    change: Vec<Option<u8>>,
    locked: bool,
}

fn model_remove(slots: &mut Vec<Option<u8>>, locked: bool, v: u8) -> bool {
    match slots.iter().position(|slot| *slot == Some(v)) {
        Some(i) if locked => {
            slots[i] = None;
            true
        }
        Some(i) => {
            slots.remove(i);
            true
        }
        None => false,
    }
}

fn live(slots: &[Option<u8>]) -> Vec<u8> {
    slots.iter().flatten().copied().collect()
}

proptest! {
    /// Test that the registry agrees with a tombstoning Vec model.
    #[test]
    fn registry_matches_model(ops in prop::collection::vec(op_strategy(), 1..150)) {
        let mut registry: ListenerRegistry<u8, u8> = ListenerRegistry::new();
        let mut model = Model::default();

        for op in &ops {
            match *op {
                Op::AddInvalidation(v) => {
                    registry.add_invalidation_listener(Handle::Strong(Rc::new(v)));
                    model.invalidation.push(Some(v));
                }
                Op::AddChange(v) => {
                    registry.add_change_listener(Handle::Strong(Rc::new(v)));
                    model.change.push(Some(v));
                }
                Op::RemoveInvalidation(v) => {
                    let expected = model_remove(&mut model.invalidation, model.locked, v);
                    prop_assert_eq!(registry.remove_invalidation_listener(matches(v)), expected);
                }
                Op::RemoveChange(v) => {
                    let expected = model_remove(&mut model.change, model.locked, v);
                    prop_assert_eq!(registry.remove_change_listener(matches(v)), expected);
                }
                Op::Lock => {
                    prop_assert_eq!(registry.lock().is_ok(), !model.locked);
                    model.locked = true;
                }
                Op::Unlock => {
                    prop_assert_eq!(registry.unlock().is_ok(), model.locked);
                    model.locked = false;
                    model.invalidation.retain(Option::is_some);
                    model.change.retain(Option::is_some);
                }
            }

            prop_assert_eq!(registry.invalidation_extent(), model.invalidation.len());
            prop_assert_eq!(registry.change_extent(), model.change.len());
            prop_assert_eq!(registry.invalidation_listeners_len(), live(&model.invalidation).len());
            prop_assert_eq!(registry.change_listeners_len(), live(&model.change).len());

            let mut seen_change = false;
            let mut invalidation = Vec::new();
            let mut change = Vec::new();
            for entry in registry.entries() {
                match entry {
                    Entry::Invalidation(handle) => {
                        prop_assert!(!seen_change, "invalidation listener after a change listener");
                        invalidation.extend(handle.get().map(|v| *v));
                    }
                    Entry::Change(handle) => {
                        seen_change = true;
                        change.extend(handle.get().map(|v| *v));
                    }
                }
            }
            prop_assert_eq!(invalidation, live(&model.invalidation));
            prop_assert_eq!(change, live(&model.change));
        }
    }

    /// Test that a pass only ever sees the listeners present when it began.
    #[test]
    fn pass_sees_snapshot(
        before in prop::collection::vec(0u8..8, 0..10),
        during in prop::collection::vec((any::<bool>(), 0u8..8), 0..20)
    ) {
        let slot: NotificationSlot<u8, u8> = NotificationSlot::new();
        for &v in &before {
            slot.add_change_listener(Handle::Strong(Rc::new(v)));
        }
        let mut visible: Vec<Option<u8>> = before.iter().copied().map(Some).collect();

        let pass = slot.begin_pass();
        prop_assert_eq!(pass.change_extent(), before.len());
        for &(add, v) in &during {
            if add {
                slot.add_change_listener(Handle::Strong(Rc::new(v)));
            } else if slot.remove_change_listener(matches(v)) {
                if let Some(i) = visible.iter().position(|slot| *slot == Some(v)) {
                    visible[i] = None;
                }
            }
            let seen: Vec<Option<u8>> = (0..pass.change_extent())
                .map(|i| pass.change_listener(i).map(|v| *v))
                .collect();
            prop_assert_eq!(&seen, &visible);
        }
        drop(pass);

        prop_assert!(!slot.is_notifying());
    }
}
