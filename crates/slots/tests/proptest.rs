//! Property-based tests for ripple-slots using proptest.

use proptest::prelude::*;
use ripple_slots::SlotArray;

#[derive(Clone, Debug)]
enum Op {
    Add(u8),
    Remove(usize),
    Tombstone(usize),
    RemoveMultiplesOf(u8),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => any::<u8>().prop_map(Op::Add),
        2 => (0usize..64).prop_map(Op::Remove),
        1 => (0usize..64).prop_map(Op::Tombstone),
        1 => (2u8..7).prop_map(Op::RemoveMultiplesOf),
    ]
}

fn apply(array: &mut SlotArray<u8>, model: &mut Vec<Option<u8>>, op: &Op) {
    match *op {
        Op::Add(v) => {
            array.add(v);
            model.push(Some(v));
        }
        Op::Remove(i) => {
            let result = array.remove(i);
            if i < model.len() {
                assert_eq!(result.unwrap(), model.remove(i));
            } else {
                assert!(result.is_err());
            }
        }
        Op::Tombstone(i) => {
            let result = array.set(i, None);
            if i < model.len() {
                assert_eq!(result.unwrap(), model[i].take());
            } else {
                assert!(result.is_err());
            }
        }
        Op::RemoveMultiplesOf(m) => {
            let expected = model.iter().any(|slot| slot.is_some_and(|v| v % m == 0));
            let removed = array.remove_if(|slot| slot.is_some_and(|v| v % m == 0));
            model.retain(|slot| !slot.is_some_and(|v| v % m == 0));
            assert_eq!(removed, expected);
        }
    }
}

proptest! {
    /// Test that the array matches a Vec model after every mutation.
    #[test]
    fn slots_match_vec_model(ops in prop::collection::vec(op_strategy(), 1..200)) {
        let mut array = SlotArray::new();
        let mut model: Vec<Option<u8>> = Vec::new();

        for op in &ops {
            apply(&mut array, &mut model, op);
            let actual: Vec<Option<u8>> = array.iter().map(|slot| slot.copied()).collect();
            prop_assert_eq!(&actual, &model);
            prop_assert!(array.capacity() >= array.len());
        }
    }

    /// Test that index_of agrees with a linear scan of the model.
    #[test]
    fn index_of_matches_model(
        ops in prop::collection::vec(op_strategy(), 1..100),
        probe in any::<u8>()
    ) {
        let mut array = SlotArray::new();
        let mut model: Vec<Option<u8>> = Vec::new();

        for op in &ops {
            apply(&mut array, &mut model, op);
            prop_assert_eq!(
                array.index_of(Some(&probe)),
                model.iter().position(|slot| *slot == Some(probe))
            );
            prop_assert_eq!(
                array.index_of(None),
                model.iter().position(|slot| slot.is_none())
            );
        }
    }

    /// Test that an array emptied by removals owns no allocation.
    #[test]
    fn emptied_array_is_unallocated(values in prop::collection::vec(any::<u8>(), 1..100)) {
        let mut array = SlotArray::new();
        for &v in &values {
            array.add(v);
        }
        while !array.is_empty() {
            array.remove(array.len() - 1).unwrap();
        }
        prop_assert!(!array.is_allocated());
        prop_assert_eq!(array.capacity(), 0);
    }
}
