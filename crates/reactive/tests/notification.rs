//! Integration tests for notification passes on properties.

use ripple_reactive::{
    change_listener, invalidation_listener, ChangeListener, Error, InvalidationListener, ListenerPanic,
    ObservableValue, Property,
};
use std::cell::{Cell, RefCell};
use std::panic::{self, AssertUnwindSafe};
use std::rc::Rc;

fn counter() -> (Rc<Cell<usize>>, Rc<Cell<usize>>) {
    let count = Rc::new(Cell::new(0));
    (Rc::clone(&count), count)
}

#[test]
fn test_string_property_example() {
    let p = Property::new(String::from("-"));
    let (invalidations, inv) = counter();
    let changes = Rc::new(RefCell::new(Vec::new()));

    let _i = p.on_invalidated(move |_| inv.set(inv.get() + 1));
    let c = Rc::clone(&changes);
    let _c = p.on_changed(move |_, old: &String, new: &String| c.borrow_mut().push((old.clone(), new.clone())));

    p.set(String::from("A"));

    assert_eq!(invalidations.get(), 1);
    assert_eq!(*changes.borrow(), vec![(String::from("-"), String::from("A"))]);
}

/// Change listeners that each bump the value until it is divisible by their
/// prime. The chain settles on 2 * 3 * 5 * 7.
#[test]
fn test_prime_hunting_chain_converges() {
    let p = Property::new(0i64);
    let (invalidations, inv) = counter();
    let (changes, chg) = counter();
    let last_seen: Rc<RefCell<Vec<i64>>> = Rc::new(RefCell::new(vec![0; 4]));

    for _ in 0..2 {
        let inv = Rc::clone(&inv);
        p.add_invalidation_listener(invalidation_listener(move |_: &dyn ObservableValue<i64>| {
            inv.set(inv.get() + 1)
        }));
    }
    for (slot, prime) in [5i64, 2, 3, 7].into_iter().enumerate() {
        let target = p.downgrade();
        let chg = Rc::clone(&chg);
        let last_seen = Rc::clone(&last_seen);
        p.add_change_listener(change_listener(move |_: &dyn ObservableValue<i64>, _: &i64, new: &i64| {
            chg.set(chg.get() + 1);
            last_seen.borrow_mut()[slot] = *new;
            if new % prime != 0 {
                if let Some(target) = target.upgrade() {
                    target.set(new + 1);
                }
            }
        }));
    }

    p.set(1);

    assert_eq!(p.get(), 210);
    assert_eq!(changes.get(), 280);
    assert_eq!(invalidations.get(), 420);
    assert_eq!(*last_seen.borrow(), vec![210; 4]);
}

#[test]
fn test_disagreeing_listeners_fail_with_non_convergence() {
    let p = Property::named("contested", 0i64);
    for forced in [2i64, 3] {
        let target = p.downgrade();
        p.add_change_listener(change_listener(move |_: &dyn ObservableValue<i64>, _: &i64, _: &i64| {
            if let Some(target) = target.upgrade() {
                target.set(forced);
            }
        }));
    }

    let result = panic::catch_unwind(AssertUnwindSafe(|| p.set(1)));
    let payload = match result {
        Ok(()) => panic!("disagreeing listeners converged"),
        Err(payload) => payload,
    };
    match payload.downcast_ref::<Error>() {
        Some(Error::NonConvergence {
            observable,
            original,
            ..
        }) => {
            assert!(observable.contains("contested"));
            assert_eq!(original, "0");
        }
        other => panic!("unexpected payload: {:?}", other),
    }
}

#[test]
fn test_non_convergence_respects_configured_depth() {
    let p = Property::builder(0i64).max_nesting_depth(4).build();
    let target = p.downgrade();
    // Always moves the value on, so it never settles.
    p.add_change_listener(change_listener(move |_: &dyn ObservableValue<i64>, _: &i64, new: &i64| {
        if let Some(target) = target.upgrade() {
            target.set(new + 1);
        }
    }));

    let result = panic::catch_unwind(AssertUnwindSafe(|| p.set(1)));
    assert!(result.is_err());
    assert_eq!(p.get(), 5);
}

#[test]
fn test_listener_added_during_pass_waits_for_next_pass() {
    let p = Property::new(0);
    let (late_calls, late) = counter();
    let target = p.downgrade();

    let added = Rc::new(Cell::new(false));
    let flag = Rc::clone(&added);
    let _first = p.on_changed(move |_, _, _| {
        if flag.replace(true) {
            return;
        }
        if let Some(target) = target.upgrade() {
            let late = Rc::clone(&late);
            target.on_changed(move |_, _, _| late.set(late.get() + 1));
        }
    });

    p.set(1);
    assert_eq!(late_calls.get(), 0);
    assert_eq!(p.change_listener_count(), 2);

    p.set(2);
    assert_eq!(late_calls.get(), 1);
}

#[test]
fn test_listener_removed_during_pass_is_skipped() {
    let p = Property::new(0);
    let (second_calls, second) = counter();
    let second_listener = change_listener(move |_: &dyn ObservableValue<i32>, _: &i32, _: &i32| {
        second.set(second.get() + 1)
    });

    let target = p.downgrade();
    let to_remove = Rc::clone(&second_listener);
    let _first = p.on_changed(move |_, _, _| {
        if let Some(target) = target.upgrade() {
            target.remove_change_listener(&*to_remove);
        }
    });
    p.add_change_listener(Rc::clone(&second_listener));
    assert_eq!(p.change_listener_count(), 2);

    p.set(1);
    assert_eq!(second_calls.get(), 0);
    assert_eq!(p.change_listener_count(), 1);
}

type SelfRef<L> = Rc<RefCell<Option<Rc<L>>>>;

#[test]
fn test_single_listener_removing_itself() {
    let p = Property::new(0);
    let (calls, c) = counter();
    let slot: SelfRef<dyn InvalidationListener<i32>> = Rc::new(RefCell::new(None));

    let me = Rc::clone(&slot);
    let target = p.downgrade();
    let listener = invalidation_listener(move |_: &dyn ObservableValue<i32>| {
        c.set(c.get() + 1);
        if let (Some(me), Some(target)) = (me.borrow_mut().take(), target.upgrade()) {
            target.remove_invalidation_listener(&*me);
        }
    });
    *slot.borrow_mut() = Some(Rc::clone(&listener));
    p.add_invalidation_listener(listener);

    p.set(1);
    p.set(2);
    assert_eq!(calls.get(), 1);
    assert_eq!(p.invalidation_listener_count(), 0);
}

#[test]
fn test_listener_removing_itself_among_many() {
    let p = Property::new(0);
    let (calls, c) = counter();
    let other = p.on_changed(move |_, _, _| c.set(c.get() + 1));

    let slot: SelfRef<dyn ChangeListener<i32>> = Rc::new(RefCell::new(None));
    let me = Rc::clone(&slot);
    let target = p.downgrade();
    let remover = p.on_changed(move |_, _, _| {
        if let (Some(me), Some(target)) = (me.borrow_mut().take(), target.upgrade()) {
            target.remove_change_listener(&*me);
        }
    });
    *slot.borrow_mut() = Some(remover);

    p.set(1);
    assert_eq!(p.change_listener_count(), 1);
    p.set(2);
    assert_eq!(calls.get(), 2);
    assert!(p.remove_change_listener(&*other));
    assert_eq!(p.change_listener_count(), 0);
}

#[test]
fn test_panicking_listeners_are_isolated() {
    let reports = Rc::new(RefCell::new(Vec::new()));
    let r = Rc::clone(&reports);
    let p = Property::builder(0)
        .sink(move |panic: ListenerPanic| r.borrow_mut().push(panic.message()))
        .build();

    let (calls, c) = counter();
    let _bad_inv = p.on_invalidated(|_| panic!("invalidation failed"));
    let _bad_chg = p.on_changed(|_, _, _| panic!("change failed"));
    let _good = p.on_changed(move |_, _, _| c.set(c.get() + 1));

    p.set(1);
    assert_eq!(calls.get(), 1);
    assert_eq!(
        *reports.borrow(),
        vec!["invalidation failed".to_string(), "change failed".to_string()]
    );
}

#[test]
fn test_dead_single_weak_listener_is_replaced() {
    let p = Property::new(0);
    let (calls, c) = counter();
    let weak_listener = change_listener(move |_: &dyn ObservableValue<i32>, _: &i32, _: &i32| {
        c.set(c.get() + 1)
    });
    p.add_weak_change_listener(Rc::downgrade(&weak_listener)).unwrap();
    p.set(1);
    assert_eq!(calls.get(), 1);

    drop(weak_listener);
    p.set(2);
    assert_eq!(calls.get(), 1);
    // Still counted until the registry is touched.
    assert_eq!(p.change_listener_count(), 1);

    let _kept = p.on_changed(|_, _, _| {});
    assert_eq!(p.change_listener_count(), 1);
}

#[test]
fn test_dead_weak_listeners_are_reclaimed_on_growth() {
    let p = Property::new(0);
    let _a = p.on_changed(|_, _, _| {});
    {
        let short_lived = change_listener(|_: &dyn ObservableValue<i32>, _: &i32, _: &i32| {});
        p.add_weak_change_listener(Rc::downgrade(&short_lived)).unwrap();
        p.add_weak_change_listener(Rc::downgrade(&short_lived)).unwrap();
    }
    let _b = p.on_changed(|_, _, _| {});
    assert_eq!(p.change_listener_count(), 4);

    let _c = p.on_changed(|_, _, _| {});
    assert_eq!(p.change_listener_count(), 3);
}

#[test]
fn test_dead_weak_registration_is_rejected() {
    let p = Property::new(0);
    let listener = invalidation_listener(|_: &dyn ObservableValue<i32>| {});
    let weak = Rc::downgrade(&listener);
    drop(listener);
    assert_eq!(
        p.add_weak_invalidation_listener(weak),
        Err(Error::null_argument("listener"))
    );
}
