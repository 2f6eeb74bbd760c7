#![forbid(unsafe_code)]

//! Mutator, selector and effect behavior against a small nested model.
//!
//! Validates that:
//! 1. Mutators copy only the written path and return the committed state.
//! 2. Selectors read the latest state and are stable only when they return
//!    shared subtrees.
//! 3. Effects hand back whatever their body returns, including futures, and
//!    their inner mutator calls commit independently.
//! 4. Errors from bodies reach the caller untouched.

use std::cell::{Cell, RefCell};
use std::future::Future;
use std::pin::pin;
use std::rc::Rc;
use std::task::{Context, Poll, Waker};

use serde_json::json;
use stately_core::path;
use stately_store::{DraftError, DraftResult, Store, Value};

// ============================================================================
// Helpers
// ============================================================================

fn model() -> Value {
    Value::from(json!({
        "a": "a",
        "b": {
            "c": "d",
            "d": 1,
            "e": {"f": "f", "g": 1},
            "h": {"f": "f", "g": 1}
        }
    }))
}

fn str_at<'v>(state: &'v Value, p: &stately_core::Path) -> Option<&'v str> {
    state.get_path(p).and_then(Value::as_str)
}

fn int_at(state: &Value, p: &stately_core::Path) -> Option<i64> {
    state.get_path(p).and_then(Value::as_int)
}

// ============================================================================
// Mutators
// ============================================================================

#[test]
fn mutator_updates_only_written_field() {
    let store = Store::new(model());
    let change_a = store.create_mutator(|draft, a: &'static str| draft.set(path!("a"), a));

    let first = change_a.call("aa").unwrap();
    assert_eq!(str_at(&first, &path!("a")), Some("aa"));
    assert_eq!(str_at(&first, &path!("b", "c")), Some("d"));

    let second = change_a.call("aaa").unwrap();
    assert_eq!(str_at(&second, &path!("a")), Some("aaa"));
    assert_eq!(int_at(&first, &path!("b", "d")), Some(1));
    assert_eq!(str_at(&first, &path!("a")), Some("aa"), "earlier result is frozen");
}

#[test]
fn repeated_mutations_build_on_previous_result() {
    let store = Store::new(model());
    let multiply_d = store.create_mutator(|draft, multiplier: i64| -> DraftResult<()> {
        let d = draft.get(path!("b", "d")).and_then(Value::as_int).unwrap_or(0);
        draft.set(path!("b", "d"), d * multiplier)
    });

    let first = multiply_d.call(2).unwrap();
    assert_eq!(int_at(&first, &path!("b", "d")), Some(2));
    assert_eq!(str_at(&first, &path!("b", "c")), Some("d"));

    let second = multiply_d.call(4).unwrap();
    assert_eq!(int_at(&second, &path!("b", "d")), Some(8));
    assert_eq!(str_at(&first, &path!("b", "c")), Some("d"));
}

#[test]
fn multiply_scenario_shares_untouched_values() {
    let base = Value::from(json!({"a": "a", "b": {"c": "d", "d": 1}}));
    let store = Store::new(base.clone());
    let multiply_d = store.create_mutator(|draft, multiplier: i64| -> DraftResult<()> {
        draft.update(path!("b", "d"), |d| Value::from(d.as_int().unwrap_or(0) * multiplier))
    });

    let next = multiply_d.call(2).unwrap();

    assert_eq!(next, Value::from(json!({"a": "a", "b": {"c": "d", "d": 2}})));
    assert!(next.get("a").unwrap().ptr_eq(base.get("a").unwrap()));
    assert!(
        next.get_path(&path!("b", "c"))
            .unwrap()
            .ptr_eq(base.get_path(&path!("b", "c")).unwrap())
    );
    assert!(!next.get("b").unwrap().ptr_eq(base.get("b").unwrap()));
}

#[test]
fn read_after_write_is_identical() {
    let store = Store::new(model());
    let change_c = store.create_mutator(|draft, c: &'static str| draft.set(path!("b", "c"), c));
    let returned = change_c.call("cc").unwrap();
    assert!(returned.ptr_eq(&store.state()));
}

#[test]
fn mutator_error_leaves_state_and_subscribers_alone() {
    let store = Store::new(model());
    let before = store.state();
    let calls = Rc::new(Cell::new(0));
    let c = Rc::clone(&calls);
    let _sub = store.subscribe(move |_, _| c.set(c.get() + 1));

    let broken = store.create_mutator(|draft, ()| -> DraftResult<()> {
        draft.set(path!("a"), "partial")?;
        draft.set(path!("b", "c", "deeper"), 1)
    });

    let err = broken.call(()).unwrap_err();
    assert!(matches!(err, DraftError::TypeMismatch { .. }));
    assert!(store.state().ptr_eq(&before));
    assert_eq!(store.version(), 0);
    assert_eq!(calls.get(), 0);
}

#[test]
fn mutator_custom_error_is_returned_verbatim() {
    #[derive(Debug, PartialEq)]
    enum Rejected {
        TooLarge(i64),
    }

    let store = Store::new(model());
    let set_d = store.create_mutator(|draft, d: i64| {
        if d > 100 {
            return Err(Rejected::TooLarge(d));
        }
        draft.set(path!("b", "d"), d).map_err(|_| Rejected::TooLarge(-1))
    });

    assert_eq!(set_d.call(500).unwrap_err(), Rejected::TooLarge(500));
    assert_eq!(int_at(&set_d.call(50).unwrap(), &path!("b", "d")), Some(50));
}

#[test]
fn mutator_with_tuple_arguments() {
    let store = Store::new(model());
    let set_at = store.create_mutator(|draft, (key, value): (&'static str, i64)| {
        draft.set(path!("b", "e", key), value)
    });
    let next = set_at.call(("g", 7)).unwrap();
    assert_eq!(int_at(&next, &path!("b", "e", "g")), Some(7));
    assert!(
        next.get_path(&path!("b", "h"))
            .unwrap()
            .ptr_eq(model_h(&store.previous()))
    );
}

fn model_h(state: &Value) -> &Value {
    state.get_path(&path!("b", "h")).unwrap()
}

#[test]
fn reentrant_write_inside_body_is_overwritten_by_outer_result() {
    let store = Store::new(model());
    let inner = store.create_mutator(|draft, ()| draft.set(path!("b", "c"), "inner"));
    let outer = store.create_mutator(move |draft, ()| -> DraftResult<()> {
        inner.call(())?;
        draft.set(path!("a"), "outer")
    });

    let next = outer.call(()).unwrap();
    assert_eq!(store.version(), 2);
    assert!(next.ptr_eq(&store.state()));
    assert_eq!(str_at(&next, &path!("a")), Some("outer"));
    // The outer draft started before the inner write landed.
    assert_eq!(str_at(&next, &path!("b", "c")), Some("d"));
    assert_eq!(str_at(&store.previous(), &path!("b", "c")), Some("inner"));
}

// ============================================================================
// Selectors
// ============================================================================

#[test]
fn selection_is_stable_when_unrelated_state_changes() {
    let store = Store::new(model());
    let change_a = store.create_mutator(|draft, a: &'static str| draft.set(path!("a"), a));
    let select_b = store.create_selector(|state, ()| state.get("b").cloned());

    let first = select_b.call(()).unwrap();
    change_a.call("aa").unwrap();
    let second = select_b.call(()).unwrap();
    assert!(second.ptr_eq(&first));
}

#[test]
fn selection_is_stable_when_sibling_under_same_parent_changes() {
    let store = Store::new(model());
    let change_h = store.create_mutator(|draft, h: Value| draft.set(path!("b", "h"), h));
    let select_e = store.create_selector(|state, ()| state.get_path(&path!("b", "e")).cloned());

    let first = select_e.call(()).unwrap();
    change_h
        .call(Value::from(json!({"f": "ff", "g": 2})))
        .unwrap();
    let second = select_e.call(()).unwrap();

    assert_eq!(first, Value::from(json!({"f": "f", "g": 1})));
    assert!(second.ptr_eq(&first));
}

#[test]
fn selection_changes_identity_when_its_subtree_is_written() {
    let store = Store::new(model());
    let change_c = store.create_mutator(|draft, c: &'static str| draft.set(path!("b", "c"), c));
    let select_b = store.create_selector(|state, ()| state.get("b").cloned());

    let first = select_b.call(()).unwrap();
    change_c.call("cc").unwrap();
    let second = select_b.call(()).unwrap();
    assert!(!second.ptr_eq(&first));
}

#[test]
fn selector_building_new_container_is_not_stable() {
    let store = Store::new(model());
    let wrap_b = store.create_selector(|state, ()| {
        Value::record([("newObj", state.get("b").cloned().unwrap_or_default())])
    });

    let first = wrap_b.call(());
    let second = wrap_b.call(());
    assert_eq!(first, second);
    assert!(!second.ptr_eq(&first));
}

#[test]
fn earlier_selection_stays_frozen_after_nested_write() {
    let store = Store::new(model());
    let change_d = store.create_mutator(|draft, d: i64| draft.set(path!("b", "d"), d));
    let select_b = store.create_selector(|state, ()| state.get("b").cloned().unwrap_or_default());

    let first = select_b.call(());
    assert_eq!(first.get("d").and_then(Value::as_int), Some(1));
    change_d.call(10).unwrap();
    let second = select_b.call(());
    assert_eq!(first.get("d").and_then(Value::as_int), Some(1));
    assert_eq!(second.get("d").and_then(Value::as_int), Some(10));
}

#[test]
fn selection_inside_subscription_sees_committed_state() {
    let store = Store::new(model());
    let change_d = store.create_mutator(|draft, d: i64| draft.set(path!("b", "d"), d));
    let select_d = store.create_selector(|state, ()| state.get_path(&path!("b", "d")).and_then(Value::as_int));

    let seen = Rc::new(RefCell::new(Vec::new()));
    let s = Rc::clone(&seen);
    let _sub = store.subscribe(move |_, _| s.borrow_mut().push(select_d.call(())));

    change_d.call(10).unwrap();
    change_d.call(20).unwrap();
    change_d.call(500).unwrap();
    assert_eq!(*seen.borrow(), vec![Some(10), Some(20), Some(500)]);
}

#[test]
fn selector_with_arguments() {
    let store = Store::new(model());
    let add_to_d = store.create_selector(|state, d: i64| {
        state.get_path(&path!("b", "d")).and_then(Value::as_int).unwrap_or(0) + d
    });
    assert_eq!(add_to_d.call(1), 2);
    assert_eq!(add_to_d.call(1), 2);
}

#[test]
fn keyed_selection_tracks_only_the_written_key() {
    let store = Store::new(model());
    let change_a = store.create_mutator(|draft, a: &'static str| draft.set(path!("a"), a));
    let select_key = store.create_selector(|state, key: &'static str| state.get(key).cloned());

    let first = select_key.call("b").unwrap();
    let second = select_key.call("a").unwrap();
    change_a.call("aa").unwrap();
    let third = select_key.call("b").unwrap();
    let fourth = select_key.call("a").unwrap();

    assert!(third.ptr_eq(&first));
    assert!(!fourth.ptr_eq(&second));
}

// ============================================================================
// Effects
// ============================================================================

#[test]
fn effect_returns_body_result_and_inner_writes_commit() {
    let store = Store::new(model());
    let mutator_calls = Rc::new(Cell::new(0));
    let m = Rc::clone(&mutator_calls);
    let change_a = store.create_mutator(move |draft, a: &'static str| {
        m.set(m.get() + 1);
        draft.set(path!("a"), a)
    });

    let effect_calls = Rc::new(Cell::new(0));
    let e = Rc::clone(&effect_calls);
    let effect_a = store.create_effect(move |_, a: &'static str| {
        e.set(e.get() + 1);
        change_a.call(a).map(|_| "Done")
    });

    let returned = effect_a.call("aa");
    assert_eq!(returned, Ok("Done"));
    assert_eq!(str_at(&store.state(), &path!("a")), Some("aa"));
    assert_eq!(mutator_calls.get(), 1);
    assert_eq!(effect_calls.get(), 1);
}

#[test]
fn effect_reads_state_at_call_time() {
    let store = Store::new(model());
    let read_a = store.create_effect(|state, ()| str_at(state, &path!("a")).map(str::to_owned));
    store.replace_state(json!({"a": "replaced"}));
    assert_eq!(read_a.call(()).as_deref(), Some("replaced"));
}

#[test]
fn effect_error_propagates() {
    let store = Store::new(model());
    let failing = store.create_effect(|_, code: u16| -> Result<(), u16> { Err(code) });
    assert_eq!(failing.call(503), Err(503));
    assert_eq!(store.version(), 0);
}

#[test]
fn effect_may_return_a_future() {
    let store = Store::new(model());
    let change_a = store.create_mutator(|draft, a: String| draft.set(path!("a"), a));
    let load = store.create_effect(move |state, suffix: &'static str| {
        let seed = str_at(state, &path!("a")).unwrap_or_default().to_owned();
        let change_a = change_a.clone();
        async move { change_a.call(format!("{seed}{suffix}")) }
    });

    let future = load.call("-loaded");
    assert_eq!(store.version(), 0, "nothing runs until the future is polled");

    let mut future = pin!(future);
    let mut cx = Context::from_waker(Waker::noop());
    let Poll::Ready(result) = future.as_mut().poll(&mut cx) else {
        panic!("future should complete on first poll");
    };
    let next = result.unwrap();
    assert_eq!(str_at(&next, &path!("a")), Some("a-loaded"));
    assert!(next.ptr_eq(&store.state()));
}
