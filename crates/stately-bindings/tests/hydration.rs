#![forbid(unsafe_code)]

//! First-render to session hand-off.
//!
//! The producing side builds a fresh store per render, runs its loaders and
//! captures the result. The consuming side hydrates once per session and
//! reuses that store afterwards.

use std::cell::Cell;
use std::rc::Rc;

use serde_json::json;
use stately_bindings::{DehydratedState, HydrateError, SessionSlot};
use stately_core::path;
use stately_store::{Store, Value};

fn make_store() -> Store {
    Store::new(json!({"user": null, "items": []}))
}

fn render_on_server() -> String {
    let store = make_store();
    let load = store.create_mutator(|draft, name: &'static str| {
        draft.set(path!("user"), Value::record([("name", name)]))?;
        draft.push(path!("items"), "first")
    });
    load.call("ada").unwrap();
    DehydratedState::capture(&store).to_json().unwrap()
}

#[test]
fn fresh_session_loads_payload_before_anyone_subscribes() {
    let payload = render_on_server();
    let mut slot = SessionSlot::new();

    let store = slot.hydrate_json(&payload, make_store).unwrap();

    assert_eq!(
        store
            .state()
            .get_path(&path!("user", "name"))
            .and_then(Value::as_str),
        Some("ada")
    );
    assert_eq!(store.state().get("items").map(Value::len), Some(1));
    assert_eq!(store.subscriber_count(), 0);
    assert_eq!(store.version(), 1);
}

#[test]
fn existing_session_store_is_reused() {
    let mut slot = SessionSlot::new();
    let first = slot.hydrate_json(&render_on_server(), make_store).unwrap();
    let bump = first.create_mutator(|draft, ()| draft.push(path!("items"), "client"));
    bump.call(()).unwrap();

    let builds = Rc::new(Cell::new(0));
    let b = Rc::clone(&builds);
    let second = slot
        .hydrate_json(&render_on_server(), move || {
            b.set(b.get() + 1);
            make_store()
        })
        .unwrap();

    assert!(second.ptr_eq(&first));
    assert_eq!(builds.get(), 0);
    assert_eq!(second.state().get("items").map(Value::len), Some(2));
}

#[test]
fn reused_store_ignores_undecodable_payload() {
    let mut slot = SessionSlot::new();
    let first = slot.get_or_init(make_store);
    let again = slot.hydrate_json("not json", make_store).unwrap();
    assert!(again.ptr_eq(&first));
}

#[test]
fn bad_payload_on_fresh_session_is_a_decode_error() {
    let mut slot = SessionSlot::new();
    let err = slot.hydrate_json("{\"state\":", make_store).unwrap_err();
    assert!(matches!(err, HydrateError::Decode(_)));
    assert!(!slot.is_initialized());
}

#[test]
fn payload_round_trips_through_json() {
    let store = make_store();
    store.replace_state(json!({"user": {"name": "grace"}, "items": [1, 2.5, "x", false]}));
    let captured = DehydratedState::capture(&store);

    let decoded = DehydratedState::from_json(&captured.to_json().unwrap()).unwrap();
    assert_eq!(decoded, captured);
    assert_eq!(decoded.state.to_json(), store.state().to_json());
}
