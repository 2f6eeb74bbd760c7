#![forbid(unsafe_code)]

//! Stately public facade crate.
//!
//! A single-writer observable store over a structurally shared state tree.
//!
//! ```
//! use stately::prelude::*;
//!
//! let store = create_store(Value::record([("a", Value::from("a"))]));
//! let change_a = store.create_mutator(|draft, a: &'static str| draft.set(path!("a"), a));
//!
//! let seen = std::rc::Rc::new(std::cell::Cell::new(false));
//! let s = seen.clone();
//! let _sub = store.subscribe(move |prev, next| {
//!     s.set(prev.get("a") != next.get("a"));
//! });
//!
//! change_a.call("x").unwrap();
//! assert!(seen.get());
//! ```

pub use stately_core as core;
#[cfg(feature = "bindings")]
pub use stately_bindings as bindings;
pub use stately_store as store;

pub use stately_core::path;

/// Create a store holding `initial`.
#[must_use]
pub fn create_store(initial: impl Into<stately_core::Value>) -> stately_store::Store {
    stately_store::Store::new(initial)
}

pub mod prelude {
    pub use crate::create_store;
    pub use stately_core::{
        Draft, DraftError, DraftResult, Path, Record, Seg, Value, path, produce,
    };
    pub use stately_store::{
        Effect, Mutator, Selector, Store, StoreConfig, SubscribePolicy, Subscription,
        WeakStore,
    };

    #[cfg(feature = "bindings")]
    pub use stately_bindings::{
        DehydratedState, HydrateError, Projection, SessionSlot, memoize_at, memoize_one,
    };
}
