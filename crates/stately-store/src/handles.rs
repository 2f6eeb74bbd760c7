#![forbid(unsafe_code)]

//! Reusable handles returned by `create_mutator`, `create_selector` and
//! `create_effect`.
//!
//! Each handle closes over the store and one body. The argument type `A` is
//! fixed when the handle is created. Handles keep nothing between calls, so
//! cloning one is the same as creating it again with the same body.

use std::fmt;
use std::rc::Rc;

use stately_core::{Draft, DraftError, RecipeOutput, Value};

use crate::store::Store;

type MutatorBody<A, E> = dyn Fn(&mut Draft, A) -> Result<Option<Value>, E>;
type ReadBody<A, R> = dyn Fn(&Value, A) -> R;

/// Write handle: runs its body on a draft of the current state, commits the
/// result, notifies subscribers and returns the new state.
pub struct Mutator<A, E = DraftError> {
    store: Store,
    body: Rc<MutatorBody<A, E>>,
}

impl<A: 'static, E: 'static> Mutator<A, E> {
    pub(crate) fn new<O, F>(store: Store, body: F) -> Self
    where
        F: Fn(&mut Draft, A) -> Result<O, E> + 'static,
        O: RecipeOutput,
    {
        Self {
            store,
            body: Rc::new(move |draft: &mut Draft, args: A| {
                body(draft, args).map(RecipeOutput::into_replacement)
            }),
        }
    }
}

impl<A, E> Mutator<A, E> {
    /// Run the body with `args`.
    ///
    /// The returned value is the store's new state, the same allocation
    /// subscribers were just handed as `next`. On `Err` the store is
    /// untouched.
    pub fn call(&self, args: A) -> Result<Value, E> {
        let body = &self.body;
        self.store.mutate(|draft| body(draft, args))
    }

    #[must_use]
    pub fn store(&self) -> &Store {
        &self.store
    }
}

/// Read handle: runs its body against the current state.
///
/// Nothing is cached. A body that only returns subtrees of the state gives
/// back the same allocation until that subtree is written; a body that builds
/// a new container gives a new one every call.
pub struct Selector<A, R> {
    store: Store,
    body: Rc<ReadBody<A, R>>,
}

impl<A, R> Selector<A, R> {
    pub(crate) fn new<F>(store: Store, body: F) -> Self
    where
        F: Fn(&Value, A) -> R + 'static,
    {
        Self {
            store,
            body: Rc::new(body),
        }
    }

    pub fn call(&self, args: A) -> R {
        let state = self.store.state();
        (self.body)(&state, args)
    }

    #[must_use]
    pub fn store(&self) -> &Store {
        &self.store
    }
}

/// Action handle: runs its body against the current state and returns
/// whatever it returns.
///
/// The body may call mutators it has captured; each of those writes notifies
/// on its own. An effect never writes by itself. If the body returns a
/// future, the caller drives it.
pub struct Effect<A, R> {
    store: Store,
    body: Rc<ReadBody<A, R>>,
}

impl<A, R> Effect<A, R> {
    pub(crate) fn new<F>(store: Store, body: F) -> Self
    where
        F: Fn(&Value, A) -> R + 'static,
    {
        Self {
            store,
            body: Rc::new(body),
        }
    }

    pub fn call(&self, args: A) -> R {
        let state = self.store.state();
        (self.body)(&state, args)
    }

    #[must_use]
    pub fn store(&self) -> &Store {
        &self.store
    }
}

macro_rules! impl_handle_traits {
    ($name:ident<$a:ident, $b:ident>) => {
        impl<$a, $b> Clone for $name<$a, $b> {
            fn clone(&self) -> Self {
                Self {
                    store: self.store.clone(),
                    body: Rc::clone(&self.body),
                }
            }
        }

        impl<$a, $b> fmt::Debug for $name<$a, $b> {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.debug_struct(stringify!($name))
                    .field("store", &self.store.config().label())
                    .finish_non_exhaustive()
            }
        }
    };
}

impl_handle_traits!(Mutator<A, E>);
impl_handle_traits!(Selector<A, R>);
impl_handle_traits!(Effect<A, R>);
