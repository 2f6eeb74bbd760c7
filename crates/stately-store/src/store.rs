#![forbid(unsafe_code)]

//! The [`Store`]: one current state, one previous state, and the write path.
//!
//! # Design
//!
//! `Store` is a cloneable handle around `Rc<StoreInner>`. The inner state is
//! split so that user code never runs under a `RefCell` borrow:
//!
//! - `cells` holds `current`, `previous` and `version`. It is borrowed only
//!   for the few instructions that read or swap them.
//! - `registry` is the ordered subscriber list (see [`subscription`](crate::subscription)).
//!
//! A write runs in three steps:
//!
//! 1. Compute the next state (`produce`, or the value handed to
//!    [`replace_state`](Store::replace_state)). No borrow is held.
//! 2. Swap `previous`/`current` and bump `version` under a short borrow.
//! 3. Notify a snapshot of the registry with `(previous, next)`.
//!
//! # Invariants
//!
//! 1. After a write, `previous()` is what `state()` returned before it.
//! 2. `version()` increments by exactly 1 per write, including writes that
//!    produced an identical value.
//! 3. A write call returns only after every subscriber in its pass has run.
//! 4. A nested write (from a subscriber or a body) notifies to completion
//!    before the outer pass resumes, and the outer pass keeps its own
//!    `(previous, next)` pair.
//!
//! # Failure Modes
//!
//! - **Mutator body returns `Err`**: nothing is swapped, nobody is notified,
//!   and the error reaches the caller unchanged.
//! - **Subscriber panics**: the state has already been swapped; later
//!   subscribers in that pass do not run.
//! - **Callbacks that capture the store**: they form an `Rc` cycle through the
//!   registry and keep the store alive until the subscription is removed.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use stately_core::{Draft, RecipeOutput, Value, produce};

use crate::config::{StoreConfig, SubscribePolicy};
use crate::handles::{Effect, Mutator, Selector};
use crate::subscription::{Registry, Subscription};

struct Cells {
    current: Value,
    previous: Value,
    version: u64,
}

pub(crate) struct StoreInner {
    cells: RefCell<Cells>,
    registry: Registry,
    config: StoreConfig,
}

impl StoreInner {
    pub(crate) fn registry(&self) -> &Registry {
        &self.registry
    }
}

/// Single-writer observable state container.
///
/// Cloning a `Store` creates a new handle to the **same** state.
///
/// ```
/// use stately_core::{path, DraftResult, Value};
/// use stately_store::Store;
///
/// let store = Store::new(Value::record([("count", Value::from(0))]));
/// let add = store.create_mutator(|draft, n: i64| -> DraftResult<()> {
///     draft.update(path!("count"), |old| Value::from(old.as_int().unwrap_or(0) + n))
/// });
///
/// let next = add.call(5).unwrap();
/// assert!(next.ptr_eq(&store.state()));
/// assert_eq!(store.state().get("count").and_then(Value::as_int), Some(5));
/// ```
#[derive(Clone)]
pub struct Store {
    inner: Rc<StoreInner>,
}

impl Store {
    /// Create a store holding `initial`. `previous()` starts out equal to it.
    #[must_use]
    pub fn new(initial: impl Into<Value>) -> Self {
        Self::with_config(initial, StoreConfig::default())
    }

    #[must_use]
    pub fn with_config(initial: impl Into<Value>, config: StoreConfig) -> Self {
        let initial = initial.into();
        Self {
            inner: Rc::new(StoreInner {
                cells: RefCell::new(Cells {
                    previous: initial.clone(),
                    current: initial,
                    version: 0,
                }),
                registry: Registry::default(),
                config,
            }),
        }
    }

    /// The current state.
    ///
    /// The returned value is a cheap handle to the same tree the store holds;
    /// it cannot be changed in place.
    #[must_use]
    pub fn state(&self) -> Value {
        self.inner.cells.borrow().current.clone()
    }

    /// The state just before the most recent write.
    #[must_use]
    pub fn previous(&self) -> Value {
        self.inner.cells.borrow().previous.clone()
    }

    /// Number of writes so far.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.inner.cells.borrow().version
    }

    #[must_use]
    pub fn config(&self) -> &StoreConfig {
        &self.inner.config
    }

    /// Number of live subscriptions.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.inner.registry.len()
    }

    /// Whether both handles point at the same store.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// A handle that does not keep the store alive.
    ///
    /// Callbacks registered on this store should hold one of these rather than
    /// a `Store`, so the registry does not own the store it lives in.
    #[must_use]
    pub fn downgrade(&self) -> WeakStore {
        WeakStore {
            inner: Rc::downgrade(&self.inner),
        }
    }

    /// Replace the whole state without going through a draft, then notify.
    ///
    /// Notifies even when `next` is identical to the current state.
    pub fn replace_state(&self, next: impl Into<Value>) {
        self.commit(next.into());
    }

    /// Register `callback` to run with `(previous, next)` after every write.
    ///
    /// With [`SubscribePolicy::Immediate`] the callback also runs once, before
    /// this returns, with the current state as both arguments.
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&Value, &Value) + 'static,
    {
        let entry = self.inner.registry.register(Box::new(callback));
        let subscription = Subscription::new(Rc::downgrade(&self.inner), entry.id());

        if self.inner.config.subscribe_policy == SubscribePolicy::Immediate {
            let current = self.state();
            entry.invoke(&current, &current);
        }
        subscription
    }

    /// Run one recipe against the current state and commit the result.
    ///
    /// This is what every [`Mutator`] call does; it is exposed for one-off
    /// writes that do not warrant a handle.
    pub fn mutate<O, E, F>(&self, recipe: F) -> Result<Value, E>
    where
        F: FnOnce(&mut Draft) -> Result<O, E>,
        O: RecipeOutput,
    {
        let base = self.state();
        let version_before = self.version();
        let next = produce(&base, recipe)?;

        // A recipe that wrote through another handle built its result from a
        // stale base. The result still wins.
        #[cfg(feature = "tracing")]
        {
            let actual = self.version();
            if actual != version_before {
                tracing::warn!(
                    message = "stately.commit_race",
                    store = self.inner.config.label(),
                    expected_version = version_before,
                    actual_version = actual,
                );
            }
        }
        #[cfg(not(feature = "tracing"))]
        let _ = version_before;

        Ok(self.commit(next))
    }

    /// Create a reusable write handle.
    ///
    /// `A` is the argument the handle is called with; use a tuple for several
    /// values and `()` for none.
    pub fn create_mutator<A, O, E, F>(&self, body: F) -> Mutator<A, E>
    where
        F: Fn(&mut Draft, A) -> Result<O, E> + 'static,
        O: RecipeOutput,
        A: 'static,
        E: 'static,
    {
        Mutator::new(self.clone(), body)
    }

    /// Create a reusable read handle. Results are not cached.
    pub fn create_selector<A, R, F>(&self, body: F) -> Selector<A, R>
    where
        F: Fn(&Value, A) -> R + 'static,
        A: 'static,
        R: 'static,
    {
        Selector::new(self.clone(), body)
    }

    /// Create a reusable action handle. Whatever the body returns, including a
    /// future or a `Result`, is handed back unchanged.
    pub fn create_effect<A, R, F>(&self, body: F) -> Effect<A, R>
    where
        F: Fn(&Value, A) -> R + 'static,
        A: 'static,
        R: 'static,
    {
        Effect::new(self.clone(), body)
    }

    fn commit(&self, next: Value) -> Value {
        let (previous, version) = {
            let mut cells = self.inner.cells.borrow_mut();
            let previous = std::mem::replace(&mut cells.current, next.clone());
            cells.previous = previous.clone();
            cells.version += 1;
            (previous, cells.version)
        };
        self.notify(&previous, &next, version);
        next
    }

    fn notify(&self, previous: &Value, next: &Value, version: u64) {
        let pass = self.inner.registry.snapshot();

        #[cfg(feature = "tracing")]
        tracing::trace!(
            message = "stately.notify",
            store = self.inner.config.label(),
            subscribers = pass.len(),
            version,
        );
        #[cfg(not(feature = "tracing"))]
        let _ = version;

        for entry in &pass {
            entry.invoke(previous, next);
        }
    }
}

impl fmt::Debug for Store {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cells = self.inner.cells.borrow();
        f.debug_struct("Store")
            .field("label", &self.inner.config.label())
            .field("version", &cells.version)
            .field("subscribers", &self.inner.registry.len())
            .field("state", &cells.current)
            .finish()
    }
}

/// Non-owning counterpart of [`Store`], from [`Store::downgrade`].
#[derive(Clone, Default)]
pub struct WeakStore {
    inner: Weak<StoreInner>,
}

impl WeakStore {
    /// The store, if any strong handle to it still exists.
    #[must_use]
    pub fn upgrade(&self) -> Option<Store> {
        self.inner.upgrade().map(|inner| Store { inner })
    }
}

impl fmt::Debug for WeakStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeakStore")
            .field("alive", &(self.inner.strong_count() > 0))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stately_core::{DraftError, DraftResult, path};
    use std::cell::Cell;

    fn counter() -> Store {
        Store::new(Value::record([("n", Value::from(0))]))
    }

    #[test]
    fn starts_with_previous_equal_to_current() {
        let store = counter();
        assert!(store.state().ptr_eq(&store.previous()));
        assert_eq!(store.version(), 0);
    }

    #[test]
    fn mutate_swaps_and_bumps_version() {
        let store = counter();
        let before = store.state();
        let next = store
            .mutate(|draft| -> DraftResult<()> { draft.set(path!("n"), 1) })
            .unwrap();
        assert!(next.ptr_eq(&store.state()));
        assert!(before.ptr_eq(&store.previous()));
        assert_eq!(store.version(), 1);
    }

    #[test]
    fn failed_mutate_changes_nothing() {
        let store = counter();
        let before = store.state();
        let calls = Rc::new(Cell::new(0));
        let c = Rc::clone(&calls);
        let _sub = store.subscribe(move |_, _| c.set(c.get() + 1));

        let err = store
            .mutate(|draft| -> DraftResult<()> {
                draft.set(path!("n"), 5)?;
                draft.set(path!("missing", "deeper"), 1)
            })
            .unwrap_err();

        assert!(matches!(err, DraftError::PathNotFound { .. }));
        assert!(store.state().ptr_eq(&before));
        assert_eq!(store.version(), 0);
        assert_eq!(calls.get(), 0);
    }

    #[test]
    fn no_op_mutate_still_notifies() {
        let store = counter();
        let before = store.state();
        let calls = Rc::new(Cell::new(0));
        let c = Rc::clone(&calls);
        let _sub = store.subscribe(move |_, _| c.set(c.get() + 1));

        let next = store.mutate(|_| Ok::<_, DraftError>(())).unwrap();
        assert!(next.ptr_eq(&before));
        assert_eq!(calls.get(), 1);
        assert_eq!(store.version(), 1);
    }

    #[test]
    fn immediate_policy_fires_on_subscribe() {
        let store = Store::with_config(
            Value::from(1),
            StoreConfig::new().with_subscribe_policy(SubscribePolicy::Immediate),
        );
        let seen = Rc::new(RefCell::new(Vec::new()));
        let s = Rc::clone(&seen);
        let _sub = store.subscribe(move |prev, next| {
            s.borrow_mut().push((prev.as_int(), next.as_int()));
        });
        store.replace_state(2);
        assert_eq!(*seen.borrow(), vec![(Some(1), Some(1)), (Some(1), Some(2))]);
    }

    #[test]
    fn clones_share_state() {
        let a = counter();
        let b = a.clone();
        a.replace_state(Value::from("x"));
        assert!(a.ptr_eq(&b));
        assert_eq!(b.state().as_str(), Some("x"));
    }

    #[test]
    fn debug_does_not_panic_inside_callback() {
        let store = counter();
        let handle = store.clone();
        let rendered = Rc::new(RefCell::new(String::new()));
        let r = Rc::clone(&rendered);
        let _sub = store.subscribe(move |_, _| {
            *r.borrow_mut() = format!("{handle:?}");
        });
        store.replace_state(Value::from(3));
        assert!(rendered.borrow().contains("version: 1"));
    }

    #[test]
    fn weak_store_does_not_keep_store_alive() {
        let store = counter();
        let weak = store.downgrade();
        assert!(weak.upgrade().is_some_and(|s| s.ptr_eq(&store)));
        drop(store);
        assert!(weak.upgrade().is_none());
        assert!(WeakStore::default().upgrade().is_none());
    }
}
