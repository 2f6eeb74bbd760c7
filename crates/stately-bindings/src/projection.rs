#![forbid(unsafe_code)]

//! Read projection: a derived value kept in step with a store.
//!
//! # Design
//!
//! A [`Projection<R>`] holds one store subscription for its whole life. The
//! mapping function sits behind a `RefCell` so a caller that rebuilds its
//! mapper on every frame can swap it in with [`set_mapper`](Projection::set_mapper)
//! without touching the subscription. Each notification runs the latest
//! mapper once against the store's current state; the result is published
//! only if it differs from the last published value.
//!
//! The current state rather than the pass's `next` is what gets mapped. When
//! an earlier subscriber writes during a pass, the nested pass publishes the
//! newer state first, and the resumed outer pass must not overwrite it.
//!
//! The subscription callback holds weak handles to the projection state and
//! to the store, so a dropped projection never keeps itself alive through the
//! store.
//!
//! # Invariants
//!
//! 1. The mapper runs exactly once per store notification.
//! 2. `version()` increments by 1 per publish and never otherwise.
//! 3. Listeners run after the new value is stored, in registration order.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use stately_store::{Store, Subscription, Value};

type Mapper<R> = dyn Fn(&Value) -> R;
type Listener<R> = dyn Fn(&R);

/// Identity of a listener added with [`Projection::on_publish`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

struct Shared<R> {
    mapper: RefCell<Rc<Mapper<R>>>,
    value: RefCell<R>,
    version: Cell<u64>,
    listeners: RefCell<Vec<(ListenerId, Rc<Listener<R>>)>>,
    next_listener: Cell<u64>,
}

impl<R: Clone + PartialEq + 'static> Shared<R> {
    fn derive(&self, state: &Value) -> R {
        let mapper = Rc::clone(&self.mapper.borrow());
        mapper(state)
    }

    /// Store `derived` and run listeners if it differs. Returns whether it did.
    fn publish(&self, derived: R) -> bool {
        if *self.value.borrow() == derived {
            return false;
        }
        *self.value.borrow_mut() = derived.clone();
        self.version.set(self.version.get() + 1);

        #[cfg(feature = "tracing")]
        tracing::debug!(
            message = "stately.projection.publish",
            version = self.version.get(),
        );

        let listeners: Vec<_> = self
            .listeners
            .borrow()
            .iter()
            .map(|(_, l)| Rc::clone(l))
            .collect();
        for listener in listeners {
            listener(&derived);
        }
        true
    }
}

/// A value derived from a store's state, re-derived on every notification.
///
/// ```
/// use stately_bindings::Projection;
/// use stately_store::{Store, Value};
///
/// let store = Store::new(Value::record([("count", Value::from(1))]));
/// let count = Projection::new(&store, |state| state.get("count").and_then(Value::as_int));
/// assert_eq!(count.get(), Some(1));
///
/// store.replace_state(Value::record([("count", Value::from(2))]));
/// assert_eq!(count.get(), Some(2));
/// assert_eq!(count.version(), 1);
/// ```
pub struct Projection<R> {
    shared: Rc<Shared<R>>,
    store: Store,
    subscription: Subscription,
}

impl<R: Clone + PartialEq + 'static> Projection<R> {
    /// Derive the initial value from the current state and subscribe.
    pub fn new<F>(store: &Store, mapper: F) -> Self
    where
        F: Fn(&Value) -> R + 'static,
    {
        let mapper: Rc<Mapper<R>> = Rc::new(mapper);
        let initial = mapper(&store.state());
        let shared = Rc::new(Shared {
            mapper: RefCell::new(mapper),
            value: RefCell::new(initial),
            version: Cell::new(0),
            listeners: RefCell::new(Vec::new()),
            next_listener: Cell::new(0),
        });

        let weak: Weak<Shared<R>> = Rc::downgrade(&shared);
        let source = store.downgrade();
        let subscription = store.subscribe(move |_, _| {
            // Derive from the latest state, not the pass's `next`: a nested
            // write may already have published something newer.
            if let Some(shared) = weak.upgrade()
                && let Some(store) = source.upgrade()
            {
                let derived = shared.derive(&store.state());
                shared.publish(derived);
            }
        });

        Self {
            shared,
            store: store.clone(),
            subscription,
        }
    }

    /// The last published value.
    #[must_use]
    pub fn get(&self) -> R {
        self.shared.value.borrow().clone()
    }

    /// Borrow the last published value.
    pub fn with<T>(&self, f: impl FnOnce(&R) -> T) -> T {
        f(&self.shared.value.borrow())
    }

    /// Number of publishes since creation.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.shared.version.get()
    }

    /// Use `mapper` from the next notification on. The subscription is kept.
    pub fn set_mapper<F>(&self, mapper: F)
    where
        F: Fn(&Value) -> R + 'static,
    {
        *self.shared.mapper.borrow_mut() = Rc::new(mapper);
    }

    /// Re-derive from the store's current state now, publishing on change.
    pub fn refresh(&self) -> bool {
        let derived = self.shared.derive(&self.store.state());
        self.shared.publish(derived)
    }

    /// Run `listener` with each newly published value.
    pub fn on_publish<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&R) + 'static,
    {
        let id = ListenerId(self.shared.next_listener.get());
        self.shared.next_listener.set(id.0 + 1);
        self.shared
            .listeners
            .borrow_mut()
            .push((id, Rc::new(listener)));
        id
    }

    /// Remove a listener. Returns whether it was present.
    pub fn remove_listener(&self, id: ListenerId) -> bool {
        let mut listeners = self.shared.listeners.borrow_mut();
        let before = listeners.len();
        listeners.retain(|(lid, _)| *lid != id);
        listeners.len() != before
    }

    #[must_use]
    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Whether the store subscription is still registered.
    #[must_use]
    pub fn is_subscribed(&self) -> bool {
        self.subscription.is_active()
    }
}

impl<R: fmt::Debug> fmt::Debug for Projection<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Projection")
            .field("value", &*self.shared.value.borrow())
            .field("version", &self.shared.version.get())
            .finish_non_exhaustive()
    }
}
