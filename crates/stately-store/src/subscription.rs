#![forbid(unsafe_code)]

//! Subscription registry and the RAII [`Subscription`] guard.
//!
//! # Design
//!
//! Registrations live in an ordered `Vec<Rc<Entry>>`. Each entry has a
//! unique [`SubscriptionId`] and a `live` flag. A notification pass clones
//! the vector (a snapshot of `Rc`s) before calling anyone, so callbacks may
//! subscribe or unsubscribe freely while the pass runs:
//!
//! - Entries removed mid-pass have `live` cleared and are skipped for the
//!   rest of the pass.
//! - Entries added mid-pass are not in the snapshot and first hear about the
//!   next write.
//!
//! # Invariants
//!
//! 1. Callbacks run in registration order.
//! 2. Removal is by id; the same closure registered twice is two entries.
//! 3. Removing an id that is already gone is a no-op.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use stately_core::Value;

use crate::store::StoreInner;

type Callback = dyn Fn(&Value, &Value);

/// Identity of one registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

pub(crate) struct Entry {
    id: SubscriptionId,
    live: Cell<bool>,
    callback: Box<Callback>,
}

impl Entry {
    pub(crate) fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Run the callback unless the entry was removed.
    pub(crate) fn invoke(&self, previous: &Value, next: &Value) {
        if self.live.get() {
            (self.callback)(previous, next);
        }
    }
}

#[derive(Default)]
pub(crate) struct Registry {
    entries: RefCell<Vec<Rc<Entry>>>,
    next_id: Cell<u64>,
}

impl Registry {
    pub(crate) fn register(&self, callback: Box<Callback>) -> Rc<Entry> {
        let id = SubscriptionId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        let entry = Rc::new(Entry {
            id,
            live: Cell::new(true),
            callback,
        });
        self.entries.borrow_mut().push(Rc::clone(&entry));
        entry
    }

    /// Remove a registration. Returns whether it was still present.
    pub(crate) fn remove(&self, id: SubscriptionId) -> bool {
        let mut entries = self.entries.borrow_mut();
        let Some(pos) = entries.iter().position(|e| e.id == id) else {
            return false;
        };
        let entry = entries.remove(pos);
        entry.live.set(false);
        true
    }

    pub(crate) fn contains(&self, id: SubscriptionId) -> bool {
        self.entries.borrow().iter().any(|e| e.id == id)
    }

    /// The registrations a notification pass starting now must reach.
    pub(crate) fn snapshot(&self) -> Vec<Rc<Entry>> {
        self.entries.borrow().clone()
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.borrow().len()
    }
}

/// Handle for one registration made with [`Store::subscribe`](crate::Store::subscribe).
///
/// Dropping the handle unsubscribes. Call [`detach`](Self::detach) to keep
/// the callback registered for as long as the store lives.
#[must_use = "dropping a Subscription unsubscribes immediately; call .detach() to keep it"]
pub struct Subscription {
    store: Weak<StoreInner>,
    id: SubscriptionId,
}

impl Subscription {
    pub(crate) fn new(store: Weak<StoreInner>, id: SubscriptionId) -> Self {
        Self { store, id }
    }

    #[must_use]
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Whether this registration is still in the store.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.store
            .upgrade()
            .is_some_and(|store| store.registry().contains(self.id))
    }

    /// Remove this registration. Safe to call any number of times, including
    /// from inside a notification.
    pub fn unsubscribe(&self) {
        if let Some(store) = self.store.upgrade() {
            store.registry().remove(self.id);
        }
    }

    /// Give up the handle without unsubscribing.
    pub fn detach(mut self) {
        self.store = Weak::new();
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("active", &self.is_active())
            .finish()
    }
}
