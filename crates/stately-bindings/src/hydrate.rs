#![forbid(unsafe_code)]

//! Handing a store's state from a first render to a later session.
//!
//! The producing side captures a [`DehydratedState`] and ships it as JSON.
//! The consuming side keeps one [`SessionSlot`] per session and calls
//! [`SessionSlot::hydrate`]. The first call builds a store and loads the
//! payload into it; later calls return the same store and ignore the payload.
//!
//! Nothing here is global. Whoever owns the session owns the slot.

use serde::{Deserialize, Serialize};
use stately_store::{Store, Value};

use crate::error::{HydrateError, HydrateResult};

/// A store's state, ready to be serialized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DehydratedState {
    pub state: Value,
    /// Writes the source store had seen when the state was captured.
    #[serde(default)]
    pub version: u64,
}

impl DehydratedState {
    #[must_use]
    pub fn capture(store: &Store) -> Self {
        Self {
            state: store.state(),
            version: store.version(),
        }
    }

    pub fn to_json(&self) -> HydrateResult<String> {
        serde_json::to_string(self).map_err(HydrateError::Encode)
    }

    pub fn from_json(json: &str) -> HydrateResult<Self> {
        serde_json::from_str(json).map_err(HydrateError::Decode)
    }
}

/// Holds at most one store for a session.
#[derive(Debug, Default)]
pub struct SessionSlot {
    store: Option<Store>,
}

impl SessionSlot {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The session's store, if one was built.
    #[must_use]
    pub fn get(&self) -> Option<&Store> {
        self.store.as_ref()
    }

    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.store.is_some()
    }

    /// The session's store, building it with `make_store` on first use.
    pub fn get_or_init(&mut self, make_store: impl FnOnce() -> Store) -> Store {
        self.store.get_or_insert_with(make_store).clone()
    }

    /// Reuse the session's store, or build one and load `payload` into it.
    ///
    /// On the build path the payload goes in with
    /// [`replace_state`](Store::replace_state) before the store is handed
    /// out, so no caller of this method can subscribe in time to see the
    /// state `make_store` started with.
    pub fn hydrate(
        &mut self,
        payload: DehydratedState,
        make_store: impl FnOnce() -> Store,
    ) -> Store {
        if let Some(store) = &self.store {
            #[cfg(feature = "tracing")]
            tracing::debug!(
                message = "stately.hydrate",
                reused = true,
                store = store.config().label(),
            );
            return store.clone();
        }

        let store = make_store();
        store.replace_state(payload.state);

        #[cfg(feature = "tracing")]
        tracing::debug!(
            message = "stately.hydrate",
            reused = false,
            store = store.config().label(),
            source_version = payload.version,
        );

        self.store = Some(store.clone());
        store
    }

    /// [`hydrate`](Self::hydrate) from the JSON produced by
    /// [`DehydratedState::to_json`].
    ///
    /// A reused store is returned without decoding `json`.
    pub fn hydrate_json(
        &mut self,
        json: &str,
        make_store: impl FnOnce() -> Store,
    ) -> HydrateResult<Store> {
        if let Some(store) = &self.store {
            return Ok(store.clone());
        }
        let payload = DehydratedState::from_json(json)?;
        Ok(self.hydrate(payload, make_store))
    }

    /// Drop the session's store, e.g. at the end of a request.
    pub fn take(&mut self) -> Option<Store> {
        self.store.take()
    }
}
