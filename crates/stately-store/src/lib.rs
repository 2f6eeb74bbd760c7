#![forbid(unsafe_code)]

//! Single-writer observable store.
//!
//! - [`Store`]: owns the current and previous state and the write path.
//! - [`Mutator`], [`Selector`], [`Effect`]: typed handles created from a store.
//! - [`Subscription`]: RAII guard for a `(previous, next)` callback.
//! - [`StoreConfig`]: subscribe policy and log label.
//!
//! Everything here is single-threaded (`Rc`-based, `!Send`). Writes,
//! notifications and reads are synchronous; reentrant writes from subscribers
//! or bodies are allowed and nest.

pub mod config;
pub mod handles;
pub mod store;
pub mod subscription;

pub use config::{StoreConfig, SubscribePolicy};
pub use handles::{Effect, Mutator, Selector};
pub use store::{Store, WeakStore};
pub use subscription::{Subscription, SubscriptionId};

pub use stately_core::{Draft, DraftError, DraftResult, Path, Value};
