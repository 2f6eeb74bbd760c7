#![forbid(unsafe_code)]

//! Helpers for code that sits around a store rather than inside it.
//!
//! - [`Projection`]: a derived value that follows the store, for UI layers
//!   that re-render when it changes.
//! - [`DehydratedState`] / [`SessionSlot`]: move state from a first render to
//!   a later session without a global store.
//! - [`memoize_one`] / [`memoize_at`]: last-call caches for selector bodies.

pub mod error;
pub mod hydrate;
pub mod memo;
pub mod projection;

pub use error::{HydrateError, HydrateResult};
pub use hydrate::{DehydratedState, SessionSlot};
pub use memo::{memoize_at, memoize_one};
pub use projection::{ListenerId, Projection};
