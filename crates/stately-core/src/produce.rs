#![forbid(unsafe_code)]

//! The `produce` entry point.
//!
//! `produce(base, recipe)` runs `recipe` against a fresh [`Draft`] over
//! `base` and returns the finished tree. Nothing is shared between calls, so
//! a recipe may call `produce` on an unrelated value while it runs.
//!
//! # Failure Modes
//!
//! - **Recipe returns `Err`**: the draft is dropped and the error is handed
//!   back unchanged. `base` was never written, so no partial result exists.
//! - **Recipe panics**: same as above, via unwinding.

use crate::draft::{Draft, DraftStats};
use crate::value::Value;

/// What a recipe may hand back besides its writes.
///
/// `()` keeps the draft. A [`Value`] replaces the whole result and discards
/// the draft; `Option<Value>` does so only when `Some`.
pub trait RecipeOutput {
    fn into_replacement(self) -> Option<Value>;
}

impl RecipeOutput for () {
    #[inline]
    fn into_replacement(self) -> Option<Value> {
        None
    }
}

impl RecipeOutput for Value {
    #[inline]
    fn into_replacement(self) -> Option<Value> {
        Some(self)
    }
}

impl RecipeOutput for Option<Value> {
    #[inline]
    fn into_replacement(self) -> Option<Value> {
        self
    }
}

/// Derive a new tree from `base` by running `recipe` on a draft.
///
/// Untouched subtrees of the result are the same allocations as in `base`.
/// A recipe that makes no effective write returns a value identical to
/// `base`.
///
/// ```
/// use stately_core::{path, produce, DraftResult, Value};
///
/// let base = Value::from(serde_json::json!({"a": "a", "b": {"c": "d", "d": 1}}));
/// let next = produce(&base, |draft| -> DraftResult<()> {
///     draft.set(path!("b", "d"), 2)
/// })
/// .unwrap();
///
/// assert_eq!(next.get_path(&path!("b", "d")).and_then(Value::as_int), Some(2));
/// assert!(next.get("a").unwrap().ptr_eq(base.get("a").unwrap()));
/// assert!(!next.get("b").unwrap().ptr_eq(base.get("b").unwrap()));
/// ```
pub fn produce<O, E, F>(base: &Value, recipe: F) -> Result<Value, E>
where
    F: FnOnce(&mut Draft) -> Result<O, E>,
    O: RecipeOutput,
{
    produce_with_stats(base, recipe).map(|(value, _)| value)
}

/// Like [`produce`], also reporting how many nodes were copied.
pub fn produce_with_stats<O, E, F>(base: &Value, recipe: F) -> Result<(Value, DraftStats), E>
where
    F: FnOnce(&mut Draft) -> Result<O, E>,
    O: RecipeOutput,
{
    #[cfg(feature = "tracing")]
    let span = tracing::debug_span!(
        "stately.produce",
        records_copied = tracing::field::Empty,
        lists_copied = tracing::field::Empty,
        writes = tracing::field::Empty,
        replaced = tracing::field::Empty,
    );
    #[cfg(feature = "tracing")]
    let _guard = span.enter();

    let mut draft = Draft::new(base);
    let replacement = recipe(&mut draft)?.into_replacement();

    #[cfg(feature = "tracing")]
    span.record("replaced", replacement.is_some());

    let (value, stats) = draft.finish(replacement);

    #[cfg(feature = "tracing")]
    {
        span.record("records_copied", stats.records_copied as u64);
        span.record("lists_copied", stats.lists_copied as u64);
        span.record("writes", stats.writes as u64);
    }

    Ok((value, stats))
}
