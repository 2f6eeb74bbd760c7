#![forbid(unsafe_code)]

//! Memoizing adapters for selector bodies.
//!
//! Selectors do no caching of their own. Wrapping a body in one of these
//! makes a selector that builds a new container return the same allocation
//! while its inputs are unchanged.
//!
//! - [`memoize_one`] keys on the identity of the whole state plus argument
//!   equality.
//! - [`memoize_at`] keys on the identity of one subtree plus argument
//!   equality, so writes elsewhere in the state keep the cache warm.
//!
//! Both remember only the most recent call.

use std::cell::RefCell;

use stately_core::Path;
use stately_store::Value;

fn same_subtree(a: Option<&Value>, b: Option<&Value>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => a.ptr_eq(b),
        (None, None) => true,
        _ => false,
    }
}

/// Cache the last result of `f`, reused while the state is the same
/// allocation and the arguments compare equal.
///
/// ```
/// use stately_bindings::memoize_one;
/// use stately_store::{Store, Value};
///
/// let store = Store::new(Value::record([("b", Value::from(1))]));
/// let wrap = store.create_selector(memoize_one(|state: &Value, ()| {
///     Value::record([("newObj", state.get("b").cloned().unwrap_or_default())])
/// }));
/// assert!(wrap.call(()).ptr_eq(&wrap.call(())));
/// ```
pub fn memoize_one<A, R, F>(f: F) -> impl Fn(&Value, A) -> R
where
    A: PartialEq + Clone,
    R: Clone,
    F: Fn(&Value, A) -> R,
{
    let cache: RefCell<Option<(Value, A, R)>> = RefCell::new(None);
    move |state: &Value, args: A| {
        if let Some((cached_state, cached_args, result)) = &*cache.borrow()
            && cached_state.ptr_eq(state)
            && *cached_args == args
        {
            return result.clone();
        }
        let result = f(state, args.clone());
        *cache.borrow_mut() = Some((state.clone(), args, result.clone()));
        result
    }
}

/// Cache the last result of `f`, reused while the subtree at `path` is the
/// same allocation and the arguments compare equal.
///
/// `f` receives the subtree (`None` when `path` does not resolve), never the
/// whole state.
pub fn memoize_at<A, R, F>(path: Path, f: F) -> impl Fn(&Value, A) -> R
where
    A: PartialEq + Clone,
    R: Clone,
    F: Fn(Option<&Value>, A) -> R,
{
    let cache: RefCell<Option<(Option<Value>, A, R)>> = RefCell::new(None);
    move |state: &Value, args: A| {
        let subtree = state.get_path(&path);
        if let Some((cached_subtree, cached_args, result)) = &*cache.borrow()
            && same_subtree(cached_subtree.as_ref(), subtree)
            && *cached_args == args
        {
            return result.clone();
        }
        let result = f(subtree, args.clone());
        *cache.borrow_mut() = Some((subtree.cloned(), args, result.clone()));
        result
    }
}
