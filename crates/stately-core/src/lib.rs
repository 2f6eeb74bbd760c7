#![forbid(unsafe_code)]

//! Core: the structural-sharing update engine.
//!
//! - [`Value`] / [`Record`]: the immutable, `Rc`-shared state tree.
//! - [`Path`] / [`Seg`] / [`path!`]: addressing nodes in the tree.
//! - [`Draft`]: copy-on-write view handed to recipes.
//! - [`produce`]: run a recipe and get the next tree.
//!
//! A `produce` call copies only the nodes on written paths; everything else
//! in the result is the same allocation as in the base, which is what lets
//! callers compare subtrees with [`Value::ptr_eq`] instead of deep equality.

pub mod draft;
pub mod error;
pub mod path;
pub mod produce;
pub mod value;

pub use draft::{Draft, DraftStats};
pub use error::{DraftError, DraftResult};
pub use path::{Path, Seg};
pub use produce::{RecipeOutput, produce, produce_with_stats};
pub use value::{Record, Value};
