#![forbid(unsafe_code)]

//! Copy-on-write drafts.
//!
//! A [`Draft`] is the write-capable view handed to a recipe for the duration
//! of one [`produce`](crate::produce) call. It starts out aliasing the base
//! value and copies nodes lazily:
//!
//! - The first write under a node copies that node and every ancestor up to
//!   the root, each one shallowly. Children that are not on the written path
//!   are shared with the base.
//! - A node copied earlier in the same call is owned by the draft alone, so
//!   further writes under it go straight to the copy.
//!
//! Ownership is tracked through `Rc` uniqueness: a node reachable from the
//! base is always shared (the base keeps it alive), a node copied by this
//! draft is unique. That makes the per-call "visited node → pending copy"
//! table implicit in the tree itself.
//!
//! # Invariants
//!
//! 1. The base value is never modified.
//! 2. Every write validates its whole path before copying anything, so a
//!    rejected write leaves the draft exactly as it was.
//! 3. Each container is copied at most once per draft.
//! 4. Cost of a write is O(depth) plus the shallow size of the copied nodes.

use std::rc::Rc;

use crate::error::{DraftError, DraftResult};
use crate::path::{Path, Seg};
use crate::value::{Record, Value};

/// Copy counters for one draft.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DraftStats {
    /// Records shallow-copied.
    pub records_copied: usize,
    /// Lists shallow-copied.
    pub lists_copied: usize,
    /// Writes that changed the draft.
    pub writes: usize,
}

impl DraftStats {
    /// Total containers copied.
    #[must_use]
    pub fn nodes_copied(&self) -> usize {
        self.records_copied + self.lists_copied
    }
}

/// Write-capable view over a state value, scoped to one `produce` call.
#[derive(Debug)]
pub struct Draft {
    base: Value,
    root: Value,
    stats: DraftStats,
}

impl Draft {
    pub(crate) fn new(base: &Value) -> Self {
        Self {
            base: base.clone(),
            root: base.clone(),
            stats: DraftStats::default(),
        }
    }

    /// The value this draft started from. Never changes.
    #[must_use]
    pub fn base(&self) -> &Value {
        &self.base
    }

    /// The draft's current tree, including writes made so far.
    #[must_use]
    pub fn root(&self) -> &Value {
        &self.root
    }

    /// Read through the draft.
    #[must_use]
    pub fn get(&self, path: impl AsRef<Path>) -> Option<&Value> {
        self.root.get_path(path.as_ref())
    }

    #[must_use]
    pub fn stats(&self) -> DraftStats {
        self.stats
    }

    /// Whether the draft has diverged from its base.
    #[must_use]
    pub fn is_modified(&self) -> bool {
        !self.root.ptr_eq(&self.base)
    }

    /// Assign `value` at `path`.
    ///
    /// On a record the field is inserted or replaced. On a list the index must
    /// be within the list, or equal to its length to append. The root path
    /// replaces the whole tree.
    ///
    /// Assigning the value already at `path` (same identity, or an equal
    /// string) is not a write and copies nothing.
    pub fn set(&mut self, path: impl AsRef<Path>, value: impl Into<Value>) -> DraftResult<()> {
        let path = path.as_ref();
        let value = value.into();

        if self
            .root
            .get_path(path)
            .is_some_and(|current| same_assignment(current, &value))
        {
            return Ok(());
        }

        let Some((last, parent)) = path.segments().split_last() else {
            self.root = value;
            self.stats.writes += 1;
            return Ok(());
        };

        let parent_node = resolve(&self.root, path, parent.len())?;
        match (parent_node, last) {
            (Value::Record(_), Seg::Key(_)) => {}
            (Value::List(items), Seg::Index(i)) if *i <= items.len() => {}
            (Value::List(items), Seg::Index(i)) => {
                return Err(DraftError::index_out_of_bounds(
                    path.truncated(parent.len()),
                    *i,
                    items.len(),
                ));
            }
            (node, seg) => return Err(mismatch(path, parent.len(), node, seg)),
        }

        let slot = descend_mut(&mut self.root, parent, &mut self.stats)?;
        match (slot, last) {
            (Value::Record(rec), Seg::Key(k)) => {
                unique_record(rec, &mut self.stats).insert(k.as_str(), value);
            }
            (Value::List(items), Seg::Index(i)) => {
                let items = unique_list(items, &mut self.stats);
                match items.get_mut(*i) {
                    Some(slot) => *slot = value,
                    None => items.push(value),
                }
            }
            (node, seg) => return Err(mismatch(path, parent.len(), node, seg)),
        }
        self.stats.writes += 1;
        Ok(())
    }

    /// Replace the value at `path` with `f(current)`.
    ///
    /// The target must exist.
    pub fn update<F>(&mut self, path: impl AsRef<Path>, f: F) -> DraftResult<()>
    where
        F: FnOnce(&Value) -> Value,
    {
        let path = path.as_ref();
        let next = f(resolve(&self.root, path, path.len())?);
        self.set(path, next)
    }

    /// Remove the field or element at `path`, returning it.
    ///
    /// Removing a missing record field is a no-op returning `None`. List
    /// elements after the removed one shift down.
    pub fn remove(&mut self, path: impl AsRef<Path>) -> DraftResult<Option<Value>> {
        let path = path.as_ref();
        let Some((last, parent)) = path.segments().split_last() else {
            return Err(DraftError::type_mismatch(Path::root(), "child path", "root"));
        };

        match (resolve(&self.root, path, parent.len())?, last) {
            (Value::Record(rec), Seg::Key(k)) if !rec.contains_key(k) => return Ok(None),
            (Value::Record(_), Seg::Key(_)) => {}
            (Value::List(items), Seg::Index(i)) if *i < items.len() => {}
            (Value::List(items), Seg::Index(i)) => {
                return Err(DraftError::index_out_of_bounds(
                    path.truncated(parent.len()),
                    *i,
                    items.len(),
                ));
            }
            (node, seg) => return Err(mismatch(path, parent.len(), node, seg)),
        }

        let removed = match (descend_mut(&mut self.root, parent, &mut self.stats)?, last) {
            (Value::Record(rec), Seg::Key(k)) => unique_record(rec, &mut self.stats).remove(k),
            (Value::List(items), Seg::Index(i)) => {
                Some(unique_list(items, &mut self.stats).remove(*i))
            }
            (node, seg) => return Err(mismatch(path, parent.len(), node, seg)),
        };
        self.stats.writes += 1;
        Ok(removed)
    }

    /// Append to the list at `path`.
    pub fn push(&mut self, path: impl AsRef<Path>, value: impl Into<Value>) -> DraftResult<()> {
        let path = path.as_ref();
        let len = list_len(&self.root, path)?;
        self.insert(path, len, value)
    }

    /// Insert into the list at `path`, shifting later elements up.
    ///
    /// `index` may equal the list length.
    pub fn insert(
        &mut self,
        path: impl AsRef<Path>,
        index: usize,
        value: impl Into<Value>,
    ) -> DraftResult<()> {
        let path = path.as_ref();
        let len = list_len(&self.root, path)?;
        if index > len {
            return Err(DraftError::index_out_of_bounds(path.clone(), index, len));
        }
        let value = value.into();
        match descend_mut(&mut self.root, path.segments(), &mut self.stats)? {
            Value::List(items) => unique_list(items, &mut self.stats).insert(index, value),
            node => {
                return Err(DraftError::type_mismatch(
                    path.clone(),
                    "list",
                    node.type_name(),
                ));
            }
        }
        self.stats.writes += 1;
        Ok(())
    }

    /// Swap the whole tree for `value`.
    ///
    /// Copy bookkeeping gathered so far is discarded; later writes apply to
    /// the replacement.
    pub fn replace(&mut self, value: impl Into<Value>) {
        self.root = value.into();
        self.stats = DraftStats {
            writes: 1,
            ..DraftStats::default()
        };
    }

    /// Finalize. A replacement returned by the recipe wins over the draft.
    pub(crate) fn finish(self, replacement: Option<Value>) -> (Value, DraftStats) {
        match replacement {
            Some(value) => (value, DraftStats::default()),
            None => (self.root, self.stats),
        }
    }
}

/// Assignment that would leave the tree unchanged.
fn same_assignment(current: &Value, next: &Value) -> bool {
    match (current, next) {
        (Value::Str(a), Value::Str(b)) => a == b,
        _ => current.ptr_eq(next),
    }
}

/// Follow the first `depth` segments of `path`, read-only, with errors that
/// name the failing prefix.
fn resolve<'a>(root: &'a Value, path: &Path, depth: usize) -> DraftResult<&'a Value> {
    let mut node = root;
    for (at, seg) in path.segments()[..depth].iter().enumerate() {
        node = match (node, seg) {
            (Value::Record(rec), Seg::Key(k)) => rec
                .get(k)
                .ok_or_else(|| DraftError::path_not_found(path.truncated(at + 1)))?,
            (Value::List(items), Seg::Index(i)) => items.get(*i).ok_or_else(|| {
                DraftError::index_out_of_bounds(path.truncated(at), *i, items.len())
            })?,
            (node, seg) => return Err(mismatch(path, at, node, seg)),
        };
    }
    Ok(node)
}

fn list_len(root: &Value, path: &Path) -> DraftResult<usize> {
    match resolve(root, path, path.len())? {
        Value::List(items) => Ok(items.len()),
        node => Err(DraftError::type_mismatch(
            path.clone(),
            "list",
            node.type_name(),
        )),
    }
}

fn mismatch(path: &Path, depth: usize, node: &Value, seg: &Seg) -> DraftError {
    let expected = match seg {
        Seg::Key(_) => "record",
        Seg::Index(_) => "list",
    };
    DraftError::type_mismatch(path.truncated(depth), expected, node.type_name())
}

/// Walk `segs` from `root`, making every container on the way unique.
///
/// Callers validate the path first; a failure here means the tree changed
/// shape under us and is reported rather than panicking.
fn descend_mut<'a>(
    root: &'a mut Value,
    segs: &[Seg],
    stats: &mut DraftStats,
) -> DraftResult<&'a mut Value> {
    let mut node = root;
    for (at, seg) in segs.iter().enumerate() {
        let found = node.type_name();
        node = match (node, seg) {
            (Value::Record(rec), Seg::Key(k)) => unique_record(rec, stats).get_mut(k),
            (Value::List(items), Seg::Index(i)) => unique_list(items, stats).get_mut(*i),
            _ => None,
        }
        .ok_or_else(|| {
            let path = Path::from_segments(segs[..=at].to_vec());
            DraftError::type_mismatch(path, "existing child", found)
        })?;
    }
    Ok(node)
}

fn unique_record<'a>(rec: &'a mut Rc<Record>, stats: &mut DraftStats) -> &'a mut Record {
    if Rc::get_mut(rec).is_none() {
        stats.records_copied += 1;
    }
    Rc::make_mut(rec)
}

fn unique_list<'a>(items: &'a mut Rc<Vec<Value>>, stats: &mut DraftStats) -> &'a mut Vec<Value> {
    if Rc::get_mut(items).is_none() {
        stats.lists_copied += 1;
    }
    Rc::make_mut(items)
}
