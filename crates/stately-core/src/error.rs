#![forbid(unsafe_code)]

//! Errors raised by draft navigation and path parsing.

use crate::Path;
use thiserror::Error;

/// Result alias for draft operations.
pub type DraftResult<T> = Result<T, DraftError>;

/// Errors that can occur while reading or writing through a [`Draft`](crate::Draft).
///
/// Every variant carries the path at which navigation stopped, so a failing
/// write deep inside a recipe can be located from the message alone.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DraftError {
    /// A record field on the way to the target does not exist.
    #[error("path not found: {path}")]
    PathNotFound {
        /// The path that was not found.
        path: Path,
    },

    /// A list index is past the end of the list.
    #[error("index {index} out of bounds (len: {len}) at {path}")]
    IndexOutOfBounds {
        /// The path of the list.
        path: Path,
        /// The index that was requested.
        index: usize,
        /// The length of the list.
        len: usize,
    },

    /// The node at `path` has the wrong shape for the requested step.
    #[error("type mismatch at {path}: expected {expected}, found {found}")]
    TypeMismatch {
        /// The path of the offending node.
        path: Path,
        /// The kind of node the operation needed.
        expected: &'static str,
        /// The kind of node actually present.
        found: &'static str,
    },

    /// Text given to [`Path::parse`] is not a valid path.
    #[error("invalid path {input:?}: {reason}")]
    InvalidPath {
        /// The rejected input.
        input: String,
        /// What was wrong with it.
        reason: &'static str,
    },
}

impl DraftError {
    #[inline]
    pub fn path_not_found(path: Path) -> Self {
        Self::PathNotFound { path }
    }

    #[inline]
    pub fn index_out_of_bounds(path: Path, index: usize, len: usize) -> Self {
        Self::IndexOutOfBounds { path, index, len }
    }

    #[inline]
    pub fn type_mismatch(path: Path, expected: &'static str, found: &'static str) -> Self {
        Self::TypeMismatch {
            path,
            expected,
            found,
        }
    }

    #[inline]
    pub fn invalid_path(input: impl Into<String>, reason: &'static str) -> Self {
        Self::InvalidPath {
            input: input.into(),
            reason,
        }
    }

    /// The path the error refers to, if it has one.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::PathNotFound { path }
            | Self::IndexOutOfBounds { path, .. }
            | Self::TypeMismatch { path, .. } => Some(path),
            Self::InvalidPath { .. } => None,
        }
    }
}
