#![forbid(unsafe_code)]

//! Paths into a state tree.
//!
//! A [`Path`] is a sequence of [`Seg`]ments: record field names and list
//! indices. Paths are how a [`Draft`](crate::Draft) is told where to write.
//!
//! # Text form
//!
//! `Display` renders paths as `$.users[0].name`. [`Path::parse`] accepts that
//! form and also the bare `users[0].name` form.
//!
//! Keys that are empty or contain `.`, `[` or `]` are written quoted inside
//! brackets, `$["a.b"][0]`, with `"` and `\` escaped by a backslash. Every
//! path's `Display` output parses back to the same path.

use std::fmt;

use crate::error::{DraftError, DraftResult};

/// A single step in a [`Path`].
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Seg {
    /// Record field access.
    Key(String),
    /// List element access.
    Index(usize),
}

impl Seg {
    #[inline]
    pub fn key(k: impl Into<String>) -> Self {
        Seg::Key(k.into())
    }

    #[inline]
    pub fn index(i: usize) -> Self {
        Seg::Index(i)
    }

    #[inline]
    #[must_use]
    pub fn as_key(&self) -> Option<&str> {
        match self {
            Seg::Key(k) => Some(k),
            Seg::Index(_) => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_index(&self) -> Option<usize> {
        match self {
            Seg::Key(_) => None,
            Seg::Index(i) => Some(*i),
        }
    }
}

impl fmt::Display for Seg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Seg::Key(k) if needs_quoting(k) => {
                f.write_str("[\"")?;
                for c in k.chars() {
                    if matches!(c, '"' | '\\') {
                        f.write_str("\\")?;
                    }
                    write!(f, "{c}")?;
                }
                f.write_str("\"]")
            }
            Seg::Key(k) => write!(f, ".{k}"),
            Seg::Index(i) => write!(f, "[{i}]"),
        }
    }
}

fn needs_quoting(key: &str) -> bool {
    key.is_empty() || key.contains(['.', '[', ']'])
}

/// Read a quoted key starting just after its opening `"`. Returns the key and
/// the byte offset just past the closing `"`.
fn read_quoted(text: &str, start: usize) -> Option<(String, usize)> {
    let mut key = String::new();
    let mut chars = text[start..].char_indices();
    while let Some((off, c)) = chars.next() {
        match c {
            '"' => return Some((key, start + off + 1)),
            '\\' => key.push(chars.next()?.1),
            c => key.push(c),
        }
    }
    None
}

impl From<String> for Seg {
    fn from(s: String) -> Self {
        Seg::Key(s)
    }
}

impl From<&str> for Seg {
    fn from(s: &str) -> Self {
        Seg::Key(s.to_owned())
    }
}

impl From<usize> for Seg {
    fn from(i: usize) -> Self {
        Seg::Index(i)
    }
}

/// A location in a state tree, from the root down.
///
/// The empty path addresses the root itself.
///
/// ```
/// use stately_core::Path;
///
/// let p = Path::root().key("b").key("d");
/// assert_eq!(p.to_string(), "$.b.d");
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Path(Vec<Seg>);

impl Path {
    #[inline]
    #[must_use]
    pub fn root() -> Self {
        Self(Vec::new())
    }

    #[inline]
    #[must_use]
    pub fn from_segments(segments: Vec<Seg>) -> Self {
        Self(segments)
    }

    /// Append a key segment (builder style).
    #[inline]
    #[must_use]
    pub fn key(mut self, k: impl Into<String>) -> Self {
        self.0.push(Seg::Key(k.into()));
        self
    }

    /// Append an index segment (builder style).
    #[inline]
    #[must_use]
    pub fn index(mut self, i: usize) -> Self {
        self.0.push(Seg::Index(i));
        self
    }

    #[inline]
    pub fn push(&mut self, seg: Seg) {
        self.0.push(seg);
    }

    #[inline]
    pub fn pop(&mut self) -> Option<Seg> {
        self.0.pop()
    }

    #[inline]
    #[must_use]
    pub fn segments(&self) -> &[Seg] {
        &self.0
    }

    #[inline]
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[inline]
    #[must_use]
    pub fn last(&self) -> Option<&Seg> {
        self.0.last()
    }

    /// The path without its last segment, or `None` for the root.
    #[must_use]
    pub fn parent(&self) -> Option<Path> {
        let (_, init) = self.0.split_last()?;
        Some(Path(init.to_vec()))
    }

    #[must_use]
    pub fn join(&self, other: &Path) -> Path {
        let mut out = self.clone();
        out.0.extend(other.0.iter().cloned());
        out
    }

    /// Whether every segment of `self` matches the start of `other`.
    ///
    /// A path is a prefix of itself.
    #[must_use]
    pub fn is_prefix_of(&self, other: &Path) -> bool {
        other.0.starts_with(&self.0)
    }

    /// The first `len` segments as a new path.
    #[must_use]
    pub fn truncated(&self, len: usize) -> Path {
        Path(self.0[..len.min(self.0.len())].to_vec())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Seg> {
        self.0.iter()
    }

    /// Parse the text form of a path.
    ///
    /// Accepts an optional leading `$`, dotted keys, bracketed indices and
    /// bracketed quoted keys: `$.b.items[0]`, `b.items[0]`, `[2].name`,
    /// `$["a.b"].c`. The empty string and `$` both parse to the root.
    pub fn parse(input: &str) -> DraftResult<Path> {
        let rest = input.strip_prefix('$').unwrap_or(input);
        let bytes = rest.as_bytes();
        let mut segments = Vec::new();
        let mut pos = 0;
        let mut first = true;

        while pos < bytes.len() {
            match bytes[pos] {
                b'[' if bytes.get(pos + 1) == Some(&b'"') => {
                    let (key, end) = read_quoted(rest, pos + 2)
                        .ok_or_else(|| DraftError::invalid_path(input, "unterminated quoted key"))?;
                    if bytes.get(end) != Some(&b']') {
                        return Err(DraftError::invalid_path(
                            input,
                            "expected ']' after quoted key",
                        ));
                    }
                    segments.push(Seg::Key(key));
                    pos = end + 1;
                }
                b'[' => {
                    let close = rest[pos..]
                        .find(']')
                        .map(|off| pos + off)
                        .ok_or_else(|| DraftError::invalid_path(input, "unterminated index"))?;
                    let digits = &rest[pos + 1..close];
                    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
                        return Err(DraftError::invalid_path(input, "index is not a number"));
                    }
                    let index = digits
                        .parse::<usize>()
                        .map_err(|_| DraftError::invalid_path(input, "index overflows usize"))?;
                    segments.push(Seg::Index(index));
                    pos = close + 1;
                }
                b']' => return Err(DraftError::invalid_path(input, "unbalanced ']'")),
                b => {
                    if b == b'.' {
                        pos += 1;
                    } else if !first {
                        return Err(DraftError::invalid_path(input, "expected '.' or '['"));
                    }
                    let end = rest[pos..]
                        .find(['.', '[', ']'])
                        .map_or(rest.len(), |off| pos + off);
                    if end == pos {
                        return Err(DraftError::invalid_path(input, "empty key"));
                    }
                    segments.push(Seg::Key(rest[pos..end].to_owned()));
                    pos = end;
                }
            }
            first = false;
        }

        Ok(Path(segments))
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("$")?;
        for seg in &self.0 {
            write!(f, "{seg}")?;
        }
        Ok(())
    }
}

impl std::str::FromStr for Path {
    type Err = DraftError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Path::parse(s)
    }
}

impl AsRef<Path> for Path {
    fn as_ref(&self) -> &Path {
        self
    }
}

impl FromIterator<Seg> for Path {
    fn from_iter<I: IntoIterator<Item = Seg>>(iter: I) -> Self {
        Path(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a Path {
    type Item = &'a Seg;
    type IntoIter = std::slice::Iter<'a, Seg>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl std::ops::Index<usize> for Path {
    type Output = Seg;

    fn index(&self, index: usize) -> &Self::Output {
        &self.0[index]
    }
}

/// Build a [`Path`] from literals: strings become keys, integers indices.
///
/// ```
/// use stately_core::path;
///
/// let p = path!("todos", 0usize, "done");
/// assert_eq!(p.to_string(), "$.todos[0].done");
/// ```
#[macro_export]
macro_rules! path {
    () => {
        $crate::Path::root()
    };
    ($($seg:expr),+ $(,)?) => {{
        let mut p = $crate::Path::root();
        $(
            p.push($crate::Seg::from($seg));
        )+
        p
    }};
}
