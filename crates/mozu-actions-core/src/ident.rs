//! Dotted and escaped action identifiers.
//!
//! Identifiers such as `embedded.commerce.carts.addItem.before` are stored and
//! compared in their dotted form. Template path expansion splits on `.`, so any
//! identifier interpolated into a generated path goes through [`EscapedId`],
//! which swaps every `.` for [`ESCAPE_MARKER`]. An `EscapedId` can only be
//! produced by escaping a `DottedId` and has no `escape` of its own, so an
//! identifier cannot be escaped twice.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::Hash;

pub const ESCAPE_MARKER: char = '*';

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DottedId(String);

impl DottedId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Leading segment, e.g. `embedded` or `http`.
    pub fn type_segment(&self) -> &str {
        self.0.split('.').next().unwrap_or("")
    }

    /// Everything after the type segment; the whole id when there is no `.`.
    pub fn tail(&self) -> &str {
        match self.0.find('.') {
            Some(i) => &self.0[i + 1..],
            None => &self.0,
        }
    }

    pub fn escape(&self) -> EscapedId {
        EscapedId(self.0.replace('.', &ESCAPE_MARKER.to_string()))
    }
}

impl fmt::Display for DottedId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DottedId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for DottedId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl AsRef<str> for DottedId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EscapedId(String);

impl EscapedId {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn unescape(&self) -> DottedId {
        DottedId(self.0.replace(ESCAPE_MARKER, "."))
    }
}

impl fmt::Display for EscapedId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Structured conversion
// ---------------------------------------------------------------------------

/// Escape every identifier inside a structured value.
pub trait Escape {
    type Escaped;
    fn escape_ids(&self) -> Self::Escaped;
}

/// Inverse of [`Escape`].
pub trait Unescape {
    type Dotted;
    fn unescape_ids(&self) -> Self::Dotted;
}

impl Escape for DottedId {
    type Escaped = EscapedId;
    fn escape_ids(&self) -> EscapedId {
        self.escape()
    }
}

impl Unescape for EscapedId {
    type Dotted = DottedId;
    fn unescape_ids(&self) -> DottedId {
        self.unescape()
    }
}

impl<T: Escape> Escape for [T] {
    type Escaped = Vec<T::Escaped>;
    fn escape_ids(&self) -> Self::Escaped {
        self.iter().map(Escape::escape_ids).collect()
    }
}

impl<T: Unescape> Unescape for [T] {
    type Dotted = Vec<T::Dotted>;
    fn unescape_ids(&self) -> Self::Dotted {
        self.iter().map(Unescape::unescape_ids).collect()
    }
}

impl<T: Escape> Escape for Vec<T> {
    type Escaped = Vec<T::Escaped>;
    fn escape_ids(&self) -> Self::Escaped {
        self.as_slice().escape_ids()
    }
}

impl<T: Unescape> Unescape for Vec<T> {
    type Dotted = Vec<T::Dotted>;
    fn unescape_ids(&self) -> Self::Dotted {
        self.as_slice().unescape_ids()
    }
}

/// Re-keys the map in insertion order; values are converted too.
impl<K, V> Escape for IndexMap<K, V>
where
    K: Escape,
    K::Escaped: Hash + Eq,
    V: Escape,
{
    type Escaped = IndexMap<K::Escaped, V::Escaped>;
    fn escape_ids(&self) -> Self::Escaped {
        self.iter()
            .map(|(k, v)| (k.escape_ids(), v.escape_ids()))
            .collect()
    }
}

impl<K, V> Unescape for IndexMap<K, V>
where
    K: Unescape,
    K::Dotted: Hash + Eq,
    V: Unescape,
{
    type Dotted = IndexMap<K::Dotted, V::Dotted>;
    fn unescape_ids(&self) -> Self::Dotted {
        self.iter()
            .map(|(k, v)| (k.unescape_ids(), v.unescape_ids()))
            .collect()
    }
}
