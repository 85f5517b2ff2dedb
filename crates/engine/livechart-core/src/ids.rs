//! Identifiers for records, scene marks and render-target elements.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Stable identity of a record across its lifetime (document id, hierarchical name).
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Key(pub String);

impl Key {
    pub fn new(key: impl Into<String>) -> Self {
        Key(key.into())
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Key {
    fn from(s: &str) -> Self {
        Key(s.to_string())
    }
}

impl From<String> for Key {
    fn from(s: String) -> Self {
        Key(s)
    }
}

impl From<u32> for Key {
    fn from(n: u32) -> Self {
        Key(n.to_string())
    }
}

/// Edge identity in a hierarchy: `(parent, child)`.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EdgeKey {
    pub parent: Key,
    pub child: Key,
}

impl EdgeKey {
    pub fn new(parent: impl Into<Key>, child: impl Into<Key>) -> Self {
        Self {
            parent: parent.into(),
            child: child.into(),
        }
    }
}

impl fmt::Display for EdgeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.parent, self.child)
    }
}

/// Identity of one mark in a scene. Each variant is reconciled as its own key space.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "snake_case")]
pub enum MarkKey {
    /// One mark per record (bar, slice, point, tree node).
    Record(Key),
    /// A hierarchy edge.
    Link(EdgeKey),
    /// A singleton mark not backed by one record (the line path of a line graph).
    Series(String),
}

impl MarkKey {
    /// Record key this mark belongs to, if any.
    pub fn record(&self) -> Option<&Key> {
        match self {
            MarkKey::Record(k) => Some(k),
            _ => None,
        }
    }

    pub fn link(&self) -> Option<&EdgeKey> {
        match self {
            MarkKey::Link(e) => Some(e),
            _ => None,
        }
    }

    pub fn series(&self) -> Option<&String> {
        match self {
            MarkKey::Series(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for MarkKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MarkKey::Record(k) => write!(f, "record:{k}"),
            MarkKey::Link(e) => write!(f, "link:{e}"),
            MarkKey::Series(s) => write!(f, "series:{s}"),
        }
    }
}

impl From<Key> for MarkKey {
    fn from(k: Key) -> Self {
        MarkKey::Record(k)
    }
}

impl From<EdgeKey> for MarkKey {
    fn from(e: EdgeKey) -> Self {
        MarkKey::Link(e)
    }
}

/// Opaque handle returned by a render target for a created element.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct ElementHandle(pub u32);

/// Monotonic allocator for element handles. Render targets may use it to mint handles.
#[derive(Default, Debug, Clone)]
pub struct HandleAllocator {
    next: u32,
}

impl HandleAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn alloc(&mut self) -> ElementHandle {
        let id = ElementHandle(self.next);
        self.next = self.next.wrapping_add(1);
        id
    }

    #[inline]
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alloc_monotonic() {
        let mut alloc = HandleAllocator::new();
        assert_eq!(alloc.alloc(), ElementHandle(0));
        assert_eq!(alloc.alloc(), ElementHandle(1));
        alloc.reset();
        assert_eq!(alloc.alloc(), ElementHandle(0));
    }

    #[test]
    fn edge_key_display_matches_link_id() {
        let e = EdgeKey::new("CEO", "VP");
        assert_eq!(e.to_string(), "CEO-VP");
        assert_eq!(MarkKey::from(e).to_string(), "link:CEO-VP");
    }
}
