//! Keyed reconciliation: split previous and next key sets into enter/update/exit.

use std::hash::Hash;

use hashbrown::HashSet;

use crate::ids::{EdgeKey, Key};
use crate::record::Snapshot;

/// Which partition a key landed in.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Phase {
    Enter,
    Update,
    Exit,
}

/// Disjoint, exhaustive split of `prev ∪ next`.
///
/// `enter` and `update` follow the order of the next keys; `exit` follows the
/// order of the previous keys.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Partition<K> {
    pub enter: Vec<K>,
    pub update: Vec<K>,
    pub exit: Vec<K>,
}

impl<K> Default for Partition<K> {
    fn default() -> Self {
        Self {
            enter: Vec::new(),
            update: Vec::new(),
            exit: Vec::new(),
        }
    }
}

impl<K: Eq> Partition<K> {
    pub fn is_empty(&self) -> bool {
        self.enter.is_empty() && self.update.is_empty() && self.exit.is_empty()
    }

    pub fn len(&self) -> usize {
        self.enter.len() + self.update.len() + self.exit.len()
    }

    pub fn phase_of(&self, key: &K) -> Option<Phase> {
        if self.enter.contains(key) {
            Some(Phase::Enter)
        } else if self.update.contains(key) {
            Some(Phase::Update)
        } else if self.exit.contains(key) {
            Some(Phase::Exit)
        } else {
            None
        }
    }

    /// All keys tagged with their phase, enter first, then update, then exit.
    pub fn iter(&self) -> impl Iterator<Item = (Phase, &K)> {
        self.enter
            .iter()
            .map(|k| (Phase::Enter, k))
            .chain(self.update.iter().map(|k| (Phase::Update, k)))
            .chain(self.exit.iter().map(|k| (Phase::Exit, k)))
    }
}

/// Partition keys. Repeated keys on either side count once.
pub fn reconcile<'a, K, P, N>(prev: P, next: N) -> Partition<K>
where
    K: Hash + Eq + Clone + 'a,
    P: IntoIterator<Item = &'a K>,
    N: IntoIterator<Item = &'a K>,
{
    let prev: Vec<&K> = prev.into_iter().collect();
    let prev_set: HashSet<&K> = prev.iter().copied().collect();
    let mut next_set: HashSet<&K> = HashSet::new();
    let mut out = Partition::default();

    for k in next {
        if !next_set.insert(k) {
            continue;
        }
        if prev_set.contains(k) {
            out.update.push(k.clone());
        } else {
            out.enter.push(k.clone());
        }
    }
    let mut seen: HashSet<&K> = HashSet::new();
    for k in prev {
        if !next_set.contains(k) && seen.insert(k) {
            out.exit.push(k.clone());
        }
    }
    out
}

/// Record keys of `snapshot` against the keys currently rendered.
pub fn reconcile_snapshot(prev: &HashSet<Key>, snapshot: &Snapshot) -> Partition<Key> {
    reconcile(prev.iter(), snapshot.keys())
}

/// Hierarchy edges, independently of their endpoint nodes.
pub fn reconcile_edges(prev: &HashSet<EdgeKey>, edges: &[EdgeKey]) -> Partition<EdgeKey> {
    reconcile(prev.iter(), edges.iter())
}
