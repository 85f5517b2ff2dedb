//! Tree layout from parent pointers.
//!
//! Each record has a node id, read from an id field (falling back to the record
//! key when the field is absent), and names its parent by that id. A missing,
//! null or empty parent marks the root. Exactly one root is allowed and every
//! other parent must resolve to a record. Layout output is keyed by record key.

use std::collections::VecDeque;

use hashbrown::{HashMap, HashSet};

use crate::error::{HierarchyFault, LayoutError};
use crate::ids::{EdgeKey, Key};
use crate::record::{FieldValue, Record, Snapshot};

/// Positioned node of a laid-out tree.
#[derive(Clone, Debug, PartialEq)]
pub struct TreeNode {
    pub key: Key,
    /// Node id the hierarchy was built from (the label).
    pub id: Key,
    pub parent: Option<Key>,
    pub depth: usize,
    pub x: f32,
    pub y: f32,
}

/// Nodes in breadth-first order (root first) and parent -> child edges in the same order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TreeLayout {
    pub nodes: Vec<TreeNode>,
    pub links: Vec<EdgeKey>,
    index: HashMap<Key, usize>,
}

impl TreeLayout {
    pub fn node(&self, key: &Key) -> Option<&TreeNode> {
        self.index.get(key).map(|&i| &self.nodes[i])
    }

    fn push(&mut self, node: TreeNode) {
        self.index.insert(node.key.clone(), self.nodes.len());
        self.nodes.push(node);
    }
}

/// Validated hierarchy over record keys.
#[derive(Clone, Debug, PartialEq)]
pub struct Hierarchy {
    pub root: Key,
    /// Child record keys per parent record key, in input order.
    pub children: HashMap<Key, Vec<Key>>,
    /// Node id per record key.
    pub ids: HashMap<Key, Key>,
}

/// Node id of `record`: the text of `id_field`, or the record key.
pub fn node_id(record: &Record, id_field: &str) -> Key {
    id_ref(record.get(id_field)).unwrap_or_else(|| record.key.clone())
}

/// Resolve parent ids into a single rooted tree over record keys.
pub fn stratify(
    snapshot: &Snapshot,
    id_field: &str,
    parent_field: &str,
) -> Result<Option<Hierarchy>, LayoutError> {
    if snapshot.is_empty() {
        return Ok(None);
    }

    let mut ids: HashMap<Key, Key> = HashMap::with_capacity(snapshot.len());
    let mut by_id: HashMap<Key, Key> = HashMap::with_capacity(snapshot.len());
    for record in snapshot {
        let id = node_id(record, id_field);
        if by_id.insert(id.clone(), record.key.clone()).is_some() {
            return Err(LayoutError::MalformedHierarchy(HierarchyFault::DuplicateId(id)));
        }
        ids.insert(record.key.clone(), id);
    }

    let mut parent_of: HashMap<Key, Key> = HashMap::new();
    let mut roots: Vec<Key> = Vec::new();
    let mut children: HashMap<Key, Vec<Key>> = HashMap::new();
    for record in snapshot {
        let Some(parent_id) = id_ref(record.get(parent_field)) else {
            roots.push(record.key.clone());
            continue;
        };
        let Some(parent) = by_id.get(&parent_id) else {
            return Err(LayoutError::MalformedHierarchy(HierarchyFault::Orphan {
                child: record.key.clone(),
                parent: parent_id,
            }));
        };
        children
            .entry(parent.clone())
            .or_default()
            .push(record.key.clone());
        parent_of.insert(record.key.clone(), parent.clone());
    }

    check_acyclic(snapshot, &roots, &parent_of)?;

    match roots.len() {
        0 => Err(LayoutError::MalformedHierarchy(HierarchyFault::NoRoot)),
        1 => Ok(Some(Hierarchy {
            root: roots.remove(0),
            children,
            ids,
        })),
        _ => Err(LayoutError::MalformedHierarchy(
            HierarchyFault::MultipleRoots(roots),
        )),
    }
}

/// Every chain of parent pointers must end at a root.
fn check_acyclic(
    snapshot: &Snapshot,
    roots: &[Key],
    parent_of: &HashMap<Key, Key>,
) -> Result<(), LayoutError> {
    let mut settled: HashSet<&Key> = roots.iter().collect();
    for start in snapshot.keys() {
        let mut path: Vec<&Key> = Vec::new();
        let mut on_path: HashSet<&Key> = HashSet::new();
        let mut cur = start;
        while !settled.contains(cur) {
            if !on_path.insert(cur) {
                return Err(LayoutError::MalformedHierarchy(HierarchyFault::Cycle(
                    cur.clone(),
                )));
            }
            path.push(cur);
            match parent_of.get(cur) {
                Some(p) => cur = p,
                None => break,
            }
        }
        settled.extend(path);
    }
    Ok(())
}

fn id_ref(value: Option<&FieldValue>) -> Option<Key> {
    match value {
        Some(FieldValue::Text(s)) if !s.trim().is_empty() => Some(Key::from(s.trim())),
        Some(FieldValue::Number(n)) => Some(Key::from(n.to_string())),
        _ => None,
    }
}

/// Lay out the snapshot as a tree inside `size = [width, height]`.
///
/// Leaves get evenly spaced horizontal slots in depth-first input order, each
/// parent is centred over its first and last child, and depth maps linearly to
/// `y` with the root at 0 and the deepest level at `height`.
pub fn tree_layout(
    snapshot: &Snapshot,
    id_field: &str,
    parent_field: &str,
    size: [f32; 2],
) -> Result<TreeLayout, LayoutError> {
    let Some(Hierarchy {
        root,
        children,
        mut ids,
    }) = stratify(snapshot, id_field, parent_field)?
    else {
        return Ok(TreeLayout::default());
    };

    let (slot_x, depth, leaves) = place(&root, &children);
    let leaves = leaves.max(1) as f32;
    let max_depth = depth.values().copied().max().unwrap_or(0);
    let level = if max_depth == 0 {
        0.0
    } else {
        size[1] / max_depth as f32
    };

    // Breadth-first emission, matching the usual `descendants()` order.
    let mut layout = TreeLayout::default();
    let mut queue = VecDeque::from([(root, None::<Key>)]);
    while let Some((key, parent)) = queue.pop_front() {
        let d = depth[&key];
        let slot = slot_x[&key];
        if let Some(p) = &parent {
            layout.links.push(EdgeKey::new(p.clone(), key.clone()));
        }
        if let Some(kids) = children.get(&key) {
            for kid in kids {
                queue.push_back((kid.clone(), Some(key.clone())));
            }
        }
        layout.push(TreeNode {
            x: (slot + 0.5) * size[0] / leaves,
            y: d as f32 * level,
            depth: d,
            id: ids.remove(&key).unwrap_or_else(|| key.clone()),
            parent,
            key,
        });
    }
    Ok(layout)
}

/// Post-order walk with an explicit stack: leaf slots, parent midpoints and
/// depths. Returns `(slot_x, depth, leaf_count)`.
fn place(
    root: &Key,
    children: &HashMap<Key, Vec<Key>>,
) -> (HashMap<Key, f32>, HashMap<Key, usize>, usize) {
    let mut slot_x: HashMap<Key, f32> = HashMap::new();
    let mut depth: HashMap<Key, usize> = HashMap::new();
    let mut next_leaf = 0usize;

    let mut stack: Vec<(&Key, usize, bool)> = vec![(root, 0, false)];
    while let Some((key, d, expanded)) = stack.pop() {
        match children.get(key).filter(|kids| !kids.is_empty()) {
            None => {
                depth.insert(key.clone(), d);
                slot_x.insert(key.clone(), next_leaf as f32);
                next_leaf += 1;
            }
            Some(kids) if !expanded => {
                depth.insert(key.clone(), d);
                stack.push((key, d, true));
                for kid in kids.iter().rev() {
                    stack.push((kid, d + 1, false));
                }
            }
            Some(kids) => {
                let first = slot_x[&kids[0]];
                let last = slot_x[&kids[kids.len() - 1]];
                slot_x.insert(key.clone(), (first + last) / 2.0);
            }
        }
    }
    (slot_x, depth, next_leaf)
}
