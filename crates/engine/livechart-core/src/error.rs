//! Error taxonomy. Every error here is locally recoverable.

use thiserror::Error;

use crate::geometry::GeometryKind;
use crate::ids::{Key, MarkKey};

/// A change event that the accumulator refused to fold into the snapshot.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ChangeError {
    #[error("added record '{0}' already exists; keeping prior record")]
    DuplicateKey(Key),
    #[error("no record with key '{0}'")]
    UnknownKey(Key),
}

/// Why a parent-pointer forest could not be turned into a single rooted tree.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HierarchyFault {
    /// A record names a parent id that no record carries.
    #[error("'{child}' references missing parent '{parent}'")]
    Orphan { child: Key, parent: Key },
    /// Two records carry the same node id.
    #[error("node id '{0}' is not unique")]
    DuplicateId(Key),
    /// Following parent pointers from this key loops back on itself.
    #[error("parent cycle through '{0}'")]
    Cycle(Key),
    /// No record without a parent.
    #[error("no root record")]
    NoRoot,
    /// More than one record without a parent.
    #[error("multiple roots: {}", join_keys(.0))]
    MultipleRoots(Vec<Key>),
}

fn join_keys(keys: &[Key]) -> String {
    keys.iter().map(|k| k.as_str()).collect::<Vec<_>>().join(", ")
}

/// Failure of a layout function. Aborts the whole reconciliation cycle.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LayoutError {
    #[error("malformed hierarchy: {0}")]
    MalformedHierarchy(#[source] HierarchyFault),
    #[error("record '{key}' has no field '{field}'")]
    MissingField { key: Key, field: String },
    #[error("record '{key}' field '{field}' is not a {expected}")]
    FieldType {
        key: Key,
        field: String,
        expected: &'static str,
    },
}

/// Interpolating between two geometries of different shape.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InterpolationError {
    #[error("cannot interpolate {from:?} into {to:?}")]
    TypeMismatch {
        from: GeometryKind,
        to: GeometryKind,
    },
}

/// Errors surfaced by `Engine::update`.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    #[error("layout failed, cycle dropped: {0}")]
    Layout(#[from] LayoutError),
}

/// Per-key transition failure recorded in frame outputs.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("transition for {key} failed: {source}")]
pub struct TransitionError {
    pub key: MarkKey,
    #[source]
    pub source: InterpolationError,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn hierarchy_faults_display_and_chain() {
        let err = LayoutError::MalformedHierarchy(HierarchyFault::MultipleRoots(vec![
            Key::from("A"),
            Key::from("B"),
        ]));
        assert_eq!(err.to_string(), "malformed hierarchy: multiple roots: A, B");
        let source = err.source().expect("fault is the source");
        assert_eq!(source.to_string(), "multiple roots: A, B");
        assert_eq!(
            HierarchyFault::Orphan {
                child: Key::from("VP"),
                parent: Key::from("Ghost"),
            }
            .to_string(),
            "'VP' references missing parent 'Ghost'"
        );
    }
}
