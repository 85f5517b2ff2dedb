//! Per-frame outputs of the engine.
//!
//! `changes` carries the concrete attributes pushed to the render target this
//! frame, keyed by mark; `events` carries discrete lifecycle signals.

use serde::{Deserialize, Serialize};

use crate::ids::{ElementHandle, MarkKey};
use crate::render::Attrs;

/// Attributes written to one element this frame.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Change {
    pub key: MarkKey,
    pub handle: ElementHandle,
    pub attrs: Attrs,
}

/// Independent tween channel of an element.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelName {
    Geometry,
    Fill,
}

/// Discrete signals emitted during update cycles and frames.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
#[non_exhaustive]
pub enum CoreEvent {
    /// Enter transition completed.
    Entered { key: MarkKey },
    /// Update transition completed.
    Updated { key: MarkKey },
    /// Exit transition completed and the element was removed.
    Exited { key: MarkKey },
    /// An in-flight tween was replaced at `progress`.
    Superseded {
        key: MarkKey,
        channel: ChannelName,
        progress: f32,
    },
    /// Interpolation failed; the element snapped to its target.
    TransitionFailed { key: MarkKey, message: String },
}

/// Outputs returned by `Engine::tick` (and the event part of `Engine::update`).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Outputs {
    #[serde(default)]
    pub changes: Vec<Change>,
    #[serde(default)]
    pub events: Vec<CoreEvent>,
}

impl Outputs {
    #[inline]
    pub fn clear(&mut self) {
        self.changes.clear();
        self.events.clear();
    }

    #[inline]
    pub fn push_change(&mut self, change: Change) {
        self.changes.push(change);
    }

    #[inline]
    pub fn push_event(&mut self, event: CoreEvent) {
        self.events.push(event);
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty() && self.events.is_empty()
    }

    /// Move everything from `other` onto the end of `self`.
    pub fn append(&mut self, other: &mut Outputs) {
        self.changes.append(&mut other.changes);
        self.events.append(&mut other.events);
    }

    /// Attributes last written to `key` in this output, if any.
    pub fn change_for(&self, key: &MarkKey) -> Option<&Change> {
        self.changes.iter().rev().find(|c| &c.key == key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::Key;

    #[test]
    fn events_serialize_with_type_tag() {
        let ev = CoreEvent::Exited {
            key: MarkKey::Record(Key::from("1")),
        };
        let json = serde_json::to_value(&ev).unwrap();
        assert_eq!(json["type"], "exited");
        assert_eq!(json["key"]["type"], "record");
    }

    #[test]
    fn change_for_returns_latest() {
        let key = MarkKey::Record(Key::from("a"));
        let mut out = Outputs::default();
        for v in [1.0f32, 2.0] {
            out.push_change(Change {
                key: key.clone(),
                handle: ElementHandle(1),
                attrs: Attrs::new().with("x", v),
            });
        }
        assert_eq!(out.change_for(&key).unwrap().attrs.number("x"), Some(2.0));
        out.clear();
        assert!(out.is_empty());
    }
}
