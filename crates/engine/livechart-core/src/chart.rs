//! The contract between a chart kind and the engine.
//!
//! A chart turns a snapshot into a [`Scene`]: keyed marks that the engine
//! reconciles and animates, plus static guides (axes, legends) that are set
//! immediately. The chart also supplies the neutral geometry marks enter from
//! and exit to, per-phase timing, and hover styling.

use serde::{Deserialize, Serialize};

use crate::error::LayoutError;
use crate::geometry::{Geometry, Rgba};
use crate::ids::{Key, MarkKey};
use crate::inputs::Command;
use crate::record::Snapshot;
use crate::render::{AttrValue, Attrs, ElementKind};
use crate::transition::{PhaseTiming, Timing};

/// Attribute the fill channel of a mark drives.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Paint {
    #[default]
    Fill,
    Stroke,
}

impl Paint {
    pub fn attr(self) -> &'static str {
        match self {
            Paint::Fill => "fill",
            Paint::Stroke => "stroke",
        }
    }
}

/// One keyed, animated element of a scene.
#[derive(Clone, Debug, PartialEq)]
pub struct Mark {
    pub key: MarkKey,
    pub kind: ElementKind,
    /// Target geometry for this cycle.
    pub geometry: Geometry,
    /// Target color of the paint channel, if the mark animates one.
    pub fill: Option<Rgba>,
    pub paint: Paint,
    /// Static attributes applied as-is (class, stroke width, labels).
    pub style: Attrs,
}

impl Mark {
    pub fn new(key: impl Into<MarkKey>, kind: ElementKind, geometry: Geometry) -> Self {
        Self {
            key: key.into(),
            kind,
            geometry,
            fill: None,
            paint: Paint::Fill,
            style: Attrs::new(),
        }
    }

    pub fn fill(mut self, color: Rgba) -> Self {
        self.fill = Some(color);
        self.paint = Paint::Fill;
        self
    }

    pub fn stroke(mut self, color: Rgba) -> Self {
        self.fill = Some(color);
        self.paint = Paint::Stroke;
        self
    }

    pub fn style(mut self, name: &str, value: impl Into<AttrValue>) -> Self {
        self.style.set(name, value);
        self
    }

    /// Record key, for marks backed by one record.
    pub fn record(&self) -> Option<&Key> {
        self.key.record()
    }
}

/// Static, unkeyed-by-data element such as an axis tick or a legend swatch.
#[derive(Clone, Debug, PartialEq)]
pub struct Guide {
    pub key: String,
    pub kind: ElementKind,
    pub attrs: Attrs,
}

impl Guide {
    pub fn new(key: impl Into<String>, kind: ElementKind, attrs: Attrs) -> Self {
        Self {
            key: key.into(),
            kind,
            attrs,
        }
    }
}

/// Output of one layout pass.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Scene {
    /// Marks in draw order.
    pub marks: Vec<Mark>,
    pub guides: Vec<Guide>,
}

impl Scene {
    pub fn mark(&self, key: &MarkKey) -> Option<&Mark> {
        self.marks.iter().find(|m| &m.key == key)
    }
}

/// Hover styling of a mark: the geometry and color it tweens to while hovered.
#[derive(Clone, Debug, PartialEq)]
pub struct Highlight {
    pub geometry: Geometry,
    pub fill: Option<Rgba>,
    pub timing: PhaseTiming,
}

/// A chart kind.
pub trait Chart {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Map the whole snapshot to a scene. Any error aborts the cycle.
    fn layout(&mut self, snapshot: &Snapshot) -> Result<Scene, LayoutError>;

    /// Phase timings for `mark`.
    fn timing(&self, mark: &Mark) -> Timing;

    /// Geometry a new mark starts from.
    fn enter_from(&self, mark: &Mark) -> Geometry;

    /// Geometry an exiting mark tweens to from its current value.
    fn exit_to(&self, key: &MarkKey, current: &Geometry) -> Geometry;

    /// Hover styling, if the mark reacts to the pointer.
    fn highlight(&self, _mark: &Mark) -> Option<Highlight> {
        None
    }

    /// Extra guides shown while `mark` is hovered (crosshairs, tooltips).
    fn hover_guides(&self, _mark: &Mark, _snapshot: &Snapshot) -> Vec<Guide> {
        Vec::new()
    }

    /// Upstream write requested by clicking `mark`.
    fn click(&self, _mark: &Mark) -> Option<Command> {
        None
    }

    /// Current record filter.
    fn filter(&self) -> Option<String> {
        None
    }

    /// Change the record filter. Returns true if a relayout is needed.
    fn set_filter(&mut self, _filter: Option<String>) -> bool {
        false
    }
}
