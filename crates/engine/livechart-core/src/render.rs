//! Render-target contract and a recording in-memory target.
//!
//! The engine is the only writer of a render target. It samples every tween
//! itself and pushes concrete attribute values once per frame, so targets never
//! hold closures over engine state.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::geometry::{Geometry, Rgba};
use crate::ids::{ElementHandle, HandleAllocator};
use crate::layout::path::{arc_path, link_vertical_path, polyline_path};

/// Primitive element kinds a target must support.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementKind {
    Rect,
    Path,
    Circle,
    Group,
    Line,
    Text,
}

impl ElementKind {
    /// SVG tag name.
    pub fn tag(self) -> &'static str {
        match self {
            ElementKind::Rect => "rect",
            ElementKind::Path => "path",
            ElementKind::Circle => "circle",
            ElementKind::Group => "g",
            ElementKind::Line => "line",
            ElementKind::Text => "text",
        }
    }
}

/// Concrete attribute value.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttrValue {
    Number(f32),
    Color(Rgba),
    Text(String),
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttrValue::Number(n) => {
                let r = (n * 1000.0).round() / 1000.0;
                if r == 0.0 {
                    f.write_str("0")
                } else {
                    write!(f, "{r}")
                }
            }
            AttrValue::Color(c) => f.write_str(&c.to_hex()),
            AttrValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<f32> for AttrValue {
    fn from(v: f32) -> Self {
        AttrValue::Number(v)
    }
}

impl From<Rgba> for AttrValue {
    fn from(v: Rgba) -> Self {
        AttrValue::Color(v)
    }
}

impl From<&str> for AttrValue {
    fn from(v: &str) -> Self {
        AttrValue::Text(v.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(v: String) -> Self {
        AttrValue::Text(v)
    }
}

/// Ordered attribute list. Later writes of the same name replace earlier ones.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Attrs(IndexMap<String, AttrValue>);

impl Attrs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: &str, value: impl Into<AttrValue>) -> Self {
        self.set(name, value);
        self
    }

    pub fn set(&mut self, name: &str, value: impl Into<AttrValue>) {
        self.0.insert(name.to_string(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&AttrValue> {
        self.0.get(name)
    }

    pub fn number(&self, name: &str) -> Option<f32> {
        match self.get(name) {
            Some(AttrValue::Number(n)) => Some(*n),
            _ => None,
        }
    }

    pub fn extend(&mut self, other: &Attrs) {
        for (k, v) in other.iter() {
            self.0.insert(k.to_string(), v.clone());
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &AttrValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Attributes that draw `geometry`.
pub fn geometry_attrs(geometry: &Geometry) -> Attrs {
    match geometry {
        Geometry::Bar {
            x,
            y,
            width,
            height,
        } => Attrs::new()
            .with("x", *x)
            .with("y", *y)
            .with("width", width.max(0.0))
            .with("height", height.max(0.0)),
        Geometry::Arc {
            start_angle,
            end_angle,
            inner_radius,
            outer_radius,
        } => Attrs::new().with(
            "d",
            arc_path(*start_angle, *end_angle, *inner_radius, *outer_radius),
        ),
        Geometry::Point { cx, cy, r } => Attrs::new()
            .with("cx", *cx)
            .with("cy", *cy)
            .with("r", r.max(0.0)),
        Geometry::Node { x, y, opacity } => Attrs::new()
            .with(
                "transform",
                format!(
                    "translate({}, {})",
                    AttrValue::Number(*x),
                    AttrValue::Number(*y)
                ),
            )
            .with("opacity", opacity.clamp(0.0, 1.0)),
        Geometry::Link {
            source,
            target,
            opacity,
        } => Attrs::new()
            .with("d", link_vertical_path(*source, *target))
            .with("opacity", opacity.clamp(0.0, 1.0)),
        Geometry::Polyline { points } => Attrs::new().with("d", polyline_path(points)),
    }
}

/// Element lifecycle the engine drives.
pub trait RenderTarget {
    fn create_element(&mut self, kind: ElementKind, attrs: &Attrs) -> ElementHandle;
    fn set_attributes(&mut self, handle: ElementHandle, attrs: &Attrs);
    fn remove_element(&mut self, handle: ElementHandle);
}

/// One call made against a [`MemoryTarget`].
#[derive(Clone, Debug, PartialEq)]
pub enum RenderOp {
    Create(ElementHandle, ElementKind),
    Set(ElementHandle),
    Remove(ElementHandle),
}

/// Element held by a [`MemoryTarget`].
#[derive(Clone, Debug, PartialEq)]
pub struct MemoryElement {
    pub kind: ElementKind,
    pub attrs: Attrs,
}

/// Render target that keeps elements in memory and records every call.
#[derive(Debug, Default)]
pub struct MemoryTarget {
    ids: HandleAllocator,
    elements: IndexMap<ElementHandle, MemoryElement>,
    ops: Vec<RenderOp>,
}

impl MemoryTarget {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, handle: ElementHandle) -> Option<&MemoryElement> {
        self.elements.get(&handle)
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn elements(&self) -> impl Iterator<Item = (ElementHandle, &MemoryElement)> {
        self.elements.iter().map(|(h, e)| (*h, e))
    }

    pub fn count_kind(&self, kind: ElementKind) -> usize {
        self.elements.values().filter(|e| e.kind == kind).count()
    }

    pub fn ops(&self) -> &[RenderOp] {
        &self.ops
    }

    pub fn clear_ops(&mut self) {
        self.ops.clear();
    }
}

impl RenderTarget for MemoryTarget {
    fn create_element(&mut self, kind: ElementKind, attrs: &Attrs) -> ElementHandle {
        let handle = self.ids.alloc();
        self.elements.insert(
            handle,
            MemoryElement {
                kind,
                attrs: attrs.clone(),
            },
        );
        self.ops.push(RenderOp::Create(handle, kind));
        handle
    }

    fn set_attributes(&mut self, handle: ElementHandle, attrs: &Attrs) {
        if let Some(el) = self.elements.get_mut(&handle) {
            el.attrs.extend(attrs);
            self.ops.push(RenderOp::Set(handle));
        }
    }

    fn remove_element(&mut self, handle: ElementHandle) {
        if self.elements.shift_remove(&handle).is_some() {
            self.ops.push(RenderOp::Remove(handle));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_geometry_renders_translate_and_opacity() {
        let a = geometry_attrs(&Geometry::Node {
            x: 10.0,
            y: 20.5,
            opacity: 2.0,
        });
        assert_eq!(a.get("transform"), Some(&AttrValue::from("translate(10, 20.5)")));
        assert_eq!(a.number("opacity"), Some(1.0));
    }

    #[test]
    fn memory_target_merges_attributes_and_records_ops() {
        let mut t = MemoryTarget::new();
        let h = t.create_element(ElementKind::Rect, &Attrs::new().with("x", 1.0));
        t.set_attributes(h, &Attrs::new().with("y", 2.0));
        assert_eq!(t.get(h).unwrap().attrs.number("x"), Some(1.0));
        assert_eq!(t.get(h).unwrap().attrs.number("y"), Some(2.0));
        t.remove_element(h);
        t.remove_element(h);
        assert!(t.is_empty());
        assert_eq!(
            t.ops(),
            &[
                RenderOp::Create(h, ElementKind::Rect),
                RenderOp::Set(h),
                RenderOp::Remove(h)
            ]
        );
    }
}
