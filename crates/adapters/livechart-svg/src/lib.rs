//! SVG document render target.
//!
//! Elements live in a flat, creation-ordered list (creation order is paint
//! order). `to_svg_string` serializes the document; a `g` element carrying a
//! `label` attribute is expanded into a rounded, centred rect with a text label,
//! which is how tree nodes are drawn.

use std::fmt;
use std::path::Path;

use indexmap::IndexMap;
use log::trace;

use livechart_core::render::{AttrValue, Attrs, ElementKind, RenderTarget};
use livechart_core::{ElementHandle, HandleAllocator};

/// Attributes of a labelled group that belong to its rect or text child.
const LABEL_CHILD_ATTRS: [&str; 7] = [
    "label",
    "width",
    "height",
    "rx",
    "fill",
    "stroke",
    "stroke-width",
];

#[derive(Clone, Debug, PartialEq)]
pub struct SvgNode {
    pub kind: ElementKind,
    pub attrs: Attrs,
}

/// In-memory SVG document driven by the engine.
#[derive(Clone, Debug)]
pub struct SvgDocument {
    width: f32,
    height: f32,
    ids: HandleAllocator,
    nodes: IndexMap<ElementHandle, SvgNode>,
}

impl SvgDocument {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width,
            height,
            ids: HandleAllocator::new(),
            nodes: IndexMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get(&self, handle: ElementHandle) -> Option<&SvgNode> {
        self.nodes.get(&handle)
    }

    /// Nodes of one kind, in paint order.
    pub fn nodes_of(&self, kind: ElementKind) -> impl Iterator<Item = &SvgNode> {
        self.nodes.values().filter(move |n| n.kind == kind)
    }

    /// Serialize the whole document.
    pub fn to_svg_string(&self) -> String {
        let mut out = String::new();
        // Writing into a String cannot fail.
        let _ = self.write_svg(&mut out);
        out
    }

    pub fn write_svg(&self, out: &mut impl fmt::Write) -> fmt::Result {
        write!(
            out,
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
            w = AttrValue::Number(self.width),
            h = AttrValue::Number(self.height)
        )?;
        for node in self.nodes.values() {
            out.write_char('\n')?;
            write_node(out, node)?;
        }
        out.write_str("\n</svg>\n")
    }

    pub fn save(&self, path: impl AsRef<Path>) -> std::io::Result<()> {
        std::fs::write(path, self.to_svg_string())
    }
}

impl RenderTarget for SvgDocument {
    fn create_element(&mut self, kind: ElementKind, attrs: &Attrs) -> ElementHandle {
        let handle = self.ids.alloc();
        trace!("svg: create <{}> {:?}", kind.tag(), handle);
        self.nodes.insert(
            handle,
            SvgNode {
                kind,
                attrs: attrs.clone(),
            },
        );
        handle
    }

    fn set_attributes(&mut self, handle: ElementHandle, attrs: &Attrs) {
        if let Some(node) = self.nodes.get_mut(&handle) {
            node.attrs.extend(attrs);
        }
    }

    fn remove_element(&mut self, handle: ElementHandle) {
        if self.nodes.shift_remove(&handle).is_some() {
            trace!("svg: remove {:?}", handle);
        }
    }
}

fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

fn write_attrs<'a>(
    out: &mut impl fmt::Write,
    attrs: impl Iterator<Item = (&'a str, &'a AttrValue)>,
) -> fmt::Result {
    for (name, value) in attrs {
        write!(out, r#" {name}="{}""#, escape(&value.to_string()))?;
    }
    Ok(())
}

fn write_node(out: &mut impl fmt::Write, node: &SvgNode) -> fmt::Result {
    let tag = node.kind.tag();
    match node.kind {
        ElementKind::Text => {
            write!(out, "<{tag}")?;
            write_attrs(out, node.attrs.iter().filter(|(n, _)| *n != "text"))?;
            let text = node
                .attrs
                .get("text")
                .map(|v| escape(&v.to_string()))
                .unwrap_or_default();
            write!(out, ">{text}</{tag}>")
        }
        ElementKind::Group if node.attrs.get("label").is_some() => write_labelled_group(out, node),
        _ => {
            write!(out, "<{tag}")?;
            write_attrs(out, node.attrs.iter())?;
            out.write_str("/>")
        }
    }
}

fn write_labelled_group(out: &mut impl fmt::Write, node: &SvgNode) -> fmt::Result {
    let a = &node.attrs;
    out.write_str("<g")?;
    write_attrs(
        out,
        a.iter().filter(|(n, _)| !LABEL_CHILD_ATTRS.contains(n)),
    )?;
    out.write_char('>')?;

    let width = a.number("width").unwrap_or(0.0);
    let height = a.number("height").unwrap_or(0.0);
    let rect = Attrs::new()
        .with("x", -width / 2.0)
        .with("y", -height / 2.0)
        .with("width", width)
        .with("height", height);
    out.write_str("<rect")?;
    write_attrs(out, rect.iter())?;
    write_attrs(
        out,
        a.iter()
            .filter(|(n, _)| matches!(*n, "rx" | "fill" | "stroke" | "stroke-width")),
    )?;
    out.write_str("/>")?;

    let label = a.get("label").map(|v| escape(&v.to_string())).unwrap_or_default();
    write!(
        out,
        r##"<text text-anchor="middle" dominant-baseline="middle" fill="#ffffff">{label}</text></g>"##
    )
}
