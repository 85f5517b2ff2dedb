//! Axis guides: a domain line, tick marks and labels, in canvas coordinates.

use chrono::{DateTime, Utc};

use crate::chart::Guide;
use crate::layout::{BandScale, LinearScale, TimeScale};
use crate::render::{AttrValue, Attrs, ElementKind};

const TICK_SIZE: f32 = 6.0;
const AXIS_COLOR: &str = "#ccc";

/// Label placement options shared by every axis.
#[derive(Clone, Debug, Default)]
pub struct AxisStyle {
    /// Rotate labels by -40 degrees around their anchor (long category names).
    pub rotate_labels: bool,
    pub label_fill: Option<String>,
}

fn line(key: String, x1: f32, y1: f32, x2: f32, y2: f32) -> Guide {
    Guide::new(
        key,
        ElementKind::Line,
        Attrs::new()
            .with("x1", x1)
            .with("y1", y1)
            .with("x2", x2)
            .with("y2", y2)
            .with("stroke", AXIS_COLOR),
    )
}

fn label(key: String, x: f32, y: f32, text: String, anchor: &str, style: &AxisStyle) -> Guide {
    let mut attrs = Attrs::new()
        .with("x", x)
        .with("y", y)
        .with("text-anchor", anchor)
        .with("text", text);
    if style.rotate_labels {
        attrs.set(
            "transform",
            format!(
                "rotate(-40, {}, {})",
                AttrValue::Number(x),
                AttrValue::Number(y)
            ),
        );
        attrs.set("text-anchor", "end");
    }
    if let Some(fill) = &style.label_fill {
        attrs.set("fill", fill.as_str());
    }
    Guide::new(key, ElementKind::Text, attrs)
}

/// Vertical axis on the left edge of the plot, labels formatted by `format`.
pub fn left_linear(
    prefix: &str,
    scale: &LinearScale,
    count: usize,
    origin: [f32; 2],
    format: impl Fn(f64) -> String,
) -> Vec<Guide> {
    let [ox, oy] = origin;
    let mut out = vec![line(
        format!("{prefix}:domain"),
        ox,
        oy + scale.range[0],
        ox,
        oy + scale.range[1],
    )];
    for v in scale.ticks(count) {
        let y = oy + scale.map(v);
        let text = format(v);
        out.push(line(
            format!("{prefix}:tick:{text}"),
            ox - TICK_SIZE,
            y,
            ox,
            y,
        ));
        out.push(label(
            format!("{prefix}:label:{text}"),
            ox - TICK_SIZE - 3.0,
            y,
            text,
            "end",
            &AxisStyle::default(),
        ));
    }
    out
}

/// Horizontal category axis at plot height `y`.
pub fn bottom_band(
    prefix: &str,
    scale: &BandScale,
    y: f32,
    origin: [f32; 2],
    style: &AxisStyle,
) -> Vec<Guide> {
    let [ox, oy] = origin;
    let [r0, r1] = scale.range();
    let y = oy + y;
    let mut out = vec![line(format!("{prefix}:domain"), ox + r0, y, ox + r1, y)];
    for name in scale.domain() {
        let Some(pos) = scale.position(name) else {
            continue;
        };
        let x = ox + pos + scale.bandwidth() / 2.0;
        out.push(line(
            format!("{prefix}:tick:{name}"),
            x,
            y,
            x,
            y + TICK_SIZE,
        ));
        out.push(label(
            format!("{prefix}:label:{name}"),
            x,
            y + TICK_SIZE + 12.0,
            name.clone(),
            "middle",
            style,
        ));
    }
    out
}

/// Horizontal time axis at plot height `y`; labels use the strftime `format`.
pub fn bottom_time(
    prefix: &str,
    scale: &TimeScale,
    count: usize,
    y: f32,
    origin: [f32; 2],
    format: &str,
    style: &AxisStyle,
) -> Vec<Guide> {
    let [ox, oy] = origin;
    let y = oy + y;
    let mut out = vec![line(
        format!("{prefix}:domain"),
        ox + scale.range[0],
        y,
        ox + scale.range[1],
        y,
    )];
    let ticks: Vec<DateTime<Utc>> = scale.ticks(count);
    for d in ticks {
        let x = ox + scale.map(d);
        let text = d.format(format).to_string();
        let id = d.timestamp_millis();
        out.push(line(format!("{prefix}:tick:{id}"), x, y, x, y + TICK_SIZE));
        out.push(label(
            format!("{prefix}:label:{id}"),
            x,
            y + TICK_SIZE + 12.0,
            text,
            "middle",
            style,
        ));
    }
    out
}
