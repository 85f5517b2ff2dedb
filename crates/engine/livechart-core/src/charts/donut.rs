//! Donut chart: one annular slice per record, in input order, colored by name,
//! with a legend, a hover tooltip and click-to-delete.

use serde::{Deserialize, Serialize};

use crate::chart::{Chart, Guide, Highlight, Mark, Scene};
use crate::error::LayoutError;
use crate::geometry::{Geometry, Rgba};
use crate::ids::{Key, MarkKey};
use crate::inputs::Command;
use crate::layout::{pie_angles, OrdinalColor, SCHEME_SET1};
use crate::record::Snapshot;
use crate::render::{AttrValue, Attrs, ElementKind};
use crate::transition::{PhaseTiming, Timing};

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct DonutConfig {
    pub width: f32,
    pub height: f32,
    pub outer_radius: f32,
    pub inner_radius: f32,
    /// Space added to the canvas for the legend.
    pub legend_space: f32,
    pub name_field: String,
    pub value_field: String,
    pub palette: Vec<String>,
    pub timing: Timing,
    pub hover: PhaseTiming,
    pub hover_fill: String,
}

impl Default for DonutConfig {
    fn default() -> Self {
        Self {
            width: 300.0,
            height: 300.0,
            outer_radius: 150.0,
            inner_radius: 75.0,
            legend_space: 150.0,
            name_field: "name".into(),
            value_field: "cost".into(),
            palette: SCHEME_SET1.iter().map(|s| s.to_string()).collect(),
            timing: Timing::default(),
            hover: PhaseTiming::ms(400),
            hover_fill: "#ffffff".into(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct DonutChart {
    config: DonutConfig,
    color: OrdinalColor,
}

impl Default for DonutChart {
    fn default() -> Self {
        Self::new(DonutConfig::default())
    }
}

impl DonutChart {
    pub fn new(config: DonutConfig) -> Self {
        let color = OrdinalColor::from_hex(&config.palette);
        Self { config, color }
    }

    pub fn config(&self) -> &DonutConfig {
        &self.config
    }

    pub fn colors(&self) -> &OrdinalColor {
        &self.color
    }

    fn center(&self) -> [f32; 2] {
        [self.config.width / 2.0 + 5.0, self.config.height / 2.0 + 5.0]
    }

    fn legend(&self) -> Vec<Guide> {
        let x = self.config.width + 40.0;
        let (r, gap) = (8.0f32, 10.0f32);
        let mut out = Vec::new();
        for (i, (name, color)) in self.color.entries().enumerate() {
            let cy = 10.0 + r + i as f32 * (2.0 * r + gap);
            out.push(Guide::new(
                format!("legend:swatch:{name}"),
                ElementKind::Circle,
                Attrs::new()
                    .with("cx", x + r)
                    .with("cy", cy)
                    .with("r", r)
                    .with("fill", color),
            ));
            out.push(Guide::new(
                format!("legend:label:{name}"),
                ElementKind::Text,
                Attrs::new()
                    .with("x", x + 2.0 * r + gap)
                    .with("y", cy)
                    .with("dominant-baseline", "middle")
                    .with("fill", "#ffffff")
                    .with("text", name),
            ));
        }
        out
    }
}

impl Chart for DonutChart {
    fn name(&self) -> &'static str {
        "donut"
    }

    fn layout(&mut self, snapshot: &Snapshot) -> Result<Scene, LayoutError> {
        let cfg = &self.config;
        let mut rows: Vec<(&Key, &str, f64)> = Vec::with_capacity(snapshot.len());
        for record in snapshot {
            rows.push((
                &record.key,
                record.require_text(&cfg.name_field)?,
                record.require_number(&cfg.value_field)?,
            ));
        }

        self.color.sync(rows.iter().map(|r| r.1));
        let slices = pie_angles(rows.iter().map(|r| (r.0, r.2)));
        let [cx, cy] = self.center();
        let transform = format!(
            "translate({}, {})",
            AttrValue::Number(cx),
            AttrValue::Number(cy)
        );

        let mut scene = Scene::default();
        for (slice, (_, name, _)) in slices.into_iter().zip(&rows) {
            let fill = self.color.color(name);
            scene.marks.push(
                Mark::new(
                    slice.key,
                    ElementKind::Path,
                    Geometry::Arc {
                        start_angle: slice.start_angle,
                        end_angle: slice.end_angle,
                        inner_radius: self.config.inner_radius,
                        outer_radius: self.config.outer_radius,
                    },
                )
                .fill(fill)
                .style("class", "arc")
                .style("stroke", "#ffffff")
                .style("stroke-width", 2.0)
                .style("transform", transform.as_str()),
            );
        }
        scene.guides = self.legend();
        Ok(scene)
    }

    fn timing(&self, _mark: &Mark) -> Timing {
        self.config.timing
    }

    /// Zero-width wedge at the slice's end angle, opening backwards to its start.
    fn enter_from(&self, mark: &Mark) -> Geometry {
        match &mark.geometry {
            Geometry::Arc {
                end_angle,
                inner_radius,
                outer_radius,
                ..
            } => Geometry::Arc {
                start_angle: *end_angle,
                end_angle: *end_angle,
                inner_radius: *inner_radius,
                outer_radius: *outer_radius,
            },
            other => other.clone(),
        }
    }

    /// Start angle sweeps forward onto the end angle.
    fn exit_to(&self, _key: &MarkKey, current: &Geometry) -> Geometry {
        match current {
            Geometry::Arc {
                end_angle,
                inner_radius,
                outer_radius,
                ..
            } => Geometry::Arc {
                start_angle: *end_angle,
                end_angle: *end_angle,
                inner_radius: *inner_radius,
                outer_radius: *outer_radius,
            },
            other => other.clone(),
        }
    }

    fn highlight(&self, mark: &Mark) -> Option<Highlight> {
        Some(Highlight {
            geometry: mark.geometry.clone(),
            fill: Rgba::from_hex(&self.config.hover_fill),
            timing: self.config.hover,
        })
    }

    fn hover_guides(&self, mark: &Mark, snapshot: &Snapshot) -> Vec<Guide> {
        let Some(record) = mark.record().and_then(|k| snapshot.get(k)) else {
            return Vec::new();
        };
        let [cx, cy] = self.center();
        let line = |id: &str, dy: f32, text: String| {
            Guide::new(
                format!("tip:{id}"),
                ElementKind::Text,
                Attrs::new()
                    .with("class", format!("tip {id}"))
                    .with("x", cx)
                    .with("y", cy + dy)
                    .with("text-anchor", "middle")
                    .with("text", text),
            )
        };
        let name = record.text(&self.config.name_field).unwrap_or_default();
        let cost = record
            .number(&self.config.value_field)
            .map(|v| v.to_string())
            .unwrap_or_default();
        vec![
            line("name", -16.0, name.to_string()),
            line("cost", 0.0, cost),
            line("delete", 16.0, "Click slice to delete".to_string()),
        ]
    }

    fn click(&self, mark: &Mark) -> Option<Command> {
        mark.record().cloned().map(Command::Remove)
    }
}
