//! Bar chart: one rect per record, band-positioned by name, height by value.

use serde::{Deserialize, Serialize};

use crate::chart::{Chart, Mark, Scene};
use crate::charts::axis::{self, AxisStyle};
use crate::config::{Canvas, Margin};
use crate::error::LayoutError;
use crate::geometry::{Geometry, Rgba};
use crate::ids::MarkKey;
use crate::layout::{BandScale, LinearScale};
use crate::record::Snapshot;
use crate::render::ElementKind;
use crate::transition::{PhaseTiming, Timing};

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct BarConfig {
    pub canvas: Canvas,
    pub name_field: String,
    pub value_field: String,
    pub padding_inner: f32,
    pub padding_outer: f32,
    pub fill: String,
    pub y_ticks: usize,
    pub y_tick_suffix: String,
    pub timing: Timing,
}

impl Default for BarConfig {
    fn default() -> Self {
        Self {
            canvas: Canvas {
                width: 500.0,
                height: 500.0,
                margin: Margin::new(10.0, 10.0, 100.0, 100.0),
            },
            name_field: "name".into(),
            value_field: "amount".into(),
            padding_inner: 0.2,
            padding_outer: 0.2,
            fill: "#ffa500".into(),
            y_ticks: 4,
            y_tick_suffix: " units".into(),
            timing: Timing {
                enter: PhaseTiming::ms(500),
                update: PhaseTiming::IMMEDIATE,
                exit: PhaseTiming::ms(300),
            },
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct BarChart {
    config: BarConfig,
}

impl BarChart {
    pub fn new(config: BarConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &BarConfig {
        &self.config
    }

    /// Canvas `y` of the value axis zero.
    fn baseline(&self) -> f32 {
        self.config.canvas.margin.top + self.config.canvas.inner_height()
    }

    fn fill(&self) -> Rgba {
        Rgba::from_hex(&self.config.fill).unwrap_or(Rgba([1.0, 0.647, 0.0, 1.0]))
    }
}

impl Chart for BarChart {
    fn name(&self) -> &'static str {
        "bar"
    }

    fn layout(&mut self, snapshot: &Snapshot) -> Result<Scene, LayoutError> {
        let cfg = &self.config;
        let (w, h) = (cfg.canvas.inner_width(), cfg.canvas.inner_height());
        let origin = [cfg.canvas.margin.left, cfg.canvas.margin.top];

        let mut rows = Vec::with_capacity(snapshot.len());
        for record in snapshot {
            let name = record.require_text(&cfg.name_field)?;
            let value = record.require_number(&cfg.value_field)?;
            rows.push((record.key.clone(), name.to_string(), value));
        }

        let y = LinearScale::zero_to_max(rows.iter().map(|r| r.2), [h, 0.0]);
        let x = BandScale::new(
            rows.iter().map(|r| r.1.clone()),
            [0.0, w],
            cfg.padding_inner,
            cfg.padding_outer,
        );

        let fill = self.fill();
        let mut scene = Scene::default();
        for (key, name, value) in rows {
            let top = y.map(value);
            let bx = x.position(&name).unwrap_or(0.0);
            scene.marks.push(
                Mark::new(
                    key,
                    ElementKind::Rect,
                    Geometry::Bar {
                        x: origin[0] + bx,
                        y: origin[1] + top,
                        width: x.bandwidth(),
                        height: h - top,
                    },
                )
                .fill(fill),
            );
        }

        let suffix = cfg.y_tick_suffix.clone();
        scene.guides.extend(axis::left_linear(
            "y-axis",
            &y,
            cfg.y_ticks,
            origin,
            move |v| format!("{v}{suffix}"),
        ));
        scene.guides.extend(axis::bottom_band(
            "x-axis",
            &x,
            h,
            origin,
            &AxisStyle {
                rotate_labels: true,
                label_fill: Some(cfg.fill.clone()),
            },
        ));
        Ok(scene)
    }

    fn timing(&self, _mark: &Mark) -> Timing {
        self.config.timing
    }

    fn enter_from(&self, mark: &Mark) -> Geometry {
        match &mark.geometry {
            Geometry::Bar { x, width, .. } => Geometry::Bar {
                x: *x,
                y: self.baseline(),
                width: *width,
                height: 0.0,
            },
            other => other.clone(),
        }
    }

    fn exit_to(&self, _key: &MarkKey, current: &Geometry) -> Geometry {
        match current {
            Geometry::Bar { x, width, .. } => Geometry::Bar {
                x: *x,
                y: self.baseline(),
                width: *width,
                height: 0.0,
            },
            other => other.clone(),
        }
    }
}
