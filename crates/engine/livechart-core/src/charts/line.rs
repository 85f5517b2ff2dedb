//! Line graph: records filtered by activity and sorted by date, drawn as one
//! polyline plus a point per record. Everything is set immediately; only hover
//! styling animates.

use serde::{Deserialize, Serialize};

use crate::chart::{Chart, Guide, Highlight, Mark, Scene};
use crate::charts::axis::{self, AxisStyle};
use crate::config::{Canvas, Margin};
use crate::error::LayoutError;
use crate::geometry::{Geometry, Rgba};
use crate::ids::MarkKey;
use crate::layout::{LinearScale, TimeScale};
use crate::record::Snapshot;
use crate::render::{Attrs, ElementKind};
use crate::transition::{PhaseTiming, Timing};

/// Key of the polyline mark.
pub const LINE_SERIES: &str = "line";

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct LineConfig {
    pub canvas: Canvas,
    pub date_field: String,
    pub value_field: String,
    pub filter_field: String,
    /// Only records whose `filter_field` equals this are drawn. None draws all.
    pub filter: Option<String>,
    pub line_color: String,
    pub point_color: String,
    pub point_radius: f32,
    pub hover_radius: f32,
    pub hover: PhaseTiming,
    pub x_ticks: usize,
    pub x_tick_format: String,
    pub y_ticks: usize,
    pub y_tick_suffix: String,
}

impl Default for LineConfig {
    fn default() -> Self {
        Self {
            canvas: Canvas {
                width: 560.0,
                height: 400.0,
                margin: Margin::new(40.0, 20.0, 50.0, 100.0),
            },
            date_field: "date".into(),
            value_field: "distance".into(),
            filter_field: "activity".into(),
            filter: Some("running".into()),
            line_color: "#00bfa5".into(),
            point_color: "#cccccc".into(),
            point_radius: 4.0,
            hover_radius: 8.0,
            hover: PhaseTiming::ms(250),
            x_ticks: 4,
            x_tick_format: "%b %d".into(),
            y_ticks: 4,
            y_tick_suffix: " mi".into(),
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct LineChart {
    config: LineConfig,
}

impl LineChart {
    pub fn new(config: LineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &LineConfig {
        &self.config
    }

    fn color(hex: &str) -> Rgba {
        Rgba::from_hex(hex).unwrap_or(Rgba::WHITE)
    }
}

impl Chart for LineChart {
    fn name(&self) -> &'static str {
        "line"
    }

    fn layout(&mut self, snapshot: &Snapshot) -> Result<Scene, LayoutError> {
        let cfg = &self.config;
        let (w, h) = (cfg.canvas.inner_width(), cfg.canvas.inner_height());
        let origin = [cfg.canvas.margin.left, cfg.canvas.margin.top];

        let mut rows = Vec::new();
        for record in snapshot {
            if let Some(want) = &cfg.filter {
                if record.text(&cfg.filter_field) != Some(want.as_str()) {
                    continue;
                }
            }
            rows.push((
                record.key.clone(),
                record.require_date(&cfg.date_field)?,
                record.require_number(&cfg.value_field)?,
            ));
        }
        rows.sort_by_key(|r| r.1);

        let y = LinearScale::zero_to_max(rows.iter().map(|r| r.2), [h, 0.0]);
        let x = TimeScale::extent(rows.iter().map(|r| r.1), [0.0, w]);

        let mut scene = Scene::default();
        let mut points = Vec::with_capacity(rows.len());
        let mut circles = Vec::with_capacity(rows.len());
        for (key, date, value) in rows {
            let px = origin[0] + x.as_ref().map_or(0.0, |x| x.map(date));
            let py = origin[1] + y.map(value);
            points.push([px, py]);
            circles.push(
                Mark::new(
                    key,
                    ElementKind::Circle,
                    Geometry::Point {
                        cx: px,
                        cy: py,
                        r: cfg.point_radius,
                    },
                )
                .fill(Self::color(&cfg.point_color)),
            );
        }

        scene.marks.push(
            Mark::new(
                MarkKey::Series(LINE_SERIES.into()),
                ElementKind::Path,
                Geometry::Polyline { points },
            )
            .stroke(Self::color(&cfg.line_color))
            .style("fill", "none")
            .style("stroke-width", 2.0),
        );
        scene.marks.extend(circles);

        if let Some(x) = &x {
            scene.guides.extend(axis::bottom_time(
                "x-axis",
                x,
                cfg.x_ticks,
                h,
                origin,
                &cfg.x_tick_format,
                &AxisStyle {
                    rotate_labels: true,
                    label_fill: None,
                },
            ));
        }
        let suffix = cfg.y_tick_suffix.clone();
        scene.guides.extend(axis::left_linear(
            "y-axis",
            &y,
            cfg.y_ticks,
            origin,
            move |v| format!("{v}{suffix}"),
        ));
        Ok(scene)
    }

    fn timing(&self, _mark: &Mark) -> Timing {
        Timing {
            enter: PhaseTiming::IMMEDIATE,
            update: PhaseTiming::IMMEDIATE,
            exit: PhaseTiming::IMMEDIATE,
        }
    }

    fn enter_from(&self, mark: &Mark) -> Geometry {
        mark.geometry.clone()
    }

    fn exit_to(&self, _key: &MarkKey, current: &Geometry) -> Geometry {
        current.clone()
    }

    fn highlight(&self, mark: &Mark) -> Option<Highlight> {
        match mark.geometry {
            Geometry::Point { cx, cy, .. } => Some(Highlight {
                geometry: Geometry::Point {
                    cx,
                    cy,
                    r: self.config.hover_radius,
                },
                fill: Some(Rgba::WHITE),
                timing: self.config.hover,
            }),
            _ => None,
        }
    }

    /// Dashed crosshairs from the hovered point to both axes.
    fn hover_guides(&self, mark: &Mark, _snapshot: &Snapshot) -> Vec<Guide> {
        let Geometry::Point { cx, cy, .. } = mark.geometry else {
            return Vec::new();
        };
        let m = self.config.canvas.margin;
        let bottom = m.top + self.config.canvas.inner_height();
        let dashed = |id: &str, x1: f32, y1: f32, x2: f32, y2: f32| {
            Guide::new(
                format!("crosshair:{id}"),
                ElementKind::Line,
                Attrs::new()
                    .with("x1", x1)
                    .with("y1", y1)
                    .with("x2", x2)
                    .with("y2", y2)
                    .with("stroke", self.config.point_color.as_str())
                    .with("stroke-width", 1.0)
                    .with("stroke-dasharray", 8.0),
            )
        };
        vec![
            dashed("horizontal", m.left, cy, cx, cy),
            dashed("vertical", cx, bottom, cx, cy),
        ]
    }

    fn filter(&self) -> Option<String> {
        self.config.filter.clone()
    }

    fn set_filter(&mut self, filter: Option<String>) -> bool {
        if self.config.filter == filter {
            return false;
        }
        self.config.filter = filter;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::Key;
    use crate::record::Record;

    fn activities() -> Snapshot {
        Snapshot::from_records(vec![
            Record::new("r2")
                .with("activity", "running")
                .with("date", "2019-05-03T08:00:00Z")
                .with("distance", 5.0),
            Record::new("c1")
                .with("activity", "cycling")
                .with("date", "2019-05-01T08:00:00Z")
                .with("distance", 40.0),
            Record::new("r1")
                .with("activity", "running")
                .with("date", "2019-05-01T08:00:00Z")
                .with("distance", 3.0),
        ])
        .unwrap()
    }

    fn points(scene: &Scene) -> Vec<[f32; 2]> {
        match &scene.mark(&MarkKey::Series(LINE_SERIES.into())).unwrap().geometry {
            Geometry::Polyline { points } => points.clone(),
            _ => panic!("line is not a polyline"),
        }
    }

    #[test]
    fn filters_by_activity_and_sorts_by_date() {
        let mut chart = LineChart::default();
        let scene = chart.layout(&activities()).unwrap();
        let keys: Vec<_> = scene.marks.iter().skip(1).map(|m| m.key.clone()).collect();
        assert_eq!(
            keys,
            vec![MarkKey::Record(Key::from("r1")), MarkKey::Record(Key::from("r2"))]
        );
        let pts = points(&scene);
        assert_eq!(pts.len(), 2);
        assert!(pts[0][0] < pts[1][0]);
        assert!(pts[1][1] < pts[0][1], "larger distance is drawn higher");
    }

    #[test]
    fn set_filter_changes_visible_records() {
        let mut chart = LineChart::default();
        assert!(chart.set_filter(Some("cycling".into())));
        assert!(!chart.set_filter(Some("cycling".into())));
        let scene = chart.layout(&activities()).unwrap();
        assert_eq!(points(&scene).len(), 1);
        assert!(scene.mark(&MarkKey::Record(Key::from("c1"))).is_some());
    }

    #[test]
    fn hover_grows_point_and_draws_crosshairs() {
        let mut chart = LineChart::default();
        let scene = chart.layout(&activities()).unwrap();
        let mark = scene.mark(&MarkKey::Record(Key::from("r1"))).unwrap();
        let hl = chart.highlight(mark).unwrap();
        assert!(matches!(hl.geometry, Geometry::Point { r, .. } if r == 8.0));
        assert_eq!(chart.hover_guides(mark, &activities()).len(), 2);
    }
}
