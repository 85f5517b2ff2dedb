//! Tree hierarchy: labelled node groups colored by department, joined by
//! vertical links. Nodes and links are reconciled as separate key spaces.

use serde::{Deserialize, Serialize};

use crate::chart::{Chart, Mark, Scene};
use crate::error::LayoutError;
use crate::geometry::Geometry;
use crate::ids::MarkKey;
use crate::layout::{tree_layout, OrdinalColor, SCHEME_SET1};
use crate::record::Snapshot;
use crate::render::ElementKind;
use crate::transition::{PhaseTiming, Timing};

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct TreeConfig {
    pub width: f32,
    pub height: f32,
    pub margin: f32,
    pub node_height: f32,
    /// Field holding the node id that `parent_field` refers to. Records
    /// without it use their key.
    pub id_field: String,
    pub parent_field: String,
    pub color_field: String,
    pub palette: Vec<String>,
    pub link_color: String,
    pub timing: Timing,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            width: 1100.0,
            height: 500.0,
            margin: 50.0,
            node_height: 50.0,
            id_field: "name".into(),
            parent_field: "parent".into(),
            color_field: "department".into(),
            palette: SCHEME_SET1.iter().map(|s| s.to_string()).collect(),
            link_color: "#aaaaaa".into(),
            timing: Timing {
                enter: PhaseTiming::ms(300).delayed(500),
                update: PhaseTiming::ms(1000),
                exit: PhaseTiming::ms(400),
            },
        }
    }
}

#[derive(Clone, Debug)]
pub struct TreeChart {
    config: TreeConfig,
    color: OrdinalColor,
}

impl Default for TreeChart {
    fn default() -> Self {
        Self::new(TreeConfig::default())
    }
}

impl TreeChart {
    pub fn new(config: TreeConfig) -> Self {
        let color = OrdinalColor::from_hex(&config.palette);
        Self { config, color }
    }

    pub fn config(&self) -> &TreeConfig {
        &self.config
    }

    pub fn colors(&self) -> &OrdinalColor {
        &self.color
    }
}

fn with_opacity(geometry: &Geometry, value: f32) -> Geometry {
    match geometry {
        Geometry::Node { x, y, .. } => Geometry::Node {
            x: *x,
            y: *y,
            opacity: value,
        },
        Geometry::Link { source, target, .. } => Geometry::Link {
            source: *source,
            target: *target,
            opacity: value,
        },
        other => other.clone(),
    }
}

impl Chart for TreeChart {
    fn name(&self) -> &'static str {
        "tree"
    }

    fn layout(&mut self, snapshot: &Snapshot) -> Result<Scene, LayoutError> {
        let tree = tree_layout(
            snapshot,
            &self.config.id_field,
            &self.config.parent_field,
            [self.config.width, self.config.height],
        )?;

        let mut departments = Vec::with_capacity(snapshot.len());
        for record in snapshot {
            departments.push(record.require_text(&self.config.color_field)?);
        }
        self.color.sync(departments.iter().copied());

        let m = self.config.margin;
        let link_color = self.config.link_color.as_str();
        let mut scene = Scene::default();

        // Links first so they draw under the nodes.
        for edge in &tree.links {
            let (Some(p), Some(c)) = (tree.node(&edge.parent), tree.node(&edge.child)) else {
                continue;
            };
            scene.marks.push(
                Mark::new(
                    edge.clone(),
                    ElementKind::Path,
                    Geometry::Link {
                        source: [p.x + m, p.y + m],
                        target: [c.x + m, c.y + m],
                        opacity: 1.0,
                    },
                )
                .style("fill", "none")
                .style("stroke", link_color)
                .style("stroke-width", 2.0),
            );
        }

        for node in &tree.nodes {
            let label = node.id.as_str();
            let department = snapshot
                .get(&node.key)
                .and_then(|r| r.text(&self.config.color_field))
                .unwrap_or_default();
            let fill = self.color.color(department);
            let width = 20.0 * label.chars().count() as f32;
            scene.marks.push(
                Mark::new(
                    node.key.clone(),
                    ElementKind::Group,
                    Geometry::Node {
                        x: node.x + m,
                        y: node.y + m,
                        opacity: 1.0,
                    },
                )
                .fill(fill)
                .style("class", "node")
                .style("label", label)
                .style("width", width)
                .style("height", self.config.node_height)
                .style("rx", 8.0)
                .style("stroke", "#555555")
                .style("stroke-width", 2.0),
            );
        }
        Ok(scene)
    }

    fn timing(&self, _mark: &Mark) -> Timing {
        self.config.timing
    }

    /// Fade in at the target position.
    fn enter_from(&self, mark: &Mark) -> Geometry {
        with_opacity(&mark.geometry, 0.0)
    }

    /// Fade out where it stands.
    fn exit_to(&self, _key: &MarkKey, current: &Geometry) -> Geometry {
        with_opacity(current, 0.0)
    }
}
