//! Derived geometry of one mark and its fill color.

use serde::{Deserialize, Serialize};

use crate::error::InterpolationError;
use crate::interp::functions::{lerp_f32, lerp_vec2, lerp_vec4};
use crate::interp::Interpolate;

/// Shape discriminant, used for mismatch reporting.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GeometryKind {
    Bar,
    Arc,
    Point,
    Node,
    Link,
    /// Polyline with its vertex count.
    Polyline(usize),
}

/// Geometry of one rendered mark, in chart-local pixels (angles in radians).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Geometry {
    Bar {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
    },
    Arc {
        start_angle: f32,
        end_angle: f32,
        inner_radius: f32,
        outer_radius: f32,
    },
    Point {
        cx: f32,
        cy: f32,
        r: f32,
    },
    Node {
        x: f32,
        y: f32,
        opacity: f32,
    },
    Link {
        source: [f32; 2],
        target: [f32; 2],
        opacity: f32,
    },
    Polyline {
        points: Vec<[f32; 2]>,
    },
}

impl Geometry {
    #[inline]
    pub fn kind(&self) -> GeometryKind {
        match self {
            Geometry::Bar { .. } => GeometryKind::Bar,
            Geometry::Arc { .. } => GeometryKind::Arc,
            Geometry::Point { .. } => GeometryKind::Point,
            Geometry::Node { .. } => GeometryKind::Node,
            Geometry::Link { .. } => GeometryKind::Link,
            Geometry::Polyline { points } => GeometryKind::Polyline(points.len()),
        }
    }
}

impl Interpolate for Geometry {
    fn interpolate(&self, to: &Self, t: f32) -> Result<Self, InterpolationError> {
        let out = match (self, to) {
            (
                Geometry::Bar {
                    x: xa,
                    y: ya,
                    width: wa,
                    height: ha,
                },
                Geometry::Bar {
                    x: xb,
                    y: yb,
                    width: wb,
                    height: hb,
                },
            ) => Geometry::Bar {
                x: lerp_f32(*xa, *xb, t),
                y: lerp_f32(*ya, *yb, t),
                width: lerp_f32(*wa, *wb, t),
                height: lerp_f32(*ha, *hb, t),
            },
            (
                Geometry::Arc {
                    start_angle: sa,
                    end_angle: ea,
                    inner_radius: ia,
                    outer_radius: oa,
                },
                Geometry::Arc {
                    start_angle: sb,
                    end_angle: eb,
                    inner_radius: ib,
                    outer_radius: ob,
                },
            ) => Geometry::Arc {
                start_angle: lerp_f32(*sa, *sb, t),
                end_angle: lerp_f32(*ea, *eb, t),
                inner_radius: lerp_f32(*ia, *ib, t),
                outer_radius: lerp_f32(*oa, *ob, t),
            },
            (
                Geometry::Point {
                    cx: xa,
                    cy: ya,
                    r: ra,
                },
                Geometry::Point {
                    cx: xb,
                    cy: yb,
                    r: rb,
                },
            ) => Geometry::Point {
                cx: lerp_f32(*xa, *xb, t),
                cy: lerp_f32(*ya, *yb, t),
                r: lerp_f32(*ra, *rb, t),
            },
            (
                Geometry::Node {
                    x: xa,
                    y: ya,
                    opacity: oa,
                },
                Geometry::Node {
                    x: xb,
                    y: yb,
                    opacity: ob,
                },
            ) => Geometry::Node {
                x: lerp_f32(*xa, *xb, t),
                y: lerp_f32(*ya, *yb, t),
                opacity: lerp_f32(*oa, *ob, t),
            },
            (
                Geometry::Link {
                    source: sa,
                    target: ta,
                    opacity: oa,
                },
                Geometry::Link {
                    source: sb,
                    target: tb,
                    opacity: ob,
                },
            ) => Geometry::Link {
                source: lerp_vec2(*sa, *sb, t),
                target: lerp_vec2(*ta, *tb, t),
                opacity: lerp_f32(*oa, *ob, t),
            },
            (Geometry::Polyline { points: pa }, Geometry::Polyline { points: pb })
                if pa.len() == pb.len() =>
            {
                Geometry::Polyline {
                    points: pa
                        .iter()
                        .zip(pb)
                        .map(|(a, b)| lerp_vec2(*a, *b, t))
                        .collect(),
                }
            }
            _ => {
                return Err(InterpolationError::TypeMismatch {
                    from: self.kind(),
                    to: to.kind(),
                })
            }
        };
        Ok(out)
    }
}

/// RGBA color, components in [0, 1].
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Rgba(pub [f32; 4]);

impl Rgba {
    pub const WHITE: Rgba = Rgba([1.0, 1.0, 1.0, 1.0]);
    pub const TRANSPARENT: Rgba = Rgba([0.0, 0.0, 0.0, 0.0]);

    /// Parse `#rrggbb` or `#rgb`. Returns `None` for anything else.
    pub fn from_hex(hex: &str) -> Option<Rgba> {
        let h = hex.strip_prefix('#')?;
        let channel = |s: &str| u8::from_str_radix(s, 16).ok().map(|v| v as f32 / 255.0);
        match h.len() {
            6 => Some(Rgba([
                channel(&h[0..2])?,
                channel(&h[2..4])?,
                channel(&h[4..6])?,
                1.0,
            ])),
            3 => {
                let mut out = [1.0f32; 4];
                for (i, c) in h.chars().enumerate() {
                    let d = c.to_digit(16)? as f32;
                    out[i] = (d * 17.0) / 255.0;
                }
                Some(Rgba(out))
            }
            _ => None,
        }
    }

    /// `#rrggbb`, alpha dropped.
    pub fn to_hex(&self) -> String {
        let c = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        format!("#{:02x}{:02x}{:02x}", c(self.0[0]), c(self.0[1]), c(self.0[2]))
    }
}

impl Interpolate for Rgba {
    fn interpolate(&self, to: &Self, t: f32) -> Result<Self, InterpolationError> {
        Ok(Rgba(lerp_vec4(self.0, to.0, t)))
    }
}
