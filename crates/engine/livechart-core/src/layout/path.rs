//! SVG path generators for arcs, vertical links and polylines.

use std::f32::consts::{FRAC_PI_2, PI, TAU};
use std::fmt::Write;

const EPSILON: f32 = 1e-6;

fn fmt_num(v: f32) -> String {
    let r = (v * 1000.0).round() / 1000.0;
    if r == 0.0 {
        "0".to_string()
    } else {
        format!("{r}")
    }
}

/// Annular sector path. Angles are clockwise from 12 o'clock, as d3's arc generator uses.
pub fn arc_path(start_angle: f32, end_angle: f32, inner_radius: f32, outer_radius: f32) -> String {
    let (a0, a1) = if end_angle >= start_angle {
        (start_angle, end_angle)
    } else {
        (end_angle, start_angle)
    };
    let (r0, r1) = (inner_radius.max(0.0), outer_radius.max(0.0));
    let sweep = a1 - a0;
    let point = |r: f32, a: f32| (r * (a - FRAC_PI_2).cos(), r * (a - FRAC_PI_2).sin());

    if r1 <= EPSILON {
        return "M0,0Z".to_string();
    }

    let mut d = String::new();
    if sweep >= TAU - EPSILON {
        // Full ring: two half arcs per circle.
        let (x0, y0) = point(r1, a0);
        let (x1, y1) = point(r1, a0 + PI);
        let _ = write!(
            d,
            "M{},{}A{r},{r},0,1,1,{},{}A{r},{r},0,1,1,{},{}",
            fmt_num(x0),
            fmt_num(y0),
            fmt_num(x1),
            fmt_num(y1),
            fmt_num(x0),
            fmt_num(y0),
            r = fmt_num(r1)
        );
        if r0 > EPSILON {
            let (x0, y0) = point(r0, a0);
            let (x1, y1) = point(r0, a0 + PI);
            let _ = write!(
                d,
                "M{},{}A{r},{r},0,1,0,{},{}A{r},{r},0,1,0,{},{}",
                fmt_num(x0),
                fmt_num(y0),
                fmt_num(x1),
                fmt_num(y1),
                fmt_num(x0),
                fmt_num(y0),
                r = fmt_num(r0)
            );
        }
        d.push('Z');
        return d;
    }

    let large = if sweep > PI { 1 } else { 0 };
    let (ox0, oy0) = point(r1, a0);
    let (ox1, oy1) = point(r1, a1);
    let _ = write!(
        d,
        "M{},{}A{r},{r},0,{large},1,{},{}",
        fmt_num(ox0),
        fmt_num(oy0),
        fmt_num(ox1),
        fmt_num(oy1),
        r = fmt_num(r1)
    );
    if r0 > EPSILON {
        let (ix1, iy1) = point(r0, a1);
        let (ix0, iy0) = point(r0, a0);
        let _ = write!(
            d,
            "L{},{}A{r},{r},0,{large},0,{},{}",
            fmt_num(ix1),
            fmt_num(iy1),
            fmt_num(ix0),
            fmt_num(iy0),
            r = fmt_num(r0)
        );
    } else {
        d.push_str("L0,0");
    }
    d.push('Z');
    d
}

/// Vertical cubic link from `source` to `target` (control points at mid-height).
pub fn link_vertical_path(source: [f32; 2], target: [f32; 2]) -> String {
    let my = (source[1] + target[1]) / 2.0;
    format!(
        "M{},{}C{},{},{},{},{},{}",
        fmt_num(source[0]),
        fmt_num(source[1]),
        fmt_num(source[0]),
        fmt_num(my),
        fmt_num(target[0]),
        fmt_num(my),
        fmt_num(target[0]),
        fmt_num(target[1])
    )
}

/// Straight-segment path through `points`. Empty input yields an empty string.
pub fn polyline_path(points: &[[f32; 2]]) -> String {
    let mut d = String::new();
    for (i, p) in points.iter().enumerate() {
        let cmd = if i == 0 { 'M' } else { 'L' };
        let _ = write!(d, "{cmd}{},{}", fmt_num(p[0]), fmt_num(p[1]));
    }
    d
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quarter_donut_slice() {
        let d = arc_path(0.0, FRAC_PI_2, 75.0, 150.0);
        assert_eq!(d, "M0,-150A150,150,0,0,1,150,0L75,0A75,75,0,0,0,0,-75Z");
    }

    #[test]
    fn zero_sweep_arc_collapses_to_a_line() {
        let d = arc_path(1.0, 1.0, 0.0, 10.0);
        assert!(d.starts_with('M') && d.ends_with("L0,0Z"));
    }

    #[test]
    fn link_uses_mid_height_controls() {
        assert_eq!(
            link_vertical_path([0.0, 0.0], [10.0, 100.0]),
            "M0,0C0,50,10,50,10,100"
        );
    }

    #[test]
    fn polyline_moves_then_lines() {
        assert_eq!(polyline_path(&[[0.0, 1.0], [2.5, 3.0]]), "M0,1L2.5,3");
        assert_eq!(polyline_path(&[]), "");
    }
}
