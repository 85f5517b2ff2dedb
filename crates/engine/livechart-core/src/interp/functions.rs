//! Interpolation helpers:
//! - lerp_f32 / lerp_vec2 (component-wise linear)
//! - easing curves applied to normalized progress

use serde::{Deserialize, Serialize};

/// Linear interpolation of scalars.
#[inline]
pub fn lerp_f32(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

#[inline]
pub fn lerp_vec2(a: [f32; 2], b: [f32; 2], t: f32) -> [f32; 2] {
    [lerp_f32(a[0], b[0], t), lerp_f32(a[1], b[1], t)]
}

#[inline]
pub fn lerp_vec4(a: [f32; 4], b: [f32; 4], t: f32) -> [f32; 4] {
    [
        lerp_f32(a[0], b[0], t),
        lerp_f32(a[1], b[1], t),
        lerp_f32(a[2], b[2], t),
        lerp_f32(a[3], b[3], t),
    ]
}

/// Timing curve mapping linear progress to eased progress, both in [0, 1].
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Ease {
    Linear,
    /// Symmetric cubic ease-in-out (the d3 transition default).
    #[default]
    CubicInOut,
}

impl Ease {
    #[inline]
    pub fn apply(self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Ease::Linear => t,
            Ease::CubicInOut => {
                let t2 = t * 2.0;
                if t2 <= 1.0 {
                    t2 * t2 * t2 / 2.0
                } else {
                    let u = t2 - 2.0;
                    (u * u * u + 2.0) / 2.0
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cubic_in_out_hits_endpoints_and_midpoint() {
        assert_eq!(Ease::CubicInOut.apply(0.0), 0.0);
        assert_eq!(Ease::CubicInOut.apply(1.0), 1.0);
        assert!((Ease::CubicInOut.apply(0.5) - 0.5).abs() < 1e-6);
        assert!(Ease::CubicInOut.apply(0.25) < 0.25);
        assert!(Ease::CubicInOut.apply(0.75) > 0.75);
    }

    #[test]
    fn ease_clamps_out_of_range_progress() {
        assert_eq!(Ease::Linear.apply(-1.0), 0.0);
        assert_eq!(Ease::Linear.apply(2.0), 1.0);
    }
}
