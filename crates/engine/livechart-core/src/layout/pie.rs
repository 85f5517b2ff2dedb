//! Pie angle assignment in stable input order.

use std::f64::consts::TAU;

use crate::ids::Key;

/// Angular extent assigned to one record.
#[derive(Clone, Debug, PartialEq)]
pub struct PieSlice {
    pub key: Key,
    pub value: f64,
    /// Position in the input.
    pub index: usize,
    pub start_angle: f32,
    pub end_angle: f32,
}

/// Assign `[start, end)` angles covering `[0, 2π)` proportionally to value.
///
/// Slices follow input order and are never sorted by value, so a key keeps its
/// neighbours across updates. Negative values count as zero. When the total is
/// zero every slice is an empty wedge at angle 0.
pub fn pie_angles<'a>(values: impl IntoIterator<Item = (&'a Key, f64)>) -> Vec<PieSlice> {
    let items: Vec<(&Key, f64)> = values
        .into_iter()
        .map(|(k, v)| (k, if v.is_finite() { v.max(0.0) } else { 0.0 }))
        .collect();
    let total: f64 = items.iter().map(|(_, v)| v).sum();
    let k = if total > 0.0 { TAU / total } else { 0.0 };

    let mut angle = 0.0f64;
    items
        .into_iter()
        .enumerate()
        .map(|(index, (key, value))| {
            let start = angle;
            angle += value * k;
            PieSlice {
                key: key.clone(),
                value,
                index,
                start_angle: start as f32,
                end_angle: angle as f32,
            }
        })
        .collect()
}
