//! Interpolation trait and helpers.

pub mod functions;

pub use functions::Ease;

use crate::error::InterpolationError;

/// A value that can be interpolated component-wise towards another of the same shape.
pub trait Interpolate: Clone {
    /// Value at progress `t` (already eased) between `self` and `to`.
    fn interpolate(&self, to: &Self, t: f32) -> Result<Self, InterpolationError>;
}
