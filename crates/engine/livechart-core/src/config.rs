//! Shared configuration types. Each chart kind has its own `*Config` built on these.

use serde::{Deserialize, Serialize};

use crate::changelog::ModifyPolicy;

/// Space reserved around the plot area.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Margin {
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
    pub left: f32,
}

impl Default for Margin {
    fn default() -> Self {
        Self::uniform(10.0)
    }
}

impl Margin {
    pub const fn new(top: f32, right: f32, bottom: f32, left: f32) -> Self {
        Self {
            top,
            right,
            bottom,
            left,
        }
    }

    pub const fn uniform(v: f32) -> Self {
        Self::new(v, v, v, v)
    }
}

/// Outer canvas size and margins.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Canvas {
    pub width: f32,
    pub height: f32,
    pub margin: Margin,
}

impl Default for Canvas {
    fn default() -> Self {
        Self {
            width: 500.0,
            height: 500.0,
            margin: Margin::default(),
        }
    }
}

impl Canvas {
    /// Width of the plot area (never negative).
    pub fn inner_width(&self) -> f32 {
        (self.width - self.margin.left - self.margin.right).max(0.0)
    }

    /// Height of the plot area (never negative).
    pub fn inner_height(&self) -> f32 {
        (self.height - self.margin.top - self.margin.bottom).max(0.0)
    }
}

/// Host-level settings for a [`crate::host::LiveChart`].
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// How `Modified` on an unknown key is folded.
    pub modify_policy: ModifyPolicy,
    /// Frame length used by `LiveChart::settle`.
    pub frame_ms: f32,
    /// Upper bound on frames `LiveChart::settle` will run.
    pub max_settle_frames: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            modify_policy: ModifyPolicy::Upsert,
            frame_ms: 16.0,
            max_settle_frames: 1024,
        }
    }
}
