//! Layout functions: pure mappings from a whole snapshot to derived geometry.
//!
//! Domains (max, extent, category set) are global properties of the data, so
//! everything here is recomputed wholesale on each update cycle.

pub mod color;
pub mod path;
pub mod pie;
pub mod scale;
pub mod tree;

pub use color::{OrdinalColor, SCHEME_SET1};
pub use pie::{pie_angles, PieSlice};
pub use scale::{BandScale, LinearScale, TimeScale};
pub use tree::{node_id, stratify, tree_layout, Hierarchy, TreeLayout, TreeNode};
