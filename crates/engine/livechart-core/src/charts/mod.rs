//! The four chart kinds.

pub mod axis;
pub mod bar;
pub mod donut;
pub mod line;
pub mod tree;

pub use bar::{BarChart, BarConfig};
pub use donut::{DonutChart, DonutConfig};
pub use line::{LineChart, LineConfig, LINE_SERIES};
pub use tree::{TreeChart, TreeConfig};
