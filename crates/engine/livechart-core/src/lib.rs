//! Livechart core (render-target agnostic)
//!
//! Keyed reconciliation and transition engine for live-updating charts. A
//! [`ChangeLog`] folds add/modify/remove events into a [`Snapshot`]; a [`Chart`]
//! lays the snapshot out into keyed marks; the [`Engine`] reconciles marks
//! against the elements it rendered before and animates enter, update and exit
//! transitions onto a [`RenderTarget`].

pub mod changelog;
pub mod chart;
pub mod charts;
pub mod config;
pub mod engine;
pub mod error;
pub mod feed;
pub mod geometry;
pub mod host;
pub mod ids;
pub mod inputs;
pub mod interp;
pub mod layout;
pub mod outputs;
pub mod reconcile;
pub mod record;
pub mod render;
pub mod transition;

// Re-exports for consumers (adapters, hosts)
pub use changelog::{record, BatchReport, ChangeEvent, ChangeLog, ModifyPolicy, SubscriptionId};
pub use chart::{Chart, Guide, Highlight, Mark, Paint, Scene};
pub use charts::{
    BarChart, BarConfig, DonutChart, DonutConfig, LineChart, LineConfig, TreeChart, TreeConfig,
};
pub use config::{Canvas, Config, Margin};
pub use engine::{CycleReport, Engine};
pub use error::{
    ChangeError, EngineError, HierarchyFault, InterpolationError, LayoutError, TransitionError,
};
pub use feed::{ChannelFeed, DataFeed, ScriptedFeed};
pub use geometry::{Geometry, GeometryKind, Rgba};
pub use host::{FrameReport, LiveChart};
pub use ids::{EdgeKey, ElementHandle, HandleAllocator, Key, MarkKey};
pub use inputs::{Command, Message};
pub use interp::{Ease, Interpolate};
pub use outputs::{Change, ChannelName, CoreEvent, Outputs};
pub use reconcile::{reconcile, reconcile_edges, reconcile_snapshot, Partition, Phase};
pub use record::{FieldValue, Record, Snapshot};
pub use render::{geometry_attrs, AttrValue, Attrs, ElementKind, MemoryTarget, RenderOp, RenderTarget};
pub use transition::{Channel, ElementState, PhaseTiming, Status, Timing, TransitionScheduler, Tween};
