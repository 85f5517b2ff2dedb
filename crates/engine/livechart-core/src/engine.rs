//! Engine: runs update cycles (layout -> reconcile -> schedule) and frames.
//!
//! - `update(snapshot)` lays out the whole snapshot, reconciles every key space
//!   against the live registry and (re)targets tweens. Layout failures abort the
//!   cycle before anything is touched.
//! - `tick(dt)` advances tweens and writes the sampled attributes to the target.
//! - `dispatch(message)` handles pointer, click and filter messages.

use hashbrown::HashSet;
use indexmap::IndexMap;
use log::{debug, trace, warn};

use crate::chart::{Chart, Guide, Mark};
use crate::error::EngineError;
use crate::geometry::{Geometry, Rgba};
use crate::ids::{EdgeKey, ElementHandle, Key, MarkKey};
use crate::inputs::{Command, Message};
use crate::outputs::Outputs;
use crate::reconcile::{reconcile, Partition};
use crate::record::Snapshot;
use crate::render::{Attrs, ElementKind, RenderTarget};
use crate::transition::{ElementState, Status, TransitionScheduler};

/// Partitions computed by one update cycle, one per key space.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CycleReport {
    pub cycle: u64,
    pub nodes: Partition<Key>,
    pub links: Partition<EdgeKey>,
    pub series: Partition<String>,
}

#[derive(Clone, Debug)]
struct GuideState {
    handle: ElementHandle,
    kind: ElementKind,
    attrs: Attrs,
}

/// Static guides keyed by name; they are created, updated and removed immediately.
#[derive(Debug, Default)]
struct GuideLayer {
    items: IndexMap<String, GuideState>,
}

impl GuideLayer {
    fn sync(&mut self, guides: Vec<Guide>, target: &mut dyn RenderTarget) {
        let keys: Vec<String> = guides.iter().map(|g| g.key.clone()).collect();
        let part = reconcile(self.items.keys(), keys.iter());
        for key in &part.exit {
            if let Some(g) = self.items.shift_remove(key) {
                target.remove_element(g.handle);
            }
        }
        for guide in guides {
            match self.items.get_mut(&guide.key) {
                Some(g) if g.kind == guide.kind => {
                    if g.attrs != guide.attrs {
                        target.set_attributes(g.handle, &guide.attrs);
                        g.attrs = guide.attrs;
                    }
                }
                Some(g) => {
                    target.remove_element(g.handle);
                    g.handle = target.create_element(guide.kind, &guide.attrs);
                    g.kind = guide.kind;
                    g.attrs = guide.attrs;
                }
                None => {
                    let handle = target.create_element(guide.kind, &guide.attrs);
                    self.items.insert(
                        guide.key,
                        GuideState {
                            handle,
                            kind: guide.kind,
                            attrs: guide.attrs,
                        },
                    );
                }
            }
        }
    }

    fn clear(&mut self, target: &mut dyn RenderTarget) {
        for (_, g) in self.items.drain(..) {
            target.remove_element(g.handle);
        }
    }

    fn handle(&self, key: &str) -> Option<ElementHandle> {
        self.items.get(key).map(|g| g.handle)
    }
}

/// Reconciliation and transition engine driving one chart.
pub struct Engine {
    chart: Box<dyn Chart>,
    scheduler: TransitionScheduler,
    guides: GuideLayer,
    overlay: GuideLayer,
    hovered: Option<MarkKey>,
    cycle: u64,
    // Events raised outside a frame, flushed by the next tick.
    pending: Outputs,
    outputs: Outputs,
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("chart", &self.chart.name())
            .field("elements", &self.scheduler.len())
            .field("guides", &self.guides.items.len())
            .field("hovered", &self.hovered)
            .field("cycle", &self.cycle)
            .finish()
    }
}

impl Engine {
    pub fn new(chart: impl Chart + 'static) -> Self {
        Self::from_boxed(Box::new(chart))
    }

    pub fn from_boxed(chart: Box<dyn Chart>) -> Self {
        Self {
            chart,
            scheduler: TransitionScheduler::new(),
            guides: GuideLayer::default(),
            overlay: GuideLayer::default(),
            hovered: None,
            cycle: 0,
            pending: Outputs::default(),
            outputs: Outputs::default(),
        }
    }

    pub fn chart(&self) -> &dyn Chart {
        self.chart.as_ref()
    }

    pub fn chart_mut(&mut self) -> &mut dyn Chart {
        self.chart.as_mut()
    }

    /// Number of completed update cycles.
    pub fn cycle(&self) -> u64 {
        self.cycle
    }

    pub fn hovered(&self) -> Option<&MarkKey> {
        self.hovered.as_ref()
    }

    pub fn element(&self, key: &MarkKey) -> Option<&ElementState> {
        self.scheduler.get(key)
    }

    pub fn elements(&self) -> impl Iterator<Item = (&MarkKey, &ElementState)> {
        self.scheduler.iter()
    }

    pub fn guide(&self, key: &str) -> Option<ElementHandle> {
        self.guides.handle(key).or_else(|| self.overlay.handle(key))
    }

    /// True when no tween is in flight.
    pub fn is_idle(&self) -> bool {
        self.scheduler.is_idle()
    }

    /// Run one update cycle for `snapshot`.
    ///
    /// On a layout error nothing is changed: no element is created, retargeted
    /// or removed and the previous scene keeps animating.
    pub fn update(
        &mut self,
        snapshot: &Snapshot,
        target: &mut dyn RenderTarget,
    ) -> Result<CycleReport, EngineError> {
        let scene = match self.chart.layout(snapshot) {
            Ok(scene) => scene,
            Err(err) => {
                warn!("{}: cycle dropped: {err}", self.chart.name());
                return Err(err.into());
            }
        };
        self.cycle += 1;

        let mut marks: IndexMap<MarkKey, Mark> = IndexMap::with_capacity(scene.marks.len());
        for mark in scene.marks {
            if marks.contains_key(&mark.key) {
                warn!("{}: duplicate mark {} ignored", self.chart.name(), mark.key);
                continue;
            }
            marks.insert(mark.key.clone(), mark);
        }

        let live: Vec<MarkKey> = self.scheduler.live_keys().cloned().collect();
        let report = CycleReport {
            cycle: self.cycle,
            nodes: reconcile(
                live.iter().filter_map(MarkKey::record),
                marks.keys().filter_map(MarkKey::record),
            ),
            links: reconcile(
                live.iter().filter_map(MarkKey::link),
                marks.keys().filter_map(MarkKey::link),
            ),
            series: reconcile(
                live.iter().filter_map(MarkKey::series),
                marks.keys().filter_map(MarkKey::series),
            ),
        };
        debug!(
            "{} cycle {}: nodes +{} ~{} -{}, links +{} ~{} -{}",
            self.chart.name(),
            self.cycle,
            report.nodes.enter.len(),
            report.nodes.update.len(),
            report.nodes.exit.len(),
            report.links.enter.len(),
            report.links.update.len(),
            report.links.exit.len(),
        );

        let exits = report
            .nodes
            .exit
            .iter()
            .cloned()
            .map(MarkKey::Record)
            .chain(report.links.exit.iter().cloned().map(MarkKey::Link))
            .chain(report.series.exit.iter().cloned().map(MarkKey::Series));
        for key in exits {
            let timing = match self.scheduler.get(&key) {
                Some(el) => self.chart.timing(&el.mark).exit,
                None => continue,
            };
            let chart = self.chart.as_ref();
            self.scheduler
                .exit(&key, |g| chart.exit_to(&key, g), timing, &mut self.pending);
            if self.hovered.as_ref() == Some(&key) {
                self.hovered = None;
                self.overlay.clear(target);
            }
        }

        let live: HashSet<MarkKey> = live.into_iter().collect();
        for (key, mark) in marks {
            let timing = self.chart.timing(&mark);
            let (geometry, fill) = self.styled_target(&mark);
            if live.contains(&key) {
                self.scheduler
                    .update(mark, geometry, fill, timing.update, &mut self.pending);
            } else {
                let start = self.chart.enter_from(&mark);
                self.scheduler.enter(
                    mark,
                    geometry,
                    fill,
                    start,
                    timing.enter,
                    target,
                    &mut self.pending,
                );
            }
        }

        self.guides.sync(scene.guides, target);
        if let Some(key) = self.hovered.clone() {
            self.refresh_overlay(&key, snapshot, target);
        }
        Ok(report)
    }

    /// Advance every tween by `dt` seconds and push sampled attributes to `target`.
    pub fn tick(&mut self, dt: f32, target: &mut dyn RenderTarget) -> &Outputs {
        self.outputs.clear();
        self.outputs.append(&mut self.pending);
        self.scheduler
            .advance(dt.max(0.0) * 1000.0, target, &mut self.outputs);
        trace!(
            "{} frame: {} changes, {} events",
            self.chart.name(),
            self.outputs.changes.len(),
            self.outputs.events.len()
        );
        &self.outputs
    }

    /// Tick in `frame_ms` steps until idle (or `max_frames`), collecting all outputs.
    pub fn settle(
        &mut self,
        frame_ms: f32,
        max_frames: usize,
        target: &mut dyn RenderTarget,
    ) -> Outputs {
        let mut all = Outputs::default();
        for _ in 0..max_frames {
            let mut out = self.tick(frame_ms / 1000.0, target).clone();
            all.append(&mut out);
            if self.is_idle() && self.pending.is_empty() {
                break;
            }
        }
        all
    }

    /// Handle one interaction message. `snapshot` is the current data, used for
    /// tooltips and for relayout when the filter changes. A filter whose relayout
    /// fails is rolled back, so the chart keeps matching the rendered scene.
    pub fn dispatch(
        &mut self,
        message: Message,
        snapshot: &Snapshot,
        target: &mut dyn RenderTarget,
    ) -> Result<Vec<Command>, EngineError> {
        match message {
            Message::PointerEnter { key } => {
                if self.hovered.as_ref() == Some(&key) {
                    return Ok(Vec::new());
                }
                if let Some(prev) = self.hovered.take() {
                    self.unhighlight(&prev, target);
                }
                let Some(mark) = self.live_mark(&key) else {
                    return Ok(Vec::new());
                };
                if let Some(hl) = self.chart.highlight(&mark) {
                    let fill = hl.fill.or(mark.fill);
                    self.scheduler
                        .restyle(&key, hl.geometry, fill, hl.timing, &mut self.pending);
                }
                self.hovered = Some(key.clone());
                self.refresh_overlay(&key, snapshot, target);
                Ok(Vec::new())
            }
            Message::PointerLeave { key } => {
                if self.hovered.as_ref() == Some(&key) {
                    self.hovered = None;
                    self.unhighlight(&key, target);
                }
                Ok(Vec::new())
            }
            Message::Click { key } => Ok(self
                .live_mark(&key)
                .and_then(|mark| self.chart.click(&mark))
                .into_iter()
                .collect()),
            Message::SetFilter { filter } => {
                let previous = self.chart.filter();
                if self.chart.set_filter(filter) {
                    if let Err(err) = self.update(snapshot, target) {
                        self.chart.set_filter(previous);
                        return Err(err);
                    }
                }
                Ok(Vec::new())
            }
        }
    }

    /// Remove every element and guide from `target` and forget all state.
    pub fn clear(&mut self, target: &mut dyn RenderTarget) {
        self.scheduler.clear(target);
        self.guides.clear(target);
        self.overlay.clear(target);
        self.hovered = None;
        self.pending.clear();
    }

    fn live_mark(&self, key: &MarkKey) -> Option<Mark> {
        self.scheduler
            .get(key)
            .filter(|el| el.status != Status::Exiting)
            .map(|el| el.mark.clone())
    }

    /// Target geometry and fill for `mark`, with hover styling if it is hovered.
    fn styled_target(&self, mark: &Mark) -> (Geometry, Option<Rgba>) {
        if self.hovered.as_ref() == Some(&mark.key) {
            if let Some(hl) = self.chart.highlight(mark) {
                return (hl.geometry, hl.fill.or(mark.fill));
            }
        }
        (mark.geometry.clone(), mark.fill)
    }

    fn unhighlight(&mut self, key: &MarkKey, target: &mut dyn RenderTarget) {
        self.overlay.clear(target);
        let Some(mark) = self.live_mark(key) else {
            return;
        };
        if let Some(hl) = self.chart.highlight(&mark) {
            self.scheduler.restyle(
                key,
                mark.geometry.clone(),
                mark.fill,
                hl.timing,
                &mut self.pending,
            );
        }
    }

    fn refresh_overlay(
        &mut self,
        key: &MarkKey,
        snapshot: &Snapshot,
        target: &mut dyn RenderTarget,
    ) {
        let guides = match self.live_mark(key) {
            Some(mark) => self.chart.hover_guides(&mark, snapshot),
            None => Vec::new(),
        };
        self.overlay.sync(guides, target);
    }
}
