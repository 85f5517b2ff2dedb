//! Transition scheduler: per-key tweens driven at frame boundaries.
//!
//! Each element walks `Absent -> Entering -> Present -> Exiting -> Absent`. It owns
//! two independent channels (geometry and fill), like named transitions: a new
//! target on one channel supersedes only that channel's in-flight tween, and the
//! superseded tween's last interpolated value becomes the new start.

use indexmap::IndexMap;
use log::{debug, trace, warn};
use serde::{Deserialize, Serialize};

use crate::chart::Mark;
use crate::error::{InterpolationError, TransitionError};
use crate::geometry::{Geometry, Rgba};
use crate::ids::{ElementHandle, MarkKey};
use crate::interp::{Ease, Interpolate};
use crate::outputs::{Change, ChannelName, CoreEvent, Outputs};
use crate::render::{geometry_attrs, Attrs, RenderTarget};

/// Duration, delay and easing of one kind of transition.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhaseTiming {
    pub duration_ms: u32,
    pub delay_ms: u32,
    pub ease: Ease,
}

impl Default for PhaseTiming {
    fn default() -> Self {
        Self {
            duration_ms: 1000,
            delay_ms: 0,
            ease: Ease::CubicInOut,
        }
    }
}

impl PhaseTiming {
    pub const IMMEDIATE: PhaseTiming = PhaseTiming {
        duration_ms: 0,
        delay_ms: 0,
        ease: Ease::Linear,
    };

    pub fn ms(duration_ms: u32) -> Self {
        Self {
            duration_ms,
            ..Self::default()
        }
    }

    pub fn delayed(mut self, delay_ms: u32) -> Self {
        self.delay_ms = delay_ms;
        self
    }

    #[inline]
    pub fn is_immediate(&self) -> bool {
        self.duration_ms == 0 && self.delay_ms == 0
    }
}

/// Timings for the three reconciliation phases of a chart.
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Timing {
    pub enter: PhaseTiming,
    pub update: PhaseTiming,
    pub exit: PhaseTiming,
}

/// A time-parameterized interpolation from `from` to `to`.
#[derive(Clone, Debug, PartialEq)]
pub struct Tween<T> {
    pub from: T,
    pub to: T,
    pub elapsed_ms: f32,
    pub timing: PhaseTiming,
}

impl<T: Interpolate> Tween<T> {
    pub fn new(from: T, to: T, timing: PhaseTiming) -> Self {
        Self {
            from,
            to,
            elapsed_ms: 0.0,
            timing,
        }
    }

    /// Linear progress in [0, 1]; 0 while delayed.
    pub fn progress(&self) -> f32 {
        let active = self.elapsed_ms - self.timing.delay_ms as f32;
        if active <= 0.0 {
            return if self.timing.duration_ms == 0 && self.timing.delay_ms == 0 {
                1.0
            } else {
                0.0
            };
        }
        if self.timing.duration_ms == 0 {
            return 1.0;
        }
        (active / self.timing.duration_ms as f32).min(1.0)
    }

    /// Value at the current progress.
    pub fn sample(&self) -> Result<T, InterpolationError> {
        let t = self.progress();
        if t >= 1.0 {
            return Ok(self.to.clone());
        }
        self.from.interpolate(&self.to, self.timing.ease.apply(t))
    }

    pub fn is_finished(&self) -> bool {
        self.progress() >= 1.0
    }
}

/// What happened to a channel during one frame.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Step {
    /// No tween in flight.
    Idle,
    /// Still delayed; nothing to draw.
    Waiting,
    /// Value changed, tween continues.
    Moved,
    /// Value reached the target this frame.
    Finished,
}

/// The rendered value of one attribute group plus its in-flight tween, if any.
#[derive(Clone, Debug, PartialEq)]
pub struct Channel<T> {
    current: T,
    tween: Option<Tween<T>>,
}

impl<T: Interpolate + PartialEq> Channel<T> {
    pub fn new(value: T) -> Self {
        Self {
            current: value,
            tween: None,
        }
    }

    /// Last rendered value (the interpolation anchor).
    #[inline]
    pub fn current(&self) -> &T {
        &self.current
    }

    #[inline]
    pub fn tween(&self) -> Option<&Tween<T>> {
        self.tween.as_ref()
    }

    #[inline]
    pub fn in_flight(&self) -> bool {
        self.tween.is_some()
    }

    /// Final value this channel is heading to.
    pub fn target(&self) -> &T {
        self.tween.as_ref().map_or(&self.current, |t| &t.to)
    }

    /// Start a tween to `to` from the last rendered value. Returns the progress
    /// of the tween that was superseded, if one was in flight.
    pub fn retarget(&mut self, to: T, timing: PhaseTiming) -> Option<f32> {
        let superseded = self.tween.take().map(|t| t.progress());
        if superseded.is_none() && self.current == to {
            return None;
        }
        self.tween = Some(Tween::new(self.current.clone(), to, timing));
        superseded
    }

    /// Like [`Channel::retarget`] but always starts a tween, so a completion is
    /// observed on a later frame even when the value does not change.
    pub fn restart(&mut self, to: T, timing: PhaseTiming) -> Option<f32> {
        let superseded = self.tween.take().map(|t| t.progress());
        self.tween = Some(Tween::new(self.current.clone(), to, timing));
        superseded
    }

    /// Advance by `dt_ms`. On interpolation failure the channel snaps to its
    /// target and the error is returned.
    pub fn advance(&mut self, dt_ms: f32) -> Result<Step, InterpolationError> {
        let Some(tween) = self.tween.as_mut() else {
            return Ok(Step::Idle);
        };
        tween.elapsed_ms += dt_ms.max(0.0);
        if tween.elapsed_ms < tween.timing.delay_ms as f32 {
            return Ok(Step::Waiting);
        }
        let finished = tween.is_finished();
        match tween.sample() {
            Ok(value) => {
                self.current = value;
                if finished {
                    self.tween = None;
                    Ok(Step::Finished)
                } else {
                    Ok(Step::Moved)
                }
            }
            Err(err) => {
                if let Some(t) = self.tween.take() {
                    self.current = t.to;
                }
                Err(err)
            }
        }
    }
}

/// Lifecycle position of a rendered key.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Status {
    Entering,
    Present,
    Exiting,
}

/// Engine-owned state of one rendered element.
#[derive(Clone, Debug)]
pub struct ElementState {
    pub handle: ElementHandle,
    pub status: Status,
    /// Latest layout output for this key (unhighlighted).
    pub mark: Mark,
    pub geometry: Channel<Geometry>,
    pub fill: Option<Channel<Rgba>>,
    updating: bool,
    style_dirty: bool,
}

impl ElementState {
    fn attrs(&self) -> Attrs {
        let mut attrs = geometry_attrs(self.geometry.current());
        if let Some(fill) = &self.fill {
            attrs.set(self.mark.paint.attr(), *fill.current());
        }
        attrs
    }
}

/// Registry of element states keyed by mark, in creation order.
#[derive(Debug, Default)]
pub struct TransitionScheduler {
    elements: IndexMap<MarkKey, ElementState>,
}

impl TransitionScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &MarkKey) -> Option<&ElementState> {
        self.elements.get(key)
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&MarkKey, &ElementState)> {
        self.elements.iter()
    }

    /// Keys that are entering or present (exiting keys are already gone from the data).
    pub fn live_keys(&self) -> impl Iterator<Item = &MarkKey> {
        self.elements
            .iter()
            .filter(|(_, e)| e.status != Status::Exiting)
            .map(|(k, _)| k)
    }

    /// True when no channel has a tween in flight.
    pub fn is_idle(&self) -> bool {
        self.elements
            .values()
            .all(|e| !e.geometry.in_flight() && e.fill.as_ref().map_or(true, |f| !f.in_flight()))
    }

    /// New key: create its element at `start` and tween to the mark's geometry.
    ///
    /// A key that is still exiting is revived from its current interpolated value
    /// instead of getting a second element.
    pub fn enter(
        &mut self,
        mark: Mark,
        target_geometry: Geometry,
        target_fill: Option<Rgba>,
        start: Geometry,
        timing: PhaseTiming,
        render: &mut dyn RenderTarget,
        outputs: &mut Outputs,
    ) {
        if let Some(el) = self.elements.get_mut(&mark.key) {
            debug!("scheduler: reviving exiting {}", mark.key);
            el.status = Status::Entering;
            el.style_dirty = el.mark.style != mark.style;
            el.mark = mark;
            if let Some(p) = el.geometry.restart(target_geometry, timing) {
                outputs.push_event(CoreEvent::Superseded {
                    key: el.mark.key.clone(),
                    channel: ChannelName::Geometry,
                    progress: p,
                });
            }
            retarget_fill(el, target_fill, timing, outputs);
            return;
        }

        let mut geometry = Channel::new(start);
        geometry.restart(target_geometry, timing);
        let mut el = ElementState {
            handle: ElementHandle(0),
            status: Status::Entering,
            geometry,
            fill: target_fill.map(Channel::new),
            updating: false,
            style_dirty: false,
            mark,
        };
        let mut attrs = el.mark.style.clone();
        attrs.extend(&el.attrs());
        el.handle = render.create_element(el.mark.kind, &attrs);
        trace!("scheduler: created {} as {:?}", el.mark.key, el.handle);
        self.elements.insert(el.mark.key.clone(), el);
    }

    /// Existing key: tween from the last rendered value to the new target.
    pub fn update(
        &mut self,
        mark: Mark,
        target_geometry: Geometry,
        target_fill: Option<Rgba>,
        timing: PhaseTiming,
        outputs: &mut Outputs,
    ) {
        let Some(el) = self.elements.get_mut(&mark.key) else {
            warn!("scheduler: update for unknown {}", mark.key);
            return;
        };
        el.style_dirty |= el.mark.style != mark.style;
        el.mark = mark;
        if let Some(p) = el.geometry.retarget(target_geometry, timing) {
            debug!("scheduler: superseded geometry of {} at {p:.2}", el.mark.key);
            outputs.push_event(CoreEvent::Superseded {
                key: el.mark.key.clone(),
                channel: ChannelName::Geometry,
                progress: p,
            });
        }
        el.updating = el.status == Status::Present && el.geometry.in_flight();
        retarget_fill(el, target_fill, timing, outputs);
    }

    /// Retarget only the visual channels of a live key (hover styling).
    pub fn restyle(
        &mut self,
        key: &MarkKey,
        target_geometry: Geometry,
        target_fill: Option<Rgba>,
        timing: PhaseTiming,
        outputs: &mut Outputs,
    ) {
        let Some(el) = self.elements.get_mut(key) else {
            return;
        };
        if el.status == Status::Exiting {
            return;
        }
        if *el.geometry.target() != target_geometry {
            if let Some(p) = el.geometry.retarget(target_geometry, timing) {
                outputs.push_event(CoreEvent::Superseded {
                    key: key.clone(),
                    channel: ChannelName::Geometry,
                    progress: p,
                });
            }
        }
        retarget_fill(el, target_fill, timing, outputs);
    }

    /// Key gone from the data: tween to `vanish`, then destroy.
    pub fn exit(
        &mut self,
        key: &MarkKey,
        vanish: impl FnOnce(&Geometry) -> Geometry,
        timing: PhaseTiming,
        outputs: &mut Outputs,
    ) {
        let Some(el) = self.elements.get_mut(key) else {
            return;
        };
        if el.status == Status::Exiting {
            return;
        }
        el.status = Status::Exiting;
        el.updating = false;
        let to = vanish(el.geometry.current());
        if let Some(p) = el.geometry.restart(to, timing) {
            outputs.push_event(CoreEvent::Superseded {
                key: key.clone(),
                channel: ChannelName::Geometry,
                progress: p,
            });
        }
        if let Some(fill) = el.fill.as_mut() {
            if fill.in_flight() {
                let target = *fill.target();
                fill.current = target;
                fill.tween = None;
            }
        }
    }

    /// Advance every channel by `dt_ms`, push changed attributes to the target,
    /// and destroy elements whose exit finished.
    pub fn advance(&mut self, dt_ms: f32, render: &mut dyn RenderTarget, outputs: &mut Outputs) {
        let mut finished_exits: Vec<MarkKey> = Vec::new();
        for (key, el) in self.elements.iter_mut() {
            let mut changed = el.style_dirty;
            let geometry_step = match el.geometry.advance(dt_ms) {
                Ok(step) => step,
                Err(source) => {
                    let err = TransitionError {
                        key: key.clone(),
                        source,
                    };
                    warn!("scheduler: {err}");
                    outputs.push_event(CoreEvent::TransitionFailed {
                        key: key.clone(),
                        message: err.to_string(),
                    });
                    Step::Finished
                }
            };
            changed |= matches!(geometry_step, Step::Moved | Step::Finished);
            if let Some(fill) = el.fill.as_mut() {
                // Rgba interpolation cannot fail.
                if let Ok(Step::Moved | Step::Finished) = fill.advance(dt_ms) {
                    changed = true;
                }
            }

            if geometry_step == Step::Finished {
                match el.status {
                    Status::Entering => {
                        el.status = Status::Present;
                        outputs.push_event(CoreEvent::Entered { key: key.clone() });
                    }
                    Status::Present if el.updating => {
                        el.updating = false;
                        outputs.push_event(CoreEvent::Updated { key: key.clone() });
                    }
                    Status::Exiting => {
                        finished_exits.push(key.clone());
                        continue;
                    }
                    Status::Present => {}
                }
            }

            if changed {
                let mut attrs = if el.style_dirty {
                    el.mark.style.clone()
                } else {
                    Attrs::new()
                };
                attrs.extend(&el.attrs());
                el.style_dirty = false;
                render.set_attributes(el.handle, &attrs);
                outputs.push_change(Change {
                    key: key.clone(),
                    handle: el.handle,
                    attrs,
                });
            }
        }

        for key in finished_exits {
            if let Some(el) = self.elements.shift_remove(&key) {
                render.remove_element(el.handle);
                trace!("scheduler: destroyed {key}");
                outputs.push_event(CoreEvent::Exited { key });
            }
        }
    }

    /// Remove every element immediately.
    pub fn clear(&mut self, render: &mut dyn RenderTarget) {
        for (_, el) in self.elements.drain(..) {
            render.remove_element(el.handle);
        }
    }
}

fn retarget_fill(
    el: &mut ElementState,
    target: Option<Rgba>,
    timing: PhaseTiming,
    outputs: &mut Outputs,
) {
    match (el.fill.as_mut(), target) {
        (Some(fill), Some(to)) => {
            if *fill.target() == to {
                return;
            }
            if let Some(p) = fill.retarget(to, timing) {
                outputs.push_event(CoreEvent::Superseded {
                    key: el.mark.key.clone(),
                    channel: ChannelName::Fill,
                    progress: p,
                });
            }
        }
        (None, Some(to)) => el.fill = Some(Channel::new(to)),
        (_, None) => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bar(h: f32) -> Geometry {
        Geometry::Bar {
            x: 0.0,
            y: 100.0 - h,
            width: 10.0,
            height: h,
        }
    }

    #[test]
    fn tween_progress_respects_delay_and_duration() {
        let mut tw = Tween::new(bar(0.0), bar(1.0), PhaseTiming::ms(100).delayed(50));
        assert_eq!(tw.progress(), 0.0);
        tw.elapsed_ms = 100.0;
        assert_eq!(tw.progress(), 0.5);
        tw.elapsed_ms = 500.0;
        assert!(tw.is_finished());
    }

    #[test]
    fn supersede_starts_from_interpolated_value() {
        let timing = PhaseTiming {
            duration_ms: 1000,
            delay_ms: 0,
            ease: Ease::Linear,
        };
        let mut ch = Channel::new(bar(0.0));
        ch.retarget(bar(100.0), timing);
        assert_eq!(ch.advance(400.0), Ok(Step::Moved));
        let at_supersede = ch.current().clone();
        assert_eq!(at_supersede, bar(40.0));

        let p = ch.retarget(bar(10.0), timing);
        assert_eq!(p, Some(0.4));
        assert_eq!(ch.tween().unwrap().from, at_supersede);
        assert_eq!(ch.current(), &at_supersede);
    }

    #[test]
    fn immediate_timing_finishes_on_next_frame() {
        let mut ch = Channel::new(bar(0.0));
        ch.retarget(bar(30.0), PhaseTiming::IMMEDIATE);
        assert_eq!(ch.advance(0.0), Ok(Step::Finished));
        assert_eq!(ch.current(), &bar(30.0));
        assert_eq!(ch.advance(16.0), Ok(Step::Idle));
    }

    #[test]
    fn retarget_to_same_value_is_a_noop() {
        let mut ch = Channel::new(bar(5.0));
        assert_eq!(ch.retarget(bar(5.0), PhaseTiming::ms(10)), None);
        assert!(!ch.in_flight());
    }

    #[test]
    fn mismatch_snaps_to_target() {
        let mut ch = Channel::new(bar(5.0));
        let point = Geometry::Point {
            cx: 1.0,
            cy: 2.0,
            r: 4.0,
        };
        ch.retarget(point.clone(), PhaseTiming::ms(100));
        assert!(ch.advance(10.0).is_err());
        assert_eq!(ch.current(), &point);
        assert!(!ch.in_flight());
    }

    #[test]
    fn restart_always_schedules_a_completion() {
        let mut ch = Channel::new(bar(5.0));
        assert_eq!(ch.restart(bar(5.0), PhaseTiming::ms(10)), None);
        assert!(ch.in_flight());
        assert_eq!(ch.advance(10.0), Ok(Step::Finished));
    }
}
