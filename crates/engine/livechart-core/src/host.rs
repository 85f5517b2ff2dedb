//! Host driver: one live chart wired to a data feed and a render target.
//!
//! Each frame drains the feed, folds the batch into the change log, re-runs the
//! engine once if the batch changed anything, dispatches queued messages, and
//! advances tweens.

use std::collections::VecDeque;

use crate::chart::Chart;
use crate::changelog::{BatchReport, ChangeLog};
use crate::config::Config;
use crate::engine::{CycleReport, Engine};
use crate::error::EngineError;
use crate::feed::DataFeed;
use crate::inputs::{Command, Message};
use crate::outputs::Outputs;
use crate::record::Snapshot;
use crate::render::RenderTarget;

/// What happened during one frame.
#[derive(Clone, Debug, Default)]
pub struct FrameReport {
    /// Present when the feed delivered a batch.
    pub batch: Option<BatchReport>,
    /// Present when the batch changed the snapshot and layout succeeded.
    pub cycle: Option<CycleReport>,
    /// Upstream writes requested by interactions.
    pub commands: Vec<Command>,
    pub outputs: Outputs,
    /// Cycles dropped this frame. The previous scene stays in place.
    pub errors: Vec<EngineError>,
}

pub struct LiveChart<F, T> {
    config: Config,
    log: ChangeLog,
    engine: Engine,
    feed: F,
    target: T,
    messages: VecDeque<Message>,
}

impl<F: DataFeed, T: RenderTarget> LiveChart<F, T> {
    pub fn new(chart: impl Chart + 'static, feed: F, target: T, config: Config) -> Self {
        Self {
            log: ChangeLog::new(config.modify_policy),
            engine: Engine::new(chart),
            feed,
            target,
            messages: VecDeque::new(),
            config,
        }
    }

    pub fn snapshot(&self) -> &Snapshot {
        self.log.snapshot()
    }

    pub fn changelog_mut(&mut self) -> &mut ChangeLog {
        &mut self.log
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    pub fn target(&self) -> &T {
        &self.target
    }

    pub fn feed_mut(&mut self) -> &mut F {
        &mut self.feed
    }

    pub fn into_target(self) -> T {
        self.target
    }

    /// Queue a message for the next frame.
    pub fn send(&mut self, message: Message) {
        self.messages.push_back(message);
    }

    /// Run one frame of `dt` seconds.
    pub fn frame(&mut self, dt: f32) -> FrameReport {
        let mut report = FrameReport::default();

        let events = self.feed.poll();
        if !events.is_empty() {
            let batch = self.log.apply_batch(events);
            if batch.changed {
                match self.engine.update(self.log.snapshot(), &mut self.target) {
                    Ok(cycle) => report.cycle = Some(cycle),
                    Err(err) => report.errors.push(err),
                }
            }
            report.batch = Some(batch);
        }

        while let Some(message) = self.messages.pop_front() {
            match self
                .engine
                .dispatch(message, self.log.snapshot(), &mut self.target)
            {
                Ok(commands) => report.commands.extend(commands),
                Err(err) => report.errors.push(err),
            }
        }

        report.outputs = self.engine.tick(dt, &mut self.target).clone();
        report
    }

    /// Run frames of the configured length until the feed is closed, no message
    /// is queued and every tween has finished. Returns the per-frame reports.
    pub fn settle(&mut self) -> Vec<FrameReport> {
        let dt = self.config.frame_ms / 1000.0;
        let mut frames = Vec::new();
        for _ in 0..self.config.max_settle_frames {
            frames.push(self.frame(dt));
            if self.feed.is_closed() && self.messages.is_empty() && self.engine.is_idle() {
                break;
            }
        }
        frames
    }
}

impl<F, T> std::fmt::Debug for LiveChart<F, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LiveChart")
            .field("engine", &self.engine)
            .field("records", &self.log.snapshot().len())
            .field("version", &self.log.version())
            .field("queued", &self.messages.len())
            .finish()
    }
}
