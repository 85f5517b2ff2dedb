//! Change-event sources polled by the host once per frame.

use std::collections::VecDeque;
use std::sync::mpsc::{Receiver, Sender, TryRecvError};

use log::debug;

use crate::changelog::ChangeEvent;

/// Ordered source of change events.
pub trait DataFeed {
    /// Events that arrived since the last poll, in arrival order.
    fn poll(&mut self) -> Vec<ChangeEvent>;

    /// True once the feed will never produce more events.
    fn is_closed(&self) -> bool {
        false
    }
}

/// Feed backed by an mpsc channel, so a producer thread can push events.
#[derive(Debug)]
pub struct ChannelFeed {
    rx: Receiver<ChangeEvent>,
    closed: bool,
}

impl ChannelFeed {
    pub fn new(rx: Receiver<ChangeEvent>) -> Self {
        Self { rx, closed: false }
    }

    /// A connected `(sender, feed)` pair.
    pub fn pair() -> (Sender<ChangeEvent>, Self) {
        let (tx, rx) = std::sync::mpsc::channel();
        (tx, Self::new(rx))
    }
}

impl DataFeed for ChannelFeed {
    fn poll(&mut self) -> Vec<ChangeEvent> {
        let mut out = Vec::new();
        loop {
            match self.rx.try_recv() {
                Ok(ev) => out.push(ev),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    if !self.closed {
                        debug!("channel feed disconnected");
                    }
                    self.closed = true;
                    break;
                }
            }
        }
        out
    }

    fn is_closed(&self) -> bool {
        self.closed
    }
}

/// Feed that replays prepared batches, one batch per poll.
#[derive(Clone, Debug, Default)]
pub struct ScriptedFeed {
    batches: VecDeque<Vec<ChangeEvent>>,
}

impl ScriptedFeed {
    pub fn new(batches: impl IntoIterator<Item = Vec<ChangeEvent>>) -> Self {
        Self {
            batches: batches.into_iter().collect(),
        }
    }

    pub fn push(&mut self, batch: Vec<ChangeEvent>) {
        self.batches.push_back(batch);
    }

    pub fn remaining(&self) -> usize {
        self.batches.len()
    }
}

impl DataFeed for ScriptedFeed {
    fn poll(&mut self) -> Vec<ChangeEvent> {
        self.batches.pop_front().unwrap_or_default()
    }

    fn is_closed(&self) -> bool {
        self.batches.is_empty()
    }
}
