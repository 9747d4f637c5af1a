//! Platform event queue
//!
//! winit pushes window events into the application callbacks. They are
//! buffered here so the poller can pull and drain them once per tick.

use std::collections::VecDeque;

use super::events::RawEvent;

/// Pull-based source of raw platform input
pub trait RawEventSource {
    /// Next queued event, or `None` when the queue is empty
    fn poll_next(&mut self) -> Option<RawEvent>;
}

/// FIFO buffer of raw events between winit callbacks and the poller
#[derive(Debug, Default)]
pub struct PlatformQueue {
    events: VecDeque<RawEvent>,
}

impl PlatformQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: RawEvent) {
        self.events.push_back(event);
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

impl RawEventSource for PlatformQueue {
    fn poll_next(&mut self) -> Option<RawEvent> {
        self.events.pop_front()
    }
}

impl FromIterator<RawEvent> for PlatformQueue {
    fn from_iter<I: IntoIterator<Item = RawEvent>>(iter: I) -> Self {
        Self {
            events: iter.into_iter().collect(),
        }
    }
}

impl Extend<RawEvent> for PlatformQueue {
    fn extend<I: IntoIterator<Item = RawEvent>>(&mut self, iter: I) {
        self.events.extend(iter);
    }
}
