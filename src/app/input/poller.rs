//! Drains platform input and forwards domain events

use tracing::{debug, trace};

use super::channel::EventSender;
use super::events::{Event, KeyCode, RawEvent};
use super::queue::RawEventSource;

/// Classifies raw input and pushes the result onto the event channel
///
/// Runs inline on the render task. It never touches game state.
#[derive(Debug)]
pub struct EventPoller {
    sender: EventSender,
    reload_key: KeyCode,
    disconnected: bool,
}

impl EventPoller {
    pub fn new(sender: EventSender, reload_key: KeyCode) -> Self {
        Self {
            sender,
            reload_key,
            disconnected: false,
        }
    }

    pub fn reload_key(&self) -> KeyCode {
        self.reload_key
    }

    /// Maps one raw event to at most one domain event
    pub fn classify(&self, raw: &RawEvent) -> Option<Event> {
        match raw {
            RawEvent::QuitRequested => Some(Event::quit()),
            RawEvent::KeyPressed(key) if *key == self.reload_key => Some(Event::reload()),
            RawEvent::KeyPressed(_) | RawEvent::Other => None,
        }
    }

    /// Drains every queued raw event, returning how many domain events were
    /// forwarded
    pub fn poll<S: RawEventSource + ?Sized>(&mut self, source: &mut S) -> usize {
        let mut forwarded = 0;

        while let Some(raw) = source.poll_next() {
            let Some(event) = self.classify(&raw) else {
                trace!(?raw, "Ignoring input");
                continue;
            };

            match self.sender.send(event) {
                Ok(()) => forwarded += 1,
                Err(err) => {
                    // The handler exits after a quit; later input has nowhere to go
                    if !self.disconnected {
                        debug!(kind = ?err.0.kind, "Event handler gone, dropping input");
                        self.disconnected = true;
                    }
                }
            }
        }

        if forwarded > 0 {
            trace!(forwarded, "Forwarded input events");
        }
        forwarded
    }
}
