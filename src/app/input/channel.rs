//! Event channel between the poller and the handler
//!
//! FIFO, any number of senders, one receiver. Unbounded: input arrives at
//! human rates and the poller must never block the render loop.

use tokio::sync::mpsc;

use super::events::Event;

/// The receiving side has gone away
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("event channel closed")]
pub struct ChannelClosed(pub Event);

/// Sending half; cheap to clone
#[derive(Debug, Clone)]
pub struct EventSender(mpsc::UnboundedSender<Event>);

/// Receiving half; owned by the event handler
#[derive(Debug)]
pub struct EventReceiver(mpsc::UnboundedReceiver<Event>);

/// Creates a connected sender/receiver pair
pub fn event_channel() -> (EventSender, EventReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    (EventSender(tx), EventReceiver(rx))
}

impl EventSender {
    pub fn send(&self, event: Event) -> Result<(), ChannelClosed> {
        self.0.send(event).map_err(|err| ChannelClosed(err.0))
    }
}

impl EventReceiver {
    /// Waits for the next event; `None` once every sender is dropped
    pub async fn recv(&mut self) -> Option<Event> {
        self.0.recv().await
    }

    /// Next event if one is already queued
    pub fn try_recv(&mut self) -> Option<Event> {
        self.0.try_recv().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::input::events::EventKind;

    #[tokio::test]
    async fn test_events_arrive_in_send_order() {
        let (tx, mut rx) = event_channel();
        let other = tx.clone();

        tx.send(Event::reload()).unwrap();
        other.send(Event::quit()).unwrap();
        drop((tx, other));

        assert_eq!(rx.recv().await.map(|e| e.kind), Some(EventKind::Reload));
        assert_eq!(rx.recv().await.map(|e| e.kind), Some(EventKind::Quit));
        assert_eq!(rx.recv().await, None);
    }

    #[test]
    fn test_send_after_receiver_dropped_fails() {
        let (tx, rx) = event_channel();
        drop(rx);

        assert_eq!(tx.send(Event::quit()), Err(ChannelClosed(Event::quit())));
    }
}
