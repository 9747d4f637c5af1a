//! Event handler task
//!
//! The only writer of the control flags from outside the render loop.

use std::sync::Arc;

use tracing::{debug, info, trace};

use super::channel::EventReceiver;
use super::events::{Event, EventKind};
use crate::game::ControlFlags;

/// What the handler should do after applying an event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    Continue,
    Stop,
}

/// Applies domain events to the shared control flags
#[derive(Debug, Clone)]
pub struct EventHandler {
    flags: Arc<ControlFlags>,
}

impl EventHandler {
    pub fn new(flags: Arc<ControlFlags>) -> Self {
        Self { flags }
    }

    /// Applies a single event
    pub fn apply(&self, event: &Event) -> Disposition {
        match event.kind {
            EventKind::Quit => {
                info!(source = ?event.source, "Quit requested");
                self.flags.request_quit();
                Disposition::Stop
            }
            EventKind::Reload => {
                info!(source = ?event.source, "Shader reload requested");
                self.flags.request_reload();
                Disposition::Continue
            }
            EventKind::Keyboard(key) => {
                trace!(%key, "Unbound key");
                Disposition::Continue
            }
        }
    }

    /// Waits on `receiver` and applies events until a quit is applied or the
    /// channel closes; returns the number of events applied
    pub async fn run(self, mut receiver: EventReceiver) -> usize {
        debug!("Event handler started");
        let mut applied = 0;

        while let Some(event) = receiver.recv().await {
            applied += 1;
            if self.apply(&event) == Disposition::Stop {
                break;
            }
        }

        debug!(applied, "Event handler stopped");
        applied
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::input::channel::event_channel;
    use crate::app::input::events::KeyCode;

    #[test]
    fn test_apply_sets_flags() {
        let flags = Arc::new(ControlFlags::new());
        let handler = EventHandler::new(Arc::clone(&flags));

        assert_eq!(handler.apply(&Event::reload()), Disposition::Continue);
        assert!(flags.is_reload_pending());
        assert!(flags.is_running());

        assert_eq!(handler.apply(&Event::quit()), Disposition::Stop);
        assert!(!flags.is_running());
    }

    #[test]
    fn test_unbound_keys_change_nothing() {
        let flags = Arc::new(ControlFlags::new());
        let handler = EventHandler::new(Arc::clone(&flags));

        handler.apply(&Event::from_player(EventKind::Keyboard(KeyCode::W)));
        assert!(flags.is_running());
        assert!(!flags.is_reload_pending());
    }

    #[tokio::test]
    async fn test_run_stops_after_quit() {
        let flags = Arc::new(ControlFlags::new());
        let (tx, rx) = event_channel();
        tx.send(Event::reload()).unwrap();
        tx.send(Event::quit()).unwrap();
        tx.send(Event::reload()).unwrap();

        let applied = EventHandler::new(Arc::clone(&flags)).run(rx).await;

        // the reload after the quit is never applied
        assert_eq!(applied, 2);
        assert!(!flags.is_running());
        assert!(flags.take_reload());
        assert!(!flags.take_reload());
    }

    #[tokio::test]
    async fn test_run_ends_when_senders_drop() {
        let flags = Arc::new(ControlFlags::new());
        let (tx, rx) = event_channel();
        let task = tokio::spawn(EventHandler::new(Arc::clone(&flags)).run(rx));

        tx.send(Event::reload()).unwrap();
        drop(tx);

        assert_eq!(task.await.unwrap(), 1);
        assert!(flags.is_running());
    }
}
