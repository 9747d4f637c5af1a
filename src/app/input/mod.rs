//! Input handling
//!
//! Input crosses from the render task to the handler task over a channel:
//!
//! ```text
//! winit WindowEvent → PlatformQueue          (render task, per callback)
//!                          ↓ poll (drain all, once per tick)
//!                     EventPoller            (render task, inline)
//!                          ↓ Event{Quit|Reload}
//!                     EventChannel           (FIFO)
//!                          ↓ recv().await
//!                     EventHandler           (handler task)
//!                          ↓
//!                     ControlFlags           (running, reload_pending)
//! ```
//!
//! The render loop reads the flags at the top of each tick.

mod channel;
mod events;
mod handler;
mod poller;
mod queue;

pub use channel::{ChannelClosed, EventReceiver, EventSender, event_channel};
pub use events::{Event, EventKind, EventSource, KeyCode, RawEvent, UnknownKey};
pub use handler::{Disposition, EventHandler};
pub use poller::EventPoller;
pub use queue::{PlatformQueue, RawEventSource};
