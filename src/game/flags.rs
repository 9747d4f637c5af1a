//! Control flags shared between the event handler and the render loop
//!
//! These two booleans are the only state written from outside the render
//! task. Both are atomics so no lock is held across a tick.

use std::sync::atomic::{AtomicBool, Ordering};

/// `running` and `reload_pending`, shared through an `Arc`
#[derive(Debug)]
pub struct ControlFlags {
    running: AtomicBool,
    reload_pending: AtomicBool,
}

impl ControlFlags {
    /// Running, no reload pending
    pub fn new() -> Self {
        Self {
            running: AtomicBool::new(true),
            reload_pending: AtomicBool::new(false),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Stops the loop at its next tick; cannot be undone
    pub fn request_quit(&self) {
        self.running.store(false, Ordering::Release);
    }

    /// Marks a rebuild for the next tick; repeated requests coalesce
    pub fn request_reload(&self) {
        self.reload_pending.store(true, Ordering::Release);
    }

    pub fn is_reload_pending(&self) -> bool {
        self.reload_pending.load(Ordering::Acquire)
    }

    /// Reads and clears the reload flag in one step
    pub fn take_reload(&self) -> bool {
        self.reload_pending.swap(false, Ordering::AcqRel)
    }
}

impl Default for ControlFlags {
    fn default() -> Self {
        Self::new()
    }
}
