//! Windowless session over the recording backend
//!
//! Runs the same poller, channel, handler and render loop as the windowed
//! app, with scripted input instead of winit events. The handler is stepped
//! between ticks instead of running as a task, so a quit or reload pushed
//! before tick N is observed by the loop at tick N+1, the same latency the
//! concurrent handler gives in the best case.

use std::sync::Arc;

use tracing::debug;

use super::config::AppConfig;
use super::input::{
    Disposition, EventHandler, EventPoller, EventReceiver, KeyCode, PlatformQueue, RawEvent,
    event_channel,
};
use super::render_loop::{LoopError, LoopState, LoopStats, RenderLoop};
use super::renderer::{RecordingBackend, VertexLayout};
use crate::game::{ControlFlags, GameState, StartupError};

/// A render loop driven by scripted input
pub struct HeadlessSession {
    gfx: RecordingBackend,
    render_loop: RenderLoop,
    queue: PlatformQueue,
    receiver: Option<EventReceiver>,
    handler: EventHandler,
    flags: Arc<ControlFlags>,
}

impl HeadlessSession {
    /// Loads the configured assets onto a fresh [`RecordingBackend`]
    pub fn start(config: &AppConfig) -> Result<Self, StartupError> {
        Self::with_backend(config, RecordingBackend::new())
    }

    /// Like [`start`](Self::start), on a backend that may carry injected
    /// failures
    pub fn with_backend(config: &AppConfig, mut gfx: RecordingBackend) -> Result<Self, StartupError> {
        let flags = Arc::new(ControlFlags::new());
        let game = GameState::load(
            &mut gfx,
            &config.assets,
            &VertexLayout::position_only(),
            Arc::clone(&flags),
        )?;

        let (sender, receiver) = event_channel();
        let poller = EventPoller::new(sender, config.hot_reload.key);
        let render_loop = RenderLoop::new(game, poller, &config.render, config.hot_reload.on_failure);

        Ok(Self {
            gfx,
            render_loop,
            queue: PlatformQueue::new(),
            receiver: Some(receiver),
            handler: EventHandler::new(Arc::clone(&flags)),
            flags,
        })
    }

    /// Queues raw input for the next tick
    pub fn push(&mut self, raw: RawEvent) {
        self.queue.push(raw);
    }

    pub fn press(&mut self, key: KeyCode) {
        self.push(RawEvent::KeyPressed(key));
    }

    pub fn request_close(&mut self) {
        self.push(RawEvent::QuitRequested);
    }

    /// Ticks the loop, then lets the handler apply what the tick forwarded
    pub fn tick(&mut self) -> Result<LoopState, LoopError> {
        let state = self.render_loop.tick(&mut self.gfx, &mut self.queue)?;
        self.step_handler();
        Ok(state)
    }

    /// Ticks until the loop terminates or `max_ticks` is reached
    pub fn run(&mut self, max_ticks: u64) -> Result<LoopState, LoopError> {
        let mut state = self.render_loop.state();
        for _ in 0..max_ticks {
            state = self.tick()?;
            if state == LoopState::Terminated {
                break;
            }
        }
        Ok(state)
    }

    fn step_handler(&mut self) {
        let Some(receiver) = self.receiver.as_mut() else {
            return;
        };

        while let Some(event) = receiver.try_recv() {
            if self.handler.apply(&event) == Disposition::Stop {
                debug!("Handler stopped, closing channel");
                self.receiver = None;
                return;
            }
        }
    }

    pub fn gfx(&self) -> &RecordingBackend {
        &self.gfx
    }

    /// Backend access for injecting failures between ticks
    pub fn gfx_mut(&mut self) -> &mut RecordingBackend {
        &mut self.gfx
    }

    pub fn render_loop(&self) -> &RenderLoop {
        &self.render_loop
    }

    pub fn flags(&self) -> &Arc<ControlFlags> {
        &self.flags
    }

    /// Releases the game's resources and returns the backend for inspection
    pub fn shutdown(self) -> (RecordingBackend, LoopStats) {
        let mut gfx = self.gfx;
        let stats = self.render_loop.shutdown(&mut gfx);
        (gfx, stats)
    }
}
