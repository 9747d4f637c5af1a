//! Main application handler

use std::sync::Arc;

use anyhow::Context;
use tokio::runtime::Runtime;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};
use winit::application::ApplicationHandler;
use winit::event::WindowEvent;
use winit::event_loop::ActiveEventLoop;
use winit::window::{Window, WindowId};

use super::config::AppConfig;
use super::input::{EventHandler, EventPoller, PlatformQueue, RawEvent, event_channel};
use super::render_loop::{LoopState, RenderLoop};
use super::renderer::{VertexLayout, WgpuBackend};
use super::window::window_attributes_from_config;
use crate::game::{ControlFlags, GameState};

/// Everything that exists only while the window is open
struct Session {
    window: Arc<Window>,
    gfx: WgpuBackend,
    render_loop: RenderLoop,
    queue: PlatformQueue,
    handler: JoinHandle<usize>,
}

impl Session {
    fn open(
        event_loop: &ActiveEventLoop,
        config: &AppConfig,
        runtime: &Runtime,
    ) -> anyhow::Result<Self> {
        let window_attributes = window_attributes_from_config(&config.window);
        let window = Arc::new(
            event_loop
                .create_window(window_attributes)
                .context("failed to create window")?,
        );
        let size = window.inner_size();
        info!(
            window.width = size.width,
            window.height = size.height,
            "Window created successfully"
        );

        // winit's event loop is synchronous; wgpu setup is awaited on the runtime
        let mut gfx = runtime
            .block_on(WgpuBackend::new(
                window.clone(),
                config.window.vsync,
                runtime.handle().clone(),
            ))
            .context("failed to initialize graphics backend")?;

        let flags = Arc::new(ControlFlags::new());
        let game = GameState::load(
            &mut gfx,
            &config.assets,
            &VertexLayout::position_only(),
            Arc::clone(&flags),
        )
        .context("failed to load game state")?;

        let (sender, receiver) = event_channel();
        let handler = runtime.spawn(EventHandler::new(flags).run(receiver));
        let poller = EventPoller::new(sender, config.hot_reload.key);
        let render_loop = RenderLoop::new(
            game,
            poller,
            &config.render,
            config.hot_reload.on_failure,
        );

        Ok(Self {
            window,
            gfx,
            render_loop,
            queue: PlatformQueue::new(),
            handler,
        })
    }

    /// Releases GPU resources and waits for the handler task
    fn close(self, runtime: &Runtime) {
        let Self {
            mut gfx,
            render_loop,
            handler,
            ..
        } = self;
        render_loop.shutdown(&mut gfx);

        // Dropping the loop dropped the sender, so the handler is finishing
        match runtime.block_on(handler) {
            Ok(applied) => info!(applied, "Event handler joined"),
            Err(e) => warn!(error = %e, "Event handler task failed"),
        }
    }
}

/// Windowed application
pub struct App {
    config: AppConfig,
    runtime: Runtime,
    session: Option<Session>,
    fatal: Option<anyhow::Error>,
}

impl App {
    /// Creates a new application with the provided configuration
    pub fn new(config: AppConfig) -> anyhow::Result<Self> {
        info!(profile = %config.profile, "Starting hotshade");
        info!(?config.window, "Window configuration");
        info!(?config.assets, "Asset configuration");

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .thread_name("hotshade-events")
            .enable_all()
            .build()
            .context("failed to create tokio runtime")?;

        Ok(Self {
            config,
            runtime,
            session: None,
            fatal: None,
        })
    }

    /// Creates a new application with configuration loaded from environment
    pub fn from_env() -> anyhow::Result<Self> {
        let config = AppConfig::load_from_env().unwrap_or_else(|e| {
            warn!(error = %e, "Failed to load config, using default configuration");
            AppConfig::builtin("release")
        });
        Self::new(config)
    }

    /// Takes the error that stopped the event loop, if any
    pub fn take_error(&mut self) -> Option<anyhow::Error> {
        self.fatal.take()
    }

    fn stop(&mut self, event_loop: &ActiveEventLoop, err: Option<anyhow::Error>) {
        if let Some(session) = self.session.take() {
            session.close(&self.runtime);
        }
        if let Some(err) = err {
            error!(error = %err, "Stopping after fatal error");
            self.fatal = Some(err);
        }
        event_loop.exit();
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.session.is_some() || self.fatal.is_some() {
            return;
        }

        match Session::open(event_loop, &self.config, &self.runtime) {
            Ok(session) => {
                info!("Render loop started");
                self.session = Some(session);
            }
            Err(e) => self.stop(event_loop, Some(e)),
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        let Some(session) = self.session.as_mut() else {
            return;
        };

        // A hidden window may get no RedrawRequested, so input is drained here too
        if session.render_loop.pump(&mut session.queue) == LoopState::Terminated {
            info!("Close requested, exiting");
            self.stop(event_loop, None);
            return;
        }
        session.window.request_redraw();
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        let Some(session) = self.session.as_mut() else {
            return;
        };

        if let Some(raw) = RawEvent::from_window_event(&event) {
            session.queue.push(raw);
        }

        match event {
            WindowEvent::Resized(new_size) => session.gfx.resize(new_size),
            WindowEvent::RedrawRequested => {
                match session.render_loop.tick(&mut session.gfx, &mut session.queue) {
                    Ok(LoopState::Terminated) => {
                        info!("Close requested, exiting");
                        self.stop(event_loop, None);
                    }
                    Ok(_) => {}
                    Err(e) => self.stop(event_loop, Some(e.into())),
                }
            }
            _ => {}
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(session) = self.session.take() {
            session.close(&self.runtime);
        }
    }
}
