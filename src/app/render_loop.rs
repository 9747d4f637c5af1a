//! The render loop state machine
//!
//! Each tick:
//!
//! ```text
//! poll input → running? ──no──→ Terminated
//!                 │yes
//!          take reload flag ──set──→ Reloading: rebuild program (blocking)
//!                 │                        │
//!                 ├────────────────────────┘
//!          begin frame → clear → draw → present
//! ```
//!
//! `running` is read before the reload flag, so once a quit has been observed
//! no rebuild, clear, draw or present happens.

use thiserror::Error;
use tracing::{debug, error, info, warn};

use super::config::{ReloadFailurePolicy, RenderConfig};
use super::input::{EventPoller, RawEventSource};
use super::renderer::{ClearColor, FrameError, GfxError, GraphicsBackend};
use super::shader_system::ShaderError;
use crate::game::GameState;

/// Render loop state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Running,
    /// Inside a shader rebuild; lasts at most one tick
    Reloading,
    Terminated,
}

/// Counters over the loop's lifetime
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoopStats {
    pub ticks: u64,
    pub frames: u64,
    pub skipped_frames: u64,
    pub rebuilds: u32,
    pub failed_rebuilds: u32,
}

/// Errors that stop the loop
#[derive(Error, Debug)]
pub enum LoopError {
    #[error("shader reload failed: {0}")]
    Reload(#[source] ShaderError),

    #[error("frame failed: {0}")]
    Frame(#[from] FrameError),

    #[error("draw failed: {0}")]
    Gfx(#[from] GfxError),
}

/// Drives polling, hot reload and drawing for one [`GameState`]
#[derive(Debug)]
pub struct RenderLoop {
    game: GameState,
    poller: EventPoller,
    clear_color: ClearColor,
    on_reload_failure: ReloadFailurePolicy,
    state: LoopState,
    stats: LoopStats,
}

impl RenderLoop {
    pub fn new(
        game: GameState,
        poller: EventPoller,
        render: &RenderConfig,
        on_reload_failure: ReloadFailurePolicy,
    ) -> Self {
        info!(
            reload_key = %poller.reload_key(),
            ?on_reload_failure,
            "Render loop ready"
        );
        Self {
            game,
            poller,
            clear_color: render.clear_color,
            on_reload_failure,
            state: LoopState::Running,
            stats: LoopStats::default(),
        }
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn stats(&self) -> LoopStats {
        self.stats
    }

    pub fn game(&self) -> &GameState {
        &self.game
    }

    /// Runs one tick and returns the resulting state
    ///
    /// An error also moves the loop to [`LoopState::Terminated`].
    pub fn tick<G, S>(&mut self, gfx: &mut G, input: &mut S) -> Result<LoopState, LoopError>
    where
        G: GraphicsBackend + ?Sized,
        S: RawEventSource + ?Sized,
    {
        if self.state == LoopState::Terminated {
            return Ok(LoopState::Terminated);
        }
        self.stats.ticks += 1;

        self.poller.poll(input);

        let result = self.advance(gfx);
        if result.is_err() {
            self.state = LoopState::Terminated;
        }
        result.map(|()| self.state)
    }

    /// Forwards pending input and observes quit without touching the GPU
    ///
    /// For event-loop wakeups that carry no redraw, e.g. while the window is
    /// hidden and the compositor withholds frames.
    pub fn pump<S: RawEventSource + ?Sized>(&mut self, input: &mut S) -> LoopState {
        if self.state != LoopState::Terminated {
            self.poller.poll(input);
            self.observe_quit();
        }
        self.state
    }

    /// Moves to [`LoopState::Terminated`] once `running` is false
    fn observe_quit(&mut self) -> bool {
        if self.game.flags().is_running() {
            return false;
        }
        info!(
            ticks = self.stats.ticks,
            frames = self.stats.frames,
            "Render loop terminated"
        );
        self.state = LoopState::Terminated;
        true
    }

    fn advance<G: GraphicsBackend + ?Sized>(&mut self, gfx: &mut G) -> Result<(), LoopError> {
        if self.observe_quit() {
            return Ok(());
        }

        if self.game.flags().take_reload() {
            self.state = LoopState::Reloading;
            self.reload(gfx)?;
            self.state = LoopState::Running;
        }

        self.draw_frame(gfx)
    }

    fn reload<G: GraphicsBackend + ?Sized>(&mut self, gfx: &mut G) -> Result<(), LoopError> {
        info!(
            vertex = %self.game.program().vertex_path().display(),
            fragment = %self.game.program().fragment_path().display(),
            "Reloading shader program"
        );

        match self.game.program_mut().rebuild(gfx) {
            Ok(()) => {
                self.stats.rebuilds += 1;
                Ok(())
            }
            Err(err) => {
                self.stats.failed_rebuilds += 1;
                match self.on_reload_failure {
                    ReloadFailurePolicy::KeepLastGood => {
                        error!(
                            error = %err,
                            program = %self.game.program().handle(),
                            "Shader reload failed, keeping previous program"
                        );
                        Ok(())
                    }
                    ReloadFailurePolicy::Abort => Err(LoopError::Reload(err)),
                }
            }
        }
    }

    fn draw_frame<G: GraphicsBackend + ?Sized>(&mut self, gfx: &mut G) -> Result<(), LoopError> {
        if let Err(err) = gfx.begin_frame() {
            return self.skip_or_fail(err);
        }

        let resources = self.game.resources();
        gfx.clear(self.clear_color);
        gfx.draw(
            self.game.program().handle(),
            resources.vertex_array(),
            resources.draw_call(),
        )?;

        if let Err(err) = gfx.present() {
            return self.skip_or_fail(err);
        }
        self.stats.frames += 1;
        Ok(())
    }

    fn skip_or_fail(&mut self, err: FrameError) -> Result<(), LoopError> {
        if err.is_fatal() {
            return Err(err.into());
        }
        self.stats.skipped_frames += 1;
        match err {
            FrameError::SurfaceLost => warn!("Surface lost, skipping frame"),
            _ => debug!(error = %err, "Skipping frame"),
        }
        Ok(())
    }

    /// Releases the game's GPU resources
    pub fn shutdown<G: GraphicsBackend + ?Sized>(self, gfx: &mut G) -> LoopStats {
        info!(
            frames = self.stats.frames,
            rebuilds = self.stats.rebuilds,
            failed_rebuilds = self.stats.failed_rebuilds,
            "Shutting down render loop"
        );
        self.game.teardown(gfx);
        self.stats
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::app::config::AssetConfig;
    use crate::app::input::{
        Event, EventHandler, EventKind, EventReceiver, KeyCode, PlatformQueue, RawEvent,
        event_channel,
    };
    use crate::app::renderer::{DrawCall, GfxCall, RecordingBackend, ShaderStage, VertexLayout};
    use crate::game::ControlFlags;

    struct Fixture {
        _dir: tempfile::TempDir,
        gfx: RecordingBackend,
        render_loop: RenderLoop,
        receiver: EventReceiver,
        handler: EventHandler,
    }

    impl Fixture {
        fn new(policy: ReloadFailurePolicy) -> Self {
            let dir = tempfile::tempdir().unwrap();
            std::fs::create_dir_all(dir.path().join("shaders")).unwrap();
            std::fs::create_dir_all(dir.path().join("models")).unwrap();
            std::fs::write(dir.path().join("shaders/vertex.wgsl"), "fn vs_main() {}").unwrap();
            std::fs::write(dir.path().join("shaders/fragment.wgsl"), "fn fs_main() {}").unwrap();
            std::fs::write(
                dir.path().join("models/triangle.json"),
                r#"{"model": {"vertices": [-0.5, -0.5, 0.0, 0.5, -0.5, 0.0, 0.0, 0.5, 0.0]}}"#,
            )
            .unwrap();

            let assets = AssetConfig::default().with_root(dir.path());
            let flags = Arc::new(ControlFlags::new());
            let mut gfx = RecordingBackend::new();
            let game = GameState::load(
                &mut gfx,
                &assets,
                &VertexLayout::position_only(),
                Arc::clone(&flags),
            )
            .unwrap();

            let (sender, receiver) = event_channel();
            let poller = EventPoller::new(sender, KeyCode::R);
            let render = RenderConfig {
                clear_color: ClearColor([0.0, 0.0, 0.0, 1.0]),
            };
            gfx.clear_calls();

            Self {
                _dir: dir,
                gfx,
                render_loop: RenderLoop::new(game, poller, &render, policy),
                receiver,
                handler: EventHandler::new(flags),
            }
        }

        fn tick(&mut self, input: impl IntoIterator<Item = RawEvent>) -> LoopState {
            let mut queue: PlatformQueue = input.into_iter().collect();
            self.render_loop.tick(&mut self.gfx, &mut queue).unwrap()
        }

        /// Applies everything the poller has sent so far
        fn drain_handler(&mut self) {
            while let Some(event) = self.receiver.try_recv() {
                self.handler.apply(&event);
            }
        }
    }

    #[test]
    fn test_tick_clears_then_draws_then_presents() {
        let mut fx = Fixture::new(ReloadFailurePolicy::KeepLastGood);

        assert_eq!(fx.tick([]), LoopState::Running);

        let program = fx.render_loop.game().program().handle();
        let vertex_array = fx.render_loop.game().resources().vertex_array();
        assert_eq!(
            fx.gfx.calls(),
            &[
                GfxCall::BeginFrame,
                GfxCall::Clear(ClearColor([0.0, 0.0, 0.0, 1.0])),
                GfxCall::Draw {
                    program,
                    vertex_array,
                    call: DrawCall::Arrays { vertex_count: 3 },
                },
                GfxCall::Present,
            ]
        );
        assert_eq!(fx.render_loop.stats().frames, 1);
    }

    #[test]
    fn test_quit_observed_next_tick_stops_drawing() {
        let mut fx = Fixture::new(ReloadFailurePolicy::KeepLastGood);

        fx.tick([RawEvent::QuitRequested]);
        fx.drain_handler();
        let presented = fx.gfx.frames_presented();

        assert_eq!(fx.tick([]), LoopState::Terminated);
        assert_eq!(fx.tick([]), LoopState::Terminated);
        assert_eq!(fx.gfx.frames_presented(), presented);
        assert_eq!(fx.render_loop.state(), LoopState::Terminated);
    }

    #[test]
    fn test_pump_observes_quit_without_frames() {
        let mut fx = Fixture::new(ReloadFailurePolicy::KeepLastGood);

        let mut queue: PlatformQueue = [RawEvent::QuitRequested].into_iter().collect();
        assert_eq!(fx.render_loop.pump(&mut queue), LoopState::Running);
        assert!(queue.is_empty());
        fx.drain_handler();

        assert_eq!(fx.render_loop.pump(&mut PlatformQueue::new()), LoopState::Terminated);
        assert!(fx.gfx.calls().is_empty());
        assert_eq!(fx.tick([]), LoopState::Terminated);
        assert_eq!(fx.gfx.frames_presented(), 0);
    }

    #[test]
    fn test_reload_rebuilds_once_before_drawing() {
        let mut fx = Fixture::new(ReloadFailurePolicy::KeepLastGood);
        let old = fx.render_loop.game().program().handle();

        fx.tick([RawEvent::KeyPressed(KeyCode::R)]);
        fx.drain_handler();
        fx.gfx.clear_calls();
        fx.tick([]);

        let new = fx.render_loop.game().program().handle();
        assert_ne!(new, old);
        assert!(!fx.gfx.is_program_live(old));
        assert_eq!(fx.gfx.programs_linked(), 1);

        let link = fx
            .gfx
            .calls()
            .iter()
            .position(|c| matches!(c, GfxCall::LinkProgram { .. }))
            .unwrap();
        let draw = fx
            .gfx
            .calls()
            .iter()
            .position(|c| matches!(c, GfxCall::Draw { .. }))
            .unwrap();
        assert!(link < draw);
        assert!(matches!(
            fx.gfx.calls()[draw],
            GfxCall::Draw { program, .. } if program == new
        ));

        // flag was consumed
        fx.tick([]);
        assert_eq!(fx.render_loop.stats().rebuilds, 1);
    }

    #[test]
    fn test_repeated_reload_presses_coalesce() {
        let mut fx = Fixture::new(ReloadFailurePolicy::KeepLastGood);

        fx.tick([
            RawEvent::KeyPressed(KeyCode::R),
            RawEvent::KeyPressed(KeyCode::R),
            RawEvent::KeyPressed(KeyCode::R),
        ]);
        fx.drain_handler();
        fx.tick([]);
        fx.tick([]);

        assert_eq!(fx.render_loop.stats().rebuilds, 1);
    }

    #[test]
    fn test_failed_reload_keeps_last_good_program() {
        let mut fx = Fixture::new(ReloadFailurePolicy::KeepLastGood);
        let old = fx.render_loop.game().program().handle();

        fx.gfx
            .fail_next_compile(Some(ShaderStage::Fragment), "unexpected token");
        fx.tick([RawEvent::KeyPressed(KeyCode::R)]);
        fx.drain_handler();
        assert_eq!(fx.tick([]), LoopState::Running);

        assert_eq!(fx.render_loop.game().program().handle(), old);
        assert_eq!(fx.render_loop.stats().failed_rebuilds, 1);
        assert!(matches!(fx.gfx.calls().last(), Some(GfxCall::Present)));
    }

    #[test]
    fn test_failed_reload_aborts_under_abort_policy() {
        let mut fx = Fixture::new(ReloadFailurePolicy::Abort);

        fx.gfx.fail_next_link("varying mismatch");
        fx.tick([RawEvent::KeyPressed(KeyCode::R)]);
        fx.drain_handler();
        let presented = fx.gfx.frames_presented();

        let mut queue = PlatformQueue::new();
        let err = fx.render_loop.tick(&mut fx.gfx, &mut queue).unwrap_err();

        assert!(matches!(err, LoopError::Reload(_)));
        assert_eq!(fx.render_loop.state(), LoopState::Terminated);
        assert_eq!(fx.gfx.frames_presented(), presented);
    }

    #[test]
    fn test_lost_surface_skips_frame() {
        let mut fx = Fixture::new(ReloadFailurePolicy::KeepLastGood);

        fx.gfx.fail_next_frame(FrameError::SurfaceLost);
        assert_eq!(fx.tick([]), LoopState::Running);
        assert_eq!(fx.gfx.frames_presented(), 0);
        assert_eq!(fx.render_loop.stats().skipped_frames, 1);

        fx.tick([]);
        assert_eq!(fx.gfx.frames_presented(), 1);
    }

    #[test]
    fn test_out_of_memory_is_fatal() {
        let mut fx = Fixture::new(ReloadFailurePolicy::KeepLastGood);

        fx.gfx.fail_next_frame(FrameError::OutOfMemory);
        let mut queue = PlatformQueue::new();
        let err = fx.render_loop.tick(&mut fx.gfx, &mut queue).unwrap_err();

        assert!(matches!(err, LoopError::Frame(FrameError::OutOfMemory)));
        assert_eq!(fx.render_loop.state(), LoopState::Terminated);
    }

    #[test]
    fn test_shutdown_releases_everything() {
        let mut fx = Fixture::new(ReloadFailurePolicy::KeepLastGood);
        fx.tick([]);

        let Fixture {
            mut gfx,
            render_loop,
            ..
        } = fx;
        let stats = render_loop.shutdown(&mut gfx);

        assert_eq!(stats.frames, 1);
        assert_eq!(gfx.live_objects(), 0);
    }

    #[test]
    fn test_other_keys_are_ignored() {
        let mut fx = Fixture::new(ReloadFailurePolicy::KeepLastGood);

        fx.tick([RawEvent::KeyPressed(KeyCode::Space), RawEvent::Other]);
        assert!(fx.receiver.try_recv().is_none());

        // unbound keys reaching the handler change nothing
        fx.handler
            .apply(&Event::from_player(EventKind::Keyboard(KeyCode::Space)));
        assert_eq!(fx.tick([]), LoopState::Running);
        assert_eq!(fx.render_loop.stats().rebuilds, 0);
    }
}
