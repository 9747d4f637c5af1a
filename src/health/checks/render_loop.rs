//! Headless render loop health check

use crate::app::renderer::GfxCall;
use crate::app::{AppConfig, HeadlessSession, LoopState};
use crate::health::check::{CheckResult, SystemCheck};

/// Runs the configured assets through the render loop on the recording
/// backend: draw, reload, draw again, then quit
pub struct RenderLoopCheck {
    config: Option<AppConfig>,
}

impl RenderLoopCheck {
    pub fn new() -> Self {
        Self { config: None }
    }

    pub fn with_config(config: AppConfig) -> Self {
        Self {
            config: Some(config),
        }
    }

    fn run(config: &AppConfig) -> Result<Vec<String>, String> {
        let mut details = Vec::new();
        let mut session = HeadlessSession::start(config).map_err(|e| format!("startup: {e}"))?;
        let first = session.render_loop().game().program().handle();
        details.push(format!("  ✓ program {first} built, model uploaded"));

        session.tick().map_err(|e| format!("first frame: {e}"))?;
        let draws = session.gfx().draws();
        let Some(call) = draws.first() else {
            return Err("first tick issued no draw".to_string());
        };
        let game = session.render_loop().game();
        let expected = game.model().draw_call(game.resources().layout().stride());
        if *call != expected {
            return Err(format!("first frame drew {call:?}, model needs {expected:?}"));
        }
        details.push(format!("  ✓ first frame drew {call:?}"));

        session.press(config.hot_reload.key);
        session.tick().map_err(|e| format!("reload request: {e}"))?;
        session.tick().map_err(|e| format!("reload: {e}"))?;
        let reloaded = session.render_loop().game().program().handle();
        if reloaded == first {
            return Err(format!("{} did not rebuild the program", config.hot_reload.key));
        }
        details.push(format!(
            "  ✓ {} rebuilt the program ({first} → {reloaded})",
            config.hot_reload.key
        ));

        session.request_close();
        session.tick().map_err(|e| format!("quit request: {e}"))?;
        let presented = session.gfx().frames_presented();
        let state = session.tick().map_err(|e| format!("quit: {e}"))?;
        if state != LoopState::Terminated || session.gfx().frames_presented() != presented {
            return Err("loop kept drawing after quit".to_string());
        }
        details.push(format!("  ✓ terminated after {presented} frames"));

        let (gfx, _) = session.shutdown();
        let leaked = gfx.live_objects();
        if leaked > 0 {
            return Err(format!("{leaked} GPU object(s) not released at teardown"));
        }
        let releases = gfx.count(|c| {
            matches!(
                c,
                GfxCall::ReleaseProgram(_) | GfxCall::ReleaseBuffer(_) | GfxCall::ReleaseVertexArray(_)
            )
        });
        details.push(format!("  ✓ teardown released {releases} objects"));

        Ok(details)
    }
}

impl Default for RenderLoopCheck {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemCheck for RenderLoopCheck {
    fn name(&self) -> &'static str {
        "Render Loop"
    }

    fn description(&self) -> Option<&'static str> {
        Some("Runs draw, hot reload and quit headlessly on the configured assets")
    }

    fn check(&self) -> CheckResult {
        let config = match &self.config {
            Some(config) => config.clone(),
            None => match AppConfig::load_from_env() {
                Ok(config) => config,
                Err(e) => return CheckResult::fail(format!("Config failed to load: {e}")),
            },
        };

        match Self::run(&config) {
            Ok(details) => {
                CheckResult::pass("Draw, reload and quit behave").with_details(details.join("\n"))
            }
            Err(message) => CheckResult::fail(message),
        }
    }
}
