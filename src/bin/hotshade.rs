use anyhow::Context;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};
use winit::event_loop::{ControlFlow, EventLoop};

use hotshade::app::App;
use hotshade::build_info;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new("hotshade=info"))?)
        .init();

    tracing::info!(version = %build_info::version_string(), "hotshade");
    tracing::debug!("\n{}", build_info::detailed_info());

    let event_loop = EventLoop::new().context("failed to create event loop")?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::from_env()?;
    event_loop
        .run_app(&mut app)
        .context("event loop terminated abnormally")?;

    match app.take_error() {
        Some(err) => Err(err),
        None => Ok(()),
    }
}
