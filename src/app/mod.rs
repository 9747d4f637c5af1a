//! Windowed application
//!
//! Handles windowing, the GPU backend, input and the render loop.

pub mod config;
pub mod headless;
pub mod input;
pub mod render_loop;
pub mod renderer;
mod runner;
pub mod shader_system;
mod window;

pub use config::{AppConfig, WindowConfig};
pub use headless::HeadlessSession;
pub use render_loop::{LoopError, LoopState, LoopStats, RenderLoop};
pub use runner::App;
pub use window::window_attributes_from_config;
