//! Built-in health checks for core systems

pub mod assets;
pub mod build_info;
pub mod config;
pub mod graphics_backend;
pub mod render_loop;
pub mod system_info;

pub use assets::AssetsCheck;
pub use build_info::BuildInfoCheck;
pub use config::ConfigCheck;
pub use graphics_backend::GraphicsBackendCheck;
pub use render_loop::RenderLoopCheck;
pub use system_info::SystemInfoCheck;
