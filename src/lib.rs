//! hotshade
//!
//! Draws a model with a WGSL shader program in a winit window and rebuilds
//! the program from disk when the reload key is pressed.

/// Windowing, GPU backend, input and the render loop
pub mod app;

/// Build-time information (git SHA, branch, timestamp, etc.)
pub mod build_info;

/// Game state: model, control flags and the resources drawn each frame
pub mod game;

/// Startup health checks
pub mod health;
