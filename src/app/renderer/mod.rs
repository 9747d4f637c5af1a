//! GPU capability layer
//!
//! ## Architecture
//!
//! - `error`: failure types for compile/link and frame acquisition
//! - `handle`: typed, non-zero GPU object handles
//! - `layout`: vertex attribute layout shared by buffers and programs
//! - `recording`: headless backend that records every call
//! - `resources`: buffers and vertex array bound to one model
//! - `wgpu_backend`: the windowed wgpu backend
//!
//! The GPU context is single-threaded state. Instead of a process-wide
//! global, every compile, upload and draw goes through a [`GraphicsBackend`]
//! value owned by the render loop and passed in by `&mut`.

pub mod error;
pub mod handle;
pub mod layout;
pub mod recording;
pub mod resources;
pub mod wgpu_backend;

pub use error::{FrameError, GfxError};
pub use handle::{BufferId, ProgramId, StageId, VertexArrayId};
pub use layout::{VertexAttribute, VertexLayout};
pub use recording::{GfxCall, RecordingBackend};
pub use resources::RenderResources;
pub use wgpu_backend::WgpuBackend;

use serde::{Deserialize, Serialize};
use std::fmt;

/// Shader pipeline stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl ShaderStage {
    /// Entry point the stage's source must define
    pub fn entry_point(self) -> &'static str {
        match self {
            Self::Vertex => "vs_main",
            Self::Fragment => "fs_main",
        }
    }
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Vertex => f.write_str("vertex"),
            Self::Fragment => f.write_str("fragment"),
        }
    }
}

/// RGBA clear colour
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClearColor(pub [f64; 4]);

impl ClearColor {
    pub const TRANSPARENT: Self = Self([0.0, 0.0, 0.0, 0.0]);
}

impl Default for ClearColor {
    fn default() -> Self {
        Self::TRANSPARENT
    }
}

/// A single draw call, sized from the model it draws
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawCall {
    /// Non-indexed triangle list of `vertex_count` vertices
    Arrays { vertex_count: u32 },
    /// Indexed triangle list of `index_count` elements
    Elements { index_count: u32 },
}

impl DrawCall {
    /// Number of vertices or elements the call consumes
    pub fn count(&self) -> u32 {
        match *self {
            Self::Arrays { vertex_count } => vertex_count,
            Self::Elements { index_count } => index_count,
        }
    }
}

/// The GPU operations the render core needs
///
/// Implementations are bound to one graphics context and must only be used
/// from the task that owns it.
pub trait GraphicsBackend {
    /// Compiles one shader stage from source text
    fn compile_stage(
        &mut self,
        stage: ShaderStage,
        label: &str,
        source: &str,
    ) -> Result<StageId, GfxError>;

    /// Links a vertex and fragment stage into a program for `layout`
    fn link_program(
        &mut self,
        vertex: StageId,
        fragment: StageId,
        layout: &VertexLayout,
    ) -> Result<ProgramId, GfxError>;

    fn release_stage(&mut self, id: StageId);

    fn release_program(&mut self, id: ProgramId);

    /// Uploads interleaved vertex data
    fn create_vertex_buffer(&mut self, data: &[f32]) -> BufferId;

    /// Uploads index data
    fn create_element_buffer(&mut self, data: &[u32]) -> BufferId;

    /// Binds buffers to attribute locations according to `layout`
    fn create_vertex_array(
        &mut self,
        vertex_buffer: BufferId,
        element_buffer: Option<BufferId>,
        layout: &VertexLayout,
    ) -> Result<VertexArrayId, GfxError>;

    fn release_buffer(&mut self, id: BufferId);

    fn release_vertex_array(&mut self, id: VertexArrayId);

    /// Acquires the next frame to draw into
    fn begin_frame(&mut self) -> Result<(), FrameError>;

    /// Clears the current frame to `color`
    fn clear(&mut self, color: ClearColor);

    /// Draws `vertex_array` with `program`
    fn draw(
        &mut self,
        program: ProgramId,
        vertex_array: VertexArrayId,
        call: DrawCall,
    ) -> Result<(), GfxError>;

    /// Presents the current frame
    fn present(&mut self) -> Result<(), FrameError>;
}
