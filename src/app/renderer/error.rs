//! GPU error types

use thiserror::Error;

use super::ShaderStage;

/// Failures reported by a [`GraphicsBackend`](super::GraphicsBackend)
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GfxError {
    /// A shader stage failed to compile; `log` holds the compiler output
    #[error("failed to compile {stage} shader `{label}`:\n{log}")]
    Compile {
        stage: ShaderStage,
        label: String,
        log: String,
    },

    /// Program link failed; `log` holds the linker output
    #[error("failed to link program `{label}`:\n{log}")]
    Link { label: String, log: String },

    /// A handle that was never created or was already released
    #[error("unknown {kind} handle {id}")]
    UnknownHandle { kind: &'static str, id: u32 },

    /// Draw issued outside `begin_frame`/`present`
    #[error("draw issued with no frame in progress")]
    NoFrame,
}

/// Failures acquiring or presenting a frame
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FrameError {
    /// Surface was lost or outdated and has been reconfigured; skip this frame
    #[error("surface lost, reconfigured")]
    SurfaceLost,

    /// Acquiring the next surface texture timed out; skip this frame
    #[error("timed out acquiring surface texture")]
    Timeout,

    /// The GPU ran out of memory
    #[error("out of memory")]
    OutOfMemory,

    /// `clear`/`draw`/`present` without `begin_frame`
    #[error("no frame in progress")]
    NoFrame,

    #[error("surface error: {0}")]
    Other(String),
}

impl FrameError {
    /// Returns true if the loop should stop rather than skip the frame
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::SurfaceLost | Self::Timeout)
    }
}

impl From<wgpu::SurfaceError> for FrameError {
    fn from(err: wgpu::SurfaceError) -> Self {
        match err {
            wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated => Self::SurfaceLost,
            wgpu::SurfaceError::Timeout => Self::Timeout,
            wgpu::SurfaceError::OutOfMemory => Self::OutOfMemory,
            other => Self::Other(other.to_string()),
        }
    }
}
