//! Game state
//!
//! [`GameState`] owns everything the render loop draws with. Only the two
//! control flags are shared with another task; every other field is written
//! once at startup and read from the render task afterwards.

pub mod flags;
pub mod model;

use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use crate::app::config::AssetConfig;
use crate::app::renderer::resources::ResourceError;
use crate::app::renderer::{GraphicsBackend, RenderResources, VertexLayout};
use crate::app::shader_system::{ShaderError, ShaderProgram};

pub use flags::ControlFlags;
pub use model::{ModelAsset, ModelError};

/// Startup failures building the game state
#[derive(Error, Debug)]
pub enum StartupError {
    #[error("failed to load model: {0}")]
    Model(#[from] ModelError),

    #[error("failed to build shader program: {0}")]
    Shader(#[from] ShaderError),

    #[error("failed to upload model: {0}")]
    Resources(#[from] ResourceError),
}

/// Aggregate root for the render loop
#[derive(Debug)]
pub struct GameState {
    program: ShaderProgram,
    model: ModelAsset,
    resources: RenderResources,
    flags: Arc<ControlFlags>,
}

impl GameState {
    /// Loads the model, builds the program and uploads the model
    ///
    /// On failure anything already created on the GPU is released.
    pub fn load<G: GraphicsBackend + ?Sized>(
        gfx: &mut G,
        assets: &AssetConfig,
        layout: &VertexLayout,
        flags: Arc<ControlFlags>,
    ) -> Result<Self, StartupError> {
        let model = ModelAsset::load(&assets.model_path(), layout.stride())?;
        let program = ShaderProgram::build(
            gfx,
            assets.vertex_shader_path(),
            assets.fragment_shader_path(),
            layout,
        )?;

        let resources = match RenderResources::upload(gfx, &model, layout) {
            Ok(resources) => resources,
            Err(err) => {
                program.release(gfx);
                return Err(err.into());
            }
        };

        Ok(Self::new(program, model, resources, flags))
    }

    pub fn new(
        program: ShaderProgram,
        model: ModelAsset,
        resources: RenderResources,
        flags: Arc<ControlFlags>,
    ) -> Self {
        Self {
            program,
            model,
            resources,
            flags,
        }
    }

    pub fn program(&self) -> &ShaderProgram {
        &self.program
    }

    pub fn program_mut(&mut self) -> &mut ShaderProgram {
        &mut self.program
    }

    pub fn model(&self) -> &ModelAsset {
        &self.model
    }

    pub fn resources(&self) -> &RenderResources {
        &self.resources
    }

    pub fn flags(&self) -> &Arc<ControlFlags> {
        &self.flags
    }

    /// Releases every GPU object the state owns
    pub fn teardown<G: GraphicsBackend + ?Sized>(self, gfx: &mut G) {
        info!(
            program = %self.program.handle(),
            vertex_array = %self.resources.vertex_array(),
            "Releasing GPU resources"
        );
        self.program.release(gfx);
        self.resources.release(gfx);
    }
}
