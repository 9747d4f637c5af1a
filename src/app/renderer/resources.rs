//! GPU buffers for one model

use tracing::{debug, info};

use super::{BufferId, DrawCall, GfxError, GraphicsBackend, VertexArrayId, VertexLayout};
use crate::game::model::{ModelAsset, ModelError};

/// Errors uploading model data
#[derive(thiserror::Error, Debug)]
pub enum ResourceError {
    /// The model does not fit the requested layout
    #[error(transparent)]
    Layout(#[from] ModelError),

    #[error(transparent)]
    Gfx(#[from] GfxError),
}

/// Vertex buffer, optional element buffer and the vertex array binding them
///
/// Created once per model and never modified. Shader reloads do not touch
/// these handles.
#[derive(Debug, PartialEq, Eq)]
pub struct RenderResources {
    vertex_buffer: BufferId,
    element_buffer: Option<BufferId>,
    vertex_array: VertexArrayId,
    layout: VertexLayout,
    draw_call: DrawCall,
}

impl RenderResources {
    /// Uploads `model` and binds it with `layout`
    pub fn upload<G: GraphicsBackend + ?Sized>(
        gfx: &mut G,
        model: &ModelAsset,
        layout: &VertexLayout,
    ) -> Result<Self, ResourceError> {
        model.validate(layout.stride())?;

        let vertex_buffer = gfx.create_vertex_buffer(model.vertices());
        let element_buffer = model
            .is_indexed()
            .then(|| gfx.create_element_buffer(model.indices()));

        let vertex_array = match gfx.create_vertex_array(vertex_buffer, element_buffer, layout) {
            Ok(vertex_array) => vertex_array,
            Err(err) => {
                gfx.release_buffer(vertex_buffer);
                if let Some(buffer) = element_buffer {
                    gfx.release_buffer(buffer);
                }
                return Err(err.into());
            }
        };

        let draw_call = model.draw_call(layout.stride());
        info!(
            %vertex_buffer,
            %vertex_array,
            indexed = element_buffer.is_some(),
            count = draw_call.count(),
            "Model uploaded"
        );

        Ok(Self {
            vertex_buffer,
            element_buffer,
            vertex_array,
            layout: layout.clone(),
            draw_call,
        })
    }

    pub fn vertex_buffer(&self) -> BufferId {
        self.vertex_buffer
    }

    pub fn element_buffer(&self) -> Option<BufferId> {
        self.element_buffer
    }

    pub fn vertex_array(&self) -> VertexArrayId {
        self.vertex_array
    }

    pub fn layout(&self) -> &VertexLayout {
        &self.layout
    }

    /// Draw call sized to the uploaded model
    pub fn draw_call(&self) -> DrawCall {
        self.draw_call
    }

    /// Releases every handle
    pub fn release<G: GraphicsBackend + ?Sized>(self, gfx: &mut G) {
        debug!(vertex_array = %self.vertex_array, "Releasing model buffers");
        gfx.release_vertex_array(self.vertex_array);
        if let Some(buffer) = self.element_buffer {
            gfx.release_buffer(buffer);
        }
        gfx.release_buffer(self.vertex_buffer);
    }
}
