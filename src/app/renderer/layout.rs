//! Vertex attribute layout
//!
//! Model vertex data is a flat `f32` sequence. The layout says how many
//! floats make up one vertex and where each shader input lives inside it.

/// One shader input inside a vertex
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexAttribute {
    /// Shader input location
    pub location: u32,
    /// Number of `f32` components (1..=4)
    pub components: u32,
    /// Offset from the start of the vertex, in floats
    pub offset: u32,
}

/// Interleaved `f32` vertex layout
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VertexLayout {
    attributes: Vec<VertexAttribute>,
    stride: u32,
}

impl VertexLayout {
    /// Builds a layout by packing `components` tightly in order, assigning
    /// locations from 0
    pub fn packed(components: &[u32]) -> Self {
        let mut offset = 0;
        let attributes = components
            .iter()
            .enumerate()
            .map(|(location, &components)| {
                let attribute = VertexAttribute {
                    location: location as u32,
                    components,
                    offset,
                };
                offset += components;
                attribute
            })
            .collect();

        Self {
            attributes,
            stride: offset,
        }
    }

    /// A single `vec3<f32>` position at location 0
    pub fn position_only() -> Self {
        Self::packed(&[3])
    }

    pub fn attributes(&self) -> &[VertexAttribute] {
        &self.attributes
    }

    /// Floats per vertex
    pub fn stride(&self) -> u32 {
        self.stride
    }

    /// Bytes per vertex
    pub fn stride_bytes(&self) -> u64 {
        u64::from(self.stride) * std::mem::size_of::<f32>() as u64
    }

    /// wgpu attribute descriptors for this layout
    pub fn wgpu_attributes(&self) -> Vec<wgpu::VertexAttribute> {
        self.attributes
            .iter()
            .map(|attribute| wgpu::VertexAttribute {
                format: match attribute.components {
                    1 => wgpu::VertexFormat::Float32,
                    2 => wgpu::VertexFormat::Float32x2,
                    3 => wgpu::VertexFormat::Float32x3,
                    _ => wgpu::VertexFormat::Float32x4,
                },
                offset: u64::from(attribute.offset) * std::mem::size_of::<f32>() as u64,
                shader_location: attribute.location,
            })
            .collect()
    }
}

impl Default for VertexLayout {
    fn default() -> Self {
        Self::position_only()
    }
}
