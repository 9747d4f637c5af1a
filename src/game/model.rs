//! Mesh data loaded from a model description file

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use tracing::info;

use crate::app::renderer::DrawCall;

/// Errors loading or validating a model
#[derive(Error, Debug)]
pub enum ModelError {
    #[error("failed to read model file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse model file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("model has {len} floats, not a multiple of the vertex stride {stride}")]
    InvalidStride { len: usize, stride: u32 },

    #[error("index {index} at position {position} is out of range for {vertex_count} vertices")]
    IndexOutOfRange {
        index: u32,
        position: usize,
        vertex_count: usize,
    },

    /// wgpu cannot slice a zero-size vertex buffer for binding
    #[error("model has no vertices")]
    Empty,
}

/// On-disk document: `{"model": {...}, "texture": {...}}`
#[derive(Debug, Deserialize)]
struct ModelDocument {
    model: ModelAsset,
    /// Reserved; parsed so malformed files still fail loudly
    #[serde(default)]
    #[allow(dead_code)]
    texture: TextureDescriptor,
}

/// Placeholder for texture data; never populated
#[derive(Debug, Default, Deserialize)]
struct TextureDescriptor {}

/// Immutable vertex and index data for one mesh
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ModelAsset {
    vertices: Vec<f32>,
    #[serde(default)]
    indices: Vec<u32>,
}

impl ModelAsset {
    /// Creates a model and checks it against `stride` floats per vertex
    pub fn new(vertices: Vec<f32>, indices: Vec<u32>, stride: u32) -> Result<Self, ModelError> {
        let model = Self { vertices, indices };
        model.validate(stride)?;
        Ok(model)
    }

    /// Loads and validates a model file
    pub fn load(path: &Path, stride: u32) -> Result<Self, ModelError> {
        let bytes = std::fs::read(path).map_err(|source| ModelError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let model = Self::from_json(&bytes, stride).map_err(|err| match err {
            ModelError::Parse { source, .. } => ModelError::Parse {
                path: path.to_path_buf(),
                source,
            },
            other => other,
        })?;

        info!(
            path = %path.display(),
            vertices = model.vertex_count(stride),
            indices = model.indices.len(),
            "Model loaded"
        );
        Ok(model)
    }

    /// Parses and validates a model document
    pub fn from_json(bytes: &[u8], stride: u32) -> Result<Self, ModelError> {
        let document: ModelDocument =
            serde_json::from_slice(bytes).map_err(|source| ModelError::Parse {
                path: PathBuf::new(),
                source,
            })?;
        document.model.validate(stride)?;
        Ok(document.model)
    }

    /// Checks the stride and index invariants
    pub fn validate(&self, stride: u32) -> Result<(), ModelError> {
        let stride_len = stride.max(1) as usize;
        if self.vertices.is_empty() {
            return Err(ModelError::Empty);
        }
        if self.vertices.len() % stride_len != 0 {
            return Err(ModelError::InvalidStride {
                len: self.vertices.len(),
                stride,
            });
        }

        let vertex_count = self.vertices.len() / stride_len;
        if let Some((position, &index)) = self
            .indices
            .iter()
            .enumerate()
            .find(|&(_, &index)| index as usize >= vertex_count)
        {
            return Err(ModelError::IndexOutOfRange {
                index,
                position,
                vertex_count,
            });
        }
        Ok(())
    }

    pub fn vertices(&self) -> &[f32] {
        &self.vertices
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    /// Returns true if the model is drawn through an index list
    pub fn is_indexed(&self) -> bool {
        !self.indices.is_empty()
    }

    /// Number of vertices at `stride` floats each
    pub fn vertex_count(&self, stride: u32) -> usize {
        self.vertices.len() / stride.max(1) as usize
    }

    /// Draw call covering the whole model
    pub fn draw_call(&self, stride: u32) -> DrawCall {
        if self.is_indexed() {
            DrawCall::Elements {
                index_count: self.indices.len() as u32,
            }
        } else {
            DrawCall::Arrays {
                vertex_count: self.vertex_count(stride) as u32,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_non_indexed_triangle() {
        let json = br#"{"model": {"vertices": [0,0,0, 1,0,0, 0,1,0], "indices": []}, "texture": {}}"#;
        let model = ModelAsset::from_json(json, 3).unwrap();

        assert!(!model.is_indexed());
        assert_eq!(model.vertex_count(3), 3);
        assert_eq!(model.draw_call(3), DrawCall::Arrays { vertex_count: 3 });
    }

    #[test]
    fn test_parse_indexed_square() {
        let json = br#"{
            "model": {
                "vertices": [0.5,0.5,0, 0.5,-0.5,0, -0.5,-0.5,0, -0.5,0.5,0],
                "indices": [0,1,3, 1,2,3]
            }
        }"#;
        let model = ModelAsset::from_json(json, 3).unwrap();

        assert!(model.is_indexed());
        assert_eq!(model.draw_call(3), DrawCall::Elements { index_count: 6 });
    }

    #[test]
    fn test_missing_indices_means_non_indexed() {
        let json = br#"{"model": {"vertices": [0,0,0]}}"#;
        let model = ModelAsset::from_json(json, 3).unwrap();
        assert!(model.indices().is_empty());
    }

    #[test]
    fn test_index_out_of_range_rejected() {
        let err = ModelAsset::new(vec![0.0; 9], vec![0, 1, 3], 3).unwrap_err();
        assert!(matches!(
            err,
            ModelError::IndexOutOfRange {
                index: 3,
                position: 2,
                vertex_count: 3
            }
        ));
    }

    #[test]
    fn test_partial_vertex_rejected() {
        let err = ModelAsset::new(vec![0.0; 8], vec![], 3).unwrap_err();
        assert!(matches!(err, ModelError::InvalidStride { len: 8, stride: 3 }));
    }

    #[test]
    fn test_malformed_json_is_parse_error() {
        let err = ModelAsset::from_json(br#"{"model": {"vertices": "nope"}}"#, 3).unwrap_err();
        assert!(matches!(err, ModelError::Parse { .. }));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = ModelAsset::load(Path::new("does/not/exist.json"), 3).unwrap_err();
        assert!(matches!(err, ModelError::Io { .. }));
    }

    #[test]
    fn test_empty_model_rejected() {
        let err = ModelAsset::from_json(br#"{"model": {"vertices": []}}"#, 3).unwrap_err();
        assert!(matches!(err, ModelError::Empty));
    }
}
