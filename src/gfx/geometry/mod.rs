//! # Procedural Geometry Generation
//!
//! Primitive shapes generated in code, for placeholder content and tests.
//!
//! ```rust
//! use fresnel_ar::gfx::geometry::generate_cube;
//!
//! let cube = generate_cube().to_mesh_data("cube");
//! assert_eq!(cube.triangle_count(), 12);
//! ```

pub mod primitives;

pub use primitives::*;

use crate::assets::MeshData;

/// Represents generated geometry data ready for GPU upload
#[derive(Debug, Clone, Default)]
pub struct GeometryData {
    /// Vertex positions (x, y, z)
    pub vertices: Vec<[f32; 3]>,
    /// Texture coordinates (u, v)
    pub tex_coords: Vec<[f32; 2]>,
    /// Normal vectors (x, y, z)
    pub normals: Vec<[f32; 3]>,
    /// Triangle indices (counter-clockwise winding)
    pub indices: Vec<u32>,
}

impl GeometryData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Converts to the same mesh form the asset loader produces
    pub fn to_mesh_data(&self, name: &str) -> MeshData {
        MeshData {
            name: name.to_string(),
            positions: self.vertices.clone(),
            normals: self.normals.clone(),
            tex_coords: self.tex_coords.clone(),
            indices: self.indices.clone(),
        }
    }
}
