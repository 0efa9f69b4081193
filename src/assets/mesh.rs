//! OBJ mesh decoding

use std::path::Path;

use log::{debug, info};

use super::AssetError;

/// CPU-side triangle mesh
#[derive(Debug, Clone, PartialEq)]
pub struct MeshData {
    pub name: String,
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub tex_coords: Vec<[f32; 2]>,
    pub indices: Vec<u32>,
}

impl MeshData {
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Axis-aligned bounds as (min, max), `None` for an empty mesh
    pub fn bounds(&self) -> Option<([f32; 3], [f32; 3])> {
        let first = *self.positions.first()?;
        Some(self.positions.iter().fold((first, first), |(mut lo, mut hi), p| {
            for axis in 0..3 {
                lo[axis] = lo[axis].min(p[axis]);
                hi[axis] = hi[axis].max(p[axis]);
            }
            (lo, hi)
        }))
    }
}

/// Decoded model: a named group of meshes, one per OBJ object
#[derive(Debug, Clone, PartialEq)]
pub struct MeshGroup {
    pub name: String,
    pub meshes: Vec<MeshData>,
}

/// Averages adjacent face normals per vertex
///
/// Used when the OBJ file carries no normals of its own.
pub fn calculate_vertex_normals(positions: &[[f32; 3]], indices: &[u32]) -> Vec<[f32; 3]> {
    let mut normals = vec![[0.0f32; 3]; positions.len()];

    for triangle in indices.chunks_exact(3) {
        let [i0, i1, i2] = [
            triangle[0] as usize,
            triangle[1] as usize,
            triangle[2] as usize,
        ];
        let (v0, v1, v2) = (positions[i0], positions[i1], positions[i2]);

        let edge1 = [v1[0] - v0[0], v1[1] - v0[1], v1[2] - v0[2]];
        let edge2 = [v2[0] - v0[0], v2[1] - v0[1], v2[2] - v0[2]];
        let face_normal = [
            edge1[1] * edge2[2] - edge1[2] * edge2[1],
            edge1[2] * edge2[0] - edge1[0] * edge2[2],
            edge1[0] * edge2[1] - edge1[1] * edge2[0],
        ];

        for vertex in [i0, i1, i2] {
            for axis in 0..3 {
                normals[vertex][axis] += face_normal[axis];
            }
        }
    }

    for normal in normals.iter_mut() {
        let length = (normal[0].powi(2) + normal[1].powi(2) + normal[2].powi(2)).sqrt();
        if length > 0.0 {
            for component in normal.iter_mut() {
                *component /= length;
            }
        }
    }

    normals
}

fn chunk3(values: &[f32]) -> Vec<[f32; 3]> {
    values.chunks_exact(3).map(|c| [c[0], c[1], c[2]]).collect()
}

fn mesh_from_model(model: &tobj::Model) -> MeshData {
    let mesh = &model.mesh;
    let positions = chunk3(&mesh.positions);

    let normals = if !mesh.normals.is_empty() && mesh.normals.len() == mesh.positions.len() {
        chunk3(&mesh.normals)
    } else {
        debug!("'{}' has no normals, computing them", model.name);
        calculate_vertex_normals(&positions, &mesh.indices)
    };

    // OBJ v runs bottom-up, wgpu samples top-down
    let tex_coords = if mesh.texcoords.len() / 2 == positions.len() {
        mesh.texcoords
            .chunks_exact(2)
            .map(|c| [c[0], 1.0 - c[1]])
            .collect()
    } else {
        vec![[0.0, 0.0]; positions.len()]
    };

    MeshData {
        name: model.name.clone(),
        positions,
        normals,
        tex_coords,
        indices: mesh.indices.clone(),
    }
}

/// Loads an OBJ file into a [`MeshGroup`]
///
/// Materials referenced by the file are ignored; the scene installs its own.
pub fn load_mesh(path: impl AsRef<Path>) -> Result<MeshGroup, AssetError> {
    let path = path.as_ref();
    let (models, _materials) = tobj::load_obj(
        path,
        &tobj::LoadOptions {
            triangulate: true,
            single_index: true,
            ..Default::default()
        },
    )
    .map_err(|source| AssetError::Mesh {
        path: path.to_path_buf(),
        source,
    })?;

    let meshes: Vec<MeshData> = models
        .iter()
        .map(mesh_from_model)
        .filter(|mesh| mesh.triangle_count() > 0)
        .collect();

    if meshes.is_empty() {
        return Err(AssetError::EmptyModel {
            path: path.to_path_buf(),
        });
    }

    let name = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "model".to_string());

    info!(
        "Loaded mesh {} ({} objects, {} triangles)",
        path.display(),
        meshes.len(),
        meshes.iter().map(MeshData::triangle_count).sum::<usize>()
    );

    Ok(MeshGroup { name, meshes })
}
