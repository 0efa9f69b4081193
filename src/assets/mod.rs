//! # Asset Loading
//!
//! Decodes the scene's mesh (OBJ through `tobj`) and texture (through `image`)
//! into plain CPU-side data, and runs that work off the frame loop.
//!
//! Nothing here touches the GPU: decoded data is uploaded later by the scene and
//! the material once the frame loop picks it up through [`PendingAsset::poll`].

pub mod loader;
pub mod mesh;
pub mod texture;

pub use loader::{AssetState, PendingAsset};
pub use mesh::{load_mesh, MeshData, MeshGroup};
pub use texture::{fitted_size, load_texture, PixelBuffer};

use std::path::PathBuf;

/// Errors produced while decoding assets
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("failed to load mesh {}: {source}", path.display())]
    Mesh {
        path: PathBuf,
        #[source]
        source: tobj::LoadError,
    },

    #[error("failed to load texture {}: {source}", path.display())]
    Texture {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("mesh {} contains no geometry", path.display())]
    EmptyModel { path: PathBuf },

    #[error("asset worker for {label} stopped before delivering a result")]
    Worker { label: String },
}
