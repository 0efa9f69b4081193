//! # Prelude
//!
//! Commonly used types in one import:
//!
//! ```rust
//! use fresnel_ar::prelude::*;
//!
//! let composer = SceneComposer::new(&FresnelConfig::default()).unwrap();
//! assert!(!composer.is_material_installed());
//! ```

// Application
pub use crate::app::FresnelArApp;
pub use crate::config::SceneConfig;

// Assets
pub use crate::assets::{
    load_mesh, load_texture, AssetError, AssetState, MeshData, MeshGroup, PendingAsset,
    PixelBuffer,
};

// Camera
pub use crate::gfx::camera::{
    ArCamera, CameraFacing, CameraFeed, CameraFrame, FixedPose, MirrorMode, PoseSource,
    StillFeed,
};

// Materials and shader patching
pub use crate::gfx::resources::{
    build_fresnel_material, fresnel_patch, AugmentedMaterial, FresnelConfig, LightConfig,
    PhysicalMaterial, ShaderMaterial,
};
pub use crate::gfx::shader_patch::{extend_material, PatchError, ShaderPatch, UniformValue};

// Scene
pub use crate::gfx::geometry::{generate_cube, GeometryData};
pub use crate::gfx::scene::{Attachment, SceneComposer, SceneNode, TransformState};

// UI
pub use crate::ui::TransformPanel;

pub use cgmath::{Matrix4, Vector3};
