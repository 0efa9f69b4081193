// src/gfx/resources/mod.rs
//! GPU resource management
//!
//! Materials, textures, and the global bind group used for rendering.

pub mod fresnel;
pub mod global_bindings;
pub mod material;
pub mod texture_resource;

// Re-export main types
pub use fresnel::{build_fresnel_material, fresnel_patch, FresnelConfig};
pub use global_bindings::{update_global_ubo, GlobalBindings, GlobalUBO, LightConfig};
pub use material::{AugmentedMaterial, PhysicalMaterial, ShaderMaterial};
pub use texture_resource::TextureResource;
