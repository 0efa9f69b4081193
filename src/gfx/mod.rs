//! # Graphics Module
//!
//! Camera, shader patching, materials, scene composition and the wgpu renderer
//! for the AR scene.
//!
//! ## Architecture Overview
//!
//! - **Camera System** ([`camera`]) - AR camera fed by a pose source and a camera feed
//! - **Shader Patching** ([`shader_patch`]) - Anchor splicing into material shaders
//! - **Resource Management** ([`resources`]) - Physical and fresnel materials, textures, globals
//! - **Scene Management** ([`scene`]) - Scene graph and the composer owning the model
//! - **Rendering Pipeline** ([`rendering`]) - Backdrop, patched materials and UI overlay
//! - **Geometry** ([`geometry`]) - Procedural placeholder meshes
//!
//! ## Usage
//!
//! ```no_run
//! use fresnel_ar::gfx::resources::FresnelConfig;
//! use fresnel_ar::gfx::scene::SceneComposer;
//!
//! // The render engine is created by the app once a window exists
//! // let engine = RenderEngine::new(window, width, height, light).await?;
//! let composer = SceneComposer::new(&FresnelConfig::default())?;
//! assert!(!composer.is_mesh_resolved());
//! # Ok::<(), fresnel_ar::gfx::shader_patch::PatchError>(())
//! ```

pub mod camera;
pub mod geometry;
pub mod rendering;
pub mod resources;
pub mod scene;
pub mod shader_patch;

// Re-export commonly used types
pub use camera::ArCamera;
pub use rendering::render_engine::RenderEngine;
