//! # Scene Management Module
//!
//! The scene graph, the user-editable transform of its root, and the
//! [`SceneComposer`] that ties the loaded model to its material.
//!
//! ## Key Components
//!
//! - [`SceneComposer`] - Owns the root node and the model's material
//! - [`SceneNode`] - Node with translation, scale, an optional mesh and children
//! - [`TransformState`] - Position and uniform scale applied to the root every frame
//! - [`Vertex3D`] - Vertex format with position, normal and texture coordinates
//!
//! ## Usage
//!
//! ```no_run
//! use fresnel_ar::gfx::resources::FresnelConfig;
//! use fresnel_ar::gfx::scene::{SceneComposer, TransformState};
//!
//! let mut composer = SceneComposer::new(&FresnelConfig::default())?;
//! // Every frame, mounted or not
//! composer.apply_frame_state(TransformState::default());
//! # Ok::<(), fresnel_ar::gfx::shader_patch::PatchError>(())
//! ```

pub mod composer;
pub mod object;
pub mod transform;
pub mod vertex;

// Re-export main types
pub use composer::{Attachment, SceneComposer};
pub use object::{DrawObject, MaterialId, Mesh, SceneNode};
pub use transform::TransformState;
pub use vertex::Vertex3D;
