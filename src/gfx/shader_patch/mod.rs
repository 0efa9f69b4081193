//! # Shader Patching
//!
//! Extends an existing material by splicing extra WGSL into its vertex and
//! fragment programs at documented anchor strings, and by merging extra uniforms
//! into its uniform set.
//!
//! ## Usage
//!
//! ```no_run
//! use fresnel_ar::gfx::resources::material::PhysicalMaterial;
//! use fresnel_ar::gfx::shader_patch::{extend_material, ShaderPatch};
//!
//! let patch = ShaderPatch::new()
//!     .with_fragment_header("fn boost(c: vec3<f32>) -> vec3<f32> { return c * 1.5; }")
//!     .insert_fragment(
//!         "out.color = vec4<f32>(outgoing_light, diffuse_color.a);",
//!         "\n    out.color = vec4<f32>(boost(out.color.rgb), out.color.a);",
//!     )
//!     .with_uniform("opacity", 0.5);
//!
//! let material = extend_material(&PhysicalMaterial::default(), &patch)?;
//! # Ok::<(), fresnel_ar::gfx::shader_patch::PatchError>(())
//! ```
//!
//! Anchors are a contract with the base material: every anchor is resolved before
//! a material is returned, and a missing one fails the whole construction.

pub mod patch;
pub mod uniforms;

pub use patch::{extend_material, insert_header, splice_after, ShaderPatch, ShaderStage};
pub use uniforms::{UniformKind, UniformLayout, UniformSet, UniformValue};

/// Errors raised while building or updating a patched material
#[derive(Debug, thiserror::Error)]
pub enum PatchError {
    #[error("anchor `{anchor}` not found in the {stage} program")]
    PatchAnchorNotFound { anchor: String, stage: ShaderStage },

    #[error("uniform `{name}` is declared as {expected} but the new value is {found}")]
    UniformKindMismatch {
        name: String,
        expected: UniformKind,
        found: UniformKind,
    },

    #[error("uniform `{name}` is not declared by the material")]
    UniformNotDeclared { name: String },
}
