//! Fresnel rim-light material
//!
//! Brightens surfaces seen at grazing angles with a fixed rim colour and makes the
//! whole mesh semi-transparent. Built as a patch over [`PhysicalMaterial`].

use std::sync::Arc;

use crate::assets::PixelBuffer;
use crate::gfx::shader_patch::{extend_material, PatchError, ShaderPatch, UniformValue};

use super::material::{AugmentedMaterial, PhysicalMaterial};

/// Final output statement of the physical fragment program
pub const OUTPUT_ANCHOR: &str = "out.color = vec4<f32>(outgoing_light, diffuse_color.a);";

const VERTEX_HEADER: &str = "\
fn without_translation(m: mat4x4<f32>) -> mat4x4<f32> {
    var lm = m;
    lm[2][3] = 0.0;
    lm[3][0] = 0.0;
    lm[3][1] = 0.0;
    lm[3][2] = 0.0;
    return lm;
}
";

const FRAGMENT_HEADER: &str = "\
fn rim_factor(eye: vec3<f32>, normal: vec3<f32>) -> f32 {
    return 1.0 - -min(dot(eye, normalize(normal)), 0.0);
}
";

const VARYINGS: &str = "
    @location(3) v_nn: vec3<f32>,
    @location(4) v_eye: vec3<f32>,";

const VERTEX_RIM: &str = "

    let gn = without_translation(model.matrix) * vec4<f32>(object_normal, 1.0);
    out.v_nn = normalize(gn.xyz);
    out.v_eye = normalize(gn.xyz - material.camera_position);";

const FRAGMENT_RIM: &str = "

    out.color = vec4<f32>(out.color.rgb + rim_factor(in.v_eye, in.v_nn) * material.fresnel_color, out.color.a);
    diffuse_color.a = material.opacity;
    out.color.a = diffuse_color.a;";

/// Tunable constants of the rim effect
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FresnelConfig {
    pub color: [f32; 3],
    pub opacity: f32,
    /// Fixed eye position the rim term is computed against
    pub camera_position: [f32; 3],
}

impl Default for FresnelConfig {
    fn default() -> Self {
        Self {
            color: [0.0, 0.13333, 0.58039],
            opacity: 0.5,
            camera_position: [0.0, 0.0, 10.0],
        }
    }
}

/// Patch adding the rim term on top of the physical material
pub fn fresnel_patch(config: &FresnelConfig, map: Option<Arc<PixelBuffer>>) -> ShaderPatch {
    ShaderPatch::new()
        .with_header(VERTEX_HEADER)
        .with_fragment_header(FRAGMENT_HEADER)
        .insert_vertex("// <varyings>", VARYINGS)
        .insert_vertex("// <fog_vertex>", VERTEX_RIM)
        .insert_fragment("// <varyings>", VARYINGS)
        .insert_fragment(OUTPUT_ANCHOR, FRAGMENT_RIM)
        .with_uniform("fresnel_color", UniformValue::Color(config.color))
        .with_uniform("map", UniformValue::Texture(map))
        .with_uniform("camera_position", config.camera_position)
        .with_uniform("opacity", config.opacity)
}

/// Builds the rim-lit material over a fresh physical base
pub fn build_fresnel_material(
    config: &FresnelConfig,
    map: Option<Arc<PixelBuffer>>,
) -> Result<AugmentedMaterial, PatchError> {
    extend_material(
        &PhysicalMaterial::new("fresnel"),
        &fresnel_patch(config, map),
    )
}
