//! Global uniform bindings for camera and lighting data
//!
//! Per-frame state shared by every draw: the camera matrices and the scene
//! lights. Bound to group 0 in the material pipelines.

use crate::{
    gfx::camera::CameraUniform,
    wgpu_utils::{binding_types, uniform_buffer::UniformBuffer},
};

/// Global uniform buffer content structure
///
/// MUST match the `Globals` struct in the material shaders exactly.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct GlobalUBOContent {
    view_position: [f32; 4],
    view_proj: [[f32; 4]; 4],
    /// rgb colour, a intensity
    ambient: [f32; 4],
    /// xyz direction the light travels
    light_direction: [f32; 4],
    /// rgb colour, a intensity
    light_color: [f32; 4],
}

/// Scene lighting
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct LightConfig {
    pub ambient_color: [f32; 3],
    pub ambient_intensity: f32,
    pub direction: [f32; 3],
    pub color: [f32; 3],
    /// Zero leaves the scene lit by ambient light only
    pub intensity: f32,
}

impl Default for LightConfig {
    fn default() -> Self {
        Self {
            ambient_color: [1.0, 1.0, 1.0],
            ambient_intensity: 0.1,
            direction: [-0.3, -1.0, -0.5],
            color: [1.0, 1.0, 1.0],
            intensity: 0.0,
        }
    }
}

impl GlobalUBOContent {
    pub fn new(camera: CameraUniform, light: &LightConfig) -> Self {
        Self {
            view_position: camera.view_position,
            view_proj: camera.view_proj,
            ambient: [
                light.ambient_color[0],
                light.ambient_color[1],
                light.ambient_color[2],
                light.ambient_intensity,
            ],
            light_direction: [light.direction[0], light.direction[1], light.direction[2], 0.0],
            light_color: [light.color[0], light.color[1], light.color[2], light.intensity],
        }
    }
}

/// Type alias for the global uniform buffer
pub type GlobalUBO = UniformBuffer<GlobalUBOContent>;

/// Updates the global uniform buffer with camera and light data
pub fn update_global_ubo(
    ubo: &mut GlobalUBO,
    queue: &wgpu::Queue,
    camera: CameraUniform,
    light: &LightConfig,
) {
    ubo.update_content(queue, GlobalUBOContent::new(camera, light));
}

/// Bind group layout and bind group for the global uniforms
pub struct GlobalBindings {
    bind_group_layout: wgpu::BindGroupLayout,
    bind_group: Option<wgpu::BindGroup>,
}

impl GlobalBindings {
    /// Sets up the layout; the bind group is created by `create_bind_group()`
    pub fn new(device: &wgpu::Device) -> Self {
        let bind_group_layout = binding_types::layout(
            device,
            "Globals Bind Group",
            &[(wgpu::ShaderStages::VERTEX_FRAGMENT, binding_types::uniform())],
        );

        GlobalBindings {
            bind_group_layout,
            bind_group: None,
        }
    }

    pub fn create_bind_group(&mut self, device: &wgpu::Device, ubo: &GlobalUBO) {
        self.bind_group = Some(device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Global Bind Group"),
            layout: &self.bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: ubo.binding_resource(),
            }],
        }));
    }

    pub fn bind_group_layout(&self) -> &wgpu::BindGroupLayout {
        &self.bind_group_layout
    }

    /// `None` until `create_bind_group()` has run
    pub fn bind_group(&self) -> Option<&wgpu::BindGroup> {
        self.bind_group.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_matches_shader_layout() {
        // vec4 + mat4x4 + 3 * vec4
        assert_eq!(std::mem::size_of::<GlobalUBOContent>(), 16 + 64 + 48);
    }

    #[test]
    fn test_default_light_is_ambient_only() {
        let content = GlobalUBOContent::new(CameraUniform::default(), &LightConfig::default());
        assert_eq!(content.ambient, [1.0, 1.0, 1.0, 0.1]);
        assert_eq!(content.light_color[3], 0.0);
    }
}
