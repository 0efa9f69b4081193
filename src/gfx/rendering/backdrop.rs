//! Camera feed backdrop
//!
//! Keeps the latest camera frame on the GPU and draws it behind the scene as a
//! single fullscreen triangle. The pipeline itself lives in the
//! [`PipelineManager`](super::pipeline_manager::PipelineManager) under
//! [`BACKDROP_PIPELINE`].

use crate::assets::PixelBuffer;
use crate::gfx::resources::texture_resource::TextureResource;
use crate::wgpu_utils::{binding_types, UniformBuffer};

pub const BACKDROP_PIPELINE: &str = "Backdrop";
pub const BACKDROP_SHADER: &str = "backdrop";
pub const BACKDROP_WGSL: &str = include_str!("backdrop.wgsl");

#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct BackdropUniform {
    /// x: 1.0 when the feed is mirrored
    pub params: [f32; 4],
}

impl BackdropUniform {
    pub fn new(mirrored: bool) -> Self {
        Self {
            params: [if mirrored { 1.0 } else { 0.0 }, 0.0, 0.0, 0.0],
        }
    }
}

pub struct Backdrop {
    layout: wgpu::BindGroupLayout,
    uniform: UniformBuffer<BackdropUniform>,
    feed: TextureResource,
    bind_group: wgpu::BindGroup,
}

impl Backdrop {
    /// Creates the backdrop with a black placeholder frame
    pub fn new(device: &wgpu::Device, queue: &wgpu::Queue) -> Self {
        let layout = binding_types::layout(
            device,
            "Backdrop Bind Group Layout",
            &[
                (wgpu::ShaderStages::FRAGMENT, binding_types::uniform()),
                (wgpu::ShaderStages::FRAGMENT, binding_types::texture_2d()),
                (
                    wgpu::ShaderStages::FRAGMENT,
                    binding_types::sampler(wgpu::SamplerBindingType::Filtering),
                ),
            ],
        );

        let mut uniform = UniformBuffer::<BackdropUniform>::new(device);
        uniform.update_content(queue, BackdropUniform::default());

        let placeholder = PixelBuffer::solid(1, 1, [0, 0, 0, 255]);
        let feed = TextureResource::from_pixels(device, queue, &placeholder, "Camera Feed");
        let bind_group = Self::create_bind_group(device, &layout, &uniform, &feed);

        Self {
            layout,
            uniform,
            feed,
            bind_group,
        }
    }

    fn create_bind_group(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        uniform: &UniformBuffer<BackdropUniform>,
        feed: &TextureResource,
    ) -> wgpu::BindGroup {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Backdrop Bind Group"),
            layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: uniform.binding_resource(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&feed.view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(&feed.sampler),
                },
            ],
        })
    }

    pub fn bind_group_layout(&self) -> &wgpu::BindGroupLayout {
        &self.layout
    }

    pub fn bind_group(&self) -> &wgpu::BindGroup {
        &self.bind_group
    }

    /// Uploads a camera frame, reallocating only when its size changes
    pub fn set_frame(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, pixels: &PixelBuffer) {
        let pixels = TextureResource::fit_to_device(device, pixels, "Camera Feed");
        if self.feed.matches(&pixels) {
            self.feed.write_pixels(queue, &pixels);
        } else {
            self.feed = TextureResource::from_pixels(device, queue, &pixels, "Camera Feed");
            self.bind_group =
                Self::create_bind_group(device, &self.layout, &self.uniform, &self.feed);
        }
    }

    pub fn set_mirrored(&mut self, queue: &wgpu::Queue, mirrored: bool) {
        self.uniform
            .update_content(queue, BackdropUniform::new(mirrored));
    }

    pub fn draw(&self, render_pass: &mut wgpu::RenderPass<'_>, pipeline: &wgpu::RenderPipeline) {
        render_pass.set_pipeline(pipeline);
        render_pass.set_bind_group(0, &self.bind_group, &[]);
        render_pass.draw(0..3, 0..1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uniform_encodes_mirroring() {
        assert_eq!(BackdropUniform::new(true).params[0], 1.0);
        assert_eq!(BackdropUniform::new(false).params, [0.0; 4]);
        assert_eq!(std::mem::size_of::<BackdropUniform>(), 16);
    }

    #[test]
    fn test_shader_entry_points() {
        assert!(BACKDROP_WGSL.contains("fn vs_main"));
        assert!(BACKDROP_WGSL.contains("fn fs_main"));
    }
}
