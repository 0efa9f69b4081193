//! Texture resource management for wgpu
//!
//! Creates GPU textures, views and samplers for the depth buffer, material maps
//! and the camera feed backdrop.

use std::borrow::Cow;

use log::warn;

use crate::assets::PixelBuffer;

/// GPU texture resource containing texture, view, and sampler
#[derive(Clone)]
pub struct TextureResource {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub sampler: wgpu::Sampler,
}

impl TextureResource {
    /// Standard depth buffer format used throughout the engine
    pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

    /// Creates a depth texture matching the surface configuration
    pub fn create_depth_texture(
        device: &wgpu::Device,
        config: &wgpu::SurfaceConfiguration,
        label: &str,
    ) -> Self {
        let size = wgpu::Extent3d {
            width: config.width.max(1),
            height: config.height.max(1),
            depth_or_array_layers: 1,
        };

        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: Self::DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[Self::DEPTH_FORMAT],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            compare: Some(wgpu::CompareFunction::LessEqual),
            lod_min_clamp: 0.0,
            lod_max_clamp: 100.0,
            ..Default::default()
        });

        Self {
            texture,
            view,
            sampler,
        }
    }

    /// Uploads a decoded image as an sRGB texture with linear filtering
    pub fn from_pixels(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        pixels: &PixelBuffer,
        label: &str,
    ) -> Self {
        Self::from_pixels_with_filter(device, queue, pixels, label, wgpu::FilterMode::Linear)
    }

    /// Uploads a decoded image with configurable filtering
    ///
    /// Addressing repeats, so UVs outside [0, 1] on imported meshes wrap rather than smear.
    pub fn from_pixels_with_filter(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        pixels: &PixelBuffer,
        label: &str,
        filter_mode: wgpu::FilterMode,
    ) -> Self {
        let pixels = Self::fit_to_device(device, pixels, label);
        let pixels = pixels.as_ref();
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: Self::extent(pixels),
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        let resource = Self {
            view: texture.create_view(&wgpu::TextureViewDescriptor::default()),
            sampler: device.create_sampler(&wgpu::SamplerDescriptor {
                label: Some(&format!("{} Sampler", label)),
                address_mode_u: wgpu::AddressMode::Repeat,
                address_mode_v: wgpu::AddressMode::Repeat,
                address_mode_w: wgpu::AddressMode::Repeat,
                mag_filter: filter_mode,
                min_filter: filter_mode,
                mipmap_filter: wgpu::FilterMode::Nearest,
                ..Default::default()
            }),
            texture,
        };
        resource.write_pixels(queue, pixels);
        resource
    }

    /// Scales `pixels` down when it exceeds the device's 2D texture limit
    pub fn fit_to_device<'a>(
        device: &wgpu::Device,
        pixels: &'a PixelBuffer,
        label: &str,
    ) -> Cow<'a, PixelBuffer> {
        let max = device.limits().max_texture_dimension_2d;
        match pixels.fit_within(max) {
            Some(fitted) => {
                warn!(
                    "Texture '{}' is {}x{}, larger than the device limit {}; resized to {}x{}",
                    label, pixels.width, pixels.height, max, fitted.width, fitted.height
                );
                Cow::Owned(fitted)
            }
            None => Cow::Borrowed(pixels),
        }
    }

    /// Whether `pixels` can be written into this texture without reallocating
    pub fn matches(&self, pixels: &PixelBuffer) -> bool {
        self.texture.width() == pixels.width && self.texture.height() == pixels.height
    }

    /// Overwrites the texture contents; dimensions must match
    pub fn write_pixels(&self, queue: &wgpu::Queue, pixels: &PixelBuffer) {
        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &self.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            &pixels.rgba,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4 * pixels.width),
                rows_per_image: Some(pixels.height),
            },
            Self::extent(pixels),
        );
    }

    fn extent(pixels: &PixelBuffer) -> wgpu::Extent3d {
        wgpu::Extent3d {
            width: pixels.width,
            height: pixels.height,
            depth_or_array_layers: 1,
        }
    }
}
