// src/wgpu_utils/uniform_buffer.rs
use std::marker::PhantomData;

/// Typed uniform buffer wrapper
pub struct UniformBuffer<Content> {
    buffer: RawUniformBuffer,
    content_type: PhantomData<Content>,
}

impl<Content: bytemuck::Pod> UniformBuffer<Content> {
    fn name() -> &'static str {
        let type_name = std::any::type_name::<Content>();
        let pos = type_name.rfind(':').unwrap_or(0);
        if pos > 0 {
            &type_name[(pos + 1)..]
        } else {
            type_name
        }
    }

    /// Create a new uniform buffer
    pub fn new(device: &wgpu::Device) -> Self {
        UniformBuffer {
            buffer: RawUniformBuffer::new(
                device,
                &format!("UniformBuffer: {}", Self::name()),
                std::mem::size_of::<Content>() as u64,
            ),
            content_type: PhantomData,
        }
    }

    /// Update buffer content (skips the write when nothing changed)
    pub fn update_content(&mut self, queue: &wgpu::Queue, content: Content) {
        self.buffer.update_bytes(queue, bytemuck::bytes_of(&content));
    }

    /// Get binding resource
    pub fn binding_resource(&self) -> wgpu::BindingResource {
        self.buffer.binding_resource()
    }
}

/// Uniform buffer whose layout is only known at runtime
///
/// Used for generated material uniform blocks, where the struct is assembled from
/// a uniform set rather than a Rust type.
pub struct RawUniformBuffer {
    buffer: wgpu::Buffer,
    previous_content: Vec<u8>,
}

impl RawUniformBuffer {
    pub fn new(device: &wgpu::Device, label: &str, size: u64) -> Self {
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size: size.max(16),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        RawUniformBuffer {
            buffer,
            previous_content: Vec::new(),
        }
    }

    pub fn size(&self) -> u64 {
        self.buffer.size()
    }

    /// Writes `bytes` unless they equal the last write
    pub fn update_bytes(&mut self, queue: &wgpu::Queue, bytes: &[u8]) {
        if self.previous_content == bytes {
            return;
        }
        queue.write_buffer(&self.buffer, 0, bytes);
        self.previous_content = bytes.to_vec();
    }

    pub fn binding_resource(&self) -> wgpu::BindingResource {
        self.buffer.as_entire_binding()
    }
}
