//! Shader-driven materials
//!
//! A [`ShaderMaterial`] is anything that can hand out a vertex program, a fragment
//! program and a default [`UniformSet`]. [`PhysicalMaterial`] is the built-in lit
//! base; [`AugmentedMaterial`] is what the renderer actually draws with, produced
//! from a base by [`extend_material`](crate::gfx::shader_patch::extend_material).

use std::sync::Arc;

use log::debug;

use crate::assets::PixelBuffer;
use crate::gfx::resources::texture_resource::TextureResource;
use crate::gfx::shader_patch::{PatchError, UniformSet, UniformValue};
use crate::wgpu_utils::{binding_types, RawUniformBuffer};

/// Vertex program of the physical base material
pub const PHYSICAL_VERTEX_WGSL: &str = include_str!("shaders/physical.vert.wgsl");
/// Fragment program of the physical base material
pub const PHYSICAL_FRAGMENT_WGSL: &str = include_str!("shaders/physical.frag.wgsl");

/// A material defined by program text and named uniforms
pub trait ShaderMaterial {
    fn name(&self) -> &str;

    /// WGSL vertex program, entry point `vs_main`
    fn vertex_source(&self) -> &str;

    /// WGSL fragment program, entry point `fs_main`
    fn fragment_source(&self) -> &str;

    /// Default uniform values, in layout order
    fn uniforms(&self) -> UniformSet;

    fn double_sided(&self) -> bool {
        false
    }
}

/// Lit base material with GGX specular
///
/// The programs address their parameters as `material.<name>` and expect the
/// uniform block to be generated from [`ShaderMaterial::uniforms`]; they are only
/// complete once built into an [`AugmentedMaterial`].
#[derive(Debug, Clone)]
pub struct PhysicalMaterial {
    pub name: String,
    pub diffuse: [f32; 3],
    pub opacity: f32,
    pub roughness: f32,
    pub metalness: f32,
    pub emissive: [f32; 3],
    pub map: Option<Arc<PixelBuffer>>,
    pub double_sided: bool,
}

impl Default for PhysicalMaterial {
    fn default() -> Self {
        Self {
            name: "physical".to_string(),
            diffuse: [1.0, 1.0, 1.0],
            opacity: 1.0,
            roughness: 1.0,
            metalness: 0.0,
            emissive: [0.0, 0.0, 0.0],
            map: None,
            double_sided: false,
        }
    }
}

impl PhysicalMaterial {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    /// Builder pattern: Set diffuse color
    pub fn with_color(mut self, r: f32, g: f32, b: f32) -> Self {
        self.diffuse = [r, g, b];
        self
    }

    /// Builder pattern: Set opacity
    pub fn with_opacity(mut self, opacity: f32) -> Self {
        self.opacity = opacity.clamp(0.0, 1.0);
        self
    }

    /// Builder pattern: Set roughness factor
    pub fn with_roughness(mut self, roughness: f32) -> Self {
        self.roughness = roughness.clamp(0.0, 1.0);
        self
    }

    /// Builder pattern: Set metalness factor
    pub fn with_metalness(mut self, metalness: f32) -> Self {
        self.metalness = metalness.clamp(0.0, 1.0);
        self
    }

    /// Builder pattern: Set emissive color
    pub fn with_emission(mut self, r: f32, g: f32, b: f32) -> Self {
        self.emissive = [r, g, b];
        self
    }

    /// Builder pattern: Set the diffuse texture
    pub fn with_map(mut self, map: Arc<PixelBuffer>) -> Self {
        self.map = Some(map);
        self
    }

    pub fn with_double_sided(mut self, double_sided: bool) -> Self {
        self.double_sided = double_sided;
        self
    }
}

impl ShaderMaterial for PhysicalMaterial {
    fn name(&self) -> &str {
        &self.name
    }

    fn vertex_source(&self) -> &str {
        PHYSICAL_VERTEX_WGSL
    }

    fn fragment_source(&self) -> &str {
        PHYSICAL_FRAGMENT_WGSL
    }

    fn uniforms(&self) -> UniformSet {
        UniformSet::new()
            .with("diffuse", UniformValue::Color(self.diffuse))
            .with("opacity", self.opacity)
            .with("roughness", self.roughness)
            .with("metalness", self.metalness)
            .with("emissive", UniformValue::Color(self.emissive))
            .with("map", UniformValue::Texture(self.map.clone()))
    }

    fn double_sided(&self) -> bool {
        self.double_sided
    }
}

/// GPU side of an [`AugmentedMaterial`]
struct MaterialGpu {
    layout: wgpu::BindGroupLayout,
    uniform_buffer: RawUniformBuffer,
    /// Uploaded texture per texture uniform, with the pixels it was made from
    textures: Vec<(Option<Arc<PixelBuffer>>, TextureResource)>,
    bind_group: wgpu::BindGroup,
}

/// Material with fully patched programs and a merged uniform set
pub struct AugmentedMaterial {
    name: String,
    vertex_source: String,
    fragment_source: String,
    uniforms: UniformSet,
    transparent: bool,
    double_sided: bool,
    gpu: Option<MaterialGpu>,
}

impl std::fmt::Debug for AugmentedMaterial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AugmentedMaterial")
            .field("name", &self.name)
            .field("uniforms", &self.uniforms.names())
            .field("transparent", &self.transparent)
            .field("double_sided", &self.double_sided)
            .field("uploaded", &self.gpu.is_some())
            .finish()
    }
}

impl AugmentedMaterial {
    pub fn from_parts(
        name: String,
        vertex_source: String,
        fragment_source: String,
        uniforms: UniformSet,
        double_sided: bool,
    ) -> Self {
        Self {
            name,
            vertex_source,
            fragment_source,
            uniforms,
            transparent: false,
            double_sided,
            gpu: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn vertex_source(&self) -> &str {
        &self.vertex_source
    }

    pub fn fragment_source(&self) -> &str {
        &self.fragment_source
    }

    pub fn uniforms(&self) -> &UniformSet {
        &self.uniforms
    }

    pub fn set_transparent(&mut self, transparent: bool) {
        self.transparent = transparent;
    }

    /// Transparent materials are alpha blended and skip depth writes
    pub fn is_transparent(&self) -> bool {
        self.transparent
    }

    pub fn is_double_sided(&self) -> bool {
        self.double_sided
    }

    /// Sets the `opacity` uniform
    pub fn set_opacity(&mut self, opacity: f32) -> Result<(), PatchError> {
        self.uniforms.set("opacity", opacity.clamp(0.0, 1.0))
    }

    pub fn opacity(&self) -> Option<f32> {
        self.uniforms.float("opacity")
    }

    /// Replaces the value of a declared uniform
    ///
    /// The program text is fixed, so only the value may change, never the kind.
    pub fn set_uniform(
        &mut self,
        name: &str,
        value: impl Into<UniformValue>,
    ) -> Result<(), PatchError> {
        self.uniforms.set(name, value)
    }

    /// Binds a texture to the `map` uniform
    pub fn set_map(&mut self, map: Arc<PixelBuffer>) -> Result<(), PatchError> {
        debug!(
            "Material '{}' map set to {}x{}",
            self.name, map.width, map.height
        );
        self.uniforms.set("map", UniformValue::Texture(Some(map)))
    }

    pub fn map(&self) -> Option<&Arc<PixelBuffer>> {
        match self.uniforms.get("map") {
            Some(UniformValue::Texture(map)) => map.as_ref(),
            _ => None,
        }
    }

    /// Bind group layout matching the generated uniform block
    pub fn create_bind_group_layout(&self, device: &wgpu::Device) -> wgpu::BindGroupLayout {
        let mut bindings = vec![(
            wgpu::ShaderStages::VERTEX_FRAGMENT,
            binding_types::uniform(),
        )];
        for _ in self.uniforms.textures() {
            bindings.push((wgpu::ShaderStages::FRAGMENT, binding_types::texture_2d()));
            bindings.push((
                wgpu::ShaderStages::FRAGMENT,
                binding_types::sampler(wgpu::SamplerBindingType::Filtering),
            ));
        }
        binding_types::layout(device, &format!("{} Bind Group Layout", self.name), &bindings)
    }

    /// Uploads uniforms and textures, creating GPU resources on first use
    ///
    /// Textures are re-uploaded only when the pixel buffer behind a texture uniform
    /// changes; numeric uniforms are written whenever they differ from the last write.
    pub fn update_gpu_resources(&mut self, device: &wgpu::Device, queue: &wgpu::Queue) {
        let mut rebind = false;

        if self.gpu.is_none() {
            let layout = self.create_bind_group_layout(device);
            let uniform_buffer = RawUniformBuffer::new(
                device,
                &format!("{} Uniforms", self.name),
                self.uniforms.layout().size,
            );
            let textures: Vec<(Option<Arc<PixelBuffer>>, TextureResource)> = self
                .uniforms
                .textures()
                .map(|(name, map)| (map.cloned(), self.upload_texture(device, queue, name, map)))
                .collect();
            let bind_group =
                Self::create_bind_group(device, &self.name, &layout, &uniform_buffer, &textures);
            debug!("Created GPU resources for material '{}'", self.name);
            self.gpu = Some(MaterialGpu {
                layout,
                uniform_buffer,
                textures,
                bind_group,
            });
        } else if let Some(gpu) = self.gpu.as_ref() {
            let stale: Vec<usize> = self
                .uniforms
                .textures()
                .zip(gpu.textures.iter())
                .enumerate()
                .filter(|(_, ((_, current), (uploaded, _)))| {
                    !same_pixels(*current, uploaded.as_ref())
                })
                .map(|(i, _)| i)
                .collect();

            if !stale.is_empty() {
                let replacements: Vec<(usize, Option<Arc<PixelBuffer>>, TextureResource)> = self
                    .uniforms
                    .textures()
                    .enumerate()
                    .filter(|(i, _)| stale.contains(i))
                    .map(|(i, (name, map))| {
                        (i, map.cloned(), self.upload_texture(device, queue, name, map))
                    })
                    .collect();
                if let Some(gpu) = self.gpu.as_mut() {
                    for (i, map, resource) in replacements {
                        gpu.textures[i] = (map, resource);
                    }
                }
                rebind = true;
            }
        }

        let bytes = self.uniforms.pack();
        if let Some(gpu) = self.gpu.as_mut() {
            if rebind {
                gpu.bind_group = Self::create_bind_group(
                    device,
                    &self.name,
                    &gpu.layout,
                    &gpu.uniform_buffer,
                    &gpu.textures,
                );
            }
            gpu.uniform_buffer.update_bytes(queue, &bytes);
        }
    }

    fn upload_texture(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        name: &str,
        map: Option<&Arc<PixelBuffer>>,
    ) -> TextureResource {
        let label = format!("{} {}", self.name, name);
        match map {
            Some(pixels) => TextureResource::from_pixels(device, queue, pixels, &label),
            None => TextureResource::from_pixels(
                device,
                queue,
                &PixelBuffer::solid(1, 1, [255, 255, 255, 255]),
                &label,
            ),
        }
    }

    fn create_bind_group(
        device: &wgpu::Device,
        name: &str,
        layout: &wgpu::BindGroupLayout,
        uniform_buffer: &RawUniformBuffer,
        textures: &[(Option<Arc<PixelBuffer>>, TextureResource)],
    ) -> wgpu::BindGroup {
        let mut entries = vec![wgpu::BindGroupEntry {
            binding: 0,
            resource: uniform_buffer.binding_resource(),
        }];
        for (i, (_, texture)) in textures.iter().enumerate() {
            let binding = 1 + 2 * i as u32;
            entries.push(wgpu::BindGroupEntry {
                binding,
                resource: wgpu::BindingResource::TextureView(&texture.view),
            });
            entries.push(wgpu::BindGroupEntry {
                binding: binding + 1,
                resource: wgpu::BindingResource::Sampler(&texture.sampler),
            });
        }

        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(&format!("{} Bind Group", name)),
            layout,
            entries: &entries,
        })
    }

    /// Gets the bind group for rendering
    pub fn bind_group(&self) -> Option<&wgpu::BindGroup> {
        self.gpu.as_ref().map(|gpu| &gpu.bind_group)
    }

    /// Gets the bind group layout for pipeline creation
    pub fn bind_group_layout(&self) -> Option<&wgpu::BindGroupLayout> {
        self.gpu.as_ref().map(|gpu| &gpu.layout)
    }
}

fn same_pixels(a: Option<&Arc<PixelBuffer>>, b: Option<&Arc<PixelBuffer>>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => Arc::ptr_eq(a, b),
        (None, None) => true,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::shader_patch::{extend_material, ShaderPatch};

    #[test]
    fn test_physical_defaults() {
        let material = PhysicalMaterial::default();
        let uniforms = material.uniforms();
        assert_eq!(uniforms.float("opacity"), Some(1.0));
        assert_eq!(uniforms.float("roughness"), Some(1.0));
        assert_eq!(uniforms.float("metalness"), Some(0.0));
        assert_eq!(
            uniforms.get("diffuse"),
            Some(&UniformValue::Color([1.0, 1.0, 1.0]))
        );
        assert_eq!(uniforms.get("map"), Some(&UniformValue::Texture(None)));
    }

    #[test]
    fn test_physical_programs_carry_anchors() {
        let material = PhysicalMaterial::default();
        for anchor in ["// <varyings>", "// <begin_vertex>", "// <fog_vertex>"] {
            assert!(material.vertex_source().contains(anchor), "{}", anchor);
        }
        for anchor in [
            "// <varyings>",
            "// <map_fragment>",
            "out.color = vec4<f32>(outgoing_light, diffuse_color.a);",
        ] {
            assert!(material.fragment_source().contains(anchor), "{}", anchor);
        }
    }

    #[test]
    fn test_builders_clamp() {
        let material = PhysicalMaterial::new("body")
            .with_opacity(1.5)
            .with_roughness(-1.0)
            .with_metalness(0.25);
        assert_eq!(material.opacity, 1.0);
        assert_eq!(material.roughness, 0.0);
        assert_eq!(material.metalness, 0.25);
        assert_eq!(material.name(), "body");
    }

    #[test]
    fn test_augmented_mutators() {
        let mut material =
            extend_material(&PhysicalMaterial::default(), &ShaderPatch::default()).unwrap();
        assert!(!material.is_transparent());

        material.set_transparent(true);
        material.set_opacity(0.5).unwrap();
        assert!(material.is_transparent());
        assert_eq!(material.opacity(), Some(0.5));

        let pixels = Arc::new(PixelBuffer::solid(2, 2, [1, 2, 3, 4]));
        material.set_map(pixels.clone()).unwrap();
        assert!(Arc::ptr_eq(material.map().unwrap(), &pixels));

        assert!(matches!(
            material.set_uniform("opacity", [1.0, 0.0, 0.0]),
            Err(PatchError::UniformKindMismatch { .. })
        ));
        assert!(matches!(
            material.set_uniform("nope", 1.0),
            Err(PatchError::UniformNotDeclared { .. })
        ));
        assert!(material.bind_group().is_none());
    }
}
