use cgmath::{Matrix, Matrix4, SquareMatrix, Vector3};
use wgpu::util::DeviceExt;

use crate::assets::MeshData;
use crate::wgpu_utils::uniform_buffer::UniformBuffer;

use super::vertex::Vertex3D;

/// Material ID for referencing materials
pub type MaterialId = String;

struct MeshBuffers {
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
}

/// Triangle mesh with lazily created GPU buffers
pub struct Mesh {
    name: String,
    vertices: Vec<Vertex3D>,
    indices: Vec<u32>,
    index_count: u32,
    buffers: Option<MeshBuffers>,
}

impl Mesh {
    pub fn from_data(data: &MeshData) -> Self {
        Self {
            name: data.name.clone(),
            vertices: Vertex3D::from_mesh(data),
            indices: data.indices.clone(),
            index_count: data.indices.len() as u32,
            buffers: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn vertices(&self) -> &[Vertex3D] {
        &self.vertices
    }

    pub fn index_count(&self) -> u32 {
        self.index_count
    }

    pub fn is_uploaded(&self) -> bool {
        self.buffers.is_some()
    }

    /// Creates vertex and index buffers once; later calls do nothing
    pub fn init_gpu_resources(&mut self, device: &wgpu::Device) {
        if self.is_uploaded() {
            return;
        }

        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{} Vertex Buffer", self.name)),
            contents: bytemuck::cast_slice(&self.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{} Index Buffer", self.name)),
            contents: bytemuck::cast_slice(&self.indices),
            usage: wgpu::BufferUsages::INDEX,
        });

        self.buffers = Some(MeshBuffers {
            vertex_buffer,
            index_buffer,
        });
    }
}

/// Per-node transform uniform, `Model` in the material shaders
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ModelUniform {
    pub matrix: [[f32; 4]; 4],
    pub normal_matrix: [[f32; 4]; 4],
}

impl ModelUniform {
    pub fn new(world: Matrix4<f32>) -> Self {
        let normal = world
            .invert()
            .map(|inverse| inverse.transpose())
            .unwrap_or(world);
        Self {
            matrix: world.into(),
            normal_matrix: normal.into(),
        }
    }
}

/// GPU resources struct holding the model uniform and its bind group
pub struct ObjectGpuResources {
    model_ubo: UniformBuffer<ModelUniform>,
    bind_group: wgpu::BindGroup,
}

/// Node of the scene graph: an optional mesh under a translation and scale
pub struct SceneNode {
    pub name: String,
    pub translation: Vector3<f32>,
    pub scale: Vector3<f32>,
    pub visible: bool,
    pub mesh: Option<Mesh>,
    /// Material drawn with; `None` uses the scene default
    pub material: Option<MaterialId>,
    pub children: Vec<SceneNode>,
    gpu_resources: Option<ObjectGpuResources>,
}

impl SceneNode {
    /// Empty group node with identity transform
    pub fn group(name: &str) -> Self {
        Self {
            name: name.to_string(),
            translation: Vector3::new(0.0, 0.0, 0.0),
            scale: Vector3::new(1.0, 1.0, 1.0),
            visible: true,
            mesh: None,
            material: None,
            children: Vec::new(),
            gpu_resources: None,
        }
    }

    pub fn with_mesh(data: &MeshData) -> Self {
        let mut node = Self::group(&data.name);
        node.mesh = Some(Mesh::from_data(data));
        node
    }

    /// Translation then scale, `T * S`
    pub fn local_matrix(&self) -> Matrix4<f32> {
        Matrix4::from_translation(self.translation)
            * Matrix4::from_nonuniform_scale(self.scale.x, self.scale.y, self.scale.z)
    }

    pub fn first_child(&self) -> Option<&SceneNode> {
        self.children.first()
    }

    pub fn first_child_mut(&mut self) -> Option<&mut SceneNode> {
        self.children.first_mut()
    }

    /// Visits every visible node with its world matrix, parents first
    pub fn visit<'a, F>(&'a self, parent: Matrix4<f32>, f: &mut F)
    where
        F: FnMut(&'a SceneNode, Matrix4<f32>),
    {
        if !self.visible {
            return;
        }
        let world = parent * self.local_matrix();
        f(self, world);
        for child in &self.children {
            child.visit(world, f);
        }
    }

    /// Uploads meshes and world matrices for this node and its descendants
    pub fn update_gpu_resources(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        layout: &wgpu::BindGroupLayout,
        parent: Matrix4<f32>,
    ) {
        let world = parent * self.local_matrix();

        if let Some(mesh) = self.mesh.as_mut() {
            mesh.init_gpu_resources(device);

            let resources = self.gpu_resources.get_or_insert_with(|| {
                let model_ubo = UniformBuffer::<ModelUniform>::new(device);
                let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
                    label: Some("Model Bind Group"),
                    layout,
                    entries: &[wgpu::BindGroupEntry {
                        binding: 0,
                        resource: model_ubo.binding_resource(),
                    }],
                });
                ObjectGpuResources {
                    model_ubo,
                    bind_group,
                }
            });
            resources
                .model_ubo
                .update_content(queue, ModelUniform::new(world));
        }

        for child in self.children.iter_mut() {
            child.update_gpu_resources(device, queue, layout, world);
        }
    }

    /// Gets the model bind group for rendering
    pub fn bind_group(&self) -> Option<&wgpu::BindGroup> {
        self.gpu_resources.as_ref().map(|res| &res.bind_group)
    }
}

pub trait DrawObject {
    fn draw_mesh(&mut self, mesh: &Mesh);
    /// Binds the node's model uniform at group 1 and draws its mesh
    fn draw_node(&mut self, node: &SceneNode);
}

impl DrawObject for wgpu::RenderPass<'_> {
    fn draw_mesh(&mut self, mesh: &Mesh) {
        // Skip drawing if not uploaded
        let Some(buffers) = &mesh.buffers else {
            return;
        };
        self.set_vertex_buffer(0, buffers.vertex_buffer.slice(..));
        self.set_index_buffer(buffers.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        self.draw_indexed(0..mesh.index_count, 0, 0..1);
    }

    fn draw_node(&mut self, node: &SceneNode) {
        let (Some(mesh), Some(bind_group)) = (&node.mesh, node.bind_group()) else {
            return;
        };
        self.set_bind_group(1, bind_group, &[]);
        self.draw_mesh(mesh);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::{vec3, vec4};

    #[test]
    fn test_local_matrix_translates_then_scales() {
        let mut node = SceneNode::group("root");
        node.translation = vec3(2.0, -10.0, 0.0);
        node.scale = vec3(1.5, 1.5, 1.5);

        let p = node.local_matrix() * vec4(1.0, 1.0, 1.0, 1.0);
        assert_eq!(p, vec4(3.5, -8.5, 1.5, 1.0));
    }

    #[test]
    fn test_visit_skips_hidden_subtrees() {
        let mesh = MeshData {
            name: "child".to_string(),
            positions: vec![],
            normals: vec![],
            tex_coords: vec![],
            indices: vec![],
        };
        let mut root = SceneNode::group("root");
        root.translation = vec3(0.0, 1.0, 0.0);
        root.children.push(SceneNode::with_mesh(&mesh));
        let mut hidden = SceneNode::with_mesh(&mesh);
        hidden.visible = false;
        root.children.push(hidden);

        let mut seen = Vec::new();
        root.visit(Matrix4::identity(), &mut |node, world| {
            seen.push((node.name.clone(), world.w.y));
        });
        assert_eq!(
            seen,
            vec![("root".to_string(), 1.0), ("child".to_string(), 1.0)]
        );
    }

    #[test]
    fn test_mesh_starts_without_gpu_buffers() {
        let data = MeshData {
            name: "tri".to_string(),
            positions: vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
            normals: vec![[0.0, 0.0, 1.0]; 3],
            tex_coords: vec![[0.0, 0.0]; 3],
            indices: vec![0, 1, 2],
        };
        let node = SceneNode::with_mesh(&data);
        let mesh = node.mesh.as_ref().unwrap();
        assert!(!mesh.is_uploaded());
        assert_eq!(mesh.index_count(), 3);
        assert_eq!(mesh.vertices().len(), 3);
        assert!(node.bind_group().is_none());
    }

    #[test]
    fn test_normal_matrix_undoes_scale() {
        let uniform = ModelUniform::new(Matrix4::from_scale(2.0));
        assert_eq!(uniform.normal_matrix[0][0], 0.5);
        assert_eq!(uniform.matrix[0][0], 2.0);
    }
}
