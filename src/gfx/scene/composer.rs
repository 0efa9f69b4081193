use cgmath::{Matrix4, SquareMatrix};
use log::{debug, error, info, warn};

use crate::assets::MeshGroup;
use crate::gfx::resources::fresnel::{build_fresnel_material, FresnelConfig};
use crate::gfx::resources::material::{AugmentedMaterial, PhysicalMaterial};
use crate::gfx::shader_patch::{extend_material, PatchError, ShaderPatch};

use super::object::SceneNode;
use super::transform::TransformState;

/// Where the scene root is attached
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Attachment {
    /// Beneath the AR camera's pose anchor frame
    #[default]
    PoseAnchor,
    /// Directly in world space
    World,
}

/// Owns the scene graph and the material installed on the model
///
/// The model arrives asynchronously. Until [`SceneComposer::mount`] is called the
/// root has no children and every mesh-dependent step is skipped; the first
/// [`SceneComposer::apply_frame_state`] after mounting installs the material on the
/// root's first child, once.
pub struct SceneComposer {
    root: SceneNode,
    material: AugmentedMaterial,
    default_material: AugmentedMaterial,
    install_opacity: f32,
    installed: bool,
    attachment: Attachment,
    anchor_frame: Matrix4<f32>,
    tracked_visible: bool,
}

impl SceneComposer {
    /// Builds the rim-lit material and an empty root
    pub fn new(fresnel: &FresnelConfig) -> Result<Self, PatchError> {
        let material = build_fresnel_material(fresnel, None)?;
        Self::with_material(material, fresnel.opacity)
    }

    /// Uses `material` for the model, setting its opacity to `install_opacity` on install
    pub fn with_material(
        material: AugmentedMaterial,
        install_opacity: f32,
    ) -> Result<Self, PatchError> {
        let default_material =
            extend_material(&PhysicalMaterial::default(), &ShaderPatch::default())?;
        info!("Scene composer ready with material '{}'", material.name());

        Ok(Self {
            root: SceneNode::group("root"),
            material,
            default_material,
            install_opacity,
            installed: false,
            attachment: Attachment::default(),
            anchor_frame: Matrix4::identity(),
            tracked_visible: false,
        })
    }

    /// Builder pattern: choose where the root is attached
    pub fn with_attachment(mut self, attachment: Attachment) -> Self {
        self.attachment = attachment;
        self
    }

    /// Adds the decoded model beneath the root, one child per mesh
    ///
    /// A second model is ignored; the composer owns exactly one.
    pub fn mount(&mut self, group: MeshGroup) {
        if !self.root.children.is_empty() {
            warn!("Model '{}' ignored, a model is already mounted", group.name);
            return;
        }
        info!(
            "Mounting model '{}' with {} meshes",
            group.name,
            group.meshes.len()
        );
        self.root.name = group.name;
        self.root.children = group.meshes.iter().map(SceneNode::with_mesh).collect();
    }

    /// Per-frame update: installs the material once the mesh exists, then places the root
    pub fn apply_frame_state(&mut self, state: TransformState) {
        if !self.installed && self.root.first_child().is_some() {
            self.install_material();
        }

        if !state.is_valid() {
            warn!("Ignoring invalid transform {:?}", state);
            return;
        }
        self.root.translation = state.translation();
        self.root.scale = state.scale();
        self.root.visible = true;
    }

    fn install_material(&mut self) {
        self.material.set_transparent(true);
        if let Err(e) = self.material.set_opacity(self.install_opacity) {
            error!("Material '{}' has no opacity: {}", self.material.name(), e);
        }

        let name = self.material.name().to_string();
        if let Some(target) = self.root.first_child_mut() {
            debug!("Installing material '{}' on '{}'", name, target.name);
            target.material = Some(name);
            self.installed = true;
        }
    }

    pub fn is_mesh_resolved(&self) -> bool {
        self.root.first_child().is_some()
    }

    pub fn is_material_installed(&self) -> bool {
        self.installed
    }

    pub fn root(&self) -> &SceneNode {
        &self.root
    }

    /// First child of the root, the mesh the material is installed on
    pub fn target_mesh(&self) -> Option<&SceneNode> {
        self.root.first_child()
    }

    pub fn material(&self) -> &AugmentedMaterial {
        &self.material
    }

    pub fn material_mut(&mut self) -> &mut AugmentedMaterial {
        &mut self.material
    }

    /// Material a node is drawn with
    pub fn material_for(&self, node: &SceneNode) -> &AugmentedMaterial {
        match &node.material {
            Some(id) if id == self.material.name() => &self.material,
            _ => &self.default_material,
        }
    }

    pub fn attachment(&self) -> Attachment {
        self.attachment
    }

    /// Latest pose anchor frame from the AR camera
    pub fn set_anchor_frame(&mut self, frame: Matrix4<f32>) {
        self.anchor_frame = frame;
    }

    /// Frame the root's local transform is composed under
    pub fn parent_frame(&self) -> Matrix4<f32> {
        match self.attachment {
            Attachment::PoseAnchor => self.anchor_frame,
            Attachment::World => Matrix4::identity(),
        }
    }

    /// World matrix of the root node
    pub fn root_world_matrix(&self) -> Matrix4<f32> {
        self.parent_frame() * self.root.local_matrix()
    }

    /// Tracking acquired. Recorded only; the root stays visible.
    pub fn on_visible(&mut self) {
        self.tracked_visible = true;
    }

    /// Tracking lost. Recorded only; the root stays visible.
    pub fn on_not_visible(&mut self) {
        self.tracked_visible = false;
    }

    pub fn is_tracked_visible(&self) -> bool {
        self.tracked_visible
    }

    /// Uploads meshes, node transforms and both materials
    pub fn update_gpu_resources(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        model_layout: &wgpu::BindGroupLayout,
    ) {
        let parent = self.parent_frame();
        self.root
            .update_gpu_resources(device, queue, model_layout, parent);
        self.material.update_gpu_resources(device, queue);
        self.default_material.update_gpu_resources(device, queue);
    }

    /// Visible mesh nodes with the material each is drawn with
    pub fn draw_list(&self) -> Vec<(&SceneNode, &AugmentedMaterial)> {
        let mut list = Vec::new();
        self.root.visit(self.parent_frame(), &mut |node, _| {
            if node.mesh.is_some() {
                list.push(node);
            }
        });
        list.into_iter()
            .map(|node| (node, self.material_for(node)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::MeshData;
    use crate::gfx::geometry::generate_cube;
    use cgmath::{vec3, vec4};

    fn cube_group() -> MeshGroup {
        MeshGroup {
            name: "cube".to_string(),
            meshes: vec![generate_cube().to_mesh_data("cube")],
        }
    }

    fn composer() -> SceneComposer {
        SceneComposer::new(&FresnelConfig::default()).unwrap()
    }

    #[test]
    fn test_unresolved_mesh_installs_nothing() {
        let mut composer = composer();
        for _ in 0..3 {
            composer.apply_frame_state(TransformState::default());
        }
        assert!(!composer.is_mesh_resolved());
        assert!(!composer.is_material_installed());
        assert!(!composer.material().is_transparent());
        assert_eq!(composer.root().translation, vec3(0.0, -10.0, 0.0));
    }

    #[test]
    fn test_installs_exactly_once() {
        let mut composer = composer();
        composer.apply_frame_state(TransformState::default());
        composer.mount(cube_group());

        composer.apply_frame_state(TransformState::default());
        assert!(composer.is_material_installed());
        assert!(composer.material().is_transparent());
        assert_eq!(composer.material().opacity(), Some(0.5));

        // Later changes survive further frames
        composer.material_mut().set_opacity(0.8).unwrap();
        composer.material_mut().set_transparent(false);
        composer.apply_frame_state(TransformState::default());
        assert_eq!(composer.material().opacity(), Some(0.8));
        assert!(!composer.material().is_transparent());

        let target = composer.target_mesh().unwrap();
        assert_eq!(target.material.as_deref(), Some(composer.material().name()));
    }

    #[test]
    fn test_applies_translation_and_uniform_scale() {
        let mut composer = composer();
        composer.mount(cube_group());
        composer.apply_frame_state(TransformState::new(2.0, -10.0, 0.0, 1.5));

        assert_eq!(composer.root().translation, vec3(2.0, -10.0, 0.0));
        assert_eq!(composer.root().scale, vec3(1.5, 1.5, 1.5));
    }

    #[test]
    fn test_invalid_state_keeps_previous_transform() {
        let mut composer = composer();
        composer.apply_frame_state(TransformState::new(1.0, 2.0, 3.0, 2.0));
        composer.apply_frame_state(TransformState::new(0.0, 0.0, 0.0, -1.0));
        assert_eq!(composer.root().translation, vec3(1.0, 2.0, 3.0));
        assert_eq!(composer.root().scale, vec3(2.0, 2.0, 2.0));
    }

    #[test]
    fn test_world_matrix_under_anchor_frame() {
        let mut composer = composer();
        composer.apply_frame_state(TransformState::default());
        composer.set_anchor_frame(Matrix4::from_translation(vec3(0.0, 0.0, -5.0)));

        let origin = composer.root_world_matrix() * vec4(0.0, 0.0, 0.0, 1.0);
        assert_eq!(origin, vec4(0.0, -10.0, -5.0, 1.0));

        let composer = composer.with_attachment(Attachment::World);
        let origin = composer.root_world_matrix() * vec4(0.0, 0.0, 0.0, 1.0);
        assert_eq!(origin, vec4(0.0, -10.0, 0.0, 1.0));
    }

    #[test]
    fn test_second_model_is_ignored() {
        let mut composer = composer();
        composer.mount(cube_group());
        composer.mount(MeshGroup {
            name: "other".to_string(),
            meshes: vec![MeshData {
                name: "other".to_string(),
                positions: vec![],
                normals: vec![],
                tex_coords: vec![],
                indices: vec![],
            }],
        });
        assert_eq!(composer.root().name, "cube");
    }

    #[test]
    fn test_draw_list_uses_installed_material() {
        let mut composer = composer();
        composer.mount(MeshGroup {
            name: "pair".to_string(),
            meshes: vec![
                generate_cube().to_mesh_data("body"),
                generate_cube().to_mesh_data("eyes"),
            ],
        });
        composer.apply_frame_state(TransformState::default());

        let list = composer.draw_list();
        assert_eq!(list.len(), 2);
        assert!(list[0].1.is_transparent());
        assert_eq!(list[1].1.name(), "physical");
    }

    #[test]
    fn test_visibility_hooks_only_record() {
        let mut composer = composer();
        composer.on_visible();
        assert!(composer.is_tracked_visible());
        composer.on_not_visible();
        assert!(!composer.is_tracked_visible());
        composer.apply_frame_state(TransformState::default());
        assert!(composer.root().visible);
    }
}
