//! End-to-end composition without a GPU: panel edits flow through the shared
//! transform into the composer, and the model arrives through the asset loader.

use std::cell::Cell;
use std::rc::Rc;

use cgmath::{vec3, vec4};
use fresnel_ar::prelude::*;

fn cube_model() -> MeshGroup {
    MeshGroup {
        name: "cube".to_string(),
        meshes: vec![generate_cube().to_mesh_data("cube")],
    }
}

#[test]
fn default_state_places_and_dresses_the_model() {
    let mut composer = SceneComposer::new(&FresnelConfig::default()).unwrap();
    composer.mount(cube_model());
    composer.apply_frame_state(TransformState::default());

    let root = composer.root();
    assert_eq!(root.translation, vec3(0.0, -10.0, 0.0));
    assert_eq!(root.scale, vec3(1.0, 1.0, 1.0));
    assert!(root.visible);

    let material = composer.material();
    assert!(material.is_transparent());
    assert_eq!(material.opacity(), Some(0.5));
    assert_eq!(
        composer.target_mesh().and_then(|node| node.material.as_deref()),
        Some(material.name())
    );
}

#[test]
fn model_arriving_late_is_installed_once() {
    let mut composer = SceneComposer::new(&FresnelConfig::default()).unwrap();
    let mut model = PendingAsset::spawn("model", || Ok(cube_model()));

    let mut frames = 0;
    while !composer.is_material_installed() {
        match model.poll() {
            AssetState::Ready(group) => composer.mount(group),
            AssetState::Failed(e) => panic!("cube failed to load: {}", e),
            AssetState::Pending | AssetState::Settled => std::thread::yield_now(),
        }
        // Unresolved frames are not errors
        composer.apply_frame_state(TransformState::default());
        frames += 1;
        assert!(frames < 1_000_000, "model never arrived");
    }

    composer.material_mut().set_opacity(0.9).unwrap();
    for _ in 0..3 {
        composer.apply_frame_state(TransformState::default());
    }
    assert_eq!(composer.material().opacity(), Some(0.9));
    assert!(matches!(model.poll(), AssetState::Settled));
}

#[test]
fn panel_edits_reach_the_root_next_frame() {
    let shared = Rc::new(Cell::new(TransformState::default()));
    let sink = shared.clone();
    let mut panel = TransformPanel::new(shared.get(), move |state| sink.set(state));

    let mut composer = SceneComposer::new(&FresnelConfig::default())
        .unwrap()
        .with_attachment(Attachment::World);
    composer.mount(cube_model());
    composer.apply_frame_state(shared.get());

    panel.edit("masterScale", 5.0);
    panel.edit("x", 1.5);
    // Untouched until the next frame reads the state
    assert_eq!(composer.root().scale, vec3(1.0, 1.0, 1.0));

    composer.apply_frame_state(shared.get());
    assert_eq!(composer.root().scale, vec3(3.0, 3.0, 3.0));
    assert_eq!(composer.root().translation, vec3(1.5, -10.0, 0.0));

    let origin = composer.root_world_matrix() * vec4(0.0, 0.0, 0.0, 1.0);
    assert_eq!(origin, vec4(1.5, -10.0, 0.0, 1.0));
}

#[test]
fn missing_model_leaves_scene_empty() {
    let mut composer = SceneComposer::new(&FresnelConfig::default()).unwrap();
    let mut model = PendingAsset::spawn("model", || load_mesh("does/not/exist.obj"));

    let error = loop {
        match model.poll() {
            AssetState::Failed(e) => break e,
            AssetState::Ready(_) => panic!("missing file loaded"),
            _ => std::thread::yield_now(),
        }
    };
    assert!(matches!(error, AssetError::Mesh { .. }));

    composer.apply_frame_state(TransformState::default());
    assert!(!composer.is_mesh_resolved());
    assert!(composer.draw_list().is_empty());
}
