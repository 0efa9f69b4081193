//! # User Interface Module
//!
//! Dear ImGui overlay with the debug control panel for the scene transform.
//!
//! - [`UiManager`] - ImGui context, winit platform and wgpu renderer
//! - [`TransformPanel`] - Sliders for position and master scale
//!
//! ```no_run
//! use fresnel_ar::gfx::scene::TransformState;
//! use fresnel_ar::ui::TransformPanel;
//!
//! let mut panel = TransformPanel::new(TransformState::default(), |state| {
//!     println!("new transform {:?}", state);
//! });
//! panel.edit("masterScale", 5.0); // committed as 3.0
//! ```

pub mod manager;
pub mod panel;

// Re-export main types
pub use manager::UiManager;
pub use panel::{transform_field, NumberField, TransformPanel, TRANSFORM_FIELDS};
