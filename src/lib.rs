// src/lib.rs
//! fresnel-ar
//!
//! An AR demo scene: a textured OBJ model with a fresnel rim-light patched into a
//! physically-based material, composited over a camera feed, positioned through a
//! debug panel.

pub mod app;
pub mod assets;
pub mod config;
pub mod gfx;
pub mod prelude;
pub mod ui;
pub mod wgpu_utils;

// Re-export main types for convenience
pub use app::FresnelArApp;
pub use config::SceneConfig;

/// Runs the scene with `config` until the window closes
pub fn run(config: SceneConfig) -> anyhow::Result<()> {
    FresnelArApp::new(config)?.run()
}
