// src/gfx/rendering/mod.rs
//! Core rendering functionality
//!
//! Handles render pipelines, the camera feed backdrop and frame rendering.

pub mod backdrop;
pub mod pipeline_manager;
pub mod render_engine;

// Re-export main types
pub use backdrop::{Backdrop, BackdropUniform};
pub use pipeline_manager::{material_pipeline_key, PipelineConfig, PipelineManager, PipelineStats};
pub use render_engine::RenderEngine;

/// Failures while setting up or driving the GPU
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("failed to create surface: {0}")]
    Surface(#[from] wgpu::CreateSurfaceError),
    #[error("no suitable GPU adapter: {0}")]
    Adapter(#[from] wgpu::RequestAdapterError),
    #[error("failed to open GPU device: {0}")]
    Device(#[from] wgpu::RequestDeviceError),
    #[error("surface reports no texture formats")]
    NoSurfaceFormat,
    #[error("failed to acquire frame: {0}")]
    Frame(#[from] wgpu::SurfaceError),
    #[error("pipeline setup failed: {0}")]
    Pipeline(String),
}
