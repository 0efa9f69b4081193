//! WGPU-based rendering engine for the AR scene
//!
//! Draws, in one pass, the camera feed backdrop, then the scene composer's
//! meshes with their patched materials, followed by an optional UI overlay.

use std::sync::Arc;

use log::{debug, error, info, warn};
use wgpu::TextureFormat;

use crate::assets::PixelBuffer;
use crate::gfx::{
    camera::{ArCamera, CameraUniform},
    resources::{
        global_bindings::{update_global_ubo, GlobalBindings, GlobalUBO, LightConfig},
        material::AugmentedMaterial,
        texture_resource::TextureResource,
    },
    scene::{object::DrawObject, SceneComposer},
};
use crate::wgpu_utils::binding_types;

use super::backdrop::{Backdrop, BACKDROP_PIPELINE, BACKDROP_SHADER, BACKDROP_WGSL};
use super::pipeline_manager::{material_pipeline_key, PipelineConfig, PipelineManager};
use super::RenderError;

/// Core rendering engine managing GPU resources and draw calls
///
/// - Surface and device management
/// - Pipeline creation for each patched material
/// - Depth buffer handling
/// - Camera feed backdrop
/// - UI overlay rendering
pub struct RenderEngine {
    surface: wgpu::Surface<'static>,
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    config: wgpu::SurfaceConfiguration,
    depth_texture: TextureResource,
    format: TextureFormat,
    pub pipeline_manager: PipelineManager,
    global_ubo: GlobalUBO,
    global_bindings: GlobalBindings,
    model_layout: wgpu::BindGroupLayout,
    backdrop: Backdrop,
    light_config: LightConfig,
    camera_uniform: CameraUniform,
    mirrored: bool,
}

impl RenderEngine {
    /// Creates a new render engine for the given window
    ///
    /// # Arguments
    /// * `window` - Window surface target for rendering
    /// * `width` - Initial surface width in pixels
    /// * `height` - Initial surface height in pixels
    pub async fn new(
        window: impl Into<wgpu::SurfaceTarget<'static>>,
        width: u32,
        height: u32,
        light_config: LightConfig,
    ) -> Result<RenderEngine, RenderError> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        let surface = instance.create_surface(window)?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await?;
        info!("Using adapter {}", adapter.get_info().name);

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("WGPU Device"),
                required_features: wgpu::Features::default(),
                required_limits: wgpu::Limits {
                    max_texture_dimension_2d: 4096,
                    ..wgpu::Limits::downlevel_defaults()
                },
                memory_hints: wgpu::MemoryHints::default(),
                trace: wgpu::Trace::Off,
            })
            .await?;

        let surface_capabilities = surface.get_capabilities(&adapter);
        // Material shaders output linear colour
        let format = surface_capabilities
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .or_else(|| surface_capabilities.formats.first().copied())
            .ok_or(RenderError::NoSurfaceFormat)?;

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: width.max(1),
            height: height.max(1),
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: surface_capabilities
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let depth_texture =
            TextureResource::create_depth_texture(&device, &config, "depth_texture");

        let global_ubo = GlobalUBO::new(&device);
        let mut global_bindings = GlobalBindings::new(&device);
        global_bindings.create_bind_group(&device, &global_ubo);

        let model_layout = binding_types::layout(
            &device,
            "Model Bind Group",
            &[(wgpu::ShaderStages::VERTEX, binding_types::uniform())],
        );

        let backdrop = Backdrop::new(&device, &queue);

        let device_handle: Arc<wgpu::Device> = Arc::new(device);
        let queue_handle: Arc<wgpu::Queue> = Arc::new(queue);
        let mut pipeline_manager = PipelineManager::new(device_handle.clone());

        pipeline_manager
            .load_shader(BACKDROP_SHADER, BACKDROP_WGSL)
            .map_err(RenderError::Pipeline)?;
        pipeline_manager.register_pipeline(
            BACKDROP_PIPELINE,
            PipelineConfig::default_with_shader(BACKDROP_SHADER)
                .with_label("BACKDROP")
                .with_bind_group_layouts(vec![backdrop.bind_group_layout().clone()])
                // Drawn first, never occludes
                .with_depth(TextureResource::DEPTH_FORMAT, false)
                .with_depth_compare(wgpu::CompareFunction::Always)
                .with_color_target(format, None)
                .with_cull_mode(None)
                .with_no_vertex_buffers(),
        );

        if let Err(errors) = pipeline_manager.create_all_pipelines() {
            return Err(RenderError::Pipeline(errors.join("; ")));
        }
        debug!("{:?}", pipeline_manager.get_stats());

        let mut engine = RenderEngine {
            device: device_handle,
            config,
            format,
            surface,
            queue: queue_handle,
            depth_texture,
            pipeline_manager,
            global_bindings,
            global_ubo,
            model_layout,
            backdrop,
            light_config,
            camera_uniform: CameraUniform::default(),
            mirrored: false,
        };
        engine.write_globals();
        Ok(engine)
    }

    /// Makes sure a pipeline exists for drawing `material`
    ///
    /// Returns the pipeline key, or `None` while the material has no GPU resources.
    fn prepare_material_pipeline(&mut self, material: &AugmentedMaterial) -> Option<String> {
        let material_layout = material.bind_group_layout()?;
        let transparent = material.is_transparent();
        let key = material_pipeline_key(material.name(), transparent, self.mirrored);
        if self.pipeline_manager.has_pipeline(&key) {
            return Some(key);
        }

        let vertex_name = format!("{}.vert", material.name());
        let fragment_name = format!("{}.frag", material.name());
        if !self.pipeline_manager.has_shader(&vertex_name) {
            if let Err(e) = self
                .pipeline_manager
                .load_shader(&vertex_name, material.vertex_source())
            {
                error!("{}", e);
                return None;
            }
        }
        if !self.pipeline_manager.has_shader(&fragment_name) {
            if let Err(e) = self
                .pipeline_manager
                .load_shader(&fragment_name, material.fragment_source())
            {
                error!("{}", e);
                return None;
            }
        }

        let blend = if transparent {
            Some(wgpu::BlendState::ALPHA_BLENDING)
        } else {
            Some(wgpu::BlendState::REPLACE)
        };
        // A mirrored view flips triangle winding
        let front_face = if self.mirrored {
            wgpu::FrontFace::Cw
        } else {
            wgpu::FrontFace::Ccw
        };
        let cull_mode = if material.is_double_sided() {
            None
        } else {
            Some(wgpu::Face::Back)
        };

        debug!("Registering pipeline '{}'", key);
        self.pipeline_manager.register_pipeline(
            &key,
            PipelineConfig::default()
                .with_label(&key)
                .with_shaders(&vertex_name, &fragment_name)
                .with_bind_group_layouts(vec![
                    self.global_bindings.bind_group_layout().clone(),
                    self.model_layout.clone(),
                    material_layout.clone(),
                ])
                .with_depth(TextureResource::DEPTH_FORMAT, !transparent)
                .with_color_target(self.format, blend)
                .with_front_face(front_face)
                .with_cull_mode(cull_mode),
        );
        self.pipeline_manager.get_pipeline(&key).map(|_| key)
    }

    /// Renders one frame: backdrop, composed scene, then the optional UI overlay
    ///
    /// A lost or outdated surface is reconfigured and the frame skipped.
    pub fn render_frame<F>(
        &mut self,
        composer: &mut SceneComposer,
        ui_callback: Option<F>,
    ) -> Result<(), RenderError>
    where
        F: FnOnce(&wgpu::Device, &wgpu::Queue, &mut wgpu::CommandEncoder, &wgpu::TextureView),
    {
        let surface_texture = match self.surface.get_current_texture() {
            Ok(texture) => texture,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                warn!("Surface lost, reconfiguring");
                self.surface.configure(&self.device, &self.config);
                return Ok(());
            }
            Err(wgpu::SurfaceError::Timeout) => {
                debug!("Surface timeout, skipping frame");
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        };

        let surface_texture_view = surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        composer.update_gpu_resources(&self.device, &self.queue, &self.model_layout);

        // Opaque first so blended meshes composite over them
        let mut draw_list = composer.draw_list();
        draw_list.sort_by_key(|(_, material)| material.is_transparent());

        let mut draws = Vec::with_capacity(draw_list.len());
        for (node, material) in draw_list {
            match (self.prepare_material_pipeline(material), material.bind_group()) {
                (Some(key), Some(bind_group)) => draws.push((key, node, bind_group)),
                _ => debug!(
                    "Skipping '{}' - material '{}' has no GPU resources",
                    node.name,
                    material.name()
                ),
            }
        }

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Main Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &surface_texture_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_texture.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            if let Some(pipeline) = self.pipeline_manager.pipeline(BACKDROP_PIPELINE) {
                self.backdrop.draw(&mut render_pass, pipeline);
            }

            if let Some(globals) = self.global_bindings.bind_group() {
                render_pass.set_bind_group(0, globals, &[]);
                for (key, node, material_bind_group) in &draws {
                    let Some(pipeline) = self.pipeline_manager.pipeline(key) else {
                        continue;
                    };
                    render_pass.set_pipeline(pipeline);
                    render_pass.set_bind_group(2, *material_bind_group, &[]);
                    render_pass.draw_node(node);
                }
            }
        }

        if let Some(ui_callback) = ui_callback {
            ui_callback(
                &self.device,
                &self.queue,
                &mut encoder,
                &surface_texture_view,
            );
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        surface_texture.present();
        Ok(())
    }

    /// Renders without a UI overlay
    pub fn render_frame_simple(&mut self, composer: &mut SceneComposer) -> Result<(), RenderError> {
        self.render_frame(
            composer,
            None::<fn(&wgpu::Device, &wgpu::Queue, &mut wgpu::CommandEncoder, &wgpu::TextureView)>,
        )
    }

    pub fn render_frame_with_ui<F>(
        &mut self,
        composer: &mut SceneComposer,
        ui_callback: F,
    ) -> Result<(), RenderError>
    where
        F: FnOnce(&wgpu::Device, &wgpu::Queue, &mut wgpu::CommandEncoder, &wgpu::TextureView),
    {
        self.render_frame(composer, Some(ui_callback))
    }

    /// Takes the camera's matrices and mirror state for the next frame
    pub fn update(&mut self, camera: &ArCamera) {
        self.camera_uniform = camera.uniform;
        self.mirrored = camera.is_mirrored();
        self.backdrop.set_mirrored(&self.queue, self.mirrored);
        self.write_globals();
    }

    fn write_globals(&mut self) {
        update_global_ubo(
            &mut self.global_ubo,
            &self.queue,
            self.camera_uniform,
            &self.light_config,
        );
    }

    /// Uploads a new camera feed frame for the backdrop
    pub fn set_camera_frame(&mut self, pixels: &PixelBuffer) {
        self.backdrop.set_frame(&self.device, &self.queue, pixels);
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }

        self.config.width = width;
        self.config.height = height;

        self.surface.configure(&self.device, &self.config);

        self.depth_texture =
            TextureResource::create_depth_texture(&self.device, &self.config, "depth_texture");
    }

    pub fn get_surface_size(&self) -> (u32, u32) {
        (self.config.width, self.config.height)
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.format
    }
}
