//! Application shell
//!
//! Owns the window, the renderer and the scene, and drives one frame per redraw:
//! poll assets, advance the AR camera, apply the transform, render, draw the panel.

use std::cell::Cell;
use std::rc::Rc;
use std::sync::Arc;

use anyhow::{anyhow, Context};
use log::{error, info, warn};
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    window::{Window, WindowAttributes},
};

use crate::assets::{load_mesh, load_texture, AssetState, MeshGroup, PendingAsset, PixelBuffer};
use crate::config::SceneConfig;
use crate::gfx::{
    camera::{ArCamera, FixedPose, StillFeed},
    scene::{SceneComposer, TransformState},
    RenderEngine,
};
use crate::ui::{TransformPanel, UiManager};

pub struct FresnelArApp {
    event_loop: Option<EventLoop<()>>,
    app_state: AppState,
}

struct AppState {
    config: SceneConfig,
    window: Option<Arc<Window>>,
    render_engine: Option<RenderEngine>,
    ui_manager: Option<UiManager>,
    camera: ArCamera,
    composer: SceneComposer,
    transform: Rc<Cell<TransformState>>,
    panel: TransformPanel,
    model: PendingAsset<MeshGroup>,
    texture: Option<PendingAsset<PixelBuffer>>,
    feed: Option<PendingAsset<PixelBuffer>>,
    fatal: Option<anyhow::Error>,
}

impl FresnelArApp {
    /// Builds the scene and starts decoding assets; the window opens on `run()`
    pub fn new(config: SceneConfig) -> anyhow::Result<Self> {
        let event_loop = EventLoop::new().context("failed to create event loop")?;

        let composer = SceneComposer::new(&config.fresnel)
            .context("failed to build the fresnel material")?
            .with_attachment(config.attachment);

        let (width, height) = config.window_size;
        let camera = ArCamera::new(
            Box::new(FixedPose::default()),
            Box::new(StillFeed::solid(config.backdrop_color, config.facing)),
            width as f32 / height.max(1) as f32,
        )
        .with_mirror_modes(config.user_mirror_mode, config.rear_mirror_mode);

        let model_path = config.model_path.clone();
        let model = PendingAsset::spawn("model", move || load_mesh(model_path));
        let texture = config.texture_path.clone().map(|path| {
            PendingAsset::spawn("texture", move || load_texture(path))
        });
        let feed = config.feed_path.clone().map(|path| {
            PendingAsset::spawn("camera feed", move || load_texture(path))
        });

        let transform = Rc::new(Cell::new(config.transform));
        let sink = transform.clone();
        let panel = TransformPanel::new(config.transform, move |state| sink.set(state));

        Ok(Self {
            event_loop: Some(event_loop),
            app_state: AppState {
                config,
                window: None,
                render_engine: None,
                ui_manager: None,
                camera,
                composer,
                transform,
                panel,
                model,
                texture,
                feed,
                fatal: None,
            },
        })
    }

    /// Runs the event loop until the window closes
    pub fn run(mut self) -> anyhow::Result<()> {
        let event_loop = self
            .event_loop
            .take()
            .ok_or_else(|| anyhow!("event loop already consumed"))?;
        event_loop.set_control_flow(ControlFlow::Poll);

        event_loop
            .run_app(&mut self.app_state)
            .context("event loop failed")?;

        match self.app_state.fatal.take() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

impl AppState {
    /// Hands finished assets to the scene; failures are reported once
    fn poll_assets(&mut self) {
        match self.model.poll() {
            AssetState::Ready(group) => self.composer.mount(group),
            AssetState::Failed(e) => warn!("Model unavailable, scene stays empty: {}", e),
            AssetState::Pending | AssetState::Settled => {}
        }

        if let Some(texture) = self.texture.as_mut() {
            match texture.poll() {
                AssetState::Ready(pixels) => {
                    if let Err(e) = self.composer.material_mut().set_map(Arc::new(pixels)) {
                        warn!("Texture not applied: {}", e);
                    }
                }
                AssetState::Failed(e) => warn!("Texture unavailable, rendering untextured: {}", e),
                AssetState::Pending | AssetState::Settled => {}
            }
        }

        if let Some(feed) = self.feed.as_mut() {
            match feed.poll() {
                AssetState::Ready(pixels) => self
                    .camera
                    .set_feed(Box::new(StillFeed::new(pixels, self.config.facing))),
                AssetState::Failed(e) => {
                    warn!("Camera feed unavailable, keeping solid backdrop: {}", e)
                }
                AssetState::Pending | AssetState::Settled => {}
            }
        }
    }

    fn redraw(&mut self) {
        if self.render_engine.is_none() {
            return;
        }

        self.poll_assets();
        let frame = self.camera.update();
        self.composer
            .set_anchor_frame(self.camera.pose_anchor_origin());
        self.composer.apply_frame_state(self.transform.get());

        let (Some(render_engine), Some(window)) =
            (self.render_engine.as_mut(), self.window.as_ref())
        else {
            return;
        };

        if let Some(frame) = frame {
            render_engine.set_camera_frame(&frame.pixels);
        }
        render_engine.update(&self.camera);

        let result = if let Some(ui_manager) = self.ui_manager.as_mut() {
            let panel = &mut self.panel;
            render_engine.render_frame_with_ui(
                &mut self.composer,
                |device, queue, encoder, color_attachment| {
                    ui_manager.draw(device, queue, encoder, window, color_attachment, |ui| {
                        panel.draw(ui)
                    });
                },
            )
        } else {
            render_engine.render_frame_simple(&mut self.composer)
        };

        if let Err(e) = result {
            error!("Frame failed: {}", e);
        }
    }
}

impl ApplicationHandler for AppState {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let (width, height) = self.config.window_size;
        let attributes = WindowAttributes::default()
            .with_title(self.config.window_title.clone())
            .with_inner_size(winit::dpi::LogicalSize::new(width, height));

        let window = match event_loop.create_window(attributes) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                self.fatal = Some(anyhow!(e).context("failed to create window"));
                event_loop.exit();
                return;
            }
        };
        self.window = Some(window.clone());

        let (width, height): (u32, u32) = window.inner_size().into();
        let light = self.config.light;
        let window_clone = window.clone();
        let renderer = match pollster::block_on(async move {
            RenderEngine::new(window_clone, width, height, light).await
        }) {
            Ok(renderer) => renderer,
            Err(e) => {
                self.fatal = Some(anyhow!(e).context("failed to initialise the renderer"));
                event_loop.exit();
                return;
            }
        };
        info!("Renderer ready at {}x{}", width, height);

        self.camera.resize_projection(width, height);

        let ui_manager = UiManager::new(
            renderer.device(),
            renderer.queue(),
            renderer.surface_format(),
            &window,
        );

        self.ui_manager = Some(ui_manager);
        self.render_engine = Some(renderer);
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        window_id: winit::window::WindowId,
        event: WindowEvent,
    ) {
        let Some(window) = self.window.clone() else {
            return;
        };

        // UI gets input first
        if let Some(ui_manager) = self.ui_manager.as_mut() {
            let ui_event: winit::event::Event<()> = winit::event::Event::WindowEvent {
                window_id,
                event: event.clone(),
            };
            if ui_manager.handle_input(&window, &ui_event) {
                window.request_redraw();
                return;
            }
        }

        match event {
            WindowEvent::KeyboardInput {
                event:
                    winit::event::KeyEvent {
                        physical_key:
                            winit::keyboard::PhysicalKey::Code(winit::keyboard::KeyCode::Escape),
                        ..
                    },
                ..
            } => {
                event_loop.exit();
            }
            WindowEvent::Resized(PhysicalSize { width, height }) => {
                self.camera.resize_projection(width, height);
                if let Some(render_engine) = self.render_engine.as_mut() {
                    render_engine.resize(width, height);
                }
                if let Some(ui_manager) = self.ui_manager.as_mut() {
                    ui_manager.update_display_size(width, height);
                }
            }
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::RedrawRequested => {
                self.redraw();
            }
            _ => (),
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(ref window) = self.window {
            window.request_redraw();
        }
    }
}
