//! AR camera: pose, camera feed and mirroring
//!
//! Tracking itself is outside this crate. A [`PoseSource`] supplies where the
//! camera is, a [`CameraFeed`] supplies what it sees, and [`ArCamera`] turns both
//! into the matrices and backdrop the renderer needs.

use std::sync::Arc;

use cgmath::{perspective, Matrix4, Point3, Rad, SquareMatrix, Vector3, Vector4};
use log::debug;

use crate::assets::PixelBuffer;

use super::camera_utils::{Camera, CameraUniform, OPENGL_TO_WGPU_MATRIX};

/// Which physical camera the feed comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CameraFacing {
    /// Front camera, facing the user
    #[default]
    User,
    Rear,
}

impl std::str::FromStr for CameraFacing {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "user" | "front" => Ok(CameraFacing::User),
            "rear" | "back" | "environment" => Ok(CameraFacing::Rear),
            other => Err(format!("unknown camera facing '{}'", other)),
        }
    }
}

/// How poses and the feed are mirrored
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MirrorMode {
    /// Nothing is mirrored
    None,
    /// The feed and the camera pose are mirrored on the X axis
    Poses,
}

/// Source of the camera pose, world-from-camera
pub trait PoseSource {
    fn pose(&mut self) -> Matrix4<f32>;
}

/// A camera that never moves
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedPose {
    pub eye: Point3<f32>,
    pub target: Point3<f32>,
    pub up: Vector3<f32>,
}

impl Default for FixedPose {
    fn default() -> Self {
        Self {
            eye: Point3::new(0.0, 0.0, 10.0),
            target: Point3::new(0.0, 0.0, 0.0),
            up: Vector3::unit_y(),
        }
    }
}

impl PoseSource for FixedPose {
    fn pose(&mut self) -> Matrix4<f32> {
        Matrix4::look_at_rh(self.eye, self.target, self.up)
            .invert()
            .unwrap_or_else(Matrix4::identity)
    }
}

/// One frame of the camera feed
#[derive(Debug, Clone)]
pub struct CameraFrame {
    pub pixels: Arc<PixelBuffer>,
    pub facing: CameraFacing,
}

/// Source of camera images
pub trait CameraFeed {
    fn facing(&self) -> CameraFacing;

    /// Newest frame since the last call, `None` when nothing new arrived
    fn poll_frame(&mut self) -> Option<CameraFrame>;
}

/// A feed showing one still image
pub struct StillFeed {
    pixels: Arc<PixelBuffer>,
    facing: CameraFacing,
    delivered: bool,
}

impl StillFeed {
    pub fn new(pixels: PixelBuffer, facing: CameraFacing) -> Self {
        Self {
            pixels: Arc::new(pixels),
            facing,
            delivered: false,
        }
    }

    /// Single-colour backdrop
    pub fn solid(rgba: [u8; 4], facing: CameraFacing) -> Self {
        Self::new(PixelBuffer::solid(1, 1, rgba), facing)
    }
}

impl CameraFeed for StillFeed {
    fn facing(&self) -> CameraFacing {
        self.facing
    }

    fn poll_frame(&mut self) -> Option<CameraFrame> {
        if self.delivered {
            return None;
        }
        self.delivered = true;
        Some(CameraFrame {
            pixels: self.pixels.clone(),
            facing: self.facing,
        })
    }
}

/// Camera combining a pose source, a feed and the mirror configuration
pub struct ArCamera {
    pose_source: Box<dyn PoseSource>,
    feed: Box<dyn CameraFeed>,
    pub user_mirror_mode: MirrorMode,
    pub rear_mirror_mode: MirrorMode,
    pose: Matrix4<f32>,
    pose_anchor_origin: Matrix4<f32>,
    pub aspect: f32,
    pub fovy: Rad<f32>,
    pub znear: f32,
    pub zfar: f32,
    pub uniform: CameraUniform,
}

impl Camera for ArCamera {
    fn build_view_projection_matrix(&self) -> Matrix4<f32> {
        let proj =
            OPENGL_TO_WGPU_MATRIX * perspective(self.fovy, self.aspect, self.znear, self.zfar);
        proj * self.view_matrix()
    }
}

impl ArCamera {
    pub fn new(pose_source: Box<dyn PoseSource>, feed: Box<dyn CameraFeed>, aspect: f32) -> Self {
        let mut camera = Self {
            pose_source,
            feed,
            user_mirror_mode: MirrorMode::Poses,
            rear_mirror_mode: MirrorMode::None,
            pose: Matrix4::identity(),
            pose_anchor_origin: Matrix4::identity(),
            aspect,
            fovy: Rad(std::f32::consts::PI / 4.0),
            znear: 0.1,
            zfar: 1000.0,
            uniform: CameraUniform::default(),
        };
        camera.pose = camera.pose_source.pose();
        camera.update_view_proj();
        camera
    }

    /// Builder pattern: mirror modes for the front and rear cameras
    pub fn with_mirror_modes(mut self, user: MirrorMode, rear: MirrorMode) -> Self {
        self.user_mirror_mode = user;
        self.rear_mirror_mode = rear;
        self.update_view_proj();
        self
    }

    /// Swaps the feed; its first frame comes out of the next `update()`
    pub fn set_feed(&mut self, feed: Box<dyn CameraFeed>) {
        self.feed = feed;
        self.update_view_proj();
    }

    pub fn facing(&self) -> CameraFacing {
        self.feed.facing()
    }

    /// Mirror mode in effect for the current feed
    pub fn mirror_mode(&self) -> MirrorMode {
        match self.feed.facing() {
            CameraFacing::User => self.user_mirror_mode,
            CameraFacing::Rear => self.rear_mirror_mode,
        }
    }

    pub fn is_mirrored(&self) -> bool {
        self.mirror_mode() == MirrorMode::Poses
    }

    /// World-from-camera transform from the last update
    pub fn pose(&self) -> Matrix4<f32> {
        self.pose
    }

    pub fn eye_position(&self) -> Point3<f32> {
        let w: Vector4<f32> = self.pose.w;
        Point3::new(w.x, w.y, w.z)
    }

    /// Frame scene content is attached beneath
    pub fn pose_anchor_origin(&self) -> Matrix4<f32> {
        self.pose_anchor_origin
    }

    pub fn set_pose_anchor_origin(&mut self, origin: Matrix4<f32>) {
        self.pose_anchor_origin = origin;
    }

    /// Camera-from-world, with the X axis flipped when poses are mirrored
    pub fn view_matrix(&self) -> Matrix4<f32> {
        let view = self.pose.invert().unwrap_or_else(Matrix4::identity);
        if self.is_mirrored() {
            Matrix4::from_nonuniform_scale(-1.0, 1.0, 1.0) * view
        } else {
            view
        }
    }

    pub fn resize_projection(&mut self, width: u32, height: u32) {
        if height > 0 {
            self.aspect = width as f32 / height as f32;
        }
    }

    /// Pulls the latest pose and returns a new feed frame if one arrived
    pub fn update(&mut self) -> Option<CameraFrame> {
        self.pose = self.pose_source.pose();
        self.update_view_proj();
        let frame = self.feed.poll_frame();
        if let Some(frame) = &frame {
            debug!(
                "New {:?} camera frame {}x{}",
                frame.facing, frame.pixels.width, frame.pixels.height
            );
        }
        frame
    }

    pub fn update_view_proj(&mut self) {
        let eye = self.eye_position();
        self.uniform.view_position = [eye.x, eye.y, eye.z, 1.0];
        self.uniform.view_proj = self.build_view_projection_matrix().into();
    }
}
