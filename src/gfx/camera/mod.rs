pub mod ar_camera;
pub mod camera_utils;

// Re-export main types
pub use ar_camera::{
    ArCamera, CameraFacing, CameraFeed, CameraFrame, FixedPose, MirrorMode, PoseSource,
    StillFeed,
};
pub use camera_utils::{Camera, CameraUniform};
