//! Scene configuration
//!
//! Compiled-in defaults for the AR scene. Asset locations and the camera facing
//! can be overridden through `FRESNEL_AR_*` environment variables.

use std::path::PathBuf;

use log::{info, warn};

use crate::gfx::camera::{CameraFacing, MirrorMode};
use crate::gfx::resources::{FresnelConfig, LightConfig};
use crate::gfx::scene::{Attachment, TransformState};

pub const MODEL_ENV: &str = "FRESNEL_AR_MODEL";
pub const TEXTURE_ENV: &str = "FRESNEL_AR_TEXTURE";
pub const FEED_ENV: &str = "FRESNEL_AR_FEED";
pub const FACING_ENV: &str = "FRESNEL_AR_FACING";

/// Everything needed to start the scene
#[derive(Debug, Clone, PartialEq)]
pub struct SceneConfig {
    pub model_path: PathBuf,
    /// Texture applied as the material map, `None` renders untextured
    pub texture_path: Option<PathBuf>,
    /// Still image used as camera feed, `None` shows a solid backdrop
    pub feed_path: Option<PathBuf>,
    pub backdrop_color: [u8; 4],
    pub facing: CameraFacing,
    pub user_mirror_mode: MirrorMode,
    pub rear_mirror_mode: MirrorMode,
    pub attachment: Attachment,
    pub fresnel: FresnelConfig,
    pub transform: TransformState,
    pub light: LightConfig,
    pub window_title: String,
    pub window_size: (u32, u32),
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from("assets/obj/human_Echorce.obj"),
            texture_path: Some(PathBuf::from("assets/obj/body_texture.png")),
            feed_path: None,
            backdrop_color: [24, 24, 28, 255],
            facing: CameraFacing::User,
            user_mirror_mode: MirrorMode::Poses,
            rear_mirror_mode: MirrorMode::None,
            attachment: Attachment::PoseAnchor,
            fresnel: FresnelConfig::default(),
            transform: TransformState::default(),
            light: LightConfig::default(),
            window_title: "fresnel-ar".to_string(),
            window_size: (1200, 800),
        }
    }
}

impl SceneConfig {
    /// Defaults with the process environment applied
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_overrides(|key| std::env::var(key).ok());
        config
    }

    /// Applies overrides from `lookup`, which maps a variable name to its value
    ///
    /// Empty values are ignored. An empty `FRESNEL_AR_TEXTURE` is ignored too; use
    /// `none` to disable the texture.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        if let Some(path) = get(MODEL_ENV) {
            info!("Model path from {}: {}", MODEL_ENV, path);
            self.model_path = PathBuf::from(path);
        }
        if let Some(path) = get(TEXTURE_ENV) {
            self.texture_path = if path.trim().eq_ignore_ascii_case("none") {
                None
            } else {
                Some(PathBuf::from(path))
            };
        }
        if let Some(path) = get(FEED_ENV) {
            self.feed_path = Some(PathBuf::from(path));
        }
        if let Some(facing) = get(FACING_ENV) {
            match facing.parse::<CameraFacing>() {
                Ok(facing) => self.facing = facing,
                Err(e) => warn!("Ignoring {}: {}", FACING_ENV, e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = SceneConfig::default();
        assert_eq!(config.transform, TransformState::new(0.0, -10.0, 0.0, 1.0));
        assert_eq!(config.fresnel.opacity, 0.5);
        assert_eq!(config.facing, CameraFacing::User);
        assert_eq!(config.user_mirror_mode, MirrorMode::Poses);
        assert_eq!(config.rear_mirror_mode, MirrorMode::None);
        assert_eq!(config.light.ambient_intensity, 0.1);
        assert!(config.feed_path.is_none());
    }

    #[test]
    fn test_overrides() {
        let mut config = SceneConfig::default();
        config.apply_overrides(lookup(&[
            (MODEL_ENV, "models/cube.obj"),
            (TEXTURE_ENV, "none"),
            (FEED_ENV, "feed.jpg"),
            (FACING_ENV, "rear"),
        ]));

        assert_eq!(config.model_path, PathBuf::from("models/cube.obj"));
        assert!(config.texture_path.is_none());
        assert_eq!(config.feed_path, Some(PathBuf::from("feed.jpg")));
        assert_eq!(config.facing, CameraFacing::Rear);
    }

    #[test]
    fn test_bad_or_empty_values_are_ignored() {
        let mut config = SceneConfig::default();
        config.apply_overrides(lookup(&[(MODEL_ENV, "  "), (FACING_ENV, "sideways")]));
        assert_eq!(config, SceneConfig::default());
    }
}
