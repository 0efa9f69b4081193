//! User-editable placement of the scene root

use cgmath::{Matrix4, Vector3};

/// Position and uniform scale of the scene root
///
/// Replaced as a whole on every edit and read once per frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransformState {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub master_scale: f32,
}

impl Default for TransformState {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: -10.0,
            z: 0.0,
            master_scale: 1.0,
        }
    }
}

impl TransformState {
    pub fn new(x: f32, y: f32, z: f32, master_scale: f32) -> Self {
        Self {
            x,
            y,
            z,
            master_scale,
        }
    }

    pub fn translation(&self) -> Vector3<f32> {
        Vector3::new(self.x, self.y, self.z)
    }

    /// `master_scale` on all three axes
    pub fn scale(&self) -> Vector3<f32> {
        Vector3::new(self.master_scale, self.master_scale, self.master_scale)
    }

    pub fn local_matrix(&self) -> Matrix4<f32> {
        Matrix4::from_translation(self.translation()) * Matrix4::from_scale(self.master_scale)
    }

    /// Finite coordinates and a finite, positive scale
    pub fn is_valid(&self) -> bool {
        [self.x, self.y, self.z].iter().all(|v| v.is_finite())
            && self.master_scale.is_finite()
            && self.master_scale > 0.0
    }

    /// Reads a field by its panel path (`x`, `y`, `z`, `masterScale`)
    pub fn field(&self, path: &str) -> Option<f32> {
        match path {
            "x" => Some(self.x),
            "y" => Some(self.y),
            "z" => Some(self.z),
            "masterScale" => Some(self.master_scale),
            _ => None,
        }
    }

    /// Copy of the state with one field replaced, `None` for an unknown path
    pub fn with_field(self, path: &str, value: f32) -> Option<Self> {
        let mut next = self;
        match path {
            "x" => next.x = value,
            "y" => next.y = value,
            "z" => next.z = value,
            "masterScale" => next.master_scale = value,
            _ => return None,
        }
        Some(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let state = TransformState::default();
        assert_eq!(state, TransformState::new(0.0, -10.0, 0.0, 1.0));
        assert!(state.is_valid());
    }

    #[test]
    fn test_field_paths() {
        let state = TransformState::default()
            .with_field("x", 2.0)
            .and_then(|s| s.with_field("masterScale", 1.5))
            .unwrap();
        assert_eq!(state.field("x"), Some(2.0));
        assert_eq!(state.field("masterScale"), Some(1.5));
        assert_eq!(state.scale(), Vector3::new(1.5, 1.5, 1.5));
        assert!(state.with_field("w", 1.0).is_none());
        assert_eq!(state.field("master_scale"), None);
    }

    #[test]
    fn test_invalid_scale() {
        assert!(!TransformState::new(0.0, 0.0, 0.0, 0.0).is_valid());
        assert!(!TransformState::new(f32::NAN, 0.0, 0.0, 1.0).is_valid());
        assert!(!TransformState::new(0.0, 0.0, 0.0, f32::INFINITY).is_valid());
    }
}
