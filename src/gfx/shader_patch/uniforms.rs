//! Named uniform values and their WGSL uniform-buffer layout
//!
//! A [`UniformSet`] is an ordered list of named values. Numeric values are packed
//! into a single generated WGSL struct following the uniform address-space layout
//! rules; texture values are bound separately by the material that owns the set.

use std::sync::Arc;

use crate::assets::PixelBuffer;

use super::PatchError;

/// A single uniform value
#[derive(Debug, Clone, PartialEq)]
pub enum UniformValue {
    Float(f32),
    Vec2([f32; 2]),
    Vec3([f32; 3]),
    Vec4([f32; 4]),
    /// Linear RGB colour, laid out as a `vec3<f32>`
    Color([f32; 3]),
    /// Texture map; `None` binds the material's fallback texture
    Texture(Option<Arc<PixelBuffer>>),
}

/// Shape of a uniform value as seen by the shader
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniformKind {
    Float,
    Vec2,
    Vec3,
    Vec4,
    Texture,
}

impl UniformKind {
    /// WGSL type name, `None` for values that are not part of the uniform struct
    pub fn wgsl_type(self) -> Option<&'static str> {
        match self {
            UniformKind::Float => Some("f32"),
            UniformKind::Vec2 => Some("vec2<f32>"),
            UniformKind::Vec3 => Some("vec3<f32>"),
            UniformKind::Vec4 => Some("vec4<f32>"),
            UniformKind::Texture => None,
        }
    }

    /// Alignment in the uniform address space
    fn align(self) -> u64 {
        match self {
            UniformKind::Float => 4,
            UniformKind::Vec2 => 8,
            UniformKind::Vec3 | UniformKind::Vec4 => 16,
            UniformKind::Texture => 0,
        }
    }

    fn size(self) -> u64 {
        match self {
            UniformKind::Float => 4,
            UniformKind::Vec2 => 8,
            UniformKind::Vec3 => 12,
            UniformKind::Vec4 => 16,
            UniformKind::Texture => 0,
        }
    }
}

impl std::fmt::Display for UniformKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            UniformKind::Float => "f32",
            UniformKind::Vec2 => "vec2",
            UniformKind::Vec3 => "vec3",
            UniformKind::Vec4 => "vec4",
            UniformKind::Texture => "texture",
        };
        f.write_str(name)
    }
}

impl UniformValue {
    pub fn kind(&self) -> UniformKind {
        match self {
            UniformValue::Float(_) => UniformKind::Float,
            UniformValue::Vec2(_) => UniformKind::Vec2,
            UniformValue::Vec3(_) | UniformValue::Color(_) => UniformKind::Vec3,
            UniformValue::Vec4(_) => UniformKind::Vec4,
            UniformValue::Texture(_) => UniformKind::Texture,
        }
    }

    fn components(&self) -> &[f32] {
        match self {
            UniformValue::Float(v) => std::slice::from_ref(v),
            UniformValue::Vec2(v) => v,
            UniformValue::Vec3(v) | UniformValue::Color(v) => v,
            UniformValue::Vec4(v) => v,
            UniformValue::Texture(_) => &[],
        }
    }
}

impl From<f32> for UniformValue {
    fn from(value: f32) -> Self {
        UniformValue::Float(value)
    }
}

impl From<[f32; 2]> for UniformValue {
    fn from(value: [f32; 2]) -> Self {
        UniformValue::Vec2(value)
    }
}

impl From<[f32; 3]> for UniformValue {
    fn from(value: [f32; 3]) -> Self {
        UniformValue::Vec3(value)
    }
}

impl From<[f32; 4]> for UniformValue {
    fn from(value: [f32; 4]) -> Self {
        UniformValue::Vec4(value)
    }
}

impl From<cgmath::Vector3<f32>> for UniformValue {
    fn from(value: cgmath::Vector3<f32>) -> Self {
        UniformValue::Vec3(value.into())
    }
}

/// One numeric member of the generated uniform struct
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniformField {
    pub name: String,
    pub kind: UniformKind,
    pub offset: u64,
}

/// Byte layout of the numeric part of a [`UniformSet`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniformLayout {
    pub fields: Vec<UniformField>,
    /// Struct size, a multiple of 16 and never zero
    pub size: u64,
}

fn round_up(align: u64, value: u64) -> u64 {
    value.div_ceil(align) * align
}

/// Ordered set of named uniforms
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UniformSet {
    entries: Vec<(String, UniformValue)>,
}

impl UniformSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder pattern: add or overwrite a uniform
    pub fn with(mut self, name: &str, value: impl Into<UniformValue>) -> Self {
        self.insert(name, value);
        self
    }

    /// Adds a uniform or overwrites an existing one in place
    ///
    /// Returns the previous value when the name was already present. Overwriting
    /// keeps the original position so the generated layout stays stable.
    pub fn insert(&mut self, name: &str, value: impl Into<UniformValue>) -> Option<UniformValue> {
        let value = value.into();
        match self.entries.iter_mut().find(|(n, _)| n == name) {
            Some((_, slot)) => Some(std::mem::replace(slot, value)),
            None => {
                self.entries.push((name.to_string(), value));
                None
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&UniformValue> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, value)| value)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Reads a float uniform
    pub fn float(&self, name: &str) -> Option<f32> {
        match self.get(name) {
            Some(UniformValue::Float(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &UniformValue)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|(n, _)| n.as_str()).collect()
    }

    /// Replaces the value of an existing uniform without changing its kind
    pub fn set(&mut self, name: &str, value: impl Into<UniformValue>) -> Result<(), PatchError> {
        let value = value.into();
        let Some((_, slot)) = self.entries.iter_mut().find(|(n, _)| n == name) else {
            return Err(PatchError::UniformNotDeclared {
                name: name.to_string(),
            });
        };
        if slot.kind() != value.kind() {
            return Err(PatchError::UniformKindMismatch {
                name: name.to_string(),
                expected: slot.kind(),
                found: value.kind(),
            });
        }
        *slot = value;
        Ok(())
    }

    /// Merges `other` into this set
    ///
    /// Keys present in both are overwritten by value, keys only in `other` are
    /// appended in `other`'s order. Keys only in `self` are left untouched. A key
    /// whose kind differs between the two sets is rejected before anything changes.
    pub fn merge(&mut self, other: &UniformSet) -> Result<(), PatchError> {
        for (name, value) in other.iter() {
            if let Some(existing) = self.get(name) {
                if existing.kind() != value.kind() {
                    return Err(PatchError::UniformKindMismatch {
                        name: name.to_string(),
                        expected: existing.kind(),
                        found: value.kind(),
                    });
                }
            }
        }

        for (name, value) in other.iter() {
            self.insert(name, value.clone());
        }
        Ok(())
    }

    /// Computes the uniform address-space layout of the numeric members
    pub fn layout(&self) -> UniformLayout {
        let mut fields = Vec::new();
        let mut offset = 0;
        let mut max_align = 16;

        for (name, value) in self.iter() {
            let kind = value.kind();
            if kind.wgsl_type().is_none() {
                continue;
            }
            offset = round_up(kind.align(), offset);
            fields.push(UniformField {
                name: name.to_string(),
                kind,
                offset,
            });
            offset += kind.size();
            max_align = max_align.max(kind.align());
        }

        let size = round_up(max_align, offset).max(16);
        UniformLayout { fields, size }
    }

    /// Emits the WGSL struct declaration matching [`UniformSet::layout`]
    pub fn wgsl_struct(&self, struct_name: &str) -> String {
        let layout = self.layout();
        let mut out = format!("struct {} {{\n", struct_name);
        if layout.fields.is_empty() {
            out.push_str("    _unused: vec4<f32>,\n");
        }
        for field in &layout.fields {
            // wgsl_type is Some for every laid-out field
            let ty = field.kind.wgsl_type().unwrap_or("f32");
            out.push_str(&format!("    {}: {},\n", field.name, ty));
        }
        out.push_str("};\n");
        out
    }

    /// Packs the numeric members into bytes laid out as [`UniformSet::layout`]
    pub fn pack(&self) -> Vec<u8> {
        let layout = self.layout();
        let mut bytes = vec![0u8; layout.size as usize];
        for field in &layout.fields {
            if let Some(value) = self.get(&field.name) {
                let data: &[u8] = bytemuck::cast_slice(value.components());
                let start = field.offset as usize;
                bytes[start..start + data.len()].copy_from_slice(data);
            }
        }
        bytes
    }

    /// Texture-valued uniforms in declaration order
    pub fn textures(&self) -> impl Iterator<Item = (&str, Option<&Arc<PixelBuffer>>)> {
        self.iter().filter_map(|(name, value)| match value {
            UniformValue::Texture(texture) => Some((name, texture.as_ref())),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read_f32(bytes: &[u8], offset: usize) -> f32 {
        f32::from_ne_bytes(bytes[offset..offset + 4].try_into().unwrap())
    }

    #[test]
    fn test_insert_overwrites_in_place() {
        let mut set = UniformSet::new().with("a", 1.0).with("b", 2.0);
        let previous = set.insert("a", 5.0);
        assert_eq!(previous, Some(UniformValue::Float(1.0)));
        assert_eq!(set.names(), vec!["a", "b"]);
        assert_eq!(set.float("a"), Some(5.0));
    }

    #[test]
    fn test_merge_overwrites_shared_and_appends_new_keys() {
        let mut base = UniformSet::new()
            .with("opacity", 1.0)
            .with("roughness", 0.8)
            .with("diffuse", UniformValue::Color([1.0, 1.0, 1.0]));
        let patch = UniformSet::new()
            .with("opacity", 0.5)
            .with("fresnel_color", UniformValue::Color([0.0, 0.1, 0.5]));

        base.merge(&patch).unwrap();

        assert_eq!(base.float("opacity"), Some(0.5));
        assert_eq!(base.float("roughness"), Some(0.8));
        assert_eq!(
            base.get("diffuse"),
            Some(&UniformValue::Color([1.0, 1.0, 1.0]))
        );
        assert_eq!(
            base.names(),
            vec!["opacity", "roughness", "diffuse", "fresnel_color"]
        );
    }

    #[test]
    fn test_merge_leaves_untouched_keys_identical() {
        let base = UniformSet::new().with("roughness", 0.3).with("metalness", 0.1);
        let mut merged = base.clone();
        merged.merge(&UniformSet::new().with("opacity", 0.5)).unwrap();
        merged.merge(&UniformSet::new().with("opacity", 0.5)).unwrap();

        assert_eq!(merged.get("roughness"), base.get("roughness"));
        assert_eq!(merged.get("metalness"), base.get("metalness"));
        assert_eq!(merged.len(), 3);
    }

    #[test]
    fn test_merge_rejects_kind_change_without_mutating() {
        let mut base = UniformSet::new().with("opacity", 1.0);
        let patch = UniformSet::new()
            .with("extra", 2.0)
            .with("opacity", [1.0, 0.0, 0.0]);

        let err = base.merge(&patch).unwrap_err();
        assert!(matches!(
            err,
            PatchError::UniformKindMismatch { ref name, expected: UniformKind::Float, found: UniformKind::Vec3 } if name == "opacity"
        ));
        assert!(!base.contains("extra"));
    }

    #[test]
    fn test_set_requires_declared_uniform_of_same_kind() {
        let mut set = UniformSet::new().with("opacity", 1.0);
        assert!(set.set("opacity", 0.25).is_ok());
        assert_eq!(set.float("opacity"), Some(0.25));
        assert!(matches!(
            set.set("missing", 1.0),
            Err(PatchError::UniformNotDeclared { .. })
        ));
        assert!(matches!(
            set.set("opacity", [0.0, 0.0]),
            Err(PatchError::UniformKindMismatch { .. })
        ));
    }

    #[test]
    fn test_layout_follows_uniform_alignment() {
        let set = UniformSet::new()
            .with("diffuse", UniformValue::Color([0.0; 3]))
            .with("opacity", 1.0)
            .with("uv_scale", [1.0, 1.0])
            .with("camera_position", [0.0, 0.0, 10.0])
            .with("map", UniformValue::Texture(None));
        let layout = set.layout();

        let offsets: Vec<(&str, u64)> = layout
            .fields
            .iter()
            .map(|f| (f.name.as_str(), f.offset))
            .collect();
        // f32 packs into the tail of the vec3; vec3 realigns to 16
        assert_eq!(
            offsets,
            vec![
                ("diffuse", 0),
                ("opacity", 12),
                ("uv_scale", 16),
                ("camera_position", 32),
            ]
        );
        assert_eq!(layout.size, 48);
    }

    #[test]
    fn test_empty_layout_is_padded() {
        let set = UniformSet::new().with("map", UniformValue::Texture(None));
        assert_eq!(set.layout().size, 16);
        assert!(set.wgsl_struct("M").contains("_unused: vec4<f32>"));
        assert_eq!(set.pack().len(), 16);
    }

    #[test]
    fn test_pack_writes_values_at_offsets() {
        let set = UniformSet::new()
            .with("fresnel_color", UniformValue::Color([0.0, 0.25, 0.5]))
            .with("opacity", 0.5);
        let bytes = set.pack();
        assert_eq!(bytes.len(), 16);
        assert_eq!(read_f32(&bytes, 4), 0.25);
        assert_eq!(read_f32(&bytes, 8), 0.5);
        assert_eq!(read_f32(&bytes, 12), 0.5);
    }

    #[test]
    fn test_wgsl_struct_lists_numeric_members_only() {
        let set = UniformSet::new()
            .with("opacity", 1.0)
            .with("map", UniformValue::Texture(None))
            .with("fresnel_color", UniformValue::Color([0.0; 3]));
        let wgsl = set.wgsl_struct("MaterialUniforms");
        assert_eq!(
            wgsl,
            "struct MaterialUniforms {\n    opacity: f32,\n    fresnel_color: vec3<f32>,\n};\n"
        );
        assert_eq!(set.textures().count(), 1);
    }
}
