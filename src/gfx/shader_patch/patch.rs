//! Anchor splicing of WGSL programs

use std::fmt;

use log::debug;

use crate::gfx::resources::material::{AugmentedMaterial, ShaderMaterial};

use super::{PatchError, UniformSet};

/// Bind group the generated material uniform block lives in
pub const MATERIAL_GROUP: u32 = 2;

/// Name of the generated material uniform struct
pub const MATERIAL_STRUCT: &str = "MaterialUniforms";

/// Program a patch targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderStage::Vertex => f.write_str("vertex"),
            ShaderStage::Fragment => f.write_str("fragment"),
        }
    }
}

/// Declarative description of how to modify a base material's programs
///
/// Insertions keep declaration order, also when several share one anchor. Code is
/// inserted verbatim right after the anchor text, so code that follows a
/// line-comment anchor should start with a line break.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShaderPatch {
    pub header: String,
    pub fragment_header: String,
    pub vertex: Vec<(String, String)>,
    pub fragment: Vec<(String, String)>,
    pub uniforms: UniformSet,
}

impl ShaderPatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder pattern: text placed at the start of the vertex program
    pub fn with_header(mut self, header: &str) -> Self {
        self.header = header.to_string();
        self
    }

    /// Builder pattern: text placed at the start of the fragment program
    pub fn with_fragment_header(mut self, header: &str) -> Self {
        self.fragment_header = header.to_string();
        self
    }

    /// Builder pattern: insert `code` after `anchor` in the vertex program
    pub fn insert_vertex(mut self, anchor: &str, code: &str) -> Self {
        self.vertex.push((anchor.to_string(), code.to_string()));
        self
    }

    /// Builder pattern: insert `code` after `anchor` in the fragment program
    pub fn insert_fragment(mut self, anchor: &str, code: &str) -> Self {
        self.fragment.push((anchor.to_string(), code.to_string()));
        self
    }

    /// Builder pattern: add or overwrite a uniform
    pub fn with_uniform(
        mut self,
        name: &str,
        value: impl Into<super::UniformValue>,
    ) -> Self {
        self.uniforms.insert(name, value);
        self
    }

    pub fn insertions(&self, stage: ShaderStage) -> &[(String, String)] {
        match stage {
            ShaderStage::Vertex => &self.vertex,
            ShaderStage::Fragment => &self.fragment,
        }
    }

    fn header_for(&self, stage: ShaderStage) -> &str {
        match stage {
            ShaderStage::Vertex => &self.header,
            ShaderStage::Fragment => &self.fragment_header,
        }
    }
}

/// Inserts `code` right after the first occurrence of `anchor`
///
/// Returns `None` when the anchor does not occur in `source`.
pub fn splice_after(source: &str, anchor: &str, code: &str) -> Option<String> {
    if anchor.is_empty() {
        return None;
    }
    let start = source.find(anchor)?;
    let end = start + anchor.len();

    let mut out = String::with_capacity(source.len() + code.len());
    out.push_str(&source[..end]);
    out.push_str(code);
    out.push_str(&source[end..]);
    Some(out)
}

/// Byte offset just past the leading global directives of a WGSL program
///
/// Blank and comment lines are only skipped when a directive follows them.
fn preamble_end(source: &str) -> usize {
    let mut end = 0;
    let mut offset = 0;
    for line in source.split_inclusive('\n') {
        let trimmed = line.trim();
        offset += line.len();
        if trimmed.starts_with("enable ")
            || trimmed.starts_with("requires ")
            || trimmed.starts_with("diagnostic")
        {
            end = offset;
        } else if !(trimmed.is_empty() || trimmed.starts_with("//")) {
            break;
        }
    }
    end
}

/// Places `header` at the start of `source`, after any required preamble
pub fn insert_header(source: &str, header: &str) -> String {
    if header.is_empty() {
        return source.to_string();
    }
    let at = preamble_end(source);
    let mut out = String::with_capacity(source.len() + header.len() + 1);
    out.push_str(&source[..at]);
    out.push_str(header);
    if !header.ends_with('\n') {
        out.push('\n');
    }
    out.push_str(&source[at..]);
    out
}

/// Joins the codes declared on the same anchor, keeping declaration order
///
/// A shared anchor is spliced once, so its codes land after it in the order they
/// were declared rather than each new one in front of the last.
fn grouped_insertions(insertions: &[(String, String)]) -> Vec<(&str, String)> {
    let mut grouped: Vec<(&str, String)> = Vec::new();
    for (anchor, code) in insertions {
        match grouped.iter_mut().find(|(seen, _)| *seen == anchor.as_str()) {
            Some((_, joined)) => joined.push_str(code),
            None => grouped.push((anchor.as_str(), code.clone())),
        }
    }
    grouped
}

fn patch_program(
    source: &str,
    patch: &ShaderPatch,
    stage: ShaderStage,
) -> Result<String, PatchError> {
    let mut program = source.to_string();
    for (anchor, code) in grouped_insertions(patch.insertions(stage)) {
        program = splice_after(&program, anchor, &code).ok_or_else(|| {
            PatchError::PatchAnchorNotFound {
                anchor: anchor.to_string(),
                stage,
            }
        })?;
        debug!("Patched {} program after `{}`", stage, anchor);
    }
    Ok(insert_header(&program, patch.header_for(stage)))
}

/// Generated WGSL declaring the material uniform struct and its bindings
///
/// Binding 0 holds the struct. Each texture uniform `name` then takes the next two
/// bindings as `t_name` and `s_name`, in declaration order.
pub fn material_uniform_block(uniforms: &UniformSet) -> String {
    let mut block = format!(
        "\n{}@group({}) @binding(0) var<uniform> material: {};\n",
        uniforms.wgsl_struct(MATERIAL_STRUCT),
        MATERIAL_GROUP,
        MATERIAL_STRUCT
    );
    for (i, (name, _)) in uniforms.textures().enumerate() {
        let binding = 1 + 2 * i as u32;
        block.push_str(&format!(
            "@group({group}) @binding({}) var t_{name}: texture_2d<f32>;\n\
             @group({group}) @binding({}) var s_{name}: sampler;\n",
            binding,
            binding + 1,
            group = MATERIAL_GROUP,
        ));
    }
    block
}

/// Builds a new material from `base` with `patch` applied
///
/// Both programs are fully patched and the uniform sets merged before anything
/// is returned; the base material is left untouched.
pub fn extend_material<M: ShaderMaterial + ?Sized>(
    base: &M,
    patch: &ShaderPatch,
) -> Result<AugmentedMaterial, PatchError> {
    let vertex = patch_program(base.vertex_source(), patch, ShaderStage::Vertex)?;
    let fragment = patch_program(base.fragment_source(), patch, ShaderStage::Fragment)?;

    let mut uniforms = base.uniforms();
    uniforms.merge(&patch.uniforms)?;

    let block = material_uniform_block(&uniforms);
    let vertex = vertex + &block;
    let fragment = fragment + &block;

    let name = if patch == &ShaderPatch::default() {
        base.name().to_string()
    } else {
        format!("{}+patch", base.name())
    };

    debug!(
        "Extended material '{}' with {} vertex and {} fragment insertions, {} uniforms",
        base.name(),
        patch.vertex.len(),
        patch.fragment.len(),
        uniforms.len()
    );

    Ok(AugmentedMaterial::from_parts(
        name,
        vertex,
        fragment,
        uniforms,
        base.double_sided(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::resources::material::PhysicalMaterial;
    use crate::gfx::shader_patch::UniformValue;

    struct FakeMaterial {
        vertex: String,
        fragment: String,
    }

    impl ShaderMaterial for FakeMaterial {
        fn name(&self) -> &str {
            "fake"
        }
        fn vertex_source(&self) -> &str {
            &self.vertex
        }
        fn fragment_source(&self) -> &str {
            &self.fragment
        }
        fn uniforms(&self) -> UniformSet {
            UniformSet::new().with("opacity", 1.0).with("roughness", 0.5)
        }
    }

    fn fake() -> FakeMaterial {
        FakeMaterial {
            vertex: "fn vs() {\n    // <a>\n    // <a>\n}\n".to_string(),
            fragment: "fn fs() {\n    final();\n}\n".to_string(),
        }
    }

    #[test]
    fn test_splice_inserts_right_after_first_occurrence() {
        let source = "head ANCHOR tail ANCHOR end";
        let out = splice_after(source, "ANCHOR", "+code").unwrap();
        assert_eq!(out, "head ANCHOR+code tail ANCHOR end");

        let p = source.find("ANCHOR").unwrap();
        assert_eq!(&out[..p], &source[..p]);
        let after = p + "ANCHOR".len();
        assert_eq!(&out[after + "+code".len()..], &source[after..]);
    }

    #[test]
    fn test_shared_anchor_keeps_declaration_order() {
        let base = FakeMaterial {
            vertex: "xAy".to_string(),
            fragment: "fBg".to_string(),
        };
        let patch = ShaderPatch::new()
            .insert_vertex("A", "1")
            .insert_vertex("A", "2")
            .insert_fragment("B", "1")
            .insert_fragment("f", "0")
            .insert_fragment("B", "2");

        let material = extend_material(&base, &patch).unwrap();
        assert!(material.vertex_source().starts_with("xA12y"));
        assert!(material.fragment_source().starts_with("f0B12g"));
    }

    #[test]
    fn test_splice_missing_anchor() {
        assert_eq!(splice_after("abc", "xyz", "code"), None);
        assert_eq!(splice_after("abc", "", "code"), None);
    }

    #[test]
    fn test_header_goes_after_directives() {
        let source = "// comment\nenable f16;\nrequires readonly_and_readwrite_storage_textures;\nfn main() {}\n";
        let out = insert_header(source, "const K: f32 = 1.0;");
        assert_eq!(
            out,
            "// comment\nenable f16;\nrequires readonly_and_readwrite_storage_textures;\nconst K: f32 = 1.0;\nfn main() {}\n"
        );
    }

    #[test]
    fn test_header_without_directives_goes_first() {
        let out = insert_header("// doc\nfn main() {}\n", "const K: f32 = 1.0;\n");
        assert_eq!(out, "const K: f32 = 1.0;\n// doc\nfn main() {}\n");
        assert_eq!(insert_header("fn main() {}", ""), "fn main() {}");
    }

    #[test]
    fn test_extend_patches_both_programs() {
        let patch = ShaderPatch::new()
            .with_header("const V: f32 = 1.0;")
            .with_fragment_header("const F: f32 = 2.0;")
            .insert_vertex("// <a>", "\n    vertex_code();")
            .insert_fragment("final();", "\n    fragment_code();");

        let material = extend_material(&fake(), &patch).unwrap();

        assert!(material
            .vertex_source()
            .starts_with("const V: f32 = 1.0;\nfn vs() {\n    // <a>\n    vertex_code();\n    // <a>\n}\n"));
        assert!(material
            .fragment_source()
            .starts_with("const F: f32 = 2.0;\nfn fs() {\n    final();\n    fragment_code();\n}\n"));
        assert_eq!(material.vertex_source().matches("vertex_code").count(), 1);
        assert!(!material.vertex_source().contains("const F"));
        assert!(!material.fragment_source().contains("const V"));
    }

    #[test]
    fn test_missing_vertex_anchor_fails() {
        let patch = ShaderPatch::new()
            .insert_vertex("// <a>", "\nok();")
            .insert_vertex("// <missing>", "\nnope();");

        match extend_material(&fake(), &patch) {
            Err(PatchError::PatchAnchorNotFound { anchor, stage }) => {
                assert_eq!(anchor, "// <missing>");
                assert_eq!(stage, ShaderStage::Vertex);
            }
            other => panic!("expected missing anchor, got {:?}", other.map(|m| m.name().to_string())),
        }
    }

    #[test]
    fn test_missing_fragment_anchor_names_the_stage() {
        // The anchor exists in the vertex program only
        let patch = ShaderPatch::new().insert_fragment("// <a>", "\nnope();");
        let err = extend_material(&fake(), &patch).unwrap_err();
        assert_eq!(
            err.to_string(),
            "anchor `// <a>` not found in the fragment program"
        );
    }

    #[test]
    fn test_uniforms_merge_and_block_is_generated() {
        let patch = ShaderPatch::new()
            .with_uniform("opacity", 0.5)
            .with_uniform("fresnel_color", UniformValue::Color([0.0, 0.1, 0.6]));
        let material = extend_material(&fake(), &patch).unwrap();

        assert_eq!(material.uniforms().float("opacity"), Some(0.5));
        assert_eq!(material.uniforms().float("roughness"), Some(0.5));
        assert!(material.uniforms().contains("fresnel_color"));
        for source in [material.vertex_source(), material.fragment_source()] {
            assert!(source.contains("struct MaterialUniforms {"));
            assert!(source.contains("    fresnel_color: vec3<f32>,"));
            assert!(source.contains("@group(2) @binding(0) var<uniform> material: MaterialUniforms;"));
        }
    }

    #[test]
    fn test_texture_uniforms_get_sampler_pairs() {
        let uniforms = UniformSet::new()
            .with("opacity", 1.0)
            .with("map", UniformValue::Texture(None))
            .with("detail", UniformValue::Texture(None));
        let block = material_uniform_block(&uniforms);

        assert!(block.contains("@group(2) @binding(1) var t_map: texture_2d<f32>;"));
        assert!(block.contains("@group(2) @binding(2) var s_map: sampler;"));
        assert!(block.contains("@group(2) @binding(3) var t_detail: texture_2d<f32>;"));
        assert!(block.contains("@group(2) @binding(4) var s_detail: sampler;"));
        assert!(!block.contains("    map:"));
    }

    #[test]
    fn test_base_material_is_not_mutated() {
        let base = PhysicalMaterial::default();
        let vertex_before = base.vertex_source().to_string();
        let uniforms_before = base.uniforms();

        let patch = ShaderPatch::new()
            .insert_vertex("// <fog_vertex>", "\n    // patched")
            .with_uniform("opacity", 0.25);
        let material = extend_material(&base, &patch).unwrap();

        assert_eq!(base.vertex_source(), vertex_before);
        assert_eq!(base.uniforms(), uniforms_before);
        assert!(material.vertex_source().contains("// <fog_vertex>\n    // patched"));
    }

    #[test]
    fn test_empty_patch_keeps_base_programs() {
        let base = PhysicalMaterial::default();
        let material = extend_material(&base, &ShaderPatch::default()).unwrap();
        assert_eq!(material.name(), base.name());
        assert!(material.vertex_source().starts_with(base.vertex_source()));
        assert!(material.fragment_source().starts_with(base.fragment_source()));
    }
}
