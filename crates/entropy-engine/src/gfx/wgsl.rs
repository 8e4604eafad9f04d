//! WGSL front end shared by every device implementation.
//!
//! Each program is two WGSL sources, one per stage. A stage "compiles" when
//! naga parses and validates it; two stages "link" when both entry points are
//! present and the uniforms they share agree on binding and type.
//!
//! Binding conventions:
//! - uniforms (`var<uniform>`) live in bind group 0, one binding per uniform,
//!   at most [`MAX_UNIFORMS`] per program
//! - the sampled texture lives in group 1 (`texture_2d<f32>` at binding 0,
//!   filtering `sampler` at 1) and is visible to the fragment stage only
//!
//! Anything else bound to a group is rejected at link time.

use std::fmt;

use super::DeviceError;

/// Bind group holding every uniform of a program.
pub const UNIFORM_GROUP: u32 = 0;

/// Bind group holding the sampled texture + sampler.
pub const TEXTURE_GROUP: u32 = 1;

/// Binding of the `texture_2d<f32>` in [`TEXTURE_GROUP`].
pub const TEXTURE_BINDING: u32 = 0;

/// Binding of the filtering sampler in [`TEXTURE_GROUP`].
pub const SAMPLER_BINDING: u32 = 1;

/// Uniforms per program. Each one is a dynamic-offset binding and wgpu's
/// default limit for those is 8 per pipeline layout.
pub const MAX_UNIFORMS: usize = 8;

/// Programmable pipeline stage.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl ShaderStage {
    fn naga(self) -> naga::ShaderStage {
        match self {
            ShaderStage::Vertex => naga::ShaderStage::Vertex,
            ShaderStage::Fragment => naga::ShaderStage::Fragment,
        }
    }
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderStage::Vertex => f.write_str("vertex"),
            ShaderStage::Fragment => f.write_str("fragment"),
        }
    }
}

/// Uniform types the render core can upload.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum UniformKind {
    /// `mat4x4<f32>`
    Mat4,
    /// `vec4<f32>`
    Vec4,
}

impl UniformKind {
    /// Size in bytes of the WGSL type.
    #[inline]
    pub const fn size(self) -> u64 {
        match self {
            UniformKind::Mat4 => 64,
            UniformKind::Vec4 => 16,
        }
    }
}

/// A uniform declared by a program.
#[derive(Debug, Clone, PartialEq)]
pub struct UniformSlot {
    pub name: String,
    pub binding: u32,
    pub kind: UniformKind,
}

/// One validated stage.
#[derive(Debug, Clone)]
pub struct CompiledStage {
    pub stage: ShaderStage,
    pub entry_point: String,
    pub uniforms: Vec<UniformSlot>,
}

/// Result of linking a vertex and a fragment stage.
#[derive(Debug, Clone)]
pub struct LinkedProgram {
    pub vertex_entry: String,
    pub fragment_entry: String,
    /// Sorted by binding.
    pub uniforms: Vec<UniformSlot>,
}

impl LinkedProgram {
    /// Index of `name` in [`uniforms`](Self::uniforms).
    pub fn slot_of(&self, name: &str) -> Option<usize> {
        self.uniforms.iter().position(|u| u.name == name)
    }
}

/// Compiles and links a program in one go.
pub fn build_program(vertex_src: &str, fragment_src: &str) -> Result<LinkedProgram, DeviceError> {
    let vertex = compile_stage(vertex_src, ShaderStage::Vertex)?;
    let fragment = compile_stage(fragment_src, ShaderStage::Fragment)?;
    link(vertex, fragment)
}

/// Parses + validates one stage and reflects its uniforms.
pub fn compile_stage(source: &str, stage: ShaderStage) -> Result<CompiledStage, DeviceError> {
    let module = naga::front::wgsl::parse_str(source).map_err(|e| DeviceError::Compile {
        stage,
        log: e.emit_to_string(source),
    })?;

    let mut validator = naga::valid::Validator::new(
        naga::valid::ValidationFlags::all(),
        naga::valid::Capabilities::default(),
    );
    validator.validate(&module).map_err(|e| DeviceError::Compile {
        stage,
        log: e.as_inner().to_string(),
    })?;

    let entry_point = module
        .entry_points
        .iter()
        .find(|ep| ep.stage == stage.naga())
        .map(|ep| ep.name.clone())
        .ok_or_else(|| DeviceError::Link(format!("{stage} source has no @{stage} entry point")))?;

    let mut uniforms = Vec::new();
    for (_, var) in module.global_variables.iter() {
        let Some(binding) = var.binding.as_ref() else { continue };
        let name = var
            .name
            .clone()
            .unwrap_or_else(|| format!("@group({}) @binding({})", binding.group, binding.binding));
        let inner = &module.types[var.ty].inner;

        match var.space {
            naga::AddressSpace::Uniform => {
                if binding.group != UNIFORM_GROUP {
                    return Err(DeviceError::Link(format!(
                        "uniform `{name}` is in group {}, uniforms must be in group {UNIFORM_GROUP}",
                        binding.group
                    )));
                }
                uniforms.push(UniformSlot {
                    kind: uniform_kind(&name, inner)?,
                    name,
                    binding: binding.binding,
                });
            }
            naga::AddressSpace::Handle => check_texture_binding(stage, &name, binding, inner)?,
            _ => {
                return Err(DeviceError::Link(format!(
                    "`{name}` in group {} is not a uniform, texture or sampler",
                    binding.group
                )));
            }
        }
    }

    Ok(CompiledStage {
        stage,
        entry_point,
        uniforms,
    })
}

/// Merges the uniform tables of both stages.
pub fn link(vertex: CompiledStage, fragment: CompiledStage) -> Result<LinkedProgram, DeviceError> {
    if vertex.stage != ShaderStage::Vertex || fragment.stage != ShaderStage::Fragment {
        return Err(DeviceError::Link(format!(
            "expected vertex + fragment stages, got {} + {}",
            vertex.stage, fragment.stage
        )));
    }

    let mut uniforms = vertex.uniforms;
    for slot in fragment.uniforms {
        if let Some(existing) = uniforms.iter().find(|u| u.name == slot.name) {
            if existing.binding != slot.binding || existing.kind != slot.kind {
                return Err(DeviceError::Link(format!(
                    "uniform `{}` is declared differently in the vertex and fragment stages",
                    slot.name
                )));
            }
            continue;
        }
        uniforms.push(slot);
    }

    if uniforms.len() > MAX_UNIFORMS {
        return Err(DeviceError::Link(format!(
            "program declares {} uniforms, at most {MAX_UNIFORMS} are supported",
            uniforms.len()
        )));
    }

    uniforms.sort_by_key(|u| u.binding);
    if let Some(pair) = uniforms.windows(2).find(|w| w[0].binding == w[1].binding) {
        return Err(DeviceError::Link(format!(
            "uniforms `{}` and `{}` share binding {}",
            pair[0].name, pair[1].name, pair[0].binding
        )));
    }

    Ok(LinkedProgram {
        vertex_entry: vertex.entry_point,
        fragment_entry: fragment.entry_point,
        uniforms,
    })
}

fn uniform_kind(name: &str, inner: &naga::TypeInner) -> Result<UniformKind, DeviceError> {
    match *inner {
        naga::TypeInner::Matrix {
            columns: naga::VectorSize::Quad,
            rows: naga::VectorSize::Quad,
            scalar,
        } if scalar == naga::Scalar::F32 => Ok(UniformKind::Mat4),
        naga::TypeInner::Vector {
            size: naga::VectorSize::Quad,
            scalar,
        } if scalar == naga::Scalar::F32 => Ok(UniformKind::Vec4),
        _ => Err(DeviceError::Link(format!(
            "uniform `{name}` has an unsupported type (expected mat4x4<f32> or vec4<f32>)"
        ))),
    }
}

/// Textures and samplers must match the fixed group 1 layout.
fn check_texture_binding(
    stage: ShaderStage,
    name: &str,
    binding: &naga::ResourceBinding,
    inner: &naga::TypeInner,
) -> Result<(), DeviceError> {
    if binding.group != TEXTURE_GROUP {
        return Err(DeviceError::Link(format!(
            "`{name}` is in group {}, textures and samplers must be in group {TEXTURE_GROUP}",
            binding.group
        )));
    }
    if stage != ShaderStage::Fragment {
        return Err(DeviceError::Link(format!(
            "`{name}` is bound in the {stage} stage, textures are fragment-only"
        )));
    }

    let matches_layout = match (binding.binding, inner) {
        (
            TEXTURE_BINDING,
            naga::TypeInner::Image {
                dim: naga::ImageDimension::D2,
                arrayed: false,
                class:
                    naga::ImageClass::Sampled {
                        kind: naga::ScalarKind::Float,
                        multi: false,
                    },
            },
        ) => true,
        (SAMPLER_BINDING, naga::TypeInner::Sampler { comparison: false }) => true,
        _ => false,
    };
    if !matches_layout {
        return Err(DeviceError::Link(format!(
            "`{name}` at binding {} does not match group {TEXTURE_GROUP} \
             (texture_2d<f32> at {TEXTURE_BINDING}, sampler at {SAMPLER_BINDING})",
            binding.binding
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const VS: &str = r#"
        @group(0) @binding(0) var<uniform> projection: mat4x4<f32>;
        @group(0) @binding(1) var<uniform> model: mat4x4<f32>;

        @vertex
        fn vs_main(@location(0) pos: vec2<f32>) -> @builtin(position) vec4<f32> {
            return projection * model * vec4<f32>(pos, 0.0, 1.0);
        }
    "#;

    const FS: &str = r#"
        @group(0) @binding(2) var<uniform> color: vec4<f32>;

        @fragment
        fn fs_main() -> @location(0) vec4<f32> {
            return color;
        }
    "#;

    #[test]
    fn reflects_uniforms_from_both_stages() {
        let program = build_program(VS, FS).unwrap();
        let names: Vec<_> = program.uniforms.iter().map(|u| u.name.as_str()).collect();
        assert_eq!(names, ["projection", "model", "color"]);
        assert_eq!(program.uniforms[0].kind, UniformKind::Mat4);
        assert_eq!(program.uniforms[2].kind, UniformKind::Vec4);
        assert_eq!(program.vertex_entry, "vs_main");
        assert_eq!(program.fragment_entry, "fs_main");
    }

    #[test]
    fn parse_error_carries_diagnostic() {
        let err = compile_stage("fn broken( {", ShaderStage::Vertex).unwrap_err();
        match err {
            DeviceError::Compile { stage, log } => {
                assert_eq!(stage, ShaderStage::Vertex);
                assert!(!log.is_empty());
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn missing_entry_point_fails_link() {
        // A fragment-only source handed to the vertex stage.
        let err = build_program(FS, FS).unwrap_err();
        assert!(matches!(err, DeviceError::Link(_)));
    }

    #[test]
    fn conflicting_shared_uniform_fails_link() {
        let fs = r#"
            @group(0) @binding(5) var<uniform> model: mat4x4<f32>;

            @fragment
            fn fs_main() -> @location(0) vec4<f32> {
                return model[0];
            }
        "#;
        assert!(matches!(build_program(VS, fs), Err(DeviceError::Link(_))));
    }

    #[test]
    fn uniform_outside_group_zero_is_rejected() {
        let vs = r#"
            @group(1) @binding(0) var<uniform> projection: mat4x4<f32>;

            @vertex
            fn vs_main() -> @builtin(position) vec4<f32> {
                return projection[0];
            }
        "#;
        assert!(matches!(
            compile_stage(vs, ShaderStage::Vertex),
            Err(DeviceError::Link(_))
        ));
    }

    #[test]
    fn unsupported_uniform_type_is_rejected() {
        let fs = r#"
            @group(0) @binding(0) var<uniform> tint: vec3<f32>;

            @fragment
            fn fs_main() -> @location(0) vec4<f32> {
                return vec4<f32>(tint, 1.0);
            }
        "#;
        assert!(matches!(
            compile_stage(fs, ShaderStage::Fragment),
            Err(DeviceError::Link(_))
        ));
    }

    fn fragment_with(decl: &str, body: &str) -> String {
        format!(
            "{decl}\n@fragment\nfn fs_main(@location(0) uv: vec2<f32>) -> @location(0) vec4<f32> {{\n{body}\n}}\n"
        )
    }

    #[test]
    fn textured_fragment_matching_layout_links() {
        let fs = fragment_with(
            "@group(1) @binding(0) var tex: texture_2d<f32>;\n\
             @group(1) @binding(1) var samp: sampler;",
            "return textureSample(tex, samp, uv);",
        );
        assert!(compile_stage(&fs, ShaderStage::Fragment).is_ok());
    }

    #[test]
    fn storage_buffer_is_rejected() {
        let fs = fragment_with(
            "@group(0) @binding(7) var<storage, read> extra: array<vec4<f32>>;",
            "return extra[0];",
        );
        assert!(matches!(
            compile_stage(&fs, ShaderStage::Fragment),
            Err(DeviceError::Link(_))
        ));
    }

    #[test]
    fn texture_outside_group_one_is_rejected() {
        let fs = fragment_with(
            "@group(3) @binding(0) var tex: texture_2d<f32>;\n\
             @group(1) @binding(1) var samp: sampler;",
            "return textureSample(tex, samp, uv);",
        );
        assert!(matches!(
            compile_stage(&fs, ShaderStage::Fragment),
            Err(DeviceError::Link(_))
        ));
    }

    #[test]
    fn texture_group_must_match_fixed_bindings() {
        // Texture and sampler swapped.
        let swapped = fragment_with(
            "@group(1) @binding(1) var tex: texture_2d<f32>;\n\
             @group(1) @binding(0) var samp: sampler;",
            "return textureSample(tex, samp, uv);",
        );
        // Integer texture at the texture slot.
        let uint = fragment_with(
            "@group(1) @binding(0) var tex: texture_2d<u32>;",
            "return vec4<f32>(textureLoad(tex, vec2<i32>(0, 0), 0));",
        );
        // Comparison sampler at the sampler slot.
        let comparison = fragment_with(
            "@group(1) @binding(0) var tex: texture_depth_2d;\n\
             @group(1) @binding(1) var samp: sampler_comparison;",
            "return vec4<f32>(textureSampleCompare(tex, samp, uv, 0.5));",
        );

        for fs in [swapped, uint, comparison] {
            assert!(
                matches!(compile_stage(&fs, ShaderStage::Fragment), Err(DeviceError::Link(_))),
                "accepted:\n{fs}"
            );
        }
    }

    #[test]
    fn texture_in_vertex_stage_is_rejected() {
        let vs = r#"
            @group(1) @binding(0) var tex: texture_2d<f32>;

            @vertex
            fn vs_main() -> @builtin(position) vec4<f32> {
                return textureLoad(tex, vec2<i32>(0, 0), 0);
            }
        "#;
        assert!(matches!(
            compile_stage(vs, ShaderStage::Vertex),
            Err(DeviceError::Link(_))
        ));
    }

    #[test]
    fn too_many_uniforms_fail_link() {
        let decls: String = (0..=MAX_UNIFORMS)
            .map(|i| format!("@group(0) @binding({i}) var<uniform> u{i}: vec4<f32>;\n"))
            .collect();
        let sum: Vec<String> = (0..=MAX_UNIFORMS).map(|i| format!("u{i}")).collect();
        let fs = fragment_with(&decls, &format!("return {};", sum.join(" + ")));

        let err = build_program(VS, &fs).unwrap_err();
        match err {
            DeviceError::Link(log) => assert!(log.contains("uniforms"), "{log}"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn limit_of_uniforms_still_links() {
        // VS already declares bindings 0 and 1.
        let decls: String = (2..MAX_UNIFORMS)
            .map(|i| format!("@group(0) @binding({i}) var<uniform> u{i}: vec4<f32>;\n"))
            .collect();
        let sum: Vec<String> = (2..MAX_UNIFORMS).map(|i| format!("u{i}")).collect();
        let fs = fragment_with(&decls, &format!("return {};", sum.join(" + ")));

        let program = build_program(VS, &fs).unwrap();
        assert_eq!(program.uniforms.len(), MAX_UNIFORMS);
    }
}
