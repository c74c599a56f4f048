//! WGSL validation using naga.
//!
//! Every program is parsed and validated before wgpu sees it, so a broken
//! kernel or render shader is reported with a readable diagnostic instead of a
//! device-side panic.

use naga::front::wgsl;
use naga::valid::{Capabilities, ValidationFlags, Validator};

use crate::error::ParticleSystemError;

/// Which program a source belongs to; selects the error variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShaderStage {
    /// The simulation kernel (`init`, `update`, `change_color`).
    Kernel,
    /// The particle vertex and fragment shader.
    Render,
}

impl ShaderStage {
    /// Wrap a diagnostic in the error this stage reports.
    pub fn error(self, source_name: &str, diagnostic: String) -> ParticleSystemError {
        let source_name = source_name.to_string();
        match self {
            ShaderStage::Kernel => ParticleSystemError::KernelCompile {
                source_name,
                diagnostic,
            },
            ShaderStage::Render => ParticleSystemError::ShaderBuild {
                source_name,
                diagnostic,
            },
        }
    }
}

/// Parse and validate WGSL source, returning the checked module.
pub fn validate_wgsl(
    source: &str,
    source_name: &str,
    stage: ShaderStage,
) -> Result<naga::Module, ParticleSystemError> {
    let module = wgsl::parse_str(source)
        .map_err(|err| stage.error(source_name, err.emit_to_string(source)))?;

    let mut validator = Validator::new(ValidationFlags::all(), Capabilities::all());
    validator
        .validate(&module)
        .map_err(|err| stage.error(source_name, err.emit_to_string(source)))?;

    Ok(module)
}

/// Check that every named entry point exists in a validated module.
pub fn require_entry_points(
    module: &naga::Module,
    names: &[&str],
    source_name: &str,
    stage: ShaderStage,
) -> Result<(), ParticleSystemError> {
    let missing: Vec<&str> = names
        .iter()
        .copied()
        .filter(|name| !module.entry_points.iter().any(|ep| ep.name == *name))
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(stage.error(
            source_name,
            format!("missing entry point(s): {}", missing.join(", ")),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID: &str = r#"
@group(0) @binding(0) var<storage, read_write> data: array<f32>;

@compute @workgroup_size(64)
fn main(@builtin(global_invocation_id) id: vec3<u32>) {
    data[id.x] = data[id.x] * 2.0;
}
"#;

    #[test]
    fn test_valid_shader() {
        let module = validate_wgsl(VALID, "double.wgsl", ShaderStage::Kernel).unwrap();
        require_entry_points(&module, &["main"], "double.wgsl", ShaderStage::Kernel).unwrap();
    }

    #[test]
    fn test_parse_error_is_kernel_compile() {
        let bad = "fn main( { }";
        let err = validate_wgsl(bad, "broken.wgsl", ShaderStage::Kernel).unwrap_err();
        match err {
            ParticleSystemError::KernelCompile {
                source_name,
                diagnostic,
            } => {
                assert_eq!(source_name, "broken.wgsl");
                assert!(!diagnostic.is_empty());
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_type_error_is_shader_build_for_render() {
        let bad = r#"
@fragment
fn fs_main() -> @location(0) vec4<f32> {
    let x: f32 = vec2<f32>(1.0, 2.0);
    return vec4<f32>(x);
}
"#;
        let err = validate_wgsl(bad, "render.wgsl", ShaderStage::Render).unwrap_err();
        assert_eq!(err.category(), "Shader build error");
    }

    #[test]
    fn test_missing_entry_point() {
        let module = validate_wgsl(VALID, "double.wgsl", ShaderStage::Kernel).unwrap();
        let err = require_entry_points(
            &module,
            &["init", "update"],
            "double.wgsl",
            ShaderStage::Kernel,
        )
        .unwrap_err();
        assert!(err.to_string().contains("init, update"));
    }
}
