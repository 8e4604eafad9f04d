use glam::{Mat4, Vec4};

use crate::gfx::{GraphicsDevice, ProgramId, UniformLocation};

use super::{ShaderError, ShaderProgram};

const QUAD_VS: &str = include_str!("shaders/quad.vert.wgsl");
const QUAD_FS: &str = include_str!("shaders/quad.frag.wgsl");

/// Shader used by the 2D batches.
///
/// Requires three uniforms: `projection` and `model` (`mat4x4<f32>`) and
/// `color` (`vec4<f32>`). Their locations are resolved once so per-draw
/// uploads skip the name lookup.
#[derive(Debug)]
pub struct Shader2D {
    program: ShaderProgram,
    projection: UniformLocation,
    model: UniformLocation,
    color: UniformLocation,
}

impl Shader2D {
    pub const PROJECTION: &'static str = "projection";
    pub const MODEL: &'static str = "model";
    pub const COLOR: &'static str = "color";

    pub fn new(
        device: &mut dyn GraphicsDevice,
        vertex_src: &str,
        fragment_src: &str,
    ) -> Result<Self, ShaderError> {
        let mut program = ShaderProgram::new(device, vertex_src, fragment_src)?;

        match resolve_uniforms(&mut program, &*device) {
            Ok((projection, model, color)) => Ok(Self {
                program,
                projection,
                model,
                color,
            }),
            Err(err) => {
                program.cleanup(device)?;
                Err(err)
            }
        }
    }

    /// The bundled textured-quad shader.
    pub fn builtin(device: &mut dyn GraphicsDevice) -> Result<Self, ShaderError> {
        Self::new(device, QUAD_VS, QUAD_FS)
    }

    #[inline]
    pub fn id(&self) -> ProgramId {
        self.program.id()
    }

    #[inline]
    pub fn program(&self) -> &ShaderProgram {
        &self.program
    }

    pub fn bind(&self, device: &mut dyn GraphicsDevice) -> Result<(), ShaderError> {
        self.program.bind(device)
    }

    pub fn unbind(device: &mut dyn GraphicsDevice) -> Result<(), ShaderError> {
        ShaderProgram::unbind(device)
    }

    pub fn set_projection(
        &self,
        device: &mut dyn GraphicsDevice,
        projection: &Mat4,
    ) -> Result<(), ShaderError> {
        device.set_uniform_mat4(self.projection, projection)?;
        Ok(())
    }

    pub fn set_model(&self, device: &mut dyn GraphicsDevice, model: &Mat4) -> Result<(), ShaderError> {
        device.set_uniform_mat4(self.model, model)?;
        Ok(())
    }

    pub fn set_color(&self, device: &mut dyn GraphicsDevice, color: Vec4) -> Result<(), ShaderError> {
        device.set_uniform_vec4(self.color, color)?;
        Ok(())
    }

    pub fn cleanup(self, device: &mut dyn GraphicsDevice) -> Result<(), ShaderError> {
        self.program.cleanup(device)
    }
}

fn resolve_uniforms(
    program: &mut ShaderProgram,
    device: &dyn GraphicsDevice,
) -> Result<(UniformLocation, UniformLocation, UniformLocation), ShaderError> {
    Ok((
        program.create_uniform(device, Shader2D::PROJECTION)?,
        program.create_uniform(device, Shader2D::MODEL)?,
        program.create_uniform(device, Shader2D::COLOR)?,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::{DeviceError, RecordingDevice};

    #[test]
    fn builtin_shader_resolves_all_uniforms() {
        let mut dev = RecordingDevice::new();
        let shader = Shader2D::builtin(&mut dev).unwrap();

        for name in [Shader2D::PROJECTION, Shader2D::MODEL, Shader2D::COLOR] {
            assert!(shader.program().location(name).is_ok(), "{name}");
        }
        assert_eq!(dev.live_programs(), 1);
    }

    #[test]
    fn shader_without_color_is_rejected_and_deleted() {
        const FS: &str = r#"
            @fragment
            fn fs_main() -> @location(0) vec4<f32> {
                return vec4<f32>(1.0);
            }
        "#;
        let mut dev = RecordingDevice::new();
        let err = Shader2D::new(&mut dev, QUAD_VS, FS).unwrap_err();

        assert_eq!(err, ShaderError::MissingUniform("color".into()));
        assert_eq!(dev.live_programs(), 0);
    }

    #[test]
    fn cleanup_releases_program() {
        let mut dev = RecordingDevice::new();
        let shader = Shader2D::builtin(&mut dev).unwrap();
        shader.cleanup(&mut dev).unwrap();
        assert_eq!(dev.live_programs(), 0);
    }

    #[test]
    fn shader_outside_the_bind_layout_fails_to_build() {
        const FS: &str = r#"
            @group(0) @binding(2) var<uniform> color: vec4<f32>;
            @group(0) @binding(7) var<storage, read> extra: array<vec4<f32>>;
            @group(3) @binding(0) var tex: texture_2d<f32>;

            @fragment
            fn fs_main() -> @location(0) vec4<f32> {
                return color * extra[0] * textureLoad(tex, vec2<i32>(0, 0), 0);
            }
        "#;
        let mut dev = RecordingDevice::new();
        let err = Shader2D::new(&mut dev, QUAD_VS, FS).unwrap_err();

        assert!(matches!(err, ShaderError::Build(DeviceError::Link(_))), "{err:?}");
        assert_eq!(dev.live_programs(), 0);
    }
}
