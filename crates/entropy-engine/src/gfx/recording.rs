//! Recording device for tests.
//!
//! Behaves like a real device as far as the render core can tell: WGSL is
//! compiled and linked through the same front end, handles are validated and
//! uniform values are tracked per program. No GPU is touched; every call is
//! appended to a log that tests assert against.

use glam::{Mat4, Vec4};

use super::state::DeviceState;
use super::{
    DeviceError, GraphicsDevice, MeshId, ProgramId, QuadVertex, TextureId, UniformLocation,
    UniformValue,
};

/// A draw as the device saw it, including a snapshot of the program's uniforms.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawCall {
    pub program: ProgramId,
    pub mesh: MeshId,
    pub texture: Option<TextureId>,
    pub vertex_count: u32,
    pub uniforms: Vec<(String, UniformValue)>,
}

impl DrawCall {
    pub fn uniform(&self, name: &str) -> Option<UniformValue> {
        self.uniforms
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| *v)
    }

    pub fn color(&self) -> Option<Vec4> {
        match self.uniform("color")? {
            UniformValue::Vec4(v) => Some(v),
            UniformValue::Mat4(_) => None,
        }
    }

    pub fn model(&self) -> Option<Mat4> {
        match self.uniform("model")? {
            UniformValue::Mat4(m) => Some(m),
            UniformValue::Vec4(_) => None,
        }
    }
}

/// One recorded device call.
#[derive(Debug, Clone, PartialEq)]
pub enum GfxCall {
    CreateProgram(ProgramId),
    UseProgram(Option<ProgramId>),
    DeleteProgram(ProgramId),
    SetUniform {
        program: ProgramId,
        name: String,
        value: UniformValue,
    },
    CreateMesh {
        mesh: MeshId,
        vertices: Vec<QuadVertex>,
    },
    BindMesh(Option<MeshId>),
    DeleteMesh(MeshId),
    Draw(DrawCall),
    CreateTexture {
        texture: TextureId,
        width: u32,
        height: u32,
    },
    BindTexture(Option<TextureId>),
    DeleteTexture(TextureId),
}

#[derive(Default)]
pub struct RecordingDevice {
    state: DeviceState,
    calls: Vec<GfxCall>,
}

impl RecordingDevice {
    pub fn new() -> Self {
        Self::default()
    }

    /// All calls recorded so far, oldest first.
    pub fn calls(&self) -> &[GfxCall] {
        &self.calls
    }

    /// Returns and forgets the recorded calls.
    pub fn take_calls(&mut self) -> Vec<GfxCall> {
        std::mem::take(&mut self.calls)
    }

    pub fn draws(&self) -> Vec<&DrawCall> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                GfxCall::Draw(d) => Some(d),
                _ => None,
            })
            .collect()
    }

    /// Number of times `program` was made current.
    pub fn program_binds(&self, program: ProgramId) -> usize {
        self.calls
            .iter()
            .filter(|c| matches!(c, GfxCall::UseProgram(Some(p)) if *p == program))
            .count()
    }

    /// Calls issued while `program` was current, plus the bind of `program` itself.
    pub fn calls_for(&self, program: ProgramId) -> Vec<&GfxCall> {
        let mut current = None;
        let mut out = Vec::new();
        for call in &self.calls {
            if let GfxCall::UseProgram(p) = call {
                current = *p;
                if current == Some(program) {
                    out.push(call);
                }
                continue;
            }
            if current == Some(program) {
                out.push(call);
            }
        }
        out
    }

    pub fn live_programs(&self) -> usize {
        self.state.live_programs()
    }

    pub fn live_meshes(&self) -> usize {
        self.state.live_meshes()
    }

    pub fn live_textures(&self) -> usize {
        self.state.live_textures()
    }

    fn set_uniform(
        &mut self,
        location: UniformLocation,
        value: UniformValue,
    ) -> Result<(), DeviceError> {
        let name = self.state.set_uniform(location, value)?.to_owned();
        self.calls.push(GfxCall::SetUniform {
            program: location.program,
            name,
            value,
        });
        Ok(())
    }
}

impl GraphicsDevice for RecordingDevice {
    fn create_program(
        &mut self,
        vertex_src: &str,
        fragment_src: &str,
    ) -> Result<ProgramId, DeviceError> {
        let id = self.state.create_program(vertex_src, fragment_src)?;
        self.calls.push(GfxCall::CreateProgram(id));
        Ok(id)
    }

    fn uniform_location(&self, program: ProgramId, name: &str) -> Option<UniformLocation> {
        self.state.uniform_location(program, name)
    }

    fn use_program(&mut self, program: Option<ProgramId>) -> Result<(), DeviceError> {
        self.state.use_program(program)?;
        self.calls.push(GfxCall::UseProgram(program));
        Ok(())
    }

    fn delete_program(&mut self, program: ProgramId) -> Result<(), DeviceError> {
        self.state.delete_program(program)?;
        self.calls.push(GfxCall::DeleteProgram(program));
        Ok(())
    }

    fn set_uniform_mat4(
        &mut self,
        location: UniformLocation,
        value: &Mat4,
    ) -> Result<(), DeviceError> {
        self.set_uniform(location, UniformValue::Mat4(*value))
    }

    fn set_uniform_vec4(
        &mut self,
        location: UniformLocation,
        value: Vec4,
    ) -> Result<(), DeviceError> {
        self.set_uniform(location, UniformValue::Vec4(value))
    }

    fn create_mesh(&mut self, vertices: &[QuadVertex]) -> Result<MeshId, DeviceError> {
        let mesh = self.state.create_mesh(vertices)?;
        self.calls.push(GfxCall::CreateMesh {
            mesh,
            vertices: vertices.to_vec(),
        });
        Ok(mesh)
    }

    fn bind_mesh(&mut self, mesh: Option<MeshId>) -> Result<(), DeviceError> {
        self.state.bind_mesh(mesh)?;
        self.calls.push(GfxCall::BindMesh(mesh));
        Ok(())
    }

    fn delete_mesh(&mut self, mesh: MeshId) -> Result<(), DeviceError> {
        self.state.delete_mesh(mesh)?;
        self.calls.push(GfxCall::DeleteMesh(mesh));
        Ok(())
    }

    fn draw_triangle_strip(&mut self, vertex_count: u32) -> Result<(), DeviceError> {
        let draw = self.state.check_draw(vertex_count)?;
        let program = self
            .state
            .program(draw.program)
            .ok_or(DeviceError::UnknownProgram(draw.program))?;
        let uniforms = program
            .linked
            .uniforms
            .iter()
            .zip(&program.values)
            .map(|(slot, value)| (slot.name.clone(), *value))
            .collect();

        self.calls.push(GfxCall::Draw(DrawCall {
            program: draw.program,
            mesh: draw.mesh,
            texture: draw.texture,
            vertex_count,
            uniforms,
        }));
        Ok(())
    }

    fn create_texture(
        &mut self,
        width: u32,
        height: u32,
        rgba: &[u8],
    ) -> Result<TextureId, DeviceError> {
        let texture = self.state.create_texture(width, height, rgba)?;
        self.calls.push(GfxCall::CreateTexture {
            texture,
            width,
            height,
        });
        Ok(texture)
    }

    fn bind_texture(&mut self, texture: Option<TextureId>) -> Result<(), DeviceError> {
        self.state.bind_texture(texture)?;
        self.calls.push(GfxCall::BindTexture(texture));
        Ok(())
    }

    fn delete_texture(&mut self, texture: TextureId) -> Result<(), DeviceError> {
        self.state.delete_texture(texture)?;
        self.calls.push(GfxCall::DeleteTexture(texture));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VS: &str = r#"
        @group(0) @binding(0) var<uniform> model: mat4x4<f32>;

        @vertex
        fn vs_main(@location(0) pos: vec2<f32>) -> @builtin(position) vec4<f32> {
            return model * vec4<f32>(pos, 0.0, 1.0);
        }
    "#;

    const FS: &str = r#"
        @group(0) @binding(1) var<uniform> color: vec4<f32>;

        @fragment
        fn fs_main() -> @location(0) vec4<f32> {
            return color;
        }
    "#;

    fn quad() -> [QuadVertex; 3] {
        [
            QuadVertex::new([0.0, 0.0], [0.0, 0.0]),
            QuadVertex::new([1.0, 0.0], [1.0, 0.0]),
            QuadVertex::new([0.0, 1.0], [0.0, 1.0]),
        ]
    }

    #[test]
    fn draw_without_program_is_rejected() {
        let mut dev = RecordingDevice::new();
        let mesh = dev.create_mesh(&quad()).unwrap();
        dev.bind_mesh(Some(mesh)).unwrap();
        assert_eq!(dev.draw_triangle_strip(3), Err(DeviceError::NoProgramBound));
    }

    #[test]
    fn draw_without_mesh_is_rejected() {
        let mut dev = RecordingDevice::new();
        let program = dev.create_program(VS, FS).unwrap();
        dev.use_program(Some(program)).unwrap();
        assert_eq!(dev.draw_triangle_strip(3), Err(DeviceError::NoMeshBound));
    }

    #[test]
    fn draw_snapshots_current_uniforms() {
        let mut dev = RecordingDevice::new();
        let program = dev.create_program(VS, FS).unwrap();
        let color = dev.uniform_location(program, "color").unwrap();
        let mesh = dev.create_mesh(&quad()).unwrap();

        dev.use_program(Some(program)).unwrap();
        dev.bind_mesh(Some(mesh)).unwrap();
        dev.set_uniform_vec4(color, Vec4::new(1.0, 0.0, 0.0, 1.0)).unwrap();
        dev.draw_triangle_strip(3).unwrap();
        dev.set_uniform_vec4(color, Vec4::new(0.0, 1.0, 0.0, 1.0)).unwrap();
        dev.draw_triangle_strip(3).unwrap();

        let draws = dev.draws();
        assert_eq!(draws[0].color(), Some(Vec4::new(1.0, 0.0, 0.0, 1.0)));
        assert_eq!(draws[1].color(), Some(Vec4::new(0.0, 1.0, 0.0, 1.0)));
    }

    #[test]
    fn uniform_type_is_checked() {
        let mut dev = RecordingDevice::new();
        let program = dev.create_program(VS, FS).unwrap();
        let model = dev.uniform_location(program, "model").unwrap();
        dev.use_program(Some(program)).unwrap();

        let err = dev.set_uniform_vec4(model, Vec4::ONE).unwrap_err();
        assert!(matches!(err, DeviceError::UniformType { .. }));
    }

    #[test]
    fn location_from_other_program_is_rejected() {
        let mut dev = RecordingDevice::new();
        let a = dev.create_program(VS, FS).unwrap();
        let b = dev.create_program(VS, FS).unwrap();
        let color_a = dev.uniform_location(a, "color").unwrap();

        dev.use_program(Some(b)).unwrap();
        let err = dev.set_uniform_vec4(color_a, Vec4::ONE).unwrap_err();
        assert!(matches!(err, DeviceError::LocationMismatch { .. }));
    }

    #[test]
    fn draw_past_mesh_end_is_rejected() {
        let mut dev = RecordingDevice::new();
        let program = dev.create_program(VS, FS).unwrap();
        let mesh = dev.create_mesh(&quad()).unwrap();
        dev.use_program(Some(program)).unwrap();
        dev.bind_mesh(Some(mesh)).unwrap();

        assert_eq!(
            dev.draw_triangle_strip(4),
            Err(DeviceError::DrawOutOfRange { requested: 4, available: 3 })
        );
    }

    #[test]
    fn texture_data_length_is_validated() {
        let mut dev = RecordingDevice::new();
        let err = dev.create_texture(2, 2, &[0u8; 15]).unwrap_err();
        assert_eq!(
            err,
            DeviceError::InvalidTextureData { width: 2, height: 2, len: 15 }
        );
        assert_eq!(dev.live_textures(), 0);
        assert!(dev.create_texture(2, 2, &[0u8; 16]).is_ok());
    }

    #[test]
    fn deleting_bound_program_unbinds_it() {
        let mut dev = RecordingDevice::new();
        let program = dev.create_program(VS, FS).unwrap();
        dev.use_program(Some(program)).unwrap();
        dev.delete_program(program).unwrap();

        assert_eq!(dev.live_programs(), 0);
        assert_eq!(dev.use_program(Some(program)), Err(DeviceError::UnknownProgram(program)));
    }
}
