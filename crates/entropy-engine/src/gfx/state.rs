//! Bookkeeping shared by every device implementation.
//!
//! Tracks live handles, the current bindings and each program's uniform
//! values, and performs the validation that makes device misuse an error
//! instead of undefined behavior.

use std::collections::HashMap;

use super::wgsl::{self, LinkedProgram};
use super::{
    DeviceError, MeshId, ProgramId, QuadVertex, TextureId, UniformLocation, UniformValue,
};

pub(crate) struct ProgramState {
    pub linked: LinkedProgram,
    /// Current value per uniform slot, same order as `linked.uniforms`.
    pub values: Vec<UniformValue>,
}

/// Everything a draw consumes, resolved at draw time.
#[derive(Debug, Copy, Clone)]
pub(crate) struct DrawState {
    pub program: ProgramId,
    pub mesh: MeshId,
    pub texture: Option<TextureId>,
}

#[derive(Default)]
pub(crate) struct DeviceState {
    next_id: u32,
    programs: HashMap<ProgramId, ProgramState>,
    meshes: HashMap<MeshId, u32>,
    textures: HashMap<TextureId, (u32, u32)>,

    bound_program: Option<ProgramId>,
    bound_mesh: Option<MeshId>,
    bound_texture: Option<TextureId>,
}

impl DeviceState {
    fn alloc(&mut self) -> u32 {
        self.next_id = self.next_id.wrapping_add(1);
        self.next_id
    }

    // ── programs ──────────────────────────────────────────────────────────

    pub fn create_program(
        &mut self,
        vertex_src: &str,
        fragment_src: &str,
    ) -> Result<ProgramId, DeviceError> {
        let linked = wgsl::build_program(vertex_src, fragment_src)?;
        let values = linked
            .uniforms
            .iter()
            .map(|u| UniformValue::zeroed(u.kind))
            .collect();

        let id = ProgramId(self.alloc());
        self.programs.insert(id, ProgramState { linked, values });
        Ok(id)
    }

    pub fn program(&self, id: ProgramId) -> Option<&ProgramState> {
        self.programs.get(&id)
    }

    pub fn uniform_location(&self, program: ProgramId, name: &str) -> Option<UniformLocation> {
        let slot = self.programs.get(&program)?.linked.slot_of(name)?;
        Some(UniformLocation {
            program,
            slot: slot as u32,
        })
    }

    pub fn use_program(&mut self, program: Option<ProgramId>) -> Result<(), DeviceError> {
        if let Some(id) = program {
            if !self.programs.contains_key(&id) {
                return Err(DeviceError::UnknownProgram(id));
            }
        }
        self.bound_program = program;
        Ok(())
    }

    pub fn delete_program(&mut self, program: ProgramId) -> Result<(), DeviceError> {
        self.programs
            .remove(&program)
            .ok_or(DeviceError::UnknownProgram(program))?;
        if self.bound_program == Some(program) {
            self.bound_program = None;
        }
        Ok(())
    }

    /// Stores `value` in the bound program and returns the uniform name.
    pub fn set_uniform(
        &mut self,
        location: UniformLocation,
        value: UniformValue,
    ) -> Result<&str, DeviceError> {
        let bound = self.bound_program.ok_or(DeviceError::NoProgramBound)?;
        if location.program != bound {
            return Err(DeviceError::LocationMismatch { location, bound });
        }

        let state = self
            .programs
            .get_mut(&bound)
            .ok_or(DeviceError::UnknownProgram(bound))?;
        let slot = location.slot as usize;
        let Some(decl) = state.linked.uniforms.get(slot) else {
            return Err(DeviceError::LocationMismatch { location, bound });
        };

        if decl.kind != value.kind() {
            return Err(DeviceError::UniformType {
                expected: decl.kind,
                found: value.kind(),
            });
        }

        state.values[slot] = value;
        Ok(&state.linked.uniforms[slot].name)
    }

    // ── meshes ────────────────────────────────────────────────────────────

    pub fn create_mesh(&mut self, vertices: &[QuadVertex]) -> Result<MeshId, DeviceError> {
        if vertices.is_empty() {
            return Err(DeviceError::EmptyMesh);
        }
        let id = MeshId(self.alloc());
        self.meshes.insert(id, vertices.len() as u32);
        Ok(id)
    }

    pub fn bind_mesh(&mut self, mesh: Option<MeshId>) -> Result<(), DeviceError> {
        if let Some(id) = mesh {
            if !self.meshes.contains_key(&id) {
                return Err(DeviceError::UnknownMesh(id));
            }
        }
        self.bound_mesh = mesh;
        Ok(())
    }

    pub fn delete_mesh(&mut self, mesh: MeshId) -> Result<(), DeviceError> {
        self.meshes
            .remove(&mesh)
            .ok_or(DeviceError::UnknownMesh(mesh))?;
        if self.bound_mesh == Some(mesh) {
            self.bound_mesh = None;
        }
        Ok(())
    }

    // ── textures ──────────────────────────────────────────────────────────

    pub fn create_texture(
        &mut self,
        width: u32,
        height: u32,
        rgba: &[u8],
    ) -> Result<TextureId, DeviceError> {
        let expected = (width as usize) * (height as usize) * 4;
        if width == 0 || height == 0 || rgba.len() != expected {
            return Err(DeviceError::InvalidTextureData {
                width,
                height,
                len: rgba.len(),
            });
        }
        let id = TextureId(self.alloc());
        self.textures.insert(id, (width, height));
        Ok(id)
    }

    pub fn bind_texture(&mut self, texture: Option<TextureId>) -> Result<(), DeviceError> {
        if let Some(id) = texture {
            if !self.textures.contains_key(&id) {
                return Err(DeviceError::UnknownTexture(id));
            }
        }
        self.bound_texture = texture;
        Ok(())
    }

    pub fn delete_texture(&mut self, texture: TextureId) -> Result<(), DeviceError> {
        self.textures
            .remove(&texture)
            .ok_or(DeviceError::UnknownTexture(texture))?;
        if self.bound_texture == Some(texture) {
            self.bound_texture = None;
        }
        Ok(())
    }

    // ── draws ─────────────────────────────────────────────────────────────

    pub fn check_draw(&self, vertex_count: u32) -> Result<DrawState, DeviceError> {
        let program = self.bound_program.ok_or(DeviceError::NoProgramBound)?;
        let mesh = self.bound_mesh.ok_or(DeviceError::NoMeshBound)?;
        let available = *self.meshes.get(&mesh).ok_or(DeviceError::UnknownMesh(mesh))?;

        if vertex_count > available {
            return Err(DeviceError::DrawOutOfRange {
                requested: vertex_count,
                available,
            });
        }

        Ok(DrawState {
            program,
            mesh,
            texture: self.bound_texture,
        })
    }

    pub fn live_programs(&self) -> usize {
        self.programs.len()
    }

    pub fn live_meshes(&self) -> usize {
        self.meshes.len()
    }

    pub fn live_textures(&self) -> usize {
        self.textures.len()
    }
}
