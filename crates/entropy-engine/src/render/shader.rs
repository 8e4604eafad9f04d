use std::collections::HashMap;

use glam::{Mat4, Vec4};

use crate::gfx::{GraphicsDevice, ProgramId, UniformLocation};

use super::ShaderError;

/// A linked vertex + fragment program with a name → location table.
///
/// Uniforms are registered once with [`create_uniform`](Self::create_uniform)
/// right after construction; the setters only look names up.
#[derive(Debug)]
pub struct ShaderProgram {
    id: ProgramId,
    uniforms: HashMap<String, UniformLocation>,
}

impl ShaderProgram {
    /// Compiles and links both stages.
    ///
    /// On failure no program is left behind and the error carries the
    /// compiler / linker output.
    pub fn new(
        device: &mut dyn GraphicsDevice,
        vertex_src: &str,
        fragment_src: &str,
    ) -> Result<Self, ShaderError> {
        let id = device
            .create_program(vertex_src, fragment_src)
            .map_err(ShaderError::Build)?;
        log::debug!("shader program {id:?} linked");
        Ok(Self {
            id,
            uniforms: HashMap::new(),
        })
    }

    #[inline]
    pub fn id(&self) -> ProgramId {
        self.id
    }

    /// Resolves `name` and caches its location.
    pub fn create_uniform(
        &mut self,
        device: &dyn GraphicsDevice,
        name: &str,
    ) -> Result<UniformLocation, ShaderError> {
        let location = device
            .uniform_location(self.id, name)
            .ok_or_else(|| ShaderError::MissingUniform(name.to_owned()))?;
        self.uniforms.insert(name.to_owned(), location);
        Ok(location)
    }

    pub fn location(&self, name: &str) -> Result<UniformLocation, ShaderError> {
        self.uniforms
            .get(name)
            .copied()
            .ok_or_else(|| ShaderError::UnknownUniform(name.to_owned()))
    }

    pub fn set_uniform_mat4(
        &self,
        device: &mut dyn GraphicsDevice,
        name: &str,
        value: &Mat4,
    ) -> Result<(), ShaderError> {
        let location = self.location(name)?;
        device.set_uniform_mat4(location, value)?;
        Ok(())
    }

    pub fn set_uniform_vec4(
        &self,
        device: &mut dyn GraphicsDevice,
        name: &str,
        value: Vec4,
    ) -> Result<(), ShaderError> {
        let location = self.location(name)?;
        device.set_uniform_vec4(location, value)?;
        Ok(())
    }

    pub fn bind(&self, device: &mut dyn GraphicsDevice) -> Result<(), ShaderError> {
        device.use_program(Some(self.id))?;
        Ok(())
    }

    pub fn unbind(device: &mut dyn GraphicsDevice) -> Result<(), ShaderError> {
        device.use_program(None)?;
        Ok(())
    }

    /// Unbinds and deletes the program.
    pub fn cleanup(self, device: &mut dyn GraphicsDevice) -> Result<(), ShaderError> {
        Self::unbind(device)?;
        device.delete_program(self.id)?;
        log::debug!("shader program {:?} deleted", self.id);
        Ok(())
    }
}
