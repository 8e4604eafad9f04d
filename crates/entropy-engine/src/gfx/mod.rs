//! Graphics device seam.
//!
//! The render core never touches wgpu directly. It drives a small bind/draw
//! state machine through [`GraphicsDevice`]:
//! - programs are built from WGSL vertex + fragment source and expose uniforms by name
//! - one mesh, one program and one texture are "current" at a time
//! - `draw_triangle_strip` consumes whatever is currently bound
//!
//! Implementations:
//! - [`WgpuDevice`] records draws and replays them into a wgpu render pass
//! - `RecordingDevice` (tests / `mock` feature) records calls for assertions

mod error;
mod state;
mod texture;
mod uniform_arena;
mod vertex;

pub mod wgsl;
pub mod wgpu_device;

#[cfg(any(test, feature = "mock"))]
pub mod recording;

use glam::{Mat4, Vec4};

pub use error::DeviceError;
pub use texture::Texture;
pub use vertex::QuadVertex;
pub use wgpu_device::WgpuDevice;
pub use wgsl::{ShaderStage, UniformKind};

#[cfg(any(test, feature = "mock"))]
pub use recording::{DrawCall, GfxCall, RecordingDevice};

/// Linked shader program handle.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct ProgramId(pub(crate) u32);

/// Vertex mesh handle.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct MeshId(pub(crate) u32);

/// Texture handle.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct TextureId(pub(crate) u32);

/// Resolved uniform location.
///
/// Locations are only valid for the program that resolved them.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct UniformLocation {
    pub(crate) program: ProgramId,
    pub(crate) slot: u32,
}

impl UniformLocation {
    #[inline]
    pub fn program(self) -> ProgramId {
        self.program
    }
}

/// A value stored in a uniform slot.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum UniformValue {
    Mat4(Mat4),
    Vec4(Vec4),
}

impl UniformValue {
    #[inline]
    pub fn kind(&self) -> UniformKind {
        match self {
            UniformValue::Mat4(_) => UniformKind::Mat4,
            UniformValue::Vec4(_) => UniformKind::Vec4,
        }
    }

    pub(crate) fn zeroed(kind: UniformKind) -> Self {
        match kind {
            UniformKind::Mat4 => UniformValue::Mat4(Mat4::ZERO),
            UniformKind::Vec4 => UniformValue::Vec4(Vec4::ZERO),
        }
    }

    /// Raw bytes as laid out in a WGSL uniform (column-major for matrices).
    pub(crate) fn bytes(&self) -> &[u8] {
        match self {
            UniformValue::Mat4(m) => bytemuck::bytes_of(m),
            UniformValue::Vec4(v) => bytemuck::bytes_of(v),
        }
    }
}

/// Opaque graphics device used by the render core.
///
/// Every call must happen on the thread that owns the graphics context.
/// Calls that need bound state fail with a [`DeviceError`] instead of
/// silently doing nothing.
pub trait GraphicsDevice {
    /// Compiles both stages and links them into a program.
    fn create_program(
        &mut self,
        vertex_src: &str,
        fragment_src: &str,
    ) -> Result<ProgramId, DeviceError>;

    /// Resolves a uniform declared by `program`.
    fn uniform_location(&self, program: ProgramId, name: &str) -> Option<UniformLocation>;

    /// Makes `program` current (`None` unbinds).
    fn use_program(&mut self, program: Option<ProgramId>) -> Result<(), DeviceError>;

    fn delete_program(&mut self, program: ProgramId) -> Result<(), DeviceError>;

    /// Uploads a 4x4 matrix to the current program.
    fn set_uniform_mat4(&mut self, location: UniformLocation, value: &Mat4)
        -> Result<(), DeviceError>;

    /// Uploads a 4-component vector to the current program.
    fn set_uniform_vec4(&mut self, location: UniformLocation, value: Vec4)
        -> Result<(), DeviceError>;

    /// Uploads static vertex data.
    fn create_mesh(&mut self, vertices: &[QuadVertex]) -> Result<MeshId, DeviceError>;

    fn bind_mesh(&mut self, mesh: Option<MeshId>) -> Result<(), DeviceError>;

    fn delete_mesh(&mut self, mesh: MeshId) -> Result<(), DeviceError>;

    /// Draws `vertex_count` vertices of the bound mesh as a triangle strip.
    fn draw_triangle_strip(&mut self, vertex_count: u32) -> Result<(), DeviceError>;

    /// Uploads tightly packed RGBA8 pixels.
    fn create_texture(
        &mut self,
        width: u32,
        height: u32,
        rgba: &[u8],
    ) -> Result<TextureId, DeviceError>;

    fn bind_texture(&mut self, texture: Option<TextureId>) -> Result<(), DeviceError>;

    fn delete_texture(&mut self, texture: TextureId) -> Result<(), DeviceError>;
}
