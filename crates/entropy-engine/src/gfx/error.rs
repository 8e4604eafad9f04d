use std::fmt;

use super::{MeshId, ProgramId, ShaderStage, TextureId, UniformKind, UniformLocation};

/// Errors reported by a [`GraphicsDevice`](super::GraphicsDevice).
#[derive(Debug, Clone, PartialEq)]
pub enum DeviceError {
    /// A shader stage failed to parse or validate. `log` is the compiler output.
    Compile { stage: ShaderStage, log: String },
    /// The stages compiled but could not be linked into one program.
    Link(String),
    UnknownProgram(ProgramId),
    UnknownMesh(MeshId),
    UnknownTexture(TextureId),
    NoProgramBound,
    NoMeshBound,
    /// The location belongs to a program other than the one currently bound.
    LocationMismatch { location: UniformLocation, bound: ProgramId },
    UniformType { expected: UniformKind, found: UniformKind },
    /// A draw asked for more vertices than the bound mesh holds.
    DrawOutOfRange { requested: u32, available: u32 },
    EmptyMesh,
    InvalidTextureData { width: u32, height: u32, len: usize },
}

impl fmt::Display for DeviceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceError::Compile { stage, log } => {
                write!(f, "could not compile {stage} shader:\n{log}")
            }
            DeviceError::Link(log) => write!(f, "could not link shader program: {log}"),
            DeviceError::UnknownProgram(id) => write!(f, "unknown program {id:?}"),
            DeviceError::UnknownMesh(id) => write!(f, "unknown mesh {id:?}"),
            DeviceError::UnknownTexture(id) => write!(f, "unknown texture {id:?}"),
            DeviceError::NoProgramBound => f.write_str("no program bound"),
            DeviceError::NoMeshBound => f.write_str("no mesh bound"),
            DeviceError::LocationMismatch { location, bound } => write!(
                f,
                "uniform location belongs to {:?} but {bound:?} is bound",
                location.program
            ),
            DeviceError::UniformType { expected, found } => {
                write!(f, "uniform expects {expected:?}, got {found:?}")
            }
            DeviceError::DrawOutOfRange { requested, available } => write!(
                f,
                "draw of {requested} vertices exceeds bound mesh ({available} vertices)"
            ),
            DeviceError::EmptyMesh => f.write_str("mesh has no vertices"),
            DeviceError::InvalidTextureData { width, height, len } => write!(
                f,
                "texture {width}x{height} needs {} bytes of RGBA8, got {len}",
                (*width as usize) * (*height as usize) * 4
            ),
        }
    }
}

impl std::error::Error for DeviceError {}
