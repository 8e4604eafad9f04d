use std::fmt;

use crate::gfx::DeviceError;

use super::BatchKind;

/// Shader construction / uniform errors.
#[derive(Debug, Clone, PartialEq)]
pub enum ShaderError {
    /// Compilation or linking failed; carries the device diagnostic.
    Build(DeviceError),
    /// `create_uniform` named a uniform the linked program does not declare.
    MissingUniform(String),
    /// A setter used a name that was never registered with `create_uniform`.
    UnknownUniform(String),
    Device(DeviceError),
}

impl fmt::Display for ShaderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderError::Build(e) => write!(f, "shader build failed: {e}"),
            ShaderError::MissingUniform(name) => write!(f, "could not find uniform: {name}"),
            ShaderError::UnknownUniform(name) => {
                write!(f, "uniform `{name}` was not registered with create_uniform")
            }
            ShaderError::Device(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for ShaderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ShaderError::Build(e) | ShaderError::Device(e) => Some(e),
            _ => None,
        }
    }
}

impl From<DeviceError> for ShaderError {
    fn from(e: DeviceError) -> Self {
        ShaderError::Device(e)
    }
}

/// Errors from batch / coordinator calls.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderError {
    /// No batch is registered for this kind.
    NoBatch(BatchKind),
    /// The submitted item type belongs to a different batch kind.
    KindMismatch { requested: BatchKind, item: BatchKind },
    Shader(ShaderError),
    Device(DeviceError),
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderError::NoBatch(kind) => write!(f, "no batch registered for {kind}"),
            RenderError::KindMismatch { requested, item } => {
                write!(f, "cannot render {item} items through the {requested} batch")
            }
            RenderError::Shader(e) => write!(f, "{e}"),
            RenderError::Device(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for RenderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RenderError::Shader(e) => Some(e),
            RenderError::Device(e) => Some(e),
            _ => None,
        }
    }
}

impl From<DeviceError> for RenderError {
    fn from(e: DeviceError) -> Self {
        RenderError::Device(e)
    }
}

impl From<ShaderError> for RenderError {
    fn from(e: ShaderError) -> Self {
        match e {
            ShaderError::Device(e) => RenderError::Device(e),
            other => RenderError::Shader(other),
        }
    }
}

/// Rejected drawable construction arguments.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawableError {
    /// The named field contains NaN or infinity.
    NonFinite(&'static str),
    /// Width or height is below zero.
    NegativeSize { width: f32, height: f32 },
}

impl fmt::Display for DrawableError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DrawableError::NonFinite(field) => write!(f, "{field} must be finite"),
            DrawableError::NegativeSize { width, height } => {
                write!(f, "size must not be negative (got {width}x{height})")
            }
        }
    }
}

impl std::error::Error for DrawableError {}
