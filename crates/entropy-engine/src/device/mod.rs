//! GPU device + surface management.
//!
//! Creates the wgpu instance/adapter/device/queue for one window, keeps the
//! surface configured across resizes and hands out frames to render into.

mod config;
mod frame;
mod gpu;
mod surface;

pub use config::GpuConfig;
pub use frame::{GpuFrame, SurfaceErrorAction};
pub use gpu::Gpu;
