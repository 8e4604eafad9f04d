/// One acquired swapchain image plus the encoder recording into it.
///
/// Hand it back to [`Gpu::present`](super::Gpu::present) promptly; holding
/// the surface texture blocks the next acquire.
pub struct GpuFrame {
    pub surface_texture: wgpu::SurfaceTexture,
    pub view: wgpu::TextureView,
    pub encoder: wgpu::CommandEncoder,
}

/// What the frame loop should do after a surface error.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum SurfaceErrorAction {
    /// Surface was reconfigured; try again next frame.
    Reconfigured,
    SkipFrame,
    /// Unrecoverable (out of memory). Shut down.
    Fatal,
}
