/// Surface and device settings for [`Gpu`](super::Gpu).
#[derive(Debug, Clone)]
pub struct GpuConfig {
    /// Pick an sRGB surface format when one is offered.
    pub prefer_srgb: bool,

    /// `true` presents with FIFO, `false` with the lowest-latency mode the
    /// surface supports.
    pub vsync: bool,

    /// Falls back to the first supported mode when unavailable.
    pub alpha_mode: Option<wgpu::CompositeAlphaMode>,

    pub required_features: wgpu::Features,
    pub required_limits: wgpu::Limits,

    /// Hint only; backends may ignore it.
    pub desired_maximum_frame_latency: u32,
}

impl Default for GpuConfig {
    fn default() -> Self {
        Self {
            prefer_srgb: true,
            vsync: true,
            alpha_mode: None,
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits::default(),
            desired_maximum_frame_latency: 2,
        }
    }
}
