use glam::UVec2;

use crate::gfx::GraphicsDevice;
use crate::render::RenderCtx;

/// Context handed to [`Game`](super::Game) callbacks that touch the GPU.
pub struct FrameCtx<'a> {
    pub render: RenderCtx<'a>,
    /// Surface size in physical pixels.
    pub surface_size: UVec2,
    exit_requested: bool,
}

impl<'a> FrameCtx<'a> {
    pub fn new(render: RenderCtx<'a>, surface_size: UVec2) -> Self {
        Self {
            render,
            surface_size,
            exit_requested: false,
        }
    }

    #[inline]
    pub fn device(&mut self) -> &mut dyn GraphicsDevice {
        &mut *self.render.device
    }

    /// Asks the runtime to close the window after this callback.
    pub fn exit(&mut self) {
        self.exit_requested = true;
    }

    #[inline]
    pub fn exit_requested(&self) -> bool {
        self.exit_requested
    }
}
