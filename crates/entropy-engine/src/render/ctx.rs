use crate::gfx::GraphicsDevice;

use super::QuadMesh;

/// Renderer-facing context: the device plus the shared quad.
///
/// Built once per frame by the runtime (or by a test around a
/// `RecordingDevice`) and handed to every batch flush.
pub struct RenderCtx<'a> {
    pub device: &'a mut dyn GraphicsDevice,
    pub quad: &'a QuadMesh,
}

impl<'a> RenderCtx<'a> {
    #[inline]
    pub fn new(device: &'a mut dyn GraphicsDevice, quad: &'a QuadMesh) -> Self {
        Self { device, quad }
    }
}
