use crate::gfx::{DeviceError, GraphicsDevice, MeshId, QuadVertex};

/// Unit quad, ordered for a 4-vertex triangle strip.
pub const QUAD_VERTICES: [QuadVertex; 4] = [
    QuadVertex::new([0.0, 0.0], [0.0, 0.0]),
    QuadVertex::new([1.0, 0.0], [1.0, 0.0]),
    QuadVertex::new([0.0, 1.0], [0.0, 1.0]),
    QuadVertex::new([1.0, 1.0], [1.0, 1.0]),
];

/// The shared quad mesh every 2D draw goes through.
///
/// Created once at startup with [`QuadMesh::init`] and released once at
/// shutdown with [`QuadMesh::release`]. The vertex data never changes.
#[derive(Debug)]
pub struct QuadMesh {
    mesh: MeshId,
}

impl QuadMesh {
    pub const VERTEX_COUNT: u32 = QUAD_VERTICES.len() as u32;

    pub fn init(device: &mut dyn GraphicsDevice) -> Result<Self, DeviceError> {
        let mesh = device.create_mesh(&QUAD_VERTICES)?;
        log::debug!("quad mesh {mesh:?} initialized");
        Ok(Self { mesh })
    }

    #[inline]
    pub fn mesh(&self) -> MeshId {
        self.mesh
    }

    pub fn bind(&self, device: &mut dyn GraphicsDevice) -> Result<(), DeviceError> {
        device.bind_mesh(Some(self.mesh))
    }

    /// Draws the quad with whatever program, texture and uniforms are current.
    pub fn draw(&self, device: &mut dyn GraphicsDevice) -> Result<(), DeviceError> {
        device.draw_triangle_strip(Self::VERTEX_COUNT)
    }

    pub fn unbind(device: &mut dyn GraphicsDevice) -> Result<(), DeviceError> {
        device.bind_mesh(None)
    }

    pub fn release(self, device: &mut dyn GraphicsDevice) -> Result<(), DeviceError> {
        device.delete_mesh(self.mesh)?;
        log::debug!("quad mesh {:?} released", self.mesh);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::{GfxCall, RecordingDevice};

    #[test]
    fn vertex_layout_is_interleaved_16_bytes() {
        assert_eq!(std::mem::size_of::<QuadVertex>(), 16);
        assert_eq!(QuadVertex::layout().array_stride, 16);
    }

    #[test]
    fn init_uploads_strip_ordered_unit_quad() {
        let mut dev = RecordingDevice::new();
        let quad = QuadMesh::init(&mut dev).unwrap();

        match &dev.calls()[0] {
            GfxCall::CreateMesh { mesh, vertices } => {
                assert_eq!(*mesh, quad.mesh());
                assert_eq!(vertices.as_slice(), &QUAD_VERTICES);
            }
            other => panic!("unexpected call: {other:?}"),
        }
        assert_eq!(dev.live_meshes(), 1);
    }

    #[test]
    fn release_frees_the_mesh() {
        let mut dev = RecordingDevice::new();
        let quad = QuadMesh::init(&mut dev).unwrap();
        let mesh = quad.mesh();
        quad.release(&mut dev).unwrap();

        assert_eq!(dev.live_meshes(), 0);
        assert_eq!(dev.bind_mesh(Some(mesh)), Err(DeviceError::UnknownMesh(mesh)));
    }
}
