//! 2D rendering core.
//!
//! Drawables are collected into per-kind batches and drawn as textured
//! quads through a [`GraphicsDevice`](crate::gfx::GraphicsDevice).
//!
//! Convention:
//! - geometry is in pixels, top-left origin, +Y down
//! - [`Camera2D`] maps pixels to NDC; each drawable supplies its own model matrix
//! - every draw binds the shared [`QuadMesh`] and one texture

mod batch;
mod camera;
mod ctx;
mod drawable;
mod error;
mod quad;
mod renderer;
mod shader;
mod shader_2d;

pub use batch::{Batch, BatchItem, BatchKind, BatchState, SpriteBatch, UiBatch};
pub use camera::Camera2D;
pub use ctx::RenderCtx;
pub use drawable::{Drawable, Layered, Sprite, UiElement};
pub use error::{DrawableError, RenderError, ShaderError};
pub use quad::{QUAD_VERTICES, QuadMesh};
pub use renderer::{BatchTable, Renderer2D, TableEntry};
pub use shader::ShaderProgram;
pub use shader_2d::Shader2D;

#[cfg(test)]
pub(crate) mod test_support {
    use std::rc::Rc;

    use crate::gfx::{RecordingDevice, Texture};

    use super::{QuadMesh, RenderCtx, Shader2D};

    /// Recording device with the quad, the builtin shader and a white texture.
    pub struct Fixture {
        pub dev: RecordingDevice,
        pub quad: QuadMesh,
        pub shader: Rc<Shader2D>,
        pub texture: Texture,
    }

    impl Fixture {
        pub fn new() -> Self {
            let mut dev = RecordingDevice::new();
            let quad = QuadMesh::init(&mut dev).unwrap();
            let shader = Rc::new(Shader2D::builtin(&mut dev).unwrap());
            let texture = Texture::solid(&mut dev, [255, 255, 255, 255]).unwrap();
            dev.take_calls();
            Self {
                dev,
                quad,
                shader,
                texture,
            }
        }

        pub fn ctx(&mut self) -> RenderCtx<'_> {
            RenderCtx::new(&mut self.dev, &self.quad)
        }
    }
}
