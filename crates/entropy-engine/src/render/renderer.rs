use std::rc::Rc;

use crate::gfx::GraphicsDevice;

use super::{
    Batch, BatchItem, BatchKind, Camera2D, RenderCtx, RenderError, Shader2D, ShaderError,
    Sprite, SpriteBatch, UiBatch, UiElement,
};

/// One batch per drawable kind. Built once, never re-keyed.
#[derive(Debug)]
pub struct BatchTable {
    ui: UiBatch,
    sprite: SpriteBatch,
}

/// Item types with a slot in the [`BatchTable`].
pub trait TableEntry: BatchItem {
    fn batch(table: &BatchTable) -> &Batch<Self>;
    fn batch_mut(table: &mut BatchTable) -> &mut Batch<Self>;
}

impl TableEntry for Sprite {
    fn batch(table: &BatchTable) -> &Batch<Self> {
        &table.sprite
    }
    fn batch_mut(table: &mut BatchTable) -> &mut Batch<Self> {
        &mut table.sprite
    }
}

impl TableEntry for UiElement {
    fn batch(table: &BatchTable) -> &Batch<Self> {
        &table.ui
    }
    fn batch_mut(table: &mut BatchTable) -> &mut Batch<Self> {
        &mut table.ui
    }
}

/// Routes draw requests to the batch for their kind.
///
/// Owns the camera and one batch per kind. `render` takes `&mut self`, so
/// concurrent renders through the same coordinator are impossible.
#[derive(Debug)]
pub struct Renderer2D {
    camera: Camera2D,
    table: BatchTable,
}

impl Renderer2D {
    pub fn new(camera: Camera2D, ui_shader: Rc<Shader2D>, sprite_shader: Rc<Shader2D>) -> Self {
        Self {
            camera,
            table: BatchTable {
                ui: Batch::new(ui_shader),
                sprite: Batch::new(sprite_shader),
            },
        }
    }

    /// Draws `items` through the batch registered for `kind`.
    ///
    /// Items are submitted in iteration order between one `begin` and one
    /// `end`. `kind` must match the item type; a mismatch or
    /// [`BatchKind::Other`] is rejected before anything reaches the device.
    pub fn render<T, I>(
        &mut self,
        ctx: &mut RenderCtx<'_>,
        kind: BatchKind,
        items: I,
    ) -> Result<(), RenderError>
    where
        T: TableEntry,
        I: IntoIterator<Item = T>,
    {
        if kind == BatchKind::Other {
            return Err(RenderError::NoBatch(kind));
        }
        if kind != T::KIND {
            return Err(RenderError::KindMismatch {
                requested: kind,
                item: T::KIND,
            });
        }

        let batch = T::batch_mut(&mut self.table);
        batch.begin(ctx, &self.camera)?;
        for item in items {
            batch.submit(item);
        }
        batch.end(ctx)
    }

    pub fn batch<T: TableEntry>(&self) -> &Batch<T> {
        T::batch(&self.table)
    }

    pub fn batch_mut<T: TableEntry>(&mut self) -> &mut Batch<T> {
        T::batch_mut(&mut self.table)
    }

    #[inline]
    pub fn ui_batch(&self) -> &UiBatch {
        &self.table.ui
    }

    #[inline]
    pub fn sprite_batch(&self) -> &SpriteBatch {
        &self.table.sprite
    }

    pub fn set_persistent(&mut self, kind: BatchKind, persistent: bool) -> Result<(), RenderError> {
        match kind {
            BatchKind::UiElement => self.table.ui.set_persistent(persistent),
            BatchKind::Sprite => self.table.sprite.set_persistent(persistent),
            BatchKind::Other => return Err(RenderError::NoBatch(kind)),
        }
        Ok(())
    }

    pub fn clear(&mut self, kind: BatchKind) -> Result<(), RenderError> {
        match kind {
            BatchKind::UiElement => self.table.ui.clear(),
            BatchKind::Sprite => self.table.sprite.clear(),
            BatchKind::Other => return Err(RenderError::NoBatch(kind)),
        }
        Ok(())
    }

    #[inline]
    pub fn camera(&self) -> &Camera2D {
        &self.camera
    }

    /// Forwards a viewport change to the camera.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.camera.resize(width, height);
    }

    /// Drops the batches and deletes every shader no one else holds.
    pub fn release(self, device: &mut dyn GraphicsDevice) -> Result<(), ShaderError> {
        let BatchTable { ui, sprite } = self.table;
        for shader in [ui.into_shader(), sprite.into_shader()] {
            match Rc::try_unwrap(shader) {
                Ok(shader) => shader.cleanup(device)?,
                Err(_) => log::debug!("shader still shared; left to its other owner"),
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use glam::{Vec2, Vec4};

    use super::*;
    use crate::gfx::{GfxCall, RecordingDevice};
    use crate::render::test_support::Fixture;

    fn renderer(fx: &mut Fixture) -> (Renderer2D, Rc<Shader2D>, Rc<Shader2D>) {
        let ui = Rc::new(Shader2D::builtin(&mut fx.dev).unwrap());
        let sprite = Rc::new(Shader2D::builtin(&mut fx.dev).unwrap());
        let renderer = Renderer2D::new(
            Camera2D::with_viewport(800, 600),
            ui.clone(),
            sprite.clone(),
        );
        (renderer, ui, sprite)
    }

    fn sprite(fx: &Fixture, x: f32) -> Sprite {
        Sprite::textured(fx.texture, Vec2::new(x, 0.0), Vec2::ONE).unwrap()
    }

    #[test]
    fn sprites_go_through_sprite_shader_only() {
        let mut fx = Fixture::new();
        let (mut r, ui, sprite_shader) = renderer(&mut fx);
        fx.dev.take_calls();

        let items = [sprite(&fx, 1.0), sprite(&fx, 2.0), sprite(&fx, 3.0)];
        r.render(&mut fx.ctx(), BatchKind::Sprite, items).unwrap();

        assert_eq!(fx.dev.program_binds(sprite_shader.id()), 1);
        assert_eq!(fx.dev.program_binds(ui.id()), 0);
        assert!(fx.dev.calls_for(ui.id()).is_empty());

        let on_sprite = fx.dev.calls_for(sprite_shader.id());
        let projections = on_sprite
            .iter()
            .filter(|c| matches!(c, GfxCall::SetUniform { name, .. } if name == "projection"))
            .count();
        assert_eq!(projections, 1);

        let draws: Vec<f32> = fx
            .dev
            .draws()
            .iter()
            .map(|d| {
                assert_eq!(d.program, sprite_shader.id());
                d.model().unwrap().w_axis.x
            })
            .collect();
        assert_eq!(draws, vec![1.0, 2.0, 3.0]);
        assert_eq!(fx.dev.calls().last(), Some(&GfxCall::UseProgram(None)));
    }

    #[test]
    fn ui_layers_draw_low_to_high() {
        let mut fx = Fixture::new();
        let (mut r, ui, _) = renderer(&mut fx);

        let top = UiElement::new(fx.texture, Vec2::new(5.0, 0.0), Vec2::ONE, Vec4::ONE, 0.0, 5)
            .unwrap();
        let bottom = UiElement::new(fx.texture, Vec2::new(1.0, 0.0), Vec2::ONE, Vec4::ONE, 0.0, 1)
            .unwrap();
        r.render(&mut fx.ctx(), BatchKind::UiElement, [top, bottom]).unwrap();

        let xs: Vec<f32> = fx
            .dev
            .draws()
            .iter()
            .map(|d| {
                assert_eq!(d.program, ui.id());
                d.model().unwrap().w_axis.x
            })
            .collect();
        assert_eq!(xs, vec![1.0, 5.0]);
    }

    #[test]
    fn other_kind_is_rejected() {
        let mut fx = Fixture::new();
        let (mut r, _, _) = renderer(&mut fx);
        fx.dev.take_calls();

        let item = sprite(&fx, 0.0);
        let err = r.render(&mut fx.ctx(), BatchKind::Other, [item]).unwrap_err();
        assert_eq!(err, RenderError::NoBatch(BatchKind::Other));
        assert!(fx.dev.calls().is_empty());
        assert_eq!(
            r.set_persistent(BatchKind::Other, true),
            Err(RenderError::NoBatch(BatchKind::Other))
        );
    }

    #[test]
    fn kind_mismatch_is_rejected_without_device_calls() {
        let mut fx = Fixture::new();
        let (mut r, _, _) = renderer(&mut fx);
        fx.dev.take_calls();

        let item = sprite(&fx, 0.0);
        let err = r.render(&mut fx.ctx(), BatchKind::UiElement, [item]).unwrap_err();
        assert_eq!(
            err,
            RenderError::KindMismatch {
                requested: BatchKind::UiElement,
                item: BatchKind::Sprite,
            }
        );
        assert!(fx.dev.calls().is_empty());
        assert!(r.sprite_batch().is_empty());
    }

    #[test]
    fn persistent_sprites_survive_frames() {
        let mut fx = Fixture::new();
        let (mut r, _, _) = renderer(&mut fx);
        r.set_persistent(BatchKind::Sprite, true).unwrap();

        let background = sprite(&fx, 0.0).with_persistent(true);
        r.render(&mut fx.ctx(), BatchKind::Sprite, [background]).unwrap();
        fx.dev.take_calls();

        let transient = sprite(&fx, 9.0);
        r.render(&mut fx.ctx(), BatchKind::Sprite, [transient]).unwrap();
        assert_eq!(fx.dev.draws().len(), 2);
        assert_eq!(r.batch::<Sprite>().len(), 1);

        r.clear(BatchKind::Sprite).unwrap();
        assert!(r.batch::<Sprite>().is_empty());
    }

    #[test]
    fn resize_updates_owned_camera() {
        let mut fx = Fixture::new();
        let (mut r, _, _) = renderer(&mut fx);
        r.resize(400, 200);
        assert!((r.camera().projection().x_axis.x - 2.0 / 400.0).abs() < 1e-6);

        r.resize(0, 0);
        assert_eq!(r.camera().viewport(), glam::UVec2::new(400, 200));
    }

    #[test]
    fn release_deletes_unshared_shaders_once() {
        let mut dev = RecordingDevice::new();
        let shared = Rc::new(Shader2D::builtin(&mut dev).unwrap());
        let r = Renderer2D::new(Camera2D::new(), shared.clone(), shared);

        r.release(&mut dev).unwrap();
        assert_eq!(dev.live_programs(), 0);
        let deletes = dev
            .calls()
            .iter()
            .filter(|c| matches!(c, GfxCall::DeleteProgram(_)))
            .count();
        assert_eq!(deletes, 1);
    }
}
