use std::fmt;
use std::rc::Rc;

use crate::gfx::Texture;

use super::{
    Camera2D, Drawable, Layered, QuadMesh, RenderCtx, RenderError, Shader2D, Sprite, UiElement,
};

/// Which batch a draw request is routed to.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum BatchKind {
    UiElement,
    Sprite,
    /// Reserved. No batch handles it.
    Other,
}

impl fmt::Display for BatchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BatchKind::UiElement => "ui-element",
            BatchKind::Sprite => "sprite",
            BatchKind::Other => "other",
        })
    }
}

/// A drawable type that belongs to exactly one batch kind.
pub trait BatchItem: Drawable + Sized {
    const KIND: BatchKind;

    /// Puts items into paint order right before a flush. Default: submission order.
    fn sort_for_draw(_items: &mut [Self]) {}
}

impl BatchItem for Sprite {
    const KIND: BatchKind = BatchKind::Sprite;
}

impl BatchItem for UiElement {
    const KIND: BatchKind = BatchKind::UiElement;

    /// Stable: equal layers keep submission order.
    fn sort_for_draw(items: &mut [Self]) {
        items.sort_by_key(|item| item.layer());
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum BatchState {
    Idle,
    /// Between `begin` and `end`.
    Accumulating,
    Flushing,
}

/// Collects drawables of one kind and draws them with one shader.
///
/// Lifecycle per frame: [`begin`](Self::begin) → [`submit`](Self::submit)* →
/// [`end`](Self::end). A non-persistent batch starts each frame empty and
/// keeps only items flagged persistent after a flush. A persistent batch
/// keeps accumulating until [`clear`](Self::clear).
#[derive(Debug)]
pub struct Batch<T: BatchItem> {
    shader: Rc<Shader2D>,
    items: Vec<T>,
    persistent: bool,
    state: BatchState,
}

pub type SpriteBatch = Batch<Sprite>;
pub type UiBatch = Batch<UiElement>;

impl<T: BatchItem> Batch<T> {
    pub fn new(shader: Rc<Shader2D>) -> Self {
        Self {
            shader,
            items: Vec::new(),
            persistent: false,
            state: BatchState::Idle,
        }
    }

    #[inline]
    pub fn kind(&self) -> BatchKind {
        T::KIND
    }

    #[inline]
    pub fn shader(&self) -> &Rc<Shader2D> {
        &self.shader
    }

    /// Binds the shader and uploads the camera projection.
    pub fn begin(&mut self, ctx: &mut RenderCtx<'_>, camera: &Camera2D) -> Result<(), RenderError> {
        self.shader.bind(ctx.device)?;
        self.shader.set_projection(ctx.device, camera.projection())?;

        if !self.persistent {
            self.items.clear();
        }
        self.state = BatchState::Accumulating;
        Ok(())
    }

    pub fn submit(&mut self, item: T) {
        if self.state != BatchState::Accumulating {
            log::trace!("{} batch: submit outside begin/end", T::KIND);
        }
        self.items.push(item);
    }

    /// Flushes, then unbinds the shader. The shader is unbound even when the
    /// flush fails; the flush error wins.
    pub fn end(&mut self, ctx: &mut RenderCtx<'_>) -> Result<(), RenderError> {
        let flushed = self.flush(ctx);
        self.state = BatchState::Idle;
        let unbound = Shader2D::unbind(ctx.device);
        flushed?;
        unbound?;
        Ok(())
    }

    /// Draws every item with the bound shader, then drops non-persistent items.
    ///
    /// The quad is bound once for the whole batch. Each item's texture is
    /// bound for its own draw and unbound right after it. If a draw fails,
    /// the texture and quad are unbound and non-persistent items are still
    /// dropped before the error is returned.
    pub fn flush(&mut self, ctx: &mut RenderCtx<'_>) -> Result<(), RenderError> {
        self.state = BatchState::Flushing;
        T::sort_for_draw(&mut self.items);
        log::trace!("{} batch: flushing {} items", T::KIND, self.items.len());

        let drawn = self.draw_items(ctx);
        if let Err(e) = &drawn {
            log::debug!("{} batch: flush failed: {e}", T::KIND);
            if let Err(e) = Texture::unbind(ctx.device).and_then(|_| QuadMesh::unbind(ctx.device)) {
                log::debug!("{} batch: unbind after failed flush: {e}", T::KIND);
            }
        }

        self.items.retain(Drawable::is_persistent);
        drawn
    }

    fn draw_items(&self, ctx: &mut RenderCtx<'_>) -> Result<(), RenderError> {
        ctx.quad.bind(ctx.device)?;
        for item in &self.items {
            self.shader.set_model(ctx.device, &item.model_matrix())?;
            self.shader.set_color(ctx.device, item.color())?;

            item.texture().bind(ctx.device)?;
            ctx.quad.draw(ctx.device)?;
            Texture::unbind(ctx.device)?;
        }
        QuadMesh::unbind(ctx.device)?;
        Ok(())
    }

    /// Drops every item, persistent or not.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn set_persistent(&mut self, persistent: bool) {
        self.persistent = persistent;
    }

    #[inline]
    pub fn is_persistent(&self) -> bool {
        self.persistent
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Items currently held, in submission order (or paint order after a flush).
    #[inline]
    pub fn items(&self) -> &[T] {
        &self.items
    }

    #[inline]
    pub fn items_mut(&mut self) -> &mut [T] {
        &mut self.items
    }

    #[inline]
    pub fn state(&self) -> BatchState {
        self.state
    }

    pub(crate) fn into_shader(self) -> Rc<Shader2D> {
        self.shader
    }
}
