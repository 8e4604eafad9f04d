//! Drawable values fed to the batches.
//!
//! Geometry, color and texture are fixed at construction. Only the
//! persistence flag (and the layer of UI elements) may change afterwards.

use glam::{Mat4, Vec2, Vec4};

use crate::gfx::Texture;

use super::DrawableError;

/// Anything a 2D batch can draw as one textured quad.
pub trait Drawable {
    fn texture(&self) -> Texture;

    /// Top-left corner in pixels.
    fn position(&self) -> Vec2;

    /// Width and height in pixels.
    fn size(&self) -> Vec2;

    /// RGBA multiplier applied to the texture.
    fn color(&self) -> Vec4;

    /// Rotation in degrees around the quad origin.
    fn rotation(&self) -> f32;

    /// Persistent items survive the end of a flush.
    fn is_persistent(&self) -> bool;

    fn set_persistent(&mut self, persistent: bool);

    /// `T(position) * S(size) * R_z(rotation)`.
    fn model_matrix(&self) -> Mat4 {
        Mat4::from_translation(self.position().extend(0.0))
            * Mat4::from_scale(self.size().extend(1.0))
            * Mat4::from_rotation_z(self.rotation().to_radians())
    }
}

/// Drawables with an explicit paint layer (lower layers draw first).
pub trait Layered {
    fn layer(&self) -> i32;
    fn set_layer(&mut self, layer: i32);
}

/// Shared immutable quad description.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Quad {
    texture: Texture,
    position: Vec2,
    size: Vec2,
    color: Vec4,
    rotation: f32,
}

impl Quad {
    fn new(
        texture: Texture,
        position: Vec2,
        size: Vec2,
        color: Vec4,
        rotation: f32,
    ) -> Result<Self, DrawableError> {
        if !position.is_finite() {
            return Err(DrawableError::NonFinite("position"));
        }
        if !size.is_finite() {
            return Err(DrawableError::NonFinite("size"));
        }
        if !color.is_finite() {
            return Err(DrawableError::NonFinite("color"));
        }
        if !rotation.is_finite() {
            return Err(DrawableError::NonFinite("rotation"));
        }
        if size.x < 0.0 || size.y < 0.0 {
            return Err(DrawableError::NegativeSize {
                width: size.x,
                height: size.y,
            });
        }
        Ok(Self {
            texture,
            position,
            size,
            color,
            rotation,
        })
    }
}

/// A world-space quad. Sprites draw in submission order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sprite {
    quad: Quad,
    persistent: bool,
}

impl Sprite {
    pub fn new(
        texture: Texture,
        position: Vec2,
        size: Vec2,
        color: Vec4,
        rotation: f32,
    ) -> Result<Self, DrawableError> {
        Ok(Self {
            quad: Quad::new(texture, position, size, color, rotation)?,
            persistent: false,
        })
    }

    /// Untinted, unrotated sprite.
    pub fn textured(texture: Texture, position: Vec2, size: Vec2) -> Result<Self, DrawableError> {
        Self::new(texture, position, size, Vec4::ONE, 0.0)
    }

    #[must_use]
    pub fn with_persistent(mut self, persistent: bool) -> Self {
        self.persistent = persistent;
        self
    }
}

impl Drawable for Sprite {
    fn texture(&self) -> Texture {
        self.quad.texture
    }
    fn position(&self) -> Vec2 {
        self.quad.position
    }
    fn size(&self) -> Vec2 {
        self.quad.size
    }
    fn color(&self) -> Vec4 {
        self.quad.color
    }
    fn rotation(&self) -> f32 {
        self.quad.rotation
    }
    fn is_persistent(&self) -> bool {
        self.persistent
    }
    fn set_persistent(&mut self, persistent: bool) {
        self.persistent = persistent;
    }
}

/// A screen-space quad with a layer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UiElement {
    quad: Quad,
    layer: i32,
    persistent: bool,
}

impl UiElement {
    pub fn new(
        texture: Texture,
        position: Vec2,
        size: Vec2,
        color: Vec4,
        rotation: f32,
        layer: i32,
    ) -> Result<Self, DrawableError> {
        Ok(Self {
            quad: Quad::new(texture, position, size, color, rotation)?,
            layer,
            persistent: false,
        })
    }

    #[must_use]
    pub fn with_persistent(mut self, persistent: bool) -> Self {
        self.persistent = persistent;
        self
    }
}

impl Drawable for UiElement {
    fn texture(&self) -> Texture {
        self.quad.texture
    }
    fn position(&self) -> Vec2 {
        self.quad.position
    }
    fn size(&self) -> Vec2 {
        self.quad.size
    }
    fn color(&self) -> Vec4 {
        self.quad.color
    }
    fn rotation(&self) -> f32 {
        self.quad.rotation
    }
    fn is_persistent(&self) -> bool {
        self.persistent
    }
    fn set_persistent(&mut self, persistent: bool) {
        self.persistent = persistent;
    }
}

impl Layered for UiElement {
    fn layer(&self) -> i32 {
        self.layer
    }
    fn set_layer(&mut self, layer: i32) {
        self.layer = layer;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::RecordingDevice;

    fn texture() -> Texture {
        let mut dev = RecordingDevice::new();
        Texture::solid(&mut dev, [255, 255, 255, 255]).unwrap()
    }

    #[test]
    fn model_matrix_is_translate_scale_rotate() {
        let sprite = Sprite::new(
            texture(),
            Vec2::new(10.0, 20.0),
            Vec2::new(30.0, 40.0),
            Vec4::ONE,
            90.0,
        )
        .unwrap();
        let m = sprite.model_matrix();

        // Quad origin lands on the position.
        let origin = m * Vec4::new(0.0, 0.0, 0.0, 1.0);
        assert!((origin.truncate().truncate() - Vec2::new(10.0, 20.0)).length() < 1e-4);

        // Rotation is applied before scaling: local +X turns into +Y, then
        // is scaled by the height.
        let x = m * Vec4::new(1.0, 0.0, 0.0, 1.0);
        assert!((x.truncate().truncate() - Vec2::new(10.0, 60.0)).length() < 1e-4);
    }

    #[test]
    fn unrotated_unit_quad_covers_position_and_size() {
        let sprite = Sprite::textured(texture(), Vec2::new(5.0, 5.0), Vec2::new(2.0, 3.0)).unwrap();
        let far = sprite.model_matrix() * Vec4::new(1.0, 1.0, 0.0, 1.0);
        assert!((far.truncate().truncate() - Vec2::new(7.0, 8.0)).length() < 1e-5);
    }

    #[test]
    fn non_finite_fields_are_rejected() {
        let tex = texture();
        assert_eq!(
            Sprite::new(tex, Vec2::new(f32::NAN, 0.0), Vec2::ONE, Vec4::ONE, 0.0),
            Err(DrawableError::NonFinite("position"))
        );
        assert_eq!(
            UiElement::new(tex, Vec2::ZERO, Vec2::ONE, Vec4::ONE, f32::INFINITY, 0),
            Err(DrawableError::NonFinite("rotation"))
        );
    }

    #[test]
    fn negative_size_is_rejected() {
        let err = Sprite::textured(texture(), Vec2::ZERO, Vec2::new(-1.0, 4.0)).unwrap_err();
        assert_eq!(err, DrawableError::NegativeSize { width: -1.0, height: 4.0 });
    }

    #[test]
    fn only_persistence_and_layer_are_mutable() {
        let mut el = UiElement::new(texture(), Vec2::ZERO, Vec2::ONE, Vec4::ONE, 0.0, 3).unwrap();
        assert!(!el.is_persistent());

        el.set_persistent(true);
        el.set_layer(-2);
        assert!(el.is_persistent());
        assert_eq!(el.layer(), -2);
    }
}
