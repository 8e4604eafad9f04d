use super::{DeviceError, GraphicsDevice, TextureId};

/// A GPU texture handle plus its dimensions.
///
/// Drawables copy this handle; the texture itself is owned by whoever
/// created it and must be released once with [`Texture::release`].
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct Texture {
    id: TextureId,
    width: u32,
    height: u32,
}

impl Texture {
    /// Uploads tightly packed RGBA8 pixels (`width * height * 4` bytes).
    pub fn from_rgba8(
        device: &mut dyn GraphicsDevice,
        width: u32,
        height: u32,
        rgba: &[u8],
    ) -> Result<Self, DeviceError> {
        let id = device.create_texture(width, height, rgba)?;
        log::debug!("texture {id:?} created ({width}x{height})");
        Ok(Self { id, width, height })
    }

    /// 1x1 texture of a single color. Handy for flat-colored quads.
    pub fn solid(device: &mut dyn GraphicsDevice, rgba: [u8; 4]) -> Result<Self, DeviceError> {
        Self::from_rgba8(device, 1, 1, &rgba)
    }

    #[inline]
    pub fn id(&self) -> TextureId {
        self.id
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn bind(&self, device: &mut dyn GraphicsDevice) -> Result<(), DeviceError> {
        device.bind_texture(Some(self.id))
    }

    pub fn unbind(device: &mut dyn GraphicsDevice) -> Result<(), DeviceError> {
        device.bind_texture(None)
    }

    /// Frees the GPU texture. Copies of this handle become invalid.
    pub fn release(self, device: &mut dyn GraphicsDevice) -> Result<(), DeviceError> {
        device.delete_texture(self.id)?;
        log::debug!("texture {:?} released", self.id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::{GfxCall, RecordingDevice};

    #[test]
    fn solid_texture_is_one_pixel() {
        let mut dev = RecordingDevice::new();
        let tex = Texture::solid(&mut dev, [10, 20, 30, 255]).unwrap();
        assert_eq!((tex.width(), tex.height()), (1, 1));
        assert_eq!(dev.live_textures(), 1);
    }

    #[test]
    fn mismatched_pixel_data_creates_nothing() {
        let mut dev = RecordingDevice::new();
        let err = Texture::from_rgba8(&mut dev, 4, 4, &[0; 60]).unwrap_err();
        assert_eq!(err, DeviceError::InvalidTextureData { width: 4, height: 4, len: 60 });
        assert!(dev.calls().is_empty());
    }

    #[test]
    fn bind_unbind_release() {
        let mut dev = RecordingDevice::new();
        let tex = Texture::from_rgba8(&mut dev, 2, 1, &[255; 8]).unwrap();
        tex.bind(&mut dev).unwrap();
        Texture::unbind(&mut dev).unwrap();
        tex.release(&mut dev).unwrap();

        assert_eq!(
            &dev.calls()[1..],
            &[
                GfxCall::BindTexture(Some(tex.id())),
                GfxCall::BindTexture(None),
                GfxCall::DeleteTexture(tex.id()),
            ]
        );
        assert_eq!(tex.bind(&mut dev), Err(DeviceError::UnknownTexture(tex.id())));
    }
}
