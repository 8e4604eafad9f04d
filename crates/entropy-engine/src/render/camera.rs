use glam::{Mat4, UVec2};

/// Orthographic camera over pixel space.
///
/// Origin is the top-left corner, +Y points down. The projection maps
/// `[0, width] x [0, height]` onto NDC and is only recomputed by `resize`.
#[derive(Debug, Clone, PartialEq)]
pub struct Camera2D {
    projection: Mat4,
    viewport: UVec2,
}

impl Default for Camera2D {
    fn default() -> Self {
        Self::new()
    }
}

impl Camera2D {
    /// Camera with an identity projection. Call [`resize`](Self::resize)
    /// before the first frame.
    pub fn new() -> Self {
        Self {
            projection: Mat4::IDENTITY,
            viewport: UVec2::ZERO,
        }
    }

    pub fn with_viewport(width: u32, height: u32) -> Self {
        let mut camera = Self::new();
        camera.resize(width, height);
        camera
    }

    /// Recomputes the projection for a `width x height` pixel viewport.
    ///
    /// A zero dimension (minimized window) keeps the previous projection.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            log::debug!("camera resize to {width}x{height} ignored");
            return;
        }

        self.viewport = UVec2::new(width, height);
        self.projection =
            Mat4::orthographic_rh(0.0, width as f32, height as f32, 0.0, -1.0, 1.0);
    }

    #[inline]
    pub fn projection(&self) -> &Mat4 {
        &self.projection
    }

    /// Last accepted viewport size in pixels.
    #[inline]
    pub fn viewport(&self) -> UVec2 {
        self.viewport
    }
}
