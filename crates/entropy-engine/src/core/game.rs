use glam::Vec4;

use crate::time::FrameTime;

use super::FrameCtx;

/// What a game plugs into [`Runtime`](crate::window::Runtime).
///
/// Per frame the runtime calls `update` then `render`, then presents.
pub trait Game {
    fn window_title(&self) -> String {
        "Entropy Game".to_owned()
    }

    /// Color the surface is cleared to before the game draws.
    fn clear_color(&self) -> Vec4 {
        Vec4::new(0.0, 0.0, 0.0, 1.0)
    }

    /// Runs once after the GPU and quad mesh exist. Create shaders,
    /// textures and renderers here.
    fn init(&mut self, ctx: &mut FrameCtx<'_>) -> anyhow::Result<()>;

    /// Surface size changed (physical pixels, may be 0 while minimized).
    fn resize(&mut self, width: u32, height: u32) {
        let _ = (width, height);
    }

    fn update(&mut self, time: FrameTime);

    fn render(&mut self, ctx: &mut FrameCtx<'_>) -> anyhow::Result<()>;

    /// Release GPU resources created in `init`. The quad mesh is released
    /// by the runtime afterwards.
    fn shutdown(&mut self, ctx: &mut FrameCtx<'_>) {
        let _ = ctx;
    }
}

#[cfg(test)]
mod tests {
    use glam::UVec2;

    use super::*;
    use crate::render::test_support::Fixture;

    struct Blank;

    impl Game for Blank {
        fn init(&mut self, _ctx: &mut FrameCtx<'_>) -> anyhow::Result<()> {
            Ok(())
        }
        fn update(&mut self, _time: FrameTime) {}
        fn render(&mut self, ctx: &mut FrameCtx<'_>) -> anyhow::Result<()> {
            ctx.exit();
            Ok(())
        }
    }

    #[test]
    fn defaults_match_engine_conventions() {
        let game = Blank;
        assert_eq!(game.window_title(), "Entropy Game");
        assert_eq!(game.clear_color(), Vec4::new(0.0, 0.0, 0.0, 1.0));
    }

    #[test]
    fn render_can_request_exit() {
        let mut fx = Fixture::new();
        let mut ctx = FrameCtx::new(fx.ctx(), UVec2::new(800, 600));
        assert!(!ctx.exit_requested());

        Blank.render(&mut ctx).unwrap();
        assert!(ctx.exit_requested());
    }
}
