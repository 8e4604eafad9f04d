use std::rc::Rc;

use anyhow::{Context, Result};
use glam::{Vec2, Vec4};

use entropy_engine::core::{FrameCtx, Game};
use entropy_engine::gfx::Texture;
use entropy_engine::render::{BatchKind, Camera2D, Renderer2D, Shader2D, Sprite, UiElement};
use entropy_engine::time::FrameTime;

use crate::textures;

const TILE: f32 = 64.0;
const RING_SPRITES: usize = 8;

struct Resources {
    renderer: Renderer2D,
    checker: Texture,
    panel: Texture,
    white: Texture,
}

#[derive(Default)]
pub struct DemoGame {
    res: Option<Resources>,
    /// Degrees.
    spin: f32,
    elapsed: f32,
    viewport: Vec2,
    /// Background tiles are submitted once and kept by the persistent batch.
    background_dirty: bool,
}

impl DemoGame {
    fn background(&self, checker: Texture) -> Result<Vec<Sprite>> {
        let cols = (self.viewport.x / TILE).ceil() as u32;
        let rows = (self.viewport.y / TILE).ceil() as u32;
        let mut tiles = Vec::with_capacity((cols * rows) as usize);
        for row in 0..rows {
            for col in 0..cols {
                let pos = Vec2::new(col as f32, row as f32) * TILE;
                let tile = Sprite::new(checker, pos, Vec2::splat(TILE), Vec4::splat(0.35), 0.0)?;
                tiles.push(tile.with_persistent(true));
            }
        }
        Ok(tiles)
    }

    fn ring(&self, white: Texture) -> Result<Vec<Sprite>> {
        let center = self.viewport * 0.5;
        let radius = self.viewport.min_element() * 0.3;
        let size = Vec2::splat(48.0);

        (0..RING_SPRITES)
            .map(|i| -> Result<Sprite> {
                let angle = (i as f32 / RING_SPRITES as f32) * std::f32::consts::TAU
                    + self.elapsed * 0.5;
                let pos = center + Vec2::new(angle.cos(), angle.sin()) * radius - size * 0.5;
                let hue = i as f32 / RING_SPRITES as f32;
                let color = Vec4::new(hue, 1.0 - hue, 0.6, 1.0);
                Ok(Sprite::new(white, pos, size, color, self.spin)?)
            })
            .collect()
    }

    fn ui(&self, panel: Texture, white: Texture) -> Result<Vec<UiElement>> {
        let pulse = 0.75 + 0.25 * (self.elapsed * 3.0).sin();
        // Deliberately out of layer order.
        Ok(vec![
            UiElement::new(
                white,
                Vec2::new(36.0, 36.0),
                Vec2::new(168.0, 28.0),
                Vec4::new(0.95, 0.75, 0.2, pulse),
                0.0,
                2,
            )?,
            UiElement::new(
                panel,
                Vec2::new(16.0, 16.0),
                Vec2::new(208.0, 120.0),
                Vec4::ONE,
                0.0,
                0,
            )?,
            UiElement::new(
                white,
                Vec2::new(28.0, 28.0),
                Vec2::new(184.0, 44.0),
                Vec4::new(0.1, 0.1, 0.15, 0.85),
                0.0,
                1,
            )?,
        ])
    }
}

impl Game for DemoGame {
    fn window_title(&self) -> String {
        "Entropy Demo".to_owned()
    }

    fn clear_color(&self) -> Vec4 {
        Vec4::new(0.05, 0.05, 0.08, 1.0)
    }

    fn init(&mut self, ctx: &mut FrameCtx<'_>) -> Result<()> {
        let device = ctx.device();
        let shader = Rc::new(Shader2D::builtin(device).context("builtin shader")?);

        let checker = textures::checkerboard(device, 2, 8, [200, 200, 210, 255], [90, 90, 110, 255])?;
        let panel = textures::gradient(device, 64, [60, 70, 110, 255], [20, 20, 40, 255])?;
        let white = Texture::solid(device, [255, 255, 255, 255])?;

        let size = ctx.surface_size;
        let mut renderer = Renderer2D::new(
            Camera2D::with_viewport(size.x, size.y),
            shader.clone(),
            shader,
        );
        renderer.set_persistent(BatchKind::Sprite, true)?;

        self.viewport = size.as_vec2();
        self.background_dirty = true;
        self.res = Some(Resources {
            renderer,
            checker,
            panel,
            white,
        });
        log::info!("demo initialized at {}x{}", size.x, size.y);
        Ok(())
    }

    fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.viewport = Vec2::new(width as f32, height as f32);
        if let Some(res) = self.res.as_mut() {
            res.renderer.resize(width, height);
            // Retile the background for the new size.
            if let Err(e) = res.renderer.clear(BatchKind::Sprite) {
                log::warn!("{e}");
            }
            self.background_dirty = true;
        }
    }

    fn update(&mut self, time: FrameTime) {
        self.elapsed += time.dt;
        self.spin = (self.spin + 90.0 * time.dt) % 360.0;
    }

    fn render(&mut self, ctx: &mut FrameCtx<'_>) -> Result<()> {
        let Some(res) = self.res.as_ref() else {
            return Ok(());
        };
        let (checker, panel, white) = (res.checker, res.panel, res.white);

        let mut sprites = if self.background_dirty {
            self.background(checker)?
        } else {
            Vec::new()
        };
        sprites.extend(self.ring(white)?);
        let ui = self.ui(panel, white)?;

        let Some(res) = self.res.as_mut() else {
            return Ok(());
        };
        res.renderer.render(&mut ctx.render, BatchKind::Sprite, sprites)?;
        res.renderer.render(&mut ctx.render, BatchKind::UiElement, ui)?;
        self.background_dirty = false;
        Ok(())
    }

    fn shutdown(&mut self, ctx: &mut FrameCtx<'_>) {
        let Some(res) = self.res.take() else {
            return;
        };
        let device = ctx.device();
        if let Err(e) = res.renderer.release(device) {
            log::warn!("failed to release shaders: {e}");
        }
        for texture in [res.checker, res.panel, res.white] {
            if let Err(e) = texture.release(device) {
                log::warn!("failed to release texture: {e}");
            }
        }
        log::info!("demo shut down");
    }
}
