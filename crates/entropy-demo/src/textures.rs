use anyhow::Result;
use entropy_engine::gfx::{GraphicsDevice, Texture};

/// Two-tone checkerboard, `cells x cells` squares of `cell` pixels each.
pub fn checkerboard(
    device: &mut dyn GraphicsDevice,
    cells: u32,
    cell: u32,
    a: [u8; 4],
    b: [u8; 4],
) -> Result<Texture> {
    let side = cells * cell;
    let mut rgba = Vec::with_capacity((side * side * 4) as usize);
    for y in 0..side {
        for x in 0..side {
            let even = ((x / cell) + (y / cell)) % 2 == 0;
            rgba.extend_from_slice(if even { &a } else { &b });
        }
    }
    Ok(Texture::from_rgba8(device, side, side, &rgba)?)
}

/// Vertical gradient from `top` to `bottom`, one pixel wide.
pub fn gradient(
    device: &mut dyn GraphicsDevice,
    height: u32,
    top: [u8; 4],
    bottom: [u8; 4],
) -> Result<Texture> {
    let mut rgba = Vec::with_capacity((height * 4) as usize);
    for y in 0..height {
        let t = y as f32 / (height.max(2) - 1) as f32;
        for (lo, hi) in top.iter().zip(bottom) {
            rgba.push((*lo as f32 + (hi as f32 - *lo as f32) * t).round() as u8);
        }
    }
    Ok(Texture::from_rgba8(device, 1, height, &rgba)?)
}
