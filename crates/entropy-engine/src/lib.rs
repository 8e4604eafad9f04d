//! Entropy engine crate.
//!
//! A small 2D rendering core (batches, shaders, camera, quad) on top of a
//! graphics device seam, plus the wgpu/winit runtime that drives a [`Game`].

pub mod core;
pub mod device;
pub mod gfx;
pub mod logging;
pub mod render;
pub mod time;
pub mod window;

pub use crate::core::{FrameCtx, Game};
