//! Window + frame loop.
//!
//! Owns the `winit` event loop and the single game window, and wires them to
//! the GPU layer and the [`Game`](crate::core::Game) callbacks.

mod runtime;

pub use runtime::{Runtime, RuntimeConfig};
