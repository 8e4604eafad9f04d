//! Contract between the runtime loop and game code.

mod ctx;
mod game;

pub use ctx::FrameCtx;
pub use game::Game;
