//! Sample game for the entropy engine.
//!
//! Draws a persistent checkerboard background, a ring of spinning sprites and
//! a layered UI panel. Submission order of the UI pieces is scrambled on
//! purpose; layers decide what ends up on top.

mod game;
mod textures;

use entropy_engine::device::GpuConfig;
use entropy_engine::logging::{LoggingConfig, init_logging};
use entropy_engine::window::{Runtime, RuntimeConfig};

fn main() -> anyhow::Result<()> {
    init_logging(LoggingConfig::default());

    Runtime::run(
        RuntimeConfig::default(),
        GpuConfig::default(),
        game::DemoGame::default(),
    )
}
