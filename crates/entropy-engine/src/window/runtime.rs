use anyhow::{Context, Result};
use glam::{UVec2, Vec4};
use ouroboros::self_referencing;

use winit::application::ApplicationHandler;
use winit::dpi::{LogicalSize, PhysicalSize};
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};

use crate::core::{FrameCtx, Game};
use crate::device::{Gpu, GpuConfig, SurfaceErrorAction};
use crate::gfx::WgpuDevice;
use crate::render::{QuadMesh, RenderCtx};
use crate::time::FrameClock;

/// Window configuration. The title comes from [`Game::window_title`].
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub initial_size: LogicalSize<f64>,
    pub resizable: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            initial_size: LogicalSize::new(800.0, 600.0),
            resizable: true,
        }
    }
}

/// Single-window frame driver.
pub struct Runtime;

impl Runtime {
    /// Opens the window and drives `game` until the window closes.
    ///
    /// Each redraw runs `update`, `render`, then encodes the recorded draws and
    /// presents. Blocks until the event loop exits.
    pub fn run<G>(config: RuntimeConfig, gpu_config: GpuConfig, game: G) -> Result<()>
    where
        G: Game + 'static,
    {
        let event_loop = EventLoop::new().context("failed to create winit EventLoop")?;
        let mut state = AppState::new(config, gpu_config, game);

        event_loop
            .run_app(&mut state)
            .context("winit event loop terminated with error")?;

        match state.failure.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[self_referencing]
struct WindowEntry {
    window: Window,

    #[borrows(window)]
    #[covariant]
    gpu: Gpu<'this>,
}

/// GPU-side state that does not borrow the window.
struct Graphics {
    device: WgpuDevice,
    quad: QuadMesh,
    clock: FrameClock,
}

struct AppState<G: Game> {
    config: RuntimeConfig,
    gpu_config: GpuConfig,
    game: G,

    window: Option<WindowEntry>,
    graphics: Option<Graphics>,

    failure: Option<anyhow::Error>,
    exit_requested: bool,
}

impl<G: Game> AppState<G> {
    fn new(config: RuntimeConfig, gpu_config: GpuConfig, game: G) -> Self {
        Self {
            config,
            gpu_config,
            game,
            window: None,
            graphics: None,
            failure: None,
            exit_requested: false,
        }
    }

    fn fail(&mut self, err: anyhow::Error) {
        log::error!("{err:#}");
        self.failure.get_or_insert(err);
        self.exit_requested = true;
    }

    fn start(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let attrs = Window::default_attributes()
            .with_title(self.game.window_title())
            .with_inner_size(self.config.initial_size)
            .with_resizable(self.config.resizable);

        let window = event_loop
            .create_window(attrs)
            .context("failed to create window")?;

        let gpu_config = self.gpu_config.clone();
        let entry = WindowEntryTryBuilder {
            window,
            gpu_builder: |w| pollster::block_on(Gpu::new(w, gpu_config)),
        }
        .try_build()
        .context("GPU initialization failed")?;

        let (mut device, size) = entry.with_gpu(|gpu| {
            let device = WgpuDevice::new(
                gpu.device().clone(),
                gpu.queue().clone(),
                gpu.surface_format(),
            );
            (device, gpu.size())
        });

        let quad = QuadMesh::init(&mut device).context("failed to create quad mesh")?;

        {
            let mut ctx = FrameCtx::new(RenderCtx::new(&mut device, &quad), surface_size(size));
            self.game.init(&mut ctx).context("game init failed")?;
            if ctx.exit_requested() {
                self.exit_requested = true;
            }
        }
        self.game.resize(size.width, size.height);

        entry.with_window(|w| w.request_redraw());
        self.window = Some(entry);
        self.graphics = Some(Graphics {
            device,
            quad,
            clock: FrameClock::new(),
        });
        Ok(())
    }

    fn resize(&mut self, new_size: PhysicalSize<u32>) {
        let Some(entry) = self.window.as_mut() else {
            return;
        };
        entry.with_gpu_mut(|gpu| gpu.resize(new_size));
        entry.with_window(|w| w.request_redraw());
        self.game.resize(new_size.width, new_size.height);
    }

    fn redraw(&mut self) -> Result<()> {
        let (Some(entry), Some(gfx)) = (self.window.as_mut(), self.graphics.as_mut()) else {
            return Ok(());
        };
        let game = &mut self.game;

        let time = gfx.clock.tick();
        game.update(time);

        let clear = to_wgpu_color(game.clear_color());
        let mut exit = false;

        let outcome = entry.with_mut(|fields| -> Result<()> {
            let size = fields.gpu.size();
            if size.width == 0 || size.height == 0 {
                return Ok(());
            }

            let mut frame = match fields.gpu.begin_frame() {
                Ok(frame) => frame,
                Err(err) => {
                    log::debug!("surface error: {err}");
                    return match fields.gpu.handle_surface_error(err) {
                        SurfaceErrorAction::Fatal => Err(anyhow::anyhow!("surface out of memory")),
                        SurfaceErrorAction::Reconfigured | SurfaceErrorAction::SkipFrame => Ok(()),
                    };
                }
            };

            {
                let mut ctx =
                    FrameCtx::new(RenderCtx::new(&mut gfx.device, &gfx.quad), surface_size(size));
                game.render(&mut ctx).context("game render failed")?;
                exit = ctx.exit_requested();
            }

            gfx.device.encode(&mut frame.encoder, &frame.view, Some(clear));
            fields.window.pre_present_notify();
            fields.gpu.present(frame);
            Ok(())
        });

        if exit {
            self.exit_requested = true;
        }
        outcome
    }

    /// Runs game shutdown and releases the quad. Safe to call more than once.
    fn teardown(&mut self) {
        let Some(Graphics {
            mut device, quad, ..
        }) = self.graphics.take()
        else {
            return;
        };
        let size = self
            .window
            .as_ref()
            .map(|entry| entry.with_gpu(|gpu| gpu.size()))
            .unwrap_or_default();

        {
            let mut ctx = FrameCtx::new(RenderCtx::new(&mut device, &quad), surface_size(size));
            self.game.shutdown(&mut ctx);
        }
        if let Err(e) = quad.release(&mut device) {
            log::warn!("failed to release quad mesh: {e}");
        }

        drop(device);
        self.window = None;
        log::debug!("runtime shut down");
    }
}

impl<G: Game + 'static> ApplicationHandler for AppState<G> {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        if let Err(e) = self.start(event_loop) {
            self.fail(e);
            event_loop.exit();
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.exit_requested {
            self.teardown();
            event_loop.exit();
            return;
        }

        event_loop.set_control_flow(ControlFlow::Wait);

        // Continuous redraw: one frame per loop iteration.
        if let Some(entry) = self.window.as_ref() {
            entry.with_window(|w| w.request_redraw());
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                self.exit_requested = true;
            }

            WindowEvent::Resized(new_size) => self.resize(new_size),

            WindowEvent::ScaleFactorChanged { .. } => {
                if let Some(size) = self
                    .window
                    .as_ref()
                    .map(|entry| entry.with_window(|w| w.inner_size()))
                {
                    self.resize(size);
                }
            }

            WindowEvent::RedrawRequested => {
                if let Err(e) = self.redraw() {
                    self.fail(e);
                }
            }

            _ => {}
        }

        if self.exit_requested {
            self.teardown();
            event_loop.exit();
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        self.teardown();
    }
}

fn surface_size(size: PhysicalSize<u32>) -> UVec2 {
    UVec2::new(size.width, size.height)
}

fn to_wgpu_color(c: Vec4) -> wgpu::Color {
    wgpu::Color {
        r: c.x as f64,
        g: c.y as f64,
        b: c.z as f64,
        a: c.w as f64,
    }
}
