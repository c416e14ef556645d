mod cli;
mod config;
mod field;
mod framepace;
mod gpu;
mod overlay;
mod particle;
mod pointer;
mod render;
mod scheduler;
mod surface;

use std::sync::Arc;

use clap::Parser;
use glam::Vec2;
use log::{error, info, warn};
use rand::{rngs::StdRng, SeedableRng};
use winit::{
    application::ApplicationHandler,
    event::{ElementState, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

use crate::{
    config::FieldConfig,
    field::ParticleField,
    framepace::Framepacer,
    gpu::GpuContext,
    overlay::{Overlay, OverlayInfo},
    pointer::PointerState,
    render::{FrameCanvas, RenderModule},
    scheduler::WindowScheduler,
    surface::Rgba,
};

fn main() -> anyhow::Result<()> {
    env_logger::builder()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    // Collect Arguments
    let args = cli::Args::parse();
    let config = FieldConfig::from_args(&args);
    let rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    // Setup Winit
    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Wait);

    // State
    let mut app_state = AppState {
        tokio_rt: tokio::runtime::Runtime::new()?,
        gfx: None,

        field: ParticleField::new(config, rng),
        scheduler: WindowScheduler::default(),
        pointer: PointerState::default(),
        framepace: Framepacer::new(args.framerate),

        show_overlay: !args.hide_overlay,
    };

    event_loop.run_app(&mut app_state)?;
    Ok(())
}

struct GfxState {
    window: Arc<Window>,
    gpu: GpuContext<'static>,

    render_module: RenderModule,
    overlay: Overlay,
    canvas: FrameCanvas,
}

impl GfxState {
    fn new(
        event_loop: &ActiveEventLoop,
        tokio_rt: &tokio::runtime::Runtime,
        max_particles: usize,
    ) -> anyhow::Result<Self> {
        let window = Arc::new(
            event_loop.create_window(Window::default_attributes().with_title("Particle Field"))?,
        );
        let window_size = window.inner_size();

        let gpu = tokio_rt.block_on(GpuContext::new(window.clone()))?;

        let render_module = RenderModule::new(&gpu.device, gpu.format(), max_particles);
        render_module.update_size(&gpu.queue, window_size.width, window_size.height);

        let mut overlay = Overlay::new(&gpu.device, gpu.format());
        overlay.resize(window_size.width, window_size.height);

        Ok(Self {
            window,
            gpu,

            render_module,
            overlay,
            canvas: FrameCanvas::default(),
        })
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.gpu.resize(width, height);
        self.render_module
            .update_size(&self.gpu.queue, width, height);
        self.overlay.resize(width, height);
    }

    fn present(
        &mut self,
        info: Option<&OverlayInfo>,
        background: Rgba,
        frametime: f32,
    ) -> anyhow::Result<()> {
        let frame = match self.gpu.surface.get_current_texture() {
            Ok(frame) => frame,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                warn!("Surface lost or outdated, reconfiguring");
                self.gpu.reconfigure_surface();
                return Ok(());
            }
            Err(err) => return Err(err.into()),
        };

        self.render_module
            .upload(&self.gpu.device, &self.gpu.queue, &self.canvas);
        self.overlay.run(info, frametime);

        let mut encoder = self
            .gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor { label: None });
        self.overlay
            .pre_render(&self.gpu.device, &self.gpu.queue, &mut encoder);

        // Render
        {
            let view = frame
                .texture
                .create_view(&wgpu::TextureViewDescriptor::default());

            let mut rpass = self.render_module.begin_pass(
                &mut encoder,
                &view,
                wgpu::Color {
                    r: background.r as f64,
                    g: background.g as f64,
                    b: background.b as f64,
                    a: background.a as f64,
                },
            );

            self.overlay.render(&mut rpass);
        }

        self.gpu.queue.submit(Some(encoder.finish()));
        frame.present();
        Ok(())
    }
}

struct AppState {
    tokio_rt: tokio::runtime::Runtime,
    gfx: Option<GfxState>,

    field: ParticleField<StdRng>,
    scheduler: WindowScheduler,
    pointer: PointerState,
    framepace: Framepacer,

    show_overlay: bool,
}

impl AppState {
    fn redraw(&mut self) {
        let Some(handle) = self.scheduler.take_due() else {
            return;
        };

        // A minimized window has nothing to draw into
        let drawable = self.field.surface().is_some_and(|surface| !surface.is_empty());
        let ctx = self
            .gfx
            .as_mut()
            .filter(|_| drawable)
            .map(|gfx| &mut gfx.canvas);

        let Some(stats) = self
            .field
            .on_frame(handle, ctx, &self.pointer, &mut self.scheduler)
        else {
            self.framepace.end_frame();
            return;
        };

        if let Some(gfx) = &mut self.gfx {
            let info = self.show_overlay.then(|| OverlayInfo {
                fps: self.framepace.framerate(),
                stats,
                surface: self.field.surface(),
            });

            if let Err(err) = gfx.present(
                info.as_ref(),
                self.field.config().background,
                self.framepace.frametime(),
            ) {
                error!("Failed to present frame: {:#}", err);
            }
        }

        self.framepace.end_frame();
    }

    /// Parks frame requests while the surface has no area, resuming once it does
    fn sync_scheduler_hold(&mut self) {
        match self.field.surface() {
            Some(surface) if surface.is_empty() => self.scheduler.hold(),
            _ => self.scheduler.release(),
        }
    }

    fn teardown(&mut self) {
        self.field.unmount(&mut self.scheduler);
        self.scheduler.detach();
        self.gfx = None;
    }
}

impl ApplicationHandler for AppState {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.gfx.is_some() && self.field.is_mounted() {
            return;
        }

        let gfx = match GfxState::new(
            event_loop,
            &self.tokio_rt,
            self.field.config().particle_count,
        ) {
            Ok(gfx) => gfx,
            Err(err) => {
                error!("Failed to set up graphics: {:#}", err);
                event_loop.exit();
                return;
            }
        };

        let size = gfx.window.inner_size();
        self.scheduler.attach(gfx.window.clone());
        self.field.mount(size.width, size.height, &mut self.scheduler);
        self.gfx = Some(gfx);
        self.sync_scheduler_hold();
    }

    fn suspended(&mut self, _event_loop: &ActiveEventLoop) {
        info!("Suspended, releasing the surface");
        self.teardown();
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => {
                self.teardown();
                event_loop.exit();
            }

            WindowEvent::Resized(new_size) => {
                if let Some(gfx) = &mut self.gfx {
                    gfx.resize(new_size.width, new_size.height);
                }
                self.field.resize(new_size.width, new_size.height);
                self.sync_scheduler_hold();
            }

            WindowEvent::CursorMoved { position, .. } => {
                let position = Vec2::new(position.x as f32, position.y as f32);
                self.pointer.move_to(position);

                if let Some(gfx) = &mut self.gfx {
                    gfx.overlay.mouse_motion(position);
                }
            }

            WindowEvent::MouseInput { state, button, .. } => {
                if let Some(gfx) = &mut self.gfx {
                    gfx.overlay
                        .mouse_event(self.pointer.position(), state, button);
                }
            }

            WindowEvent::KeyboardInput { event, .. } if event.state == ElementState::Pressed => {
                match event.physical_key {
                    PhysicalKey::Code(KeyCode::Escape) => {
                        self.teardown();
                        event_loop.exit();
                    }
                    PhysicalKey::Code(KeyCode::KeyR) => self.field.regenerate(),
                    PhysicalKey::Code(KeyCode::KeyH) => self.show_overlay = !self.show_overlay,
                    PhysicalKey::Code(KeyCode::F11) => {
                        if let Some(gfx) = &self.gfx {
                            if gfx.window.fullscreen().is_none() {
                                gfx.window
                                    .set_fullscreen(Some(winit::window::Fullscreen::Borderless(None)));
                            } else {
                                gfx.window.set_fullscreen(None);
                            }
                        }
                    }
                    _ => (),
                }
            }

            WindowEvent::RedrawRequested => self.redraw(),

            _ => (),
        }
    }
}
