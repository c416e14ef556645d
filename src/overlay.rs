//! Stats overlay drawn with egui on top of the field

use glam::Vec2;

use crate::{field::FrameStats, surface::Surface};

pub struct OverlayInfo {
    pub fps: f32,
    pub stats: FrameStats,
    pub surface: Option<Surface>,
}

pub struct Overlay {
    ctx: egui::Context,
    raw_input: egui::RawInput,

    renderer: egui_wgpu::Renderer,
    clipped_shapes: Vec<egui::ClippedPrimitive>,
    textures_delta: egui::TexturesDelta,
}

impl Overlay {
    pub fn new(device: &wgpu::Device, swapchain_format: wgpu::TextureFormat) -> Self {
        let renderer = egui_wgpu::Renderer::new(device, swapchain_format, None, 1);

        Self {
            ctx: egui::Context::default(),
            raw_input: egui::RawInput::default(),

            renderer,
            clipped_shapes: Vec::new(),
            textures_delta: egui::TexturesDelta::default(),
        }
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.raw_input.screen_rect = Some(egui::Rect::from_min_size(
            Default::default(),
            egui::Vec2::new(width as f32, height as f32),
        ));
    }

    /// Lays out the overlay for this frame, `None` hides it
    pub fn run(&mut self, info: Option<&OverlayInfo>, delta_time: f32) {
        self.raw_input.predicted_dt = delta_time;
        let raw_input = std::mem::take(&mut self.raw_input);
        self.ctx.begin_frame(raw_input);

        if let Some(info) = info {
            egui::Window::new("Particle Field")
                .default_width(160.0)
                .resizable(false)
                .show(&self.ctx, |ui| {
                    ui.label(format!("FPS {:.1}", info.fps));
                    ui.label(format!("Particles {}", info.stats.particles));
                    ui.label(format!("Links {}", info.stats.links));
                    if let Some(surface) = info.surface {
                        ui.label(format!("Size {}x{}", surface.width, surface.height));
                    }

                    ui.separator();
                    ui.label("[R] regenerate  [H] hide");
                });
        }

        let output = self.ctx.end_frame();
        self.clipped_shapes = self.ctx.tessellate(output.shapes, output.pixels_per_point);
        self.textures_delta = output.textures_delta;
    }

    pub fn pre_render(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
    ) {
        let screen_descriptor = self.screen_descriptor();
        self.renderer.update_buffers(
            device,
            queue,
            encoder,
            &self.clipped_shapes,
            &screen_descriptor,
        );

        for (id, delta) in &self.textures_delta.set {
            self.renderer.update_texture(device, queue, *id, delta);
        }

        for id in &self.textures_delta.free {
            self.renderer.free_texture(id);
        }
    }

    pub fn render<'a>(&'a mut self, rpass: &mut wgpu::RenderPass<'a>) {
        let screen_descriptor = self.screen_descriptor();
        self.renderer
            .render(rpass, &self.clipped_shapes, &screen_descriptor);
    }

    pub fn mouse_event(
        &mut self,
        position: Vec2,
        state: winit::event::ElementState,
        button: winit::event::MouseButton,
    ) {
        let pressed = matches!(state, winit::event::ElementState::Pressed);
        let button = match button {
            winit::event::MouseButton::Left => egui::PointerButton::Primary,
            winit::event::MouseButton::Right => egui::PointerButton::Secondary,
            winit::event::MouseButton::Middle => egui::PointerButton::Middle,
            _ => return,
        };

        self.raw_input.events.push(egui::Event::PointerButton {
            pos: egui::Pos2::new(position.x, position.y),
            button,
            pressed,
            modifiers: egui::Modifiers::default(),
        });
    }

    pub fn mouse_motion(&mut self, position: Vec2) {
        self.raw_input
            .events
            .push(egui::Event::PointerMoved(egui::Pos2::new(
                position.x, position.y,
            )));
    }

    fn screen_descriptor(&self) -> egui_wgpu::ScreenDescriptor {
        let screen_rect = self.ctx.screen_rect();
        egui_wgpu::ScreenDescriptor {
            size_in_pixels: [screen_rect.width() as u32, screen_rect.height() as u32],
            pixels_per_point: self.ctx.pixels_per_point(),
        }
    }
}
