//! The particle backdrop simulator
//!
//! A fixed set of particles drifts across the surface, gets nudged by the
//! pointer and wraps around the edges. Nearby pairs are joined by lines
//! that fade out with distance, and a soft glow follows the pointer.
//! Frames are driven by an injected [`FrameScheduler`], each one
//! rescheduling the next until unmounted.

use log::{debug, info, trace};
use rand::Rng;

use crate::{
    config::FieldConfig,
    particle::{generate_particles, Particle},
    pointer::PointerState,
    scheduler::{FrameHandle, FrameScheduler},
    surface::{DrawingContext, Surface},
};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub particles: usize,
    pub links: usize,
}

pub struct ParticleField<R> {
    config: FieldConfig,
    rng: R,

    /// `None` while unmounted
    surface: Option<Surface>,
    particles: Vec<Particle>,
    pending_frame: Option<FrameHandle>,
}

impl<R: Rng> ParticleField<R> {
    pub fn new(config: FieldConfig, rng: R) -> Self {
        Self {
            config,
            rng,
            surface: None,
            particles: Vec::new(),
            pending_frame: None,
        }
    }

    pub fn config(&self) -> &FieldConfig {
        &self.config
    }

    #[cfg(test)]
    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn surface(&self) -> Option<Surface> {
        self.surface
    }

    pub fn is_mounted(&self) -> bool {
        self.surface.is_some()
    }

    pub fn mount<S: FrameScheduler + ?Sized>(
        &mut self,
        width: u32,
        height: u32,
        scheduler: &mut S,
    ) {
        info!("Mounting particle field on a {}x{} surface", width, height);
        self.surface = Some(Surface::new(width, height));
        self.regenerate();

        if self.pending_frame.is_none() {
            self.pending_frame = Some(scheduler.request_frame());
        }
    }

    /// Adopts the new size and replaces every particle
    pub fn resize(&mut self, width: u32, height: u32) {
        let Some(surface) = &mut self.surface else {
            debug!("Ignoring resize to {}x{} while unmounted", width, height);
            return;
        };

        *surface = Surface::new(width, height);
        debug!("Surface resized to {}x{}", width, height);
        self.regenerate();
    }

    pub fn regenerate(&mut self) {
        let Some(surface) = self.surface else {
            return;
        };

        self.particles = generate_particles(&mut self.rng, surface.extent(), &self.config);
        debug!("Generated {} particles", self.particles.len());
    }

    /// Cancels the pending frame and drops the surface
    pub fn unmount<S: FrameScheduler + ?Sized>(&mut self, scheduler: &mut S) {
        if let Some(handle) = self.pending_frame.take() {
            scheduler.cancel_frame(handle);
        }

        if self.surface.take().is_some() {
            info!("Unmounted particle field");
        }
        self.particles.clear();
    }

    /// Runs a frame delivered by the scheduler
    ///
    /// Frames that were cancelled or superseded are ignored. Once unmounted
    /// nothing is drawn or rescheduled. Without a drawing context the frame
    /// is skipped and retried on the next refresh.
    pub fn on_frame<C, S>(
        &mut self,
        handle: FrameHandle,
        ctx: Option<&mut C>,
        pointer: &PointerState,
        scheduler: &mut S,
    ) -> Option<FrameStats>
    where
        C: DrawingContext + ?Sized,
        S: FrameScheduler + ?Sized,
    {
        if self.pending_frame != Some(handle) {
            trace!("Dropping stale frame {:?}", handle);
            return None;
        }
        self.pending_frame = None;

        if self.surface.is_none() {
            return None;
        }

        let stats = match ctx {
            Some(ctx) => Some(self.step(ctx, pointer)),
            None => {
                debug!("Drawing context unavailable, retrying next frame");
                None
            }
        };

        self.pending_frame = Some(scheduler.request_frame());
        stats
    }

    pub fn step<C: DrawingContext + ?Sized>(
        &mut self,
        ctx: &mut C,
        pointer: &PointerState,
    ) -> FrameStats {
        let Some(surface) = self.surface else {
            return FrameStats::default();
        };
        let bounds = surface.extent();

        ctx.clear_rect(0.0, 0.0, bounds.x, bounds.y);

        for particle in &mut self.particles {
            particle.advance(pointer.position(), &self.config, bounds);
        }

        for particle in &self.particles {
            ctx.fill_circle(particle.position, particle.size, self.config.particle_color);
        }

        let links = self.draw_links(ctx);

        ctx.fill_radial(
            pointer.position(),
            self.config.glow_radius,
            self.config.glow_color,
            self.config.glow_fade_end,
        );

        let stats = FrameStats {
            particles: self.particles.len(),
            links,
        };
        trace!("{:?}", stats);
        stats
    }

    // Every pair is checked, the particle count is small enough for O(n^2)
    fn draw_links<C: DrawingContext + ?Sized>(&self, ctx: &mut C) -> usize {
        let link_distance = self.config.link_distance;
        let base = self.config.link_color;
        let mut links = 0;

        for (i, a) in self.particles.iter().enumerate() {
            for b in &self.particles[i + 1..] {
                let distance = a.position.distance(b.position);
                if distance < link_distance {
                    let alpha = link_opacity(distance, link_distance, base.a);
                    ctx.stroke_line(a.position, b.position, base.with_alpha(alpha));
                    links += 1;
                }
            }
        }

        links
    }

    #[cfg(test)]
    fn set_particles(&mut self, particles: Vec<Particle>) {
        self.particles = particles;
    }
}

/// Opacity of a link, fading linearly to zero at `link_distance`
pub fn link_opacity(distance: f32, link_distance: f32, base_alpha: f32) -> f32 {
    base_alpha * (1.0 - distance / link_distance)
}

#[cfg(test)]
mod tests {
    use glam::Vec2;
    use rand::{rngs::StdRng, SeedableRng};

    use super::*;
    use crate::{scheduler::testing::ManualScheduler, surface::testing::RecordingContext};

    fn particle_at(x: f32, y: f32) -> Particle {
        Particle {
            position: Vec2::new(x, y),
            velocity: Vec2::ZERO,
            size: 1.0,
        }
    }

    fn field() -> ParticleField<StdRng> {
        ParticleField::new(FieldConfig::default(), StdRng::seed_from_u64(42))
    }

    fn far_pointer() -> PointerState {
        let mut pointer = PointerState::default();
        pointer.move_to(Vec2::new(-10_000.0, -10_000.0));
        pointer
    }

    /// Delivers every due frame to the field, like one display refresh
    fn refresh(
        field: &mut ParticleField<StdRng>,
        scheduler: &mut ManualScheduler,
        ctx: &mut RecordingContext,
        pointer: &PointerState,
    ) -> Option<FrameStats> {
        let mut last = None;
        for handle in scheduler.tick() {
            last = field.on_frame(handle, Some(&mut *ctx), pointer, scheduler).or(last);
        }
        last
    }

    #[test]
    fn mount_generates_fifty_particles_and_schedules_once() {
        let mut field = field();
        let mut scheduler = ManualScheduler::default();
        field.mount(800, 600, &mut scheduler);

        assert_eq!(field.particles().len(), 50);
        assert_eq!(scheduler.pending.len(), 1);
    }

    #[test]
    fn particles_stay_inside_surface_after_many_steps() {
        let mut field = field();
        let mut scheduler = ManualScheduler::default();
        let mut ctx = RecordingContext::default();
        let mut pointer = PointerState::default();
        field.mount(320, 240, &mut scheduler);

        for i in 0..2_000 {
            pointer.move_to(Vec2::new((i * 7 % 320) as f32, (i * 13 % 240) as f32));
            refresh(&mut field, &mut scheduler, &mut ctx, &pointer);

            for p in field.particles() {
                assert!(p.position.x >= 0.0 && p.position.x < 320.0, "{:?}", p);
                assert!(p.position.y >= 0.0 && p.position.y < 240.0, "{:?}", p);
            }
        }
    }

    #[test]
    fn each_frame_schedules_exactly_one_successor() {
        let mut field = field();
        let mut scheduler = ManualScheduler::default();
        let mut ctx = RecordingContext::default();
        field.mount(200, 200, &mut scheduler);

        for _ in 0..10 {
            refresh(&mut field, &mut scheduler, &mut ctx, &far_pointer());
            assert_eq!(scheduler.pending.len(), 1);
        }
        assert_eq!(ctx.clears, 10);
    }

    #[test]
    fn step_clears_then_draws_every_particle() {
        let mut field = field();
        let mut scheduler = ManualScheduler::default();
        let mut ctx = RecordingContext::default();
        field.mount(800, 600, &mut scheduler);

        let stats = field.step(&mut ctx, &far_pointer());

        assert_eq!(ctx.clears, 1);
        assert_eq!(ctx.circles.len(), 50);
        assert_eq!(stats.particles, 50);
        assert_eq!(stats.links, ctx.lines.len());
        assert!(ctx.circles.iter().all(|(_, r, _)| (1.0..3.0).contains(r)));
    }

    #[test]
    fn far_particles_move_by_velocity_only() {
        let mut field = field();
        let mut scheduler = ManualScheduler::default();
        field.mount(1000, 1000, &mut scheduler);
        field.set_particles(vec![Particle {
            position: Vec2::new(500.0, 500.0),
            velocity: Vec2::new(0.75, -0.5),
            size: 2.0,
        }]);

        let mut pointer = PointerState::default();
        pointer.move_to(Vec2::new(500.0, 700.0));
        field.step(&mut RecordingContext::default(), &pointer);

        assert_eq!(field.particles()[0].position, Vec2::new(500.75, 499.5));
    }

    #[test]
    fn pointer_in_range_nudges_particle() {
        let mut field = field();
        let mut scheduler = ManualScheduler::default();
        field.mount(400, 400, &mut scheduler);
        field.set_particles(vec![particle_at(50.0, 50.0)]);

        let mut pointer = PointerState::default();
        pointer.move_to(Vec2::new(50.0, 60.0));
        field.step(&mut RecordingContext::default(), &pointer);

        let position = field.particles()[0].position;
        assert_eq!(position.x, 50.0);
        assert!((position.y - 49.7).abs() < 1e-4);
    }

    #[test]
    fn link_opacity_falls_off_linearly() {
        assert!((link_opacity(50.0, 100.0, 0.3) - 0.15).abs() < 1e-6);
        assert!((link_opacity(0.0, 100.0, 0.3) - 0.3).abs() < 1e-6);
        assert!(link_opacity(99.9, 100.0, 0.3) > 0.0);
    }

    #[test]
    fn particles_fifty_apart_are_linked_at_half_opacity() {
        let mut field = field();
        let mut scheduler = ManualScheduler::default();
        let mut ctx = RecordingContext::default();
        field.mount(400, 400, &mut scheduler);
        field.set_particles(vec![particle_at(100.0, 100.0), particle_at(130.0, 140.0)]);

        let stats = field.step(&mut ctx, &far_pointer());

        assert_eq!(stats.links, 1);
        let (from, to, color) = ctx.lines[0];
        assert_eq!(from, Vec2::new(100.0, 100.0));
        assert_eq!(to, Vec2::new(130.0, 140.0));
        let base = FieldConfig::default().link_color.a;
        assert!((color.a - 0.5 * base).abs() < 1e-6);
    }

    #[test]
    fn links_cover_each_close_pair_once() {
        let mut field = field();
        let mut scheduler = ManualScheduler::default();
        let mut ctx = RecordingContext::default();
        field.mount(1000, 1000, &mut scheduler);
        field.set_particles(vec![
            particle_at(100.0, 100.0),
            particle_at(150.0, 100.0),
            particle_at(100.0, 150.0),
            // too far from the others
            particle_at(800.0, 800.0),
        ]);

        let stats = field.step(&mut ctx, &far_pointer());

        assert_eq!(stats.links, 3);
        assert_eq!(ctx.lines.len(), 3);
    }

    #[test]
    fn resize_keeps_count_and_discards_positions() {
        let mut field = field();
        let mut scheduler = ManualScheduler::default();
        field.mount(800, 600, &mut scheduler);
        let before: Vec<Vec2> = field.particles().iter().map(|p| p.position).collect();

        field.resize(1024, 768);

        assert_eq!(field.particles().len(), 50);
        assert_eq!(field.surface(), Some(Surface::new(1024, 768)));
        assert!(field
            .particles()
            .iter()
            .all(|p| !before.contains(&p.position)));
    }

    #[test]
    fn resize_does_not_touch_scheduling() {
        let mut field = field();
        let mut scheduler = ManualScheduler::default();
        field.mount(800, 600, &mut scheduler);

        field.resize(640, 480);
        field.resize(320, 240);

        assert_eq!(scheduler.requested, 1);
        assert_eq!(scheduler.pending.len(), 1);
    }

    #[test]
    fn unmount_stops_all_drawing() {
        let mut field = field();
        let mut scheduler = ManualScheduler::default();
        let mut ctx = RecordingContext::default();
        let pointer = far_pointer();
        field.mount(800, 600, &mut scheduler);

        refresh(&mut field, &mut scheduler, &mut ctx, &pointer);
        let drawn = ctx.draw_calls();
        assert!(drawn > 0);

        let last = scheduler.pending[0];
        field.unmount(&mut scheduler);
        assert!(scheduler.pending.is_empty());

        // a refresh after teardown, plus a late delivery of the cancelled frame
        refresh(&mut field, &mut scheduler, &mut ctx, &pointer);
        assert_eq!(field.on_frame(last, Some(&mut ctx), &pointer, &mut scheduler), None);

        assert_eq!(ctx.draw_calls(), drawn);
        assert!(scheduler.pending.is_empty());
        assert!(!field.is_mounted());
    }

    #[test]
    fn missing_context_skips_frame_and_retries() {
        let mut field = field();
        let mut scheduler = ManualScheduler::default();
        field.mount(800, 600, &mut scheduler);
        let before = field.particles().to_vec();

        let handle = scheduler.tick()[0];
        let stats =
            field.on_frame::<RecordingContext, _>(handle, None, &far_pointer(), &mut scheduler);

        assert_eq!(stats, None);
        assert_eq!(field.particles(), before.as_slice());
        assert_eq!(scheduler.pending.len(), 1);
    }

    #[test]
    fn stale_frames_are_ignored() {
        let mut field = field();
        let mut scheduler = ManualScheduler::default();
        let mut ctx = RecordingContext::default();
        field.mount(800, 600, &mut scheduler);

        let handle = scheduler.tick()[0];
        field.on_frame(handle, Some(&mut ctx), &far_pointer(), &mut scheduler);
        let drawn = ctx.draw_calls();

        assert_eq!(
            field.on_frame(handle, Some(&mut ctx), &far_pointer(), &mut scheduler),
            None
        );
        assert_eq!(ctx.draw_calls(), drawn);
        assert_eq!(scheduler.pending.len(), 1);
    }

    #[test]
    fn remount_after_unmount_resumes_the_loop() {
        let mut field = field();
        let mut scheduler = ManualScheduler::default();
        let mut ctx = RecordingContext::default();
        field.mount(800, 600, &mut scheduler);
        field.unmount(&mut scheduler);
        field.resize(100, 100);
        assert!(field.particles().is_empty());

        field.mount(640, 480, &mut scheduler);
        let stats = refresh(&mut field, &mut scheduler, &mut ctx, &far_pointer());

        assert_eq!(stats.map(|s| s.particles), Some(50));
    }

    #[test]
    fn glow_follows_latest_pointer_position() {
        let mut field = field();
        let mut scheduler = ManualScheduler::default();
        let mut ctx = RecordingContext::default();
        let mut pointer = PointerState::default();
        field.mount(800, 600, &mut scheduler);

        pointer.move_to(Vec2::new(10.0, 20.0));
        pointer.move_to(Vec2::new(300.0, 250.0));
        refresh(&mut field, &mut scheduler, &mut ctx, &pointer);
        pointer.move_to(Vec2::new(420.0, 64.0));
        refresh(&mut field, &mut scheduler, &mut ctx, &pointer);

        let centers: Vec<Vec2> = ctx.glows.iter().map(|(center, ..)| *center).collect();
        assert_eq!(centers, vec![Vec2::new(300.0, 250.0), Vec2::new(420.0, 64.0)]);

        let config = FieldConfig::default();
        let (_, radius, color, fade_end) = ctx.glows[1];
        assert_eq!(radius, config.glow_radius);
        assert_eq!(color, config.glow_color);
        assert_eq!(fade_end, 0.7);
    }

    #[test]
    fn velocity_applies_before_pointer_delta() {
        let mut field = field();
        let mut scheduler = ManualScheduler::default();
        field.mount(400, 400, &mut scheduler);
        field.set_particles(vec![Particle {
            position: Vec2::new(50.0, 50.0),
            velocity: Vec2::new(0.0, 2.0),
            size: 1.0,
        }]);

        let mut pointer = PointerState::default();
        pointer.move_to(Vec2::new(50.0, 60.0));
        field.step(&mut RecordingContext::default(), &pointer);

        // 52 - 0.03 * (60 - 52)
        assert!((field.particles()[0].position.y - 51.76).abs() < 1e-4);
    }
}
