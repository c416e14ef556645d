use glam::Vec2;
use rand::Rng;

use crate::config::FieldConfig;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Particle {
    pub position: Vec2,
    pub velocity: Vec2,
    pub size: f32,
}

impl Particle {
    /// Moves the particle by one frame
    pub fn advance(&mut self, pointer: Vec2, config: &FieldConfig, bounds: Vec2) {
        self.position += self.velocity;

        let delta = pointer - self.position;
        if delta.length() < config.pointer_radius {
            self.position -= delta * config.pointer_strength;
        }

        self.position = Vec2::new(
            wrap(self.position.x, bounds.x),
            wrap(self.position.y, bounds.y),
        );
    }
}

/// Wraps `value` onto `[0, extent)`, reappearing on the opposite edge
pub fn wrap(value: f32, extent: f32) -> f32 {
    if extent <= 0.0 {
        return 0.0;
    }

    let wrapped = value.rem_euclid(extent);
    // rem_euclid can round up to `extent` for tiny negative values
    if wrapped >= extent {
        0.0
    } else {
        wrapped
    }
}

pub fn generate_particles<R: Rng>(
    rng: &mut R,
    bounds: Vec2,
    config: &FieldConfig,
) -> Vec<Particle> {
    (0..config.particle_count)
        .map(|_| Particle {
            position: Vec2::new(sample_axis(rng, bounds.x), sample_axis(rng, bounds.y)),
            velocity: Vec2::new(
                rng.gen_range(-config.max_speed..config.max_speed),
                rng.gen_range(-config.max_speed..config.max_speed),
            ),
            size: rng.gen_range(config.min_size..config.max_size),
        })
        .collect()
}

fn sample_axis<R: Rng>(rng: &mut R, extent: f32) -> f32 {
    if extent > 0.0 {
        rng.gen_range(0.0..extent)
    } else {
        0.0
    }
}
