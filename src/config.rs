use crate::{cli::Args, surface::Rgba};

/// Tunables of the particle backdrop
#[derive(Clone, Debug)]
pub struct FieldConfig {
    pub particle_count: usize,

    pub min_size: f32,
    pub max_size: f32,
    pub max_speed: f32,

    /// Particles closer than this to the pointer get nudged every frame
    pub pointer_radius: f32,
    pub pointer_strength: f32,

    /// Particle pairs closer than this get joined by a line
    pub link_distance: f32,

    pub particle_color: Rgba,
    /// The alpha of this color is the opacity of a zero-length link
    pub link_color: Rgba,
    pub background: Rgba,

    /// Soft glow following the pointer, fading out at `glow_fade_end * glow_radius`
    pub glow_radius: f32,
    pub glow_fade_end: f32,
    pub glow_color: Rgba,
}

impl Default for FieldConfig {
    fn default() -> Self {
        Self {
            particle_count: 50,

            min_size: 1.0,
            max_size: 3.0,
            max_speed: 1.0,

            pointer_radius: 100.0,
            pointer_strength: 0.03,

            link_distance: 100.0,

            particle_color: Rgba::from_rgb8(99, 179, 237).with_alpha(0.3),
            link_color: Rgba::from_rgb8(99, 179, 237).with_alpha(0.3),
            background: Rgba::from_rgb8(3, 7, 18),

            glow_radius: 16.0,
            glow_fade_end: 0.7,
            glow_color: Rgba::from_rgb8(99, 179, 237).with_alpha(0.3),
        }
    }
}

impl FieldConfig {
    pub fn from_args(args: &Args) -> Self {
        Self {
            particle_count: args.particles,
            link_distance: args.link_distance,
            ..Default::default()
        }
    }
}
