use clap::Parser;

/// An ambient particle backdrop that reacts to the pointer
#[derive(Parser)]
#[command()]
pub struct Args {
    /// Number of particles in the field
    #[arg(short, long, default_value_t = 50)]
    pub particles: usize,

    /// Particles closer than this (in pixels) are joined by a line
    #[arg(short, long, default_value_t = 100f32)]
    pub link_distance: f32,

    /// The framerate the field will run at
    ///
    /// if default the field follows the display refresh
    #[arg(short, long)]
    pub framerate: Option<u32>,

    /// Seed for particle generation, random if omitted
    #[arg(long)]
    pub seed: Option<u64>,

    /// Start with the stats overlay hidden
    #[arg(long)]
    pub hide_overlay: bool,
}
