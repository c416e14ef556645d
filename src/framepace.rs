use std::time::{Duration, Instant};

/// Measures frame times and optionally caps the framerate
pub struct Framepacer {
    frame_start: Instant,
    last_frametime: f32,
    limit: Option<Duration>,
}

impl Framepacer {
    pub fn new(framerate: Option<u32>) -> Self {
        Self {
            frame_start: Instant::now(),
            last_frametime: 0.0,
            limit: framerate
                .filter(|fps| *fps > 0)
                .map(|fps| Duration::from_secs_f32(1.0 / fps as f32)),
        }
    }

    /// Duration of the last completed frame in seconds
    pub fn frametime(&self) -> f32 {
        self.last_frametime
    }

    pub fn framerate(&self) -> f32 {
        if self.last_frametime > f32::EPSILON {
            1.0 / self.last_frametime
        } else {
            0.0
        }
    }

    pub fn end_frame(&mut self) {
        if let Some(limit) = self.limit {
            const ACCURACY: Duration = Duration::from_micros(100);
            if let Some(sleep_time) = limit.checked_sub(self.frame_start.elapsed() + ACCURACY) {
                std::thread::sleep(sleep_time);
            }

            while self.frame_start.elapsed() < limit {
                std::thread::yield_now();
            }
        }

        self.last_frametime = self.frame_start.elapsed().as_secs_f32();
        self.frame_start = Instant::now();
    }
}
