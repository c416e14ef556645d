use glam::Vec2;

/// The region the field is drawn into, in pixels
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Surface {
    pub width: u32,
    pub height: u32,
}

impl Surface {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn extent(&self) -> Vec2 {
        Vec2::new(self.width as f32, self.height as f32)
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rgba {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Rgba {
    pub fn from_rgb8(r: u8, g: u8, b: u8) -> Self {
        Self {
            r: r as f32 / 255.0,
            g: g as f32 / 255.0,
            b: b as f32 / 255.0,
            a: 1.0,
        }
    }

    pub fn with_alpha(self, a: f32) -> Self {
        Self { a, ..self }
    }

    pub fn to_array(self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

/// A 2D immediate mode drawing context
pub trait DrawingContext {
    fn clear_rect(&mut self, x: f32, y: f32, width: f32, height: f32);

    fn fill_circle(&mut self, center: Vec2, radius: f32, color: Rgba);

    fn stroke_line(&mut self, from: Vec2, to: Vec2, color: Rgba);

    /// Fills a radial gradient from `color` at the center to transparent at
    /// `fade_end * radius`
    fn fill_radial(&mut self, center: Vec2, radius: f32, color: Rgba, fade_end: f32);
}

#[cfg(test)]
pub mod testing {
    use super::*;

    /// Records every draw call it receives
    #[derive(Default)]
    pub struct RecordingContext {
        pub clears: usize,
        pub circles: Vec<(Vec2, f32, Rgba)>,
        pub lines: Vec<(Vec2, Vec2, Rgba)>,
        pub glows: Vec<(Vec2, f32, Rgba, f32)>,
    }

    impl RecordingContext {
        pub fn draw_calls(&self) -> usize {
            self.clears + self.circles.len() + self.lines.len() + self.glows.len()
        }
    }

    impl DrawingContext for RecordingContext {
        fn clear_rect(&mut self, _x: f32, _y: f32, _width: f32, _height: f32) {
            self.clears += 1;
        }

        fn fill_circle(&mut self, center: Vec2, radius: f32, color: Rgba) {
            self.circles.push((center, radius, color));
        }

        fn stroke_line(&mut self, from: Vec2, to: Vec2, color: Rgba) {
            self.lines.push((from, to, color));
        }

        fn fill_radial(&mut self, center: Vec2, radius: f32, color: Rgba, fade_end: f32) {
            self.glows.push((center, radius, color, fade_end));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_when_either_axis_is_zero() {
        assert!(Surface::new(0, 10).is_empty());
        assert!(Surface::new(10, 0).is_empty());
        assert!(!Surface::new(1, 1).is_empty());
    }

    #[test]
    fn with_alpha_keeps_rgb() {
        let color = Rgba::from_rgb8(255, 0, 51).with_alpha(0.25);
        assert_eq!(color.to_array(), [1.0, 0.0, 0.2, 0.25]);
    }
}
