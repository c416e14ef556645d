use glam::Vec2;

/// Last known pointer position in surface coordinates
///
/// Input events overwrite it as they arrive; frames only ever read it.
#[derive(Clone, Copy, Debug, Default)]
pub struct PointerState {
    position: Vec2,
}

impl PointerState {
    pub fn move_to(&mut self, position: Vec2) {
        self.position = position;
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }
}
