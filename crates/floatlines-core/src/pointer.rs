use glam::Vec2;

/// Last pointer position relative to the surface's top-left corner.
///
/// No history and no smoothing: each move overwrites the previous value.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PointerTracker {
    position: Vec2,
}

impl PointerTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn on_pointer_move(&mut self, client: Vec2, surface_origin: Vec2) {
        self.position = client - surface_origin;
    }
}
