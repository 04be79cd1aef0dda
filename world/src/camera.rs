//! Horizontal scroll tracking.

/// Horizontally scrolling camera measured in tiles.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Camera {
    position: f32,
    max_displacement: u32,
}

impl Camera {
    /// Creates a camera resting at the left edge of the level.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            position: 0.0,
            max_displacement: 0,
        }
    }

    /// Scrolls by `delta` tiles and records the furthest rounded displacement.
    pub fn advance(&mut self, delta: f32) {
        self.position += delta;
        let displacement = self.position.round().abs() as u32;
        self.max_displacement = self.max_displacement.max(displacement);
    }

    /// Current horizontal offset in tiles.
    #[must_use]
    pub const fn position(&self) -> f32 {
        self.position
    }

    /// Largest `|round(position)|` ever reached. Never decreases.
    #[must_use]
    pub const fn max_displacement(&self) -> u32 {
        self.max_displacement
    }
}
