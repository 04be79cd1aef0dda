//! Entities and the behaviours that move them across the level grid.

use glam::Vec2;
use moodscroll_core::{EntityId, EntityKind, PixelRect, TILE_SIZE};

use crate::grid::{cell_index, LevelGrid};

/// Side length of an entity's square body in pixels.
pub(crate) const BODY_SIZE: f32 = TILE_SIZE as f32;

/// Lifecycle state read by the reap sweep.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Aliveness {
    /// The entity takes part in updates.
    Alive,
    /// The entity is waiting to be reaped after the current update pass.
    Dead,
}

/// Horizontal travel direction of a patrolling entity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Heading {
    /// Towards decreasing columns.
    Left,
    /// Towards increasing columns.
    Right,
}

impl Heading {
    /// Opposite direction.
    #[must_use]
    pub const fn flipped(self) -> Self {
        match self {
            Self::Left => Self::Right,
            Self::Right => Self::Left,
        }
    }

    /// Sign applied to the patrol speed.
    #[must_use]
    pub const fn sign(self) -> f32 {
        match self {
            Self::Left => -1.0,
            Self::Right => 1.0,
        }
    }
}

/// Vertical acceleration applied to falling entities.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Physics {
    /// Pixels per frame added to the vertical velocity while airborne.
    pub gravity: f32,
    /// Largest downward velocity in pixels per frame. Kept below a tile so a
    /// single vertical step never skips a solid row.
    pub terminal_velocity: f32,
}

impl Default for Physics {
    fn default() -> Self {
        Self {
            gravity: 0.75,
            terminal_velocity: 12.0,
        }
    }
}

/// Position, velocity, and lifecycle state of an entity.
#[derive(Clone, Debug, PartialEq)]
pub struct Body {
    position: Vec2,
    velocity: Vec2,
    aliveness: Aliveness,
    on_ground: bool,
}

impl Body {
    fn at_cell(column: u32, row: u32) -> Self {
        Self {
            position: Vec2::new(column as f32, row as f32) * BODY_SIZE,
            velocity: Vec2::ZERO,
            aliveness: Aliveness::Alive,
            on_ground: false,
        }
    }

    /// Upper-left corner in pixels.
    #[must_use]
    pub const fn position(&self) -> Vec2 {
        self.position
    }

    /// Velocity in pixels per frame.
    #[must_use]
    pub const fn velocity(&self) -> Vec2 {
        self.velocity
    }

    /// Current lifecycle state.
    #[must_use]
    pub const fn aliveness(&self) -> Aliveness {
        self.aliveness
    }

    /// Reports whether the body rested on a solid tile after the last vertical step.
    #[must_use]
    pub const fn on_ground(&self) -> bool {
        self.on_ground
    }

    fn kill(&mut self) {
        self.aliveness = Aliveness::Dead;
    }

    fn apply_gravity(&mut self, physics: Physics) {
        self.velocity.y = (self.velocity.y + physics.gravity).min(physics.terminal_velocity);
    }

    fn overlaps(&self, rect: PixelRect) -> bool {
        self.position.x < rect.right()
            && self.position.x + BODY_SIZE > rect.left()
            && self.position.y < rect.bottom()
            && self.position.y + BODY_SIZE > rect.top()
    }

    fn touching_colliders(&self, grid: &LevelGrid) -> Vec<PixelRect> {
        grid.colliders_within(
            self.position.x,
            self.position.y,
            self.position.x + BODY_SIZE,
            self.position.y + BODY_SIZE,
        )
        .filter(|rect| self.overlaps(*rect))
        .collect()
    }

    fn resolve_vertical(&mut self, grid: &LevelGrid) {
        self.on_ground = false;
        for rect in self.touching_colliders(grid) {
            if self.velocity.y > 0.0 {
                self.position.y = rect.top() - BODY_SIZE;
                self.velocity.y = 0.0;
                self.on_ground = true;
            } else if self.velocity.y < 0.0 {
                self.position.y = rect.bottom();
                self.velocity.y = 0.0;
            }
        }
    }

    fn resolve_horizontal(&mut self, grid: &LevelGrid) {
        for rect in self.touching_colliders(grid) {
            if self.velocity.x > 0.0 {
                self.position.x = rect.left() - BODY_SIZE;
                self.velocity.x = 0.0;
            } else if self.velocity.x < 0.0 {
                self.position.x = rect.right();
                self.velocity.x = 0.0;
            }
        }
    }
}

/// Back-and-forth walking with obstruction reversal and out-of-bounds death.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PatrolTrait {
    heading: Heading,
    speed: f32,
}

impl PatrolTrait {
    /// Creates a patrol behaviour walking in `heading` at `speed` pixels per frame.
    #[must_use]
    pub const fn new(heading: Heading, speed: f32) -> Self {
        Self { heading, speed }
    }

    /// Current walking direction.
    #[must_use]
    pub const fn heading(&self) -> Heading {
        self.heading
    }

    /// Advances the body one frame, settling the vertical axis before the horizontal one.
    ///
    /// A zero horizontal velocity means the previous frame hit an obstacle,
    /// so the heading flips. A body whose row or column lies outside the grid
    /// dies before moving along that axis.
    pub fn update(&mut self, body: &mut Body, grid: &LevelGrid) {
        if body.velocity.x == 0.0 {
            self.heading = self.heading.flipped();
        }
        body.velocity.x = self.speed * self.heading.sign();

        let row = cell_index(body.position.y);
        if row < 0 || row >= i64::from(grid.row_count()) {
            body.kill();
            return;
        }
        body.position.y += body.velocity.y;
        body.resolve_vertical(grid);

        let column = cell_index(body.position.x);
        if column < 0 || column >= i64::from(grid.length()) {
            body.kill();
            return;
        }
        body.position.x += body.velocity.x;
        body.resolve_horizontal(grid);
    }
}

/// Per-entity behaviour selected at construction.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Behavior {
    /// Walks back and forth under gravity.
    Patrol(PatrolTrait),
    /// Never moves.
    Static,
}

/// Simulated inhabitant of the level.
#[derive(Clone, Debug, PartialEq)]
pub struct Entity {
    id: EntityId,
    kind: EntityKind,
    body: Body,
    behavior: Behavior,
    active: bool,
}

impl Entity {
    pub(crate) fn new(
        id: EntityId,
        kind: EntityKind,
        column: u32,
        row: u32,
        behavior: Behavior,
    ) -> Self {
        let mut body = Body::at_cell(column, row);
        if let Behavior::Patrol(patrol) = behavior {
            body.velocity.x = patrol.speed * patrol.heading.sign();
        }
        Self {
            id,
            kind,
            body,
            behavior,
            active: false,
        }
    }

    /// Identifier allocated by the world.
    #[must_use]
    pub const fn id(&self) -> EntityId {
        self.id
    }

    /// Kind the entity was spawned as.
    #[must_use]
    pub const fn kind(&self) -> EntityKind {
        self.kind
    }

    /// Position, velocity, and lifecycle state.
    #[must_use]
    pub const fn body(&self) -> &Body {
        &self.body
    }

    /// Behaviour driving the entity.
    #[must_use]
    pub const fn behavior(&self) -> &Behavior {
        &self.behavior
    }

    /// Reports whether the camera has brought the entity into play.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.active
    }

    /// Reports whether the entity survives the next reap sweep.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.body.aliveness == Aliveness::Alive
    }

    /// Column containing the entity's upper-left corner.
    #[must_use]
    pub fn column(&self) -> i64 {
        cell_index(self.body.position.x)
    }

    pub(crate) fn activate(&mut self) {
        self.active = true;
    }

    /// Runs one frame of behaviour. Dead or inactive entities stay untouched.
    pub(crate) fn update(&mut self, grid: &LevelGrid, physics: Physics) {
        if !self.active || !self.is_alive() {
            return;
        }
        match &mut self.behavior {
            Behavior::Patrol(patrol) => {
                self.body.apply_gravity(physics);
                patrol.update(&mut self.body, grid);
            }
            Behavior::Static => {}
        }
    }

    #[cfg(test)]
    pub(crate) fn place(&mut self, position: Vec2, velocity: Vec2) {
        self.body.position = position;
        self.body.velocity = velocity;
    }
}
