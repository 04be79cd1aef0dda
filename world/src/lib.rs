#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state management for Moodscroll.

mod camera;
mod entity;
mod grid;
mod level;
mod registry;

use moodscroll_core::{Command, EntityId, EntityKind, Event, LevelDescription, Tile, Viewport};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

pub use camera::Camera;
pub use entity::{Aliveness, Behavior, Body, Entity, Heading, PatrolTrait, Physics};
pub use grid::LevelGrid;
pub use level::LevelError;
pub use registry::EntityRegistry;

const DEFAULT_LEVEL_COLUMNS: u32 = 60;
const DEFAULT_LEVEL_ROWS: u32 = 15;
const DEFAULT_GROUND_ROWS: u32 = 2;
const DEFAULT_PATROL_SPEED: f32 = 1.0;
const DEFAULT_RNG_SEED: u64 = 0x6d6f_6f64_7363_726c;

/// Configuration parameters required to construct the world.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Config {
    viewport: Viewport,
    physics: Physics,
    patrol_speed: f32,
    rng_seed: u64,
}

impl Config {
    /// Creates a configuration with the provided viewport and seed and default physics.
    #[must_use]
    pub fn new(viewport: Viewport, rng_seed: u64) -> Self {
        Self {
            viewport,
            physics: Physics::default(),
            patrol_speed: DEFAULT_PATROL_SPEED,
            rng_seed,
        }
    }

    /// Replaces the physics constants applied to patrolling entities.
    #[must_use]
    pub fn with_physics(mut self, physics: Physics) -> Self {
        self.physics = physics;
        self
    }

    /// Replaces the walking speed of patrolling entities, in pixels per frame.
    #[must_use]
    pub fn with_patrol_speed(mut self, patrol_speed: f32) -> Self {
        self.patrol_speed = patrol_speed;
        self
    }

    /// Visible window size.
    #[must_use]
    pub const fn viewport(&self) -> Viewport {
        self.viewport
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(Viewport::DEFAULT, DEFAULT_RNG_SEED)
    }
}

/// Represents the authoritative Moodscroll world state.
#[derive(Debug)]
pub struct World {
    grid: LevelGrid,
    registry: EntityRegistry,
    camera: Camera,
    viewport: Viewport,
    initial_length: u32,
    declared_length: u32,
    frame: u64,
    rng: ChaCha8Rng,
}

impl World {
    /// Creates a flat level ready for simulation.
    #[must_use]
    pub fn new() -> Self {
        let grid = LevelGrid::flat(DEFAULT_LEVEL_COLUMNS, DEFAULT_LEVEL_ROWS, DEFAULT_GROUND_ROWS);
        Self::with_grid(grid, Config::default())
    }

    /// Creates a world from a pre-built grid.
    #[must_use]
    pub fn with_grid(grid: LevelGrid, config: Config) -> Self {
        Self {
            initial_length: grid.length(),
            declared_length: 0,
            registry: EntityRegistry::new(config.physics, config.patrol_speed),
            camera: Camera::new(),
            viewport: config.viewport,
            frame: 0,
            rng: ChaCha8Rng::seed_from_u64(config.rng_seed),
            grid,
        }
    }

    /// Materializes a level description.
    ///
    /// The initial length is the materialized layer width. The declared
    /// length is kept as a floor for the growth target; the grid is not
    /// padded here, so the padding columns arrive through regular extension.
    pub fn from_description(
        description: &LevelDescription,
        config: Config,
    ) -> Result<Self, LevelError> {
        let (grid, placements) = level::build(description)?;

        let mut world = Self::with_grid(grid, config);
        world.declared_length = description.length;
        for placement in placements {
            let _ = world.spawn(placement.kind, placement.column, placement.row);
        }
        tracing::debug!(
            length = world.grid.length(),
            declared_length = world.declared_length,
            rows = world.grid.row_count(),
            entities = world.registry.len(),
            "level loaded"
        );
        Ok(world)
    }

    fn spawn(&mut self, kind: EntityKind, column: u32, row: u32) -> EntityId {
        let heading = if self.rng.gen_bool(0.5) {
            Heading::Left
        } else {
            Heading::Right
        };
        self.registry.spawn(kind, column, row, heading)
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::AdvanceCamera { delta } => {
            world.camera.advance(delta);
            out_events.push(Event::CameraMoved {
                position: world.camera.position(),
                max_displacement: world.camera.max_displacement(),
            });
        }
        Command::Tick => {
            world.frame = world.frame.saturating_add(1);
            out_events.push(Event::TimeAdvanced { frame: world.frame });
            let _ = world
                .registry
                .update(&world.grid, &world.camera, world.viewport, out_events);
        }
        Command::ExtendLevel { columns } => {
            if columns == 0 {
                return;
            }
            let previous_length = world.grid.length();
            world.grid.extend(columns);
            tracing::debug!(previous_length, length = world.grid.length(), "level extended");
            out_events.push(Event::LevelExtended {
                previous_length,
                length: world.grid.length(),
            });
        }
        Command::SpawnEntity { kind, column, row } => {
            if !world.grid.contains(column.get(), row.get()) {
                tracing::warn!(?kind, column = column.get(), row = row.get(), "spawn outside level");
                out_events.push(Event::SpawnRejected { kind, column, row });
                return;
            }
            if kind.occupies_tile() {
                world
                    .grid
                    .set(column.get(), row.get(), Tile::solid(column.get(), row.get()));
            }
            let entity = world.spawn(kind, column.get(), row.get());
            out_events.push(Event::EntitySpawned {
                entity,
                kind,
                column,
                row,
            });
        }
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use std::ops::Range;

    use glam::Vec2;
    use moodscroll_core::{EntityId, EntityKind, Tile, TileCoord, Viewport};

    use super::{Camera, Entity, EntityRegistry, LevelGrid, World};

    /// Provides read-only access to the level grid.
    #[must_use]
    pub fn level_grid(world: &World) -> &LevelGrid {
        &world.grid
    }

    /// Current number of columns.
    #[must_use]
    pub fn level_length(world: &World) -> u32 {
        world.grid.length()
    }

    /// Number of columns when the level was loaded.
    #[must_use]
    pub fn initial_length(world: &World) -> u32 {
        world.initial_length
    }

    /// Length the level description declared, or zero when it declared none.
    ///
    /// The level never targets fewer columns than this.
    #[must_use]
    pub fn declared_length(world: &World) -> u32 {
        world.declared_length
    }

    /// Provides read-only access to the camera.
    #[must_use]
    pub fn camera(world: &World) -> &Camera {
        &world.camera
    }

    /// Provides read-only access to the entity registry.
    #[must_use]
    pub fn entities(world: &World) -> &EntityRegistry {
        &world.registry
    }

    /// Number of frames simulated so far.
    #[must_use]
    pub fn frame(world: &World) -> u64 {
        world.frame
    }

    /// Size of the visible window.
    #[must_use]
    pub fn viewport(world: &World) -> Viewport {
        world.viewport
    }

    /// Captures the tiles and active entities an external renderer should draw.
    ///
    /// The column window starts one column left of the camera and spans one
    /// extra column on either side of the viewport, clamped to the grid.
    #[must_use]
    pub fn visible_window(world: &World) -> VisibleWindow<'_> {
        let length = i64::from(world.grid.length());
        let left = world.camera.position().floor() as i64;
        let first = (left - 1).clamp(0, length);
        let end = (left + i64::from(world.viewport.columns()) + 1).clamp(first, length);
        let columns = first as u32..end as u32;
        let rows = 0..world.viewport.rows().min(world.grid.row_count());

        let entities = world
            .registry
            .iter()
            .filter(|entity| entity.is_active() && entity.is_alive())
            .map(EntitySnapshot::from)
            .collect();

        VisibleWindow {
            grid: &world.grid,
            camera_position: world.camera.position(),
            columns,
            rows,
            entities,
        }
    }

    /// Tiles and entities visible through the camera for one frame.
    #[derive(Clone, Debug)]
    pub struct VisibleWindow<'a> {
        grid: &'a LevelGrid,
        camera_position: f32,
        columns: Range<u32>,
        rows: Range<u32>,
        entities: Vec<EntitySnapshot>,
    }

    impl<'a> VisibleWindow<'a> {
        /// Camera offset in tiles the window was captured at.
        #[must_use]
        pub const fn camera_position(&self) -> f32 {
            self.camera_position
        }

        /// Visible columns.
        #[must_use]
        pub fn columns(&self) -> Range<u32> {
            self.columns.clone()
        }

        /// Visible rows.
        #[must_use]
        pub fn rows(&self) -> Range<u32> {
            self.rows.clone()
        }

        /// Iterator over the visible tiles in row-major order.
        pub fn tiles(&self) -> impl Iterator<Item = (TileCoord, TileCoord, &'a Tile)> + '_ {
            let grid = self.grid;
            self.rows.clone().flat_map(move |row| {
                self.columns.clone().map(move |column| {
                    (
                        TileCoord::new(column),
                        TileCoord::new(row),
                        grid.get(column, row),
                    )
                })
            })
        }

        /// Active entities in spawn order.
        #[must_use]
        pub fn entities(&self) -> &[EntitySnapshot] {
            &self.entities
        }
    }

    /// Immutable representation of a single entity used for queries.
    #[derive(Clone, Copy, Debug, PartialEq)]
    pub struct EntitySnapshot {
        /// Identifier allocated by the world.
        pub id: EntityId,
        /// Kind of entity.
        pub kind: EntityKind,
        /// Upper-left corner in pixels.
        pub position: Vec2,
        /// Velocity in pixels per frame.
        pub velocity: Vec2,
    }

    impl From<&Entity> for EntitySnapshot {
        fn from(entity: &Entity) -> Self {
            Self {
                id: entity.id(),
                kind: entity.kind(),
                position: entity.body().position(),
                velocity: entity.body().velocity(),
            }
        }
    }
}
