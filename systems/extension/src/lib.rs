#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Level extension system that grows the grid behind the camera and seeds
//! the new frontier with content chosen from the player's mood.

use moodscroll_core::{BoxItem, Command, EmotionLabel, EntityKind, MoodSource, TileCoord};
use moodscroll_world::{query, World};

const DEFAULT_SPAWN_EVERY: u64 = 5;
const ENEMY_ROW: u32 = 8;
const BOX_ROW: u32 = 10;

/// Entity spawned for a mood and the row it is anchored at.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SpawnRule {
    /// Kind of entity to spawn.
    pub kind: EntityKind,
    /// Row of the anchor cell within the frontier column.
    pub row: u32,
}

impl SpawnRule {
    /// Creates a rule spawning `kind` at `row`.
    #[must_use]
    pub const fn new(kind: EntityKind, row: u32) -> Self {
        Self { kind, row }
    }
}

/// Static mapping from every emotion label to a spawn rule.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SpawnTable {
    rules: [SpawnRule; EmotionLabel::ALL.len()],
}

impl SpawnTable {
    /// Creates a table that spawns the same rule for every label.
    #[must_use]
    pub const fn uniform(rule: SpawnRule) -> Self {
        Self {
            rules: [rule; EmotionLabel::ALL.len()],
        }
    }

    /// Replaces the rule applied to `label`.
    #[must_use]
    pub fn with_rule(mut self, label: EmotionLabel, rule: SpawnRule) -> Self {
        self.rules[label.index()] = rule;
        self
    }

    /// Rule applied to `label`.
    #[must_use]
    pub const fn rule(&self, label: EmotionLabel) -> SpawnRule {
        self.rules[label.index()]
    }
}

impl Default for SpawnTable {
    fn default() -> Self {
        let koopa = SpawnRule::new(EntityKind::Koopa, ENEMY_ROW);
        let goomba = SpawnRule::new(EntityKind::Goomba, ENEMY_ROW);
        let coin_box = SpawnRule::new(
            EntityKind::RandomBox {
                item: BoxItem::Coin,
            },
            BOX_ROW,
        );
        let mushroom_box = SpawnRule::new(
            EntityKind::RandomBox {
                item: BoxItem::RedMushroom,
            },
            BOX_ROW,
        );

        Self::uniform(koopa)
            .with_rule(EmotionLabel::Happy, goomba)
            .with_rule(EmotionLabel::Surprise, goomba)
            .with_rule(EmotionLabel::Sad, coin_box)
            .with_rule(EmotionLabel::Fear, coin_box)
            .with_rule(EmotionLabel::Angry, mushroom_box)
    }
}

/// Configuration parameters required to construct the extension system.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Config {
    spawn_every: u64,
    spawn_table: SpawnTable,
}

impl Config {
    /// Creates a configuration that spawns whenever the accumulated column
    /// count is a multiple of `spawn_every`. Zero disables spawning.
    #[must_use]
    pub const fn new(spawn_every: u64, spawn_table: SpawnTable) -> Self {
        Self {
            spawn_every,
            spawn_table,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(DEFAULT_SPAWN_EVERY, SpawnTable::default())
    }
}

/// Pure system that keeps the level ahead of the camera.
#[derive(Debug)]
pub struct Extension {
    spawn_every: u64,
    spawn_table: SpawnTable,
    extension_counter: u64,
}

impl Extension {
    /// Creates a new extension system using the supplied configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            spawn_every: config.spawn_every,
            spawn_table: config.spawn_table,
            extension_counter: 0,
        }
    }

    /// Total number of columns appended so far.
    #[must_use]
    pub const fn extension_counter(&self) -> u64 {
        self.extension_counter
    }

    /// Compares the level length against the camera's reach and emits the
    /// commands that close the gap.
    ///
    /// The target length is the initial length plus the camera's maximum
    /// displacement, but never less than the level's declared length, so the
    /// first call pads a short level. When the grid falls short, one extension command covers
    /// the whole gap, and if the accumulated column count then divides evenly
    /// by the spawn cadence the mood source is drained and one entity is
    /// spawned at the new frontier column.
    pub fn handle<M>(&mut self, world: &World, mood: &M, out: &mut Vec<Command>)
    where
        M: MoodSource + ?Sized,
    {
        let length = query::level_length(world);
        let target = query::initial_length(world)
            .saturating_add(query::camera(world).max_displacement())
            .max(query::declared_length(world));
        if target <= length {
            return;
        }

        let extension = target - length;
        out.push(Command::ExtendLevel { columns: extension });
        self.extension_counter = self.extension_counter.saturating_add(u64::from(extension));

        if self.spawn_every == 0 || self.extension_counter % self.spawn_every != 0 {
            return;
        }

        let emotion = mood.dominant_emotion();
        let rule = self.spawn_table.rule(emotion);
        let frontier = target - 1;
        tracing::info!(
            %emotion,
            kind = ?rule.kind,
            column = frontier,
            row = rule.row,
            extensions = self.extension_counter,
            "spawning mood-driven content"
        );
        out.push(Command::SpawnEntity {
            kind: rule.kind,
            column: TileCoord::new(frontier),
            row: TileCoord::new(rule.row),
        });
    }
}
