#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Moodscroll runtime.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Adapters and systems submit
//! [`Command`] values describing desired mutations, the world executes those
//! commands via its `apply` entry point, and then broadcasts [`Event`] values
//! describing what actually happened. Systems read immutable world queries and
//! respond exclusively with new command batches.

use std::{borrow::Cow, collections::BTreeMap, error::Error, fmt, ops::Range, str::FromStr};

use serde::{Deserialize, Serialize};

/// Side length of a square tile measured in pixels.
pub const TILE_SIZE: u32 = 32;

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Scrolls the camera horizontally by the provided amount of tiles.
    AdvanceCamera {
        /// Signed horizontal offset applied to the camera position.
        delta: f32,
    },
    /// Runs a single frame of entity behaviour followed by the reap sweep.
    Tick,
    /// Appends whole columns to the right edge of the level grid.
    ExtendLevel {
        /// Number of columns to append.
        columns: u32,
    },
    /// Requests that a new entity is placed at the provided grid cell.
    SpawnEntity {
        /// Kind of entity to construct.
        kind: EntityKind,
        /// Column of the cell that anchors the entity.
        column: TileCoord,
        /// Row of the cell that anchors the entity.
        row: TileCoord,
    },
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Reports the camera position after it scrolled.
    CameraMoved {
        /// Horizontal camera offset measured in tiles.
        position: f32,
        /// Largest rounded displacement the camera ever reached.
        max_displacement: u32,
    },
    /// Indicates that a simulation frame elapsed.
    TimeAdvanced {
        /// Index of the frame that just completed, starting at one.
        frame: u64,
    },
    /// Announces that an entity was marked dead during the update pass.
    EntityDied {
        /// Identifier of the entity that died.
        entity: EntityId,
    },
    /// Confirms that the reap sweep removed dead entities from the registry.
    EntitiesReaped {
        /// Number of entities removed by the sweep.
        count: usize,
    },
    /// Confirms that the level grid grew by whole columns.
    LevelExtended {
        /// Column count before the extension.
        previous_length: u32,
        /// Column count after the extension.
        length: u32,
    },
    /// Confirms that an entity was created.
    EntitySpawned {
        /// Identifier allocated to the entity by the world.
        entity: EntityId,
        /// Kind of entity that was created.
        kind: EntityKind,
        /// Column of the anchor cell.
        column: TileCoord,
        /// Row of the anchor cell.
        row: TileCoord,
    },
    /// Reports that a spawn request targeted a cell outside of the grid.
    SpawnRejected {
        /// Kind of entity requested.
        kind: EntityKind,
        /// Requested column.
        column: TileCoord,
        /// Requested row.
        row: TileCoord,
    },
}

/// Index within the level grid measured in whole tiles.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileCoord(u32);

impl TileCoord {
    /// Creates a new tile coordinate wrapper.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the underlying tile index.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Unique identifier assigned to an entity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(u32);

impl EntityId {
    /// Creates a new entity identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Axis-aligned collision rectangle expressed in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PixelRect {
    x: i32,
    y: i32,
    width: u32,
    height: u32,
}

impl PixelRect {
    /// Creates a rectangle anchored at its upper-left corner.
    #[must_use]
    pub const fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Creates a rectangle covering exactly one grid cell.
    #[must_use]
    pub const fn for_cell(column: u32, row: u32) -> Self {
        Self::new(
            (column * TILE_SIZE) as i32,
            (row * TILE_SIZE) as i32,
            TILE_SIZE,
            TILE_SIZE,
        )
    }

    /// Horizontal coordinate of the left edge.
    #[must_use]
    pub const fn x(&self) -> i32 {
        self.x
    }

    /// Vertical coordinate of the top edge.
    #[must_use]
    pub const fn y(&self) -> i32 {
        self.y
    }

    /// Width of the rectangle in pixels.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Height of the rectangle in pixels.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Left edge as a floating point coordinate.
    #[must_use]
    pub fn left(&self) -> f32 {
        self.x as f32
    }

    /// Right edge as a floating point coordinate.
    #[must_use]
    pub fn right(&self) -> f32 {
        self.x as f32 + self.width as f32
    }

    /// Top edge as a floating point coordinate.
    #[must_use]
    pub fn top(&self) -> f32 {
        self.y as f32
    }

    /// Bottom edge as a floating point coordinate.
    #[must_use]
    pub fn bottom(&self) -> f32 {
        self.y as f32 + self.height as f32
    }
}

/// Opaque reference to a visual asset drawn by an external renderer.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SpriteKey(Cow<'static, str>);

impl SpriteKey {
    /// Background sky sprite.
    pub const SKY: Self = Self::from_static("sky");
    /// Solid ground sprite.
    pub const GROUND: Self = Self::from_static("ground");

    /// Creates a key referencing a sprite by a static name.
    #[must_use]
    pub const fn from_static(name: &'static str) -> Self {
        Self(Cow::Borrowed(name))
    }

    /// Creates a key from any owned or borrowed sprite name.
    #[must_use]
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    /// Name of the referenced sprite.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SpriteKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Content of a single grid cell. Tiles are replaced wholesale, never mutated.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Tile {
    sprite: Option<SpriteKey>,
    collider: Option<PixelRect>,
}

impl Tile {
    /// Creates a tile from an optional sprite and an optional collider.
    #[must_use]
    pub const fn new(sprite: Option<SpriteKey>, collider: Option<PixelRect>) -> Self {
        Self { sprite, collider }
    }

    /// Passable background tile.
    #[must_use]
    pub const fn sky() -> Self {
        Self::new(Some(SpriteKey::SKY), None)
    }

    /// Solid ground tile whose collider covers the provided cell.
    #[must_use]
    pub const fn ground(column: u32, row: u32) -> Self {
        Self::new(
            Some(SpriteKey::GROUND),
            Some(PixelRect::for_cell(column, row)),
        )
    }

    /// Invisible solid tile used underneath boxes and bricks, which draw themselves.
    #[must_use]
    pub const fn solid(column: u32, row: u32) -> Self {
        Self::new(None, Some(PixelRect::for_cell(column, row)))
    }

    /// Visual reference drawn for this tile, if any.
    #[must_use]
    pub fn sprite(&self) -> Option<&SpriteKey> {
        self.sprite.as_ref()
    }

    /// Collision rectangle, if the tile blocks movement.
    #[must_use]
    pub const fn collider(&self) -> Option<PixelRect> {
        self.collider
    }

    /// Reports whether the tile blocks movement.
    #[must_use]
    pub const fn is_solid(&self) -> bool {
        self.collider.is_some()
    }
}

/// Item hidden inside a random box.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BoxItem {
    /// A collectible coin.
    Coin,
    /// A power-up mushroom.
    RedMushroom,
}

/// Kinds of entities that can inhabit the level.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    /// Walking enemy that patrols back and forth.
    Goomba,
    /// Shelled enemy that patrols back and forth.
    Koopa,
    /// Power-up that wanders like an enemy.
    RedMushroom,
    /// Floating collectible coin.
    Coin,
    /// Box that yields coins.
    CoinBox,
    /// Brick that yields coins.
    CoinBrick,
    /// Box that yields the contained item.
    RandomBox {
        /// Item released by the box.
        item: BoxItem,
    },
}

impl EntityKind {
    /// Reports whether the entity moves with the patrol behaviour.
    #[must_use]
    pub const fn patrols(self) -> bool {
        matches!(self, Self::Goomba | Self::Koopa | Self::RedMushroom)
    }

    /// Reports whether the entity turns its anchor cell into a solid tile.
    #[must_use]
    pub const fn occupies_tile(self) -> bool {
        matches!(
            self,
            Self::CoinBox | Self::CoinBrick | Self::RandomBox { .. }
        )
    }
}

/// Emotion labels produced by the external classifier.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum EmotionLabel {
    /// Anger.
    Angry,
    /// Disgust.
    Disgust,
    /// Fear.
    Fear,
    /// Happiness.
    Happy,
    /// Sadness.
    Sad,
    /// Surprise.
    Surprise,
    /// No discernible emotion. Returned whenever nothing was observed.
    Neutral,
}

impl EmotionLabel {
    /// Every label in canonical order. Aggregation ties resolve to the earliest entry.
    pub const ALL: [Self; 7] = [
        Self::Angry,
        Self::Disgust,
        Self::Fear,
        Self::Happy,
        Self::Sad,
        Self::Surprise,
        Self::Neutral,
    ];

    /// Position of the label within [`EmotionLabel::ALL`].
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Lowercase name used by the classifier.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Angry => "angry",
            Self::Disgust => "disgust",
            Self::Fear => "fear",
            Self::Happy => "happy",
            Self::Sad => "sad",
            Self::Surprise => "surprise",
            Self::Neutral => "neutral",
        }
    }
}

impl fmt::Display for EmotionLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EmotionLabel {
    type Err = UnknownEmotion;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|label| label.as_str() == normalized)
            .ok_or_else(|| UnknownEmotion(value.to_owned()))
    }
}

/// Error returned when parsing an unrecognised emotion label.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnknownEmotion(String);

impl fmt::Display for UnknownEmotion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown emotion label `{}`", self.0)
    }
}

impl Error for UnknownEmotion {}

/// Per-label intensity scores reported for a single face.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EmotionScores {
    intensities: BTreeMap<EmotionLabel, f32>,
}

impl EmotionScores {
    /// Creates an empty score map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the intensity observed for a label, replacing any previous score.
    pub fn set(&mut self, label: EmotionLabel, intensity: f32) {
        let _ = self.intensities.insert(label, intensity);
    }

    /// Intensity recorded for a label. Absent labels score zero.
    #[must_use]
    pub fn get(&self, label: EmotionLabel) -> f32 {
        self.intensities.get(&label).copied().unwrap_or(0.0)
    }

    /// Iterator over recorded scores in canonical label order.
    pub fn iter(&self) -> impl Iterator<Item = (EmotionLabel, f32)> + '_ {
        self.intensities
            .iter()
            .map(|(label, intensity)| (*label, *intensity))
    }

    /// Reports whether no label has been scored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.intensities.is_empty()
    }

    /// Label with the highest score, or [`EmotionLabel::Neutral`] when empty.
    #[must_use]
    pub fn dominant(&self) -> EmotionLabel {
        if self.is_empty() {
            return EmotionLabel::Neutral;
        }
        strongest(EmotionLabel::ALL.into_iter().map(|label| (label, self.get(label))))
    }
}

impl FromIterator<(EmotionLabel, f32)> for EmotionScores {
    fn from_iter<I: IntoIterator<Item = (EmotionLabel, f32)>>(iter: I) -> Self {
        Self {
            intensities: iter.into_iter().collect(),
        }
    }
}

/// Picks the label with the strictly greatest score, preferring earlier entries on ties.
#[must_use]
pub fn strongest<I>(scores: I) -> EmotionLabel
where
    I: IntoIterator<Item = (EmotionLabel, f32)>,
{
    let mut best: Option<(EmotionLabel, f32)> = None;
    for (label, score) in scores {
        match best {
            Some((_, best_score)) if score <= best_score => {}
            _ => best = Some((label, score)),
        }
    }
    best.map_or(EmotionLabel::Neutral, |(label, _)| label)
}

/// Emotion observed on a single face in a single frame.
#[derive(Clone, Debug, PartialEq)]
pub struct EmotionSample {
    label: EmotionLabel,
    scores: EmotionScores,
}

impl EmotionSample {
    /// Creates a sample whose label is the dominant score.
    #[must_use]
    pub fn from_scores(scores: EmotionScores) -> Self {
        Self {
            label: scores.dominant(),
            scores,
        }
    }

    /// Dominant label of this sample.
    #[must_use]
    pub const fn label(&self) -> EmotionLabel {
        self.label
    }

    /// Per-label intensities of this sample.
    #[must_use]
    pub const fn scores(&self) -> &EmotionScores {
        &self.scores
    }
}

/// Source of the player's aggregated mood.
pub trait MoodSource {
    /// Returns the dominant emotion observed since the previous read.
    ///
    /// Implementations drain their history, so two consecutive reads without
    /// new observations yield [`EmotionLabel::Neutral`] the second time.
    fn dominant_emotion(&self) -> EmotionLabel;
}

/// Size of the visible window measured in tiles.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    columns: u32,
    rows: u32,
}

impl Viewport {
    /// Twenty columns by fifteen rows.
    pub const DEFAULT: Self = Self::new(20, 15);

    /// Creates a viewport of the provided size.
    #[must_use]
    pub const fn new(columns: u32, rows: u32) -> Self {
        Self { columns, rows }
    }

    /// Number of visible columns.
    #[must_use]
    pub const fn columns(&self) -> u32 {
        self.columns
    }

    /// Number of visible rows.
    #[must_use]
    pub const fn rows(&self) -> u32 {
        self.rows
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Declarative level description materialized into a grid at load time.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LevelDescription {
    /// Layers, objects, and entity placements.
    pub level: LevelLayout,
    /// Declared total length in columns. Zero means "as materialized".
    #[serde(default)]
    pub length: u32,
}

/// Body of a level description.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LevelLayout {
    /// Sky and ground layer ranges.
    pub layers: Layers,
    /// Decorative and solid object placements.
    #[serde(default)]
    pub objects: ObjectPlacements,
    /// Entity placements.
    #[serde(default)]
    pub entities: EntityPlacements,
}

/// Background layers that define the grid dimensions.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Layers {
    /// Upper rows filled with sky tiles.
    pub sky: LayerRange,
    /// Lower rows filled with ground tiles.
    pub ground: LayerRange,
}

/// Half-open column and row ranges covered by a layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerRange {
    /// `[start, end)` columns.
    pub x: [u32; 2],
    /// `[start, end)` rows.
    pub y: [u32; 2],
}

impl LayerRange {
    /// Columns covered by the layer.
    #[must_use]
    pub fn columns(&self) -> Range<u32> {
        self.x[0]..self.x[1]
    }

    /// Rows covered by the layer.
    #[must_use]
    pub fn rows(&self) -> Range<u32> {
        self.y[0]..self.y[1]
    }
}

/// Object placements. Every category defaults to empty when absent.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObjectPlacements {
    /// Bushes as `[column, row]`.
    pub bush: Vec<(u32, u32)>,
    /// Clouds as `[column, row]`.
    pub cloud: Vec<(u32, u32)>,
    /// Pipes as `[column, row, length]`.
    pub pipe: Vec<(u32, u32, u32)>,
    /// Cells forced back to sky as `[column, row]`.
    pub sky: Vec<(u32, u32)>,
    /// Cells forced to ground as `[column, row]`.
    pub ground: Vec<(u32, u32)>,
}

/// Entity placements. Every category defaults to empty when absent.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EntityPlacements {
    /// Coin boxes as `[column, row]`.
    #[serde(rename = "CoinBox")]
    pub coin_box: Vec<(u32, u32)>,
    /// Coin bricks as `[column, row]`.
    #[serde(rename = "coinBrick")]
    pub coin_brick: Vec<(u32, u32)>,
    /// Goombas as `[column, row]`.
    #[serde(rename = "Goomba")]
    pub goomba: Vec<(u32, u32)>,
    /// Koopas as `[column, row]`.
    #[serde(rename = "Koopa")]
    pub koopa: Vec<(u32, u32)>,
    /// Coins as `[column, row]`.
    #[serde(rename = "coin")]
    pub coin: Vec<(u32, u32)>,
    /// Random boxes as `[column, row, item]`.
    #[serde(rename = "RandomBox")]
    pub random_box: Vec<(u32, u32, BoxItem)>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dominant_prefers_highest_score() {
        let scores: EmotionScores = [(EmotionLabel::Happy, 0.2), (EmotionLabel::Sad, 0.7)]
            .into_iter()
            .collect();
        assert_eq!(scores.dominant(), EmotionLabel::Sad);
    }

    #[test]
    fn dominant_of_empty_scores_is_neutral() {
        assert_eq!(EmotionScores::new().dominant(), EmotionLabel::Neutral);
    }

    #[test]
    fn ties_resolve_to_canonical_order() {
        let label = strongest([(EmotionLabel::Sad, 0.5), (EmotionLabel::Angry, 0.5)]);
        assert_eq!(label, EmotionLabel::Sad);

        let scores: EmotionScores = [(EmotionLabel::Sad, 0.5), (EmotionLabel::Angry, 0.5)]
            .into_iter()
            .collect();
        assert_eq!(scores.dominant(), EmotionLabel::Angry);
    }

    #[test]
    fn emotion_labels_parse_case_insensitively() {
        assert_eq!("Happy".parse::<EmotionLabel>(), Ok(EmotionLabel::Happy));
        assert_eq!(" neutral ".parse::<EmotionLabel>(), Ok(EmotionLabel::Neutral));
        assert!("bored".parse::<EmotionLabel>().is_err());
    }

    #[test]
    fn tiles_report_solidity() {
        assert!(!Tile::sky().is_solid());
        assert!(Tile::ground(2, 3).is_solid());
        assert_eq!(Tile::ground(2, 3).collider(), Some(PixelRect::new(64, 96, 32, 32)));
        assert_eq!(Tile::solid(0, 0).sprite(), None);
    }

    #[test]
    fn entity_kinds_classify_behaviour() {
        assert!(EntityKind::Goomba.patrols());
        assert!(!EntityKind::Coin.patrols());
        assert!(EntityKind::RandomBox {
            item: BoxItem::Coin
        }
        .occupies_tile());
        assert!(!EntityKind::Koopa.occupies_tile());
    }

    #[test]
    fn level_description_defaults_missing_categories() {
        let json = r#"{
            "id": 1,
            "length": 40,
            "level": {
                "layers": {
                    "sky": { "x": [0, 30], "y": [0, 13] },
                    "ground": { "x": [0, 30], "y": [14, 16] }
                },
                "entities": {
                    "Goomba": [[10, 12]],
                    "RandomBox": [[4, 9, "RedMushroom"]]
                }
            }
        }"#;

        let description: LevelDescription = serde_json::from_str(json).expect("valid level");
        assert_eq!(description.length, 40);
        assert_eq!(description.level.layers.sky.columns(), 0..30);
        assert_eq!(description.level.layers.ground.rows(), 14..16);
        assert!(description.level.objects.pipe.is_empty());
        assert!(description.level.entities.koopa.is_empty());
        assert_eq!(description.level.entities.goomba, vec![(10, 12)]);
        assert_eq!(
            description.level.entities.random_box,
            vec![(4, 9, BoxItem::RedMushroom)]
        );
    }
}
