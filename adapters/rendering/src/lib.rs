#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Shared rendering contracts for Moodscroll adapters.

use anyhow::Result as AnyResult;
use glam::Vec2;
use moodscroll_core::{BoxItem, EntityKind, SpriteKey, Viewport, TILE_SIZE};
use moodscroll_world::query::VisibleWindow;
use std::time::Duration;

/// Tile edge length in pixels as a float.
const TILE_PIXELS: f32 = TILE_SIZE as f32;

/// RGBA color used when presenting frames.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
    /// Red channel intensity in the range 0.0..=1.0.
    pub red: f32,
    /// Green channel intensity in the range 0.0..=1.0.
    pub green: f32,
    /// Blue channel intensity in the range 0.0..=1.0.
    pub blue: f32,
    /// Alpha channel intensity in the range 0.0..=1.0.
    pub alpha: f32,
}

impl Color {
    /// Daytime sky behind the level.
    pub const SKY: Self = Self::from_rgb_u8(92, 148, 252);

    /// Creates a new color from floating point channels.
    #[must_use]
    pub const fn new(red: f32, green: f32, blue: f32, alpha: f32) -> Self {
        Self {
            red,
            green,
            blue,
            alpha,
        }
    }

    /// Creates an opaque color from byte RGB values.
    #[must_use]
    pub const fn from_rgb_u8(red: u8, green: u8, blue: u8) -> Self {
        Self {
            red: red as f32 / 255.0,
            green: green as f32 / 255.0,
            blue: blue as f32 / 255.0,
            alpha: 1.0,
        }
    }
}

/// Sprite a backend should draw for an entity kind.
#[must_use]
pub fn entity_sprite(kind: EntityKind) -> SpriteKey {
    let name = match kind {
        EntityKind::Goomba => "goomba",
        EntityKind::Koopa => "koopa",
        EntityKind::RedMushroom => "mushroom",
        EntityKind::Coin => "coin",
        EntityKind::CoinBox => "coinBox",
        EntityKind::CoinBrick => "brick",
        EntityKind::RandomBox {
            item: BoxItem::Coin,
        } => "randomBox",
        EntityKind::RandomBox {
            item: BoxItem::RedMushroom,
        } => "randomBoxMushroom",
    };
    SpriteKey::from_static(name)
}

/// A single sprite placed in screen space.
#[derive(Clone, Debug, PartialEq)]
pub struct SpriteDraw {
    /// Sprite to draw.
    pub sprite: SpriteKey,
    /// Upper-left corner in screen pixels.
    pub position: Vec2,
}

impl SpriteDraw {
    /// Creates a draw of `sprite` at `position`.
    #[must_use]
    pub fn new(sprite: SpriteKey, position: Vec2) -> Self {
        Self { sprite, position }
    }
}

/// Backend-neutral description of one frame.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Scene {
    /// Camera offset in pixels subtracted from world positions.
    pub scroll: f32,
    /// Background tiles, drawn first.
    pub tiles: Vec<SpriteDraw>,
    /// Entities, drawn above the tiles.
    pub entities: Vec<SpriteDraw>,
}

impl Scene {
    /// Projects the visible window into screen space.
    ///
    /// Tiles without a sprite are skipped; they are either empty sky or
    /// invisible colliders beneath box entities.
    #[must_use]
    pub fn from_window(window: &VisibleWindow<'_>) -> Self {
        let scroll = window.camera_position() * TILE_PIXELS;

        let tiles = window
            .tiles()
            .filter_map(|(column, row, tile)| {
                let sprite = tile.sprite()?.clone();
                let world = Vec2::new(column.get() as f32, row.get() as f32) * TILE_PIXELS;
                Some(SpriteDraw::new(sprite, world - Vec2::new(scroll, 0.0)))
            })
            .collect();

        let entities = window
            .entities()
            .iter()
            .map(|entity| {
                SpriteDraw::new(
                    entity_sprite(entity.kind),
                    entity.position - Vec2::new(scroll, 0.0),
                )
            })
            .collect();

        Self {
            scroll,
            tiles,
            entities,
        }
    }

    /// Total number of sprites in the frame.
    #[must_use]
    pub fn draw_count(&self) -> usize {
        self.tiles.len() + self.entities.len()
    }
}

/// Presentation descriptor consumed by rendering backends.
#[derive(Clone, Debug, PartialEq)]
pub struct Presentation {
    /// Title used by the created window.
    pub window_title: String,
    /// Solid color used to clear each frame.
    pub clear_color: Color,
    /// Size of the visible window in tiles.
    pub viewport: Viewport,
    /// Scene content that should be displayed.
    pub scene: Scene,
}

impl Presentation {
    /// Constructs a new presentation descriptor.
    #[must_use]
    pub fn new<T>(window_title: T, clear_color: Color, viewport: Viewport, scene: Scene) -> Self
    where
        T: Into<String>,
    {
        Self {
            window_title: window_title.into(),
            clear_color,
            viewport,
            scene,
        }
    }

    /// Window size in pixels.
    #[must_use]
    pub fn screen_size(&self) -> Vec2 {
        Vec2::new(
            self.viewport.columns() as f32,
            self.viewport.rows() as f32,
        ) * TILE_PIXELS
    }
}

/// Rendering backend capable of presenting Moodscroll scenes.
pub trait RenderingBackend {
    /// Runs the rendering backend until it is requested to exit.
    ///
    /// The provided `update_scene` closure receives the simulated frame delta
    /// and may replace the scene before it is rendered, allowing adapters to
    /// step the world once per presented frame.
    fn run<F>(self, presentation: Presentation, update_scene: F) -> AnyResult<()>
    where
        F: FnMut(Duration, &mut Scene) + 'static;
}
