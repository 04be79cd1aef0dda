//! Materializes a declarative level description into a grid and entity placements.

use moodscroll_core::{EntityKind, LayerRange, LevelDescription, PixelRect, SpriteKey, Tile};
use thiserror::Error;

use crate::grid::LevelGrid;

/// Extra body segments drawn below a pipe head beyond its declared length.
const PIPE_BODY_OVERSHOOT: u32 = 20;

/// Reasons a level description cannot be turned into a grid.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum LevelError {
    /// A layer range ends before it starts.
    #[error("{layer} layer range {start}..{end} is inverted")]
    InvertedRange {
        /// Layer and axis that failed validation.
        layer: &'static str,
        /// First index of the range.
        start: u32,
        /// One past the last index of the range.
        end: u32,
    },
    /// The layers describe a grid without rows or columns.
    #[error("level grid has no tiles")]
    EmptyGrid,
    /// A row does not have the same number of columns as the first row.
    #[error("row {row} holds {found} tiles, expected {expected}")]
    Ragged {
        /// Index of the offending row.
        row: usize,
        /// Column count of the first row.
        expected: usize,
        /// Column count of the offending row.
        found: usize,
    },
}

/// Entity placement extracted from a level description.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Placement {
    pub(crate) kind: EntityKind,
    pub(crate) column: u32,
    pub(crate) row: u32,
}

/// Builds the grid and the in-bounds entity placements of a level.
pub(crate) fn build(
    description: &LevelDescription,
) -> Result<(LevelGrid, Vec<Placement>), LevelError> {
    let layers = &description.level.layers;
    validate(&layers.sky, "sky")?;
    validate(&layers.ground, "ground")?;

    let columns = layers.sky.columns().len() as u32;
    let sky_rows = layers.sky.rows().len() as u32;
    let ground_rows = layers.ground.rows().len() as u32;

    let rows = (0..sky_rows + ground_rows)
        .map(|row| {
            (0..columns)
                .map(|column| {
                    if row < sky_rows {
                        Tile::sky()
                    } else {
                        Tile::ground(column, row)
                    }
                })
                .collect()
        })
        .collect();
    let mut grid = LevelGrid::from_rows(rows, ground_rows)?;

    place_objects(&mut grid, description);
    let placements = place_entities(&mut grid, description);
    Ok((grid, placements))
}

fn validate(range: &LayerRange, layer: &'static str) -> Result<(), LevelError> {
    for [start, end] in [range.x, range.y] {
        if start > end {
            return Err(LevelError::InvertedRange { layer, start, end });
        }
    }
    Ok(())
}

/// Writes the tile built by `tile` when the cell exists. Offsets that
/// overflowed arrive as `None` and are skipped like any other outside cell.
fn place<F>(grid: &mut LevelGrid, column: Option<u32>, row: Option<u32>, tile: F) -> bool
where
    F: FnOnce(u32, u32) -> Tile,
{
    let (Some(column), Some(row)) = (column, row) else {
        return false;
    };
    if !grid.contains(column, row) {
        return false;
    }
    grid.set(column, row, tile(column, row));
    true
}

fn decoration(name: String) -> impl FnOnce(u32, u32) -> Tile {
    move |_, _| Tile::new(Some(SpriteKey::new(name)), None)
}

fn solid_sprite(name: &'static str) -> impl FnOnce(u32, u32) -> Tile {
    move |column, row| {
        Tile::new(
            Some(SpriteKey::from_static(name)),
            Some(PixelRect::for_cell(column, row)),
        )
    }
}

fn place_objects(grid: &mut LevelGrid, description: &LevelDescription) {
    let objects = &description.level.objects;

    for &(x, y) in &objects.bush {
        for offset in 0..3 {
            let tile = decoration(format!("bush_{}", offset + 1));
            let _ = place(grid, x.checked_add(offset), Some(y), tile);
        }
    }

    for &(x, y) in &objects.cloud {
        for y_offset in 0..2 {
            for x_offset in 0..3 {
                let tile = decoration(format!("cloud{}_{}", y_offset + 1, x_offset + 1));
                let _ = place(grid, x.checked_add(x_offset), y.checked_add(y_offset), tile);
            }
        }
    }

    for &(x, y, length) in &objects.pipe {
        let right = x.checked_add(1);
        let _ = place(grid, Some(x), Some(y), solid_sprite("pipeL"));
        let _ = place(grid, right, Some(y), solid_sprite("pipeR"));
        for segment in 1..length.saturating_add(PIPE_BODY_OVERSHOOT) {
            let Some(row) = y.checked_add(segment).filter(|row| *row < grid.row_count()) else {
                break;
            };
            let _ = place(grid, Some(x), Some(row), solid_sprite("pipe2L"));
            let _ = place(grid, right, Some(row), solid_sprite("pipe2R"));
        }
    }

    for &(x, y) in &objects.sky {
        let _ = place(grid, Some(x), Some(y), |_, _| Tile::sky());
    }

    for &(x, y) in &objects.ground {
        let _ = place(grid, Some(x), Some(y), Tile::ground);
    }
}

fn place_entities(grid: &mut LevelGrid, description: &LevelDescription) -> Vec<Placement> {
    let entities = &description.level.entities;
    let groups = [
        (EntityKind::CoinBox, &entities.coin_box),
        (EntityKind::Goomba, &entities.goomba),
        (EntityKind::Koopa, &entities.koopa),
        (EntityKind::Coin, &entities.coin),
        (EntityKind::CoinBrick, &entities.coin_brick),
    ];

    let listed = groups
        .into_iter()
        .flat_map(|(kind, cells)| cells.iter().map(move |&(column, row)| (kind, column, row)))
        .chain(
            entities
                .random_box
                .iter()
                .map(|&(column, row, item)| (EntityKind::RandomBox { item }, column, row)),
        );

    let mut placements = Vec::new();
    for (kind, column, row) in listed {
        if !grid.contains(column, row) {
            tracing::warn!(?kind, column, row, "skipping entity placed outside the level");
            continue;
        }
        if kind.occupies_tile() {
            grid.set(column, row, Tile::solid(column, row));
        }
        placements.push(Placement { kind, column, row });
    }
    placements
}

#[cfg(test)]
mod tests {
    use super::*;
    use moodscroll_core::{BoxItem, EntityPlacements, LevelLayout, Layers, ObjectPlacements};

    fn description(objects: ObjectPlacements, entities: EntityPlacements) -> LevelDescription {
        LevelDescription {
            level: LevelLayout {
                layers: Layers {
                    sky: LayerRange {
                        x: [0, 12],
                        y: [0, 13],
                    },
                    ground: LayerRange {
                        x: [0, 12],
                        y: [14, 16],
                    },
                },
                objects,
                entities,
            },
            length: 0,
        }
    }

    #[test]
    fn layers_stack_sky_over_ground() {
        let (grid, placements) =
            build(&description(ObjectPlacements::default(), EntityPlacements::default()))
                .expect("valid level");
        assert_eq!(grid.length(), 12);
        assert_eq!(grid.row_count(), 15);
        assert_eq!(grid.ground_rows(), 2);
        assert!(!grid.get(0, 12).is_solid());
        assert_eq!(grid.get(5, 13), &Tile::ground(5, 13));
        assert!(placements.is_empty());
    }

    #[test]
    fn inverted_range_is_rejected() {
        let mut level = description(ObjectPlacements::default(), EntityPlacements::default());
        level.level.layers.ground.y = [16, 14];
        assert_eq!(
            build(&level).map(|_| ()),
            Err(LevelError::InvertedRange {
                layer: "ground",
                start: 16,
                end: 14
            })
        );
    }

    #[test]
    fn pipes_are_solid_down_to_the_bottom_and_clip_at_edges() {
        let objects = ObjectPlacements {
            pipe: vec![(11, 10, 2)],
            ..ObjectPlacements::default()
        };
        let (grid, _) = build(&description(objects, EntityPlacements::default()))
            .expect("valid level");

        assert_eq!(
            grid.get(11, 10).sprite(),
            Some(&SpriteKey::from_static("pipeL"))
        );
        assert!(grid.get(11, 14).is_solid());
        assert_eq!(
            grid.get(11, 14).sprite(),
            Some(&SpriteKey::from_static("pipe2L"))
        );
        assert!(grid.is_rectangular());
        assert_eq!(grid.length(), 12);
    }

    #[test]
    fn decorations_do_not_collide() {
        let objects = ObjectPlacements {
            bush: vec![(1, 12)],
            cloud: vec![(4, 2)],
            ..ObjectPlacements::default()
        };
        let (grid, _) = build(&description(objects, EntityPlacements::default()))
            .expect("valid level");

        assert_eq!(
            grid.get(3, 12).sprite(),
            Some(&SpriteKey::from_static("bush_3"))
        );
        assert_eq!(
            grid.get(6, 3).sprite(),
            Some(&SpriteKey::from_static("cloud2_3"))
        );
        assert!(!grid.get(6, 3).is_solid());
    }

    #[test]
    fn sky_override_opens_a_pit() {
        let objects = ObjectPlacements {
            sky: vec![(3, 13), (3, 14)],
            ..ObjectPlacements::default()
        };
        let (grid, _) = build(&description(objects, EntityPlacements::default()))
            .expect("valid level");
        assert!(!grid.get(3, 13).is_solid());
        assert!(!grid.get(3, 14).is_solid());
    }

    #[test]
    fn coordinates_at_the_integer_limit_are_skipped() {
        let objects = ObjectPlacements {
            bush: vec![(u32::MAX, 12), (u32::MAX - 1, 12)],
            cloud: vec![(u32::MAX, u32::MAX)],
            pipe: vec![(u32::MAX, 10, u32::MAX), (11, u32::MAX, 2)],
            sky: vec![(u32::MAX, 0)],
            ground: vec![(200_000_000, 9), (u32::MAX, u32::MAX)],
        };
        let entities = EntityPlacements {
            coin_box: vec![(u32::MAX, u32::MAX)],
            ..EntityPlacements::default()
        };
        let (grid, placements) = build(&description(objects, entities)).expect("valid level");

        assert_eq!(
            grid,
            build(&description(ObjectPlacements::default(), EntityPlacements::default()))
                .expect("valid level")
                .0
        );
        assert!(placements.is_empty());
    }

    #[test]
    fn bush_straddling_the_right_edge_is_clipped() {
        let objects = ObjectPlacements {
            bush: vec![(10, 12)],
            ..ObjectPlacements::default()
        };
        let (grid, _) = build(&description(objects, EntityPlacements::default()))
            .expect("valid level");

        assert_eq!(
            grid.get(11, 12).sprite(),
            Some(&SpriteKey::from_static("bush_2"))
        );
        assert!(grid.is_rectangular());
        assert_eq!(grid.length(), 12);
    }

    #[test]
    fn boxes_become_solid_and_out_of_bounds_entities_are_skipped() {
        let entities = EntityPlacements {
            random_box: vec![(4, 9, BoxItem::Coin)],
            goomba: vec![(6, 12), (40, 12)],
            ..EntityPlacements::default()
        };
        let (grid, placements) = build(&description(ObjectPlacements::default(), entities))
            .expect("valid level");

        assert_eq!(grid.get(4, 9), &Tile::solid(4, 9));
        assert_eq!(
            placements,
            vec![
                Placement {
                    kind: EntityKind::Goomba,
                    column: 6,
                    row: 12
                },
                Placement {
                    kind: EntityKind::RandomBox {
                        item: BoxItem::Coin
                    },
                    column: 4,
                    row: 9
                },
            ]
        );
    }
}
