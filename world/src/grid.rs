//! Rectangular, row-major tile storage that only ever grows to the right.

use std::ops::RangeInclusive;

use moodscroll_core::{PixelRect, Tile, TILE_SIZE};

use crate::LevelError;

/// Rectangular collection of tiles addressed by column and row.
///
/// Every row holds the same number of tiles at every observable point. The
/// grid only grows by appending whole columns on the right edge.
#[derive(Clone, Debug, PartialEq)]
pub struct LevelGrid {
    rows: Vec<Vec<Tile>>,
    ground_rows: u32,
}

impl LevelGrid {
    /// Creates a grid of the provided size with sky above `ground_rows` of ground.
    ///
    /// # Panics
    ///
    /// Panics when `rows` is zero, since a grid without rows can never grow.
    #[must_use]
    pub fn flat(columns: u32, rows: u32, ground_rows: u32) -> Self {
        assert!(rows > 0, "flat level grid needs at least one row");
        let mut grid = Self {
            rows: vec![Vec::new(); rows as usize],
            ground_rows: ground_rows.min(rows),
        };
        grid.extend(columns);
        grid
    }

    /// Wraps pre-built rows, validating that they form a rectangle.
    ///
    /// `ground_rows` controls how many bottom rows receive ground tiles when
    /// the grid is later extended.
    pub fn from_rows(rows: Vec<Vec<Tile>>, ground_rows: u32) -> Result<Self, LevelError> {
        let Some(expected) = rows.first().map(Vec::len) else {
            return Err(LevelError::EmptyGrid);
        };
        if expected == 0 {
            return Err(LevelError::EmptyGrid);
        }
        if let Some((row, found)) = rows
            .iter()
            .map(Vec::len)
            .enumerate()
            .find(|(_, len)| *len != expected)
        {
            return Err(LevelError::Ragged {
                row,
                expected,
                found,
            });
        }

        let row_count = rows.len() as u32;
        Ok(Self {
            rows,
            ground_rows: ground_rows.min(row_count),
        })
    }

    /// Number of columns, which is the level length.
    #[must_use]
    pub fn length(&self) -> u32 {
        self.rows.first().map_or(0, |row| row.len() as u32)
    }

    /// Number of rows.
    #[must_use]
    pub fn row_count(&self) -> u32 {
        self.rows.len() as u32
    }

    /// Number of bottom rows filled with ground by [`LevelGrid::extend`].
    #[must_use]
    pub const fn ground_rows(&self) -> u32 {
        self.ground_rows
    }

    /// Reports whether the cell lies inside the grid.
    #[must_use]
    pub fn contains(&self, column: u32, row: u32) -> bool {
        column < self.length() && row < self.row_count()
    }

    /// Tile stored at the cell, or `None` outside the grid.
    #[must_use]
    pub fn try_get(&self, column: u32, row: u32) -> Option<&Tile> {
        self.rows.get(row as usize)?.get(column as usize)
    }

    /// Tile stored at the cell.
    ///
    /// # Panics
    ///
    /// Panics when the cell lies outside the grid. Callers bounds-check first.
    #[must_use]
    pub fn get(&self, column: u32, row: u32) -> &Tile {
        match self.try_get(column, row) {
            Some(tile) => tile,
            None => panic!(
                "tile ({column}, {row}) read outside {}x{} grid",
                self.length(),
                self.row_count()
            ),
        }
    }

    /// Replaces the tile stored at the cell.
    ///
    /// # Panics
    ///
    /// Panics when the cell lies outside the grid. Callers bounds-check first.
    pub fn set(&mut self, column: u32, row: u32, tile: Tile) {
        let (length, row_count) = (self.length(), self.row_count());
        match self
            .rows
            .get_mut(row as usize)
            .and_then(|cells| cells.get_mut(column as usize))
        {
            Some(slot) => *slot = tile,
            None => panic!("tile ({column}, {row}) written outside {length}x{row_count} grid"),
        }
    }

    /// Appends `columns` new columns of sky over ground to the right edge.
    pub fn extend(&mut self, columns: u32) {
        let start = self.length();
        let sky_rows = self.row_count() - self.ground_rows;
        for (row_index, row) in self.rows.iter_mut().enumerate() {
            let row_index = row_index as u32;
            row.reserve(columns as usize);
            for column in start..start + columns {
                let tile = if row_index < sky_rows {
                    Tile::sky()
                } else {
                    Tile::ground(column, row_index)
                };
                row.push(tile);
            }
        }
    }

    /// Reports whether every row has the same number of columns.
    #[must_use]
    pub fn is_rectangular(&self) -> bool {
        let length = self.length() as usize;
        self.rows.iter().all(|row| row.len() == length)
    }

    /// Colliders of the solid tiles in the cells spanned by the pixel box.
    pub(crate) fn colliders_within(
        &self,
        left: f32,
        top: f32,
        right: f32,
        bottom: f32,
    ) -> impl Iterator<Item = PixelRect> + '_ {
        let columns = cell_span(left, right, self.length());
        let rows = cell_span(top, bottom, self.row_count());
        rows.into_iter()
            .flatten()
            .flat_map(move |row| {
                columns
                    .clone()
                    .into_iter()
                    .flatten()
                    .map(move |column| (column, row))
            })
            .filter_map(|(column, row)| self.try_get(column, row)?.collider())
    }
}

/// Index of the cell containing the pixel coordinate. Negative above or left of the grid.
#[must_use]
pub(crate) fn cell_index(pixel: f32) -> i64 {
    (pixel / TILE_SIZE as f32).floor() as i64
}

fn cell_span(start: f32, end: f32, limit: u32) -> Option<RangeInclusive<u32>> {
    if limit == 0 {
        return None;
    }
    let first = cell_index(start).max(0);
    let last = ((end / TILE_SIZE as f32).ceil() as i64 - 1).min(i64::from(limit) - 1);
    if first > last {
        return None;
    }
    Some(first as u32..=last as u32)
}
