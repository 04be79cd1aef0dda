//! Backend that steps the scene without opening a window.

use std::time::Duration;

use anyhow::{ensure, Result};
use glam::Vec2;
use moodscroll_core::{Viewport, TILE_SIZE};
use moodscroll_rendering::{Presentation, RenderingBackend, Scene, SpriteDraw};

/// Presents a fixed number of frames at a fixed step and optionally prints
/// the last one as text.
#[derive(Clone, Copy, Debug)]
pub(crate) struct HeadlessBackend {
    frames: u64,
    frame_time: Duration,
    snapshot: bool,
}

impl HeadlessBackend {
    pub(crate) fn new(frames: u64, snapshot: bool) -> Self {
        Self {
            frames,
            frame_time: Duration::from_secs_f64(1.0 / 60.0),
            snapshot,
        }
    }
}

impl RenderingBackend for HeadlessBackend {
    fn run<F>(self, presentation: Presentation, mut update_scene: F) -> Result<()>
    where
        F: FnMut(Duration, &mut Scene) + 'static,
    {
        ensure!(
            presentation.viewport.columns() > 0 && presentation.viewport.rows() > 0,
            "viewport must have at least one tile"
        );
        let size = presentation.screen_size();
        tracing::info!(
            title = %presentation.window_title,
            frames = self.frames,
            width = size.x,
            height = size.y,
            "presenting headless"
        );

        let mut scene = presentation.scene;
        for _ in 0..self.frames {
            update_scene(self.frame_time, &mut scene);
        }

        if self.snapshot {
            println!("{}", ascii_frame(&scene, presentation.viewport));
        }
        Ok(())
    }
}

fn glyph(draw: &SpriteDraw) -> char {
    let name = draw.sprite.as_str();
    match name {
        "sky" => ' ',
        "ground" => '#',
        "goomba" => 'g',
        "koopa" => 'k',
        "mushroom" => 'm',
        "coin" => 'o',
        "brick" => 'B',
        "coinBox" | "randomBox" | "randomBoxMushroom" => '?',
        _ if name.starts_with("pipe") => '|',
        _ if name.starts_with("bush") => '"',
        _ if name.starts_with("cloud") => '~',
        _ => '*',
    }
}

/// Renders the scene into one character per on-screen tile.
pub(crate) fn ascii_frame(scene: &Scene, viewport: Viewport) -> String {
    let columns = viewport.columns() as usize;
    let rows = viewport.rows() as usize;
    let mut cells = vec![vec![' '; columns]; rows];

    for draw in scene.tiles.iter().chain(&scene.entities) {
        let cell = (draw.position / TILE_SIZE as f32).round();
        if cell.cmplt(Vec2::ZERO).any() {
            continue;
        }
        let (column, row) = (cell.x as usize, cell.y as usize);
        if column < columns && row < rows {
            cells[row][column] = glyph(draw);
        }
    }

    cells
        .into_iter()
        .map(|row| row.into_iter().collect::<String>().trim_end().to_owned())
        .collect::<Vec<_>>()
        .join("\n")
}
