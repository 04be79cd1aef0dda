#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that runs a headless Moodscroll session.

mod backend;
mod config;
mod session;
mod vision;

use std::{cell::RefCell, fs, path::PathBuf, rc::Rc};

use anyhow::{Context, Result};
use clap::Parser;
use moodscroll_core::{EmotionLabel, LevelDescription};
use moodscroll_rendering::{Color, Presentation, RenderingBackend, Scene};
use moodscroll_system_emotion::{Config as SamplerConfig, EmotionSampler};
use moodscroll_system_extension::{Config as ExtensionConfig, Extension, SpawnTable};
use moodscroll_world::{query, Config as WorldConfig, LevelGrid, World};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::{
    backend::HeadlessBackend, config::SessionConfig, session::Session, vision::ScriptedVision,
};

const FLAT_LEVEL_COLUMNS: u32 = 60;
const FLAT_LEVEL_GROUND_ROWS: u32 = 2;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Level description in JSON. A flat level is generated when omitted.
    #[arg(short, long)]
    level: Option<PathBuf>,

    /// Session settings in TOML.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Frames to simulate.
    #[arg(long)]
    frames: Option<u64>,

    /// Columns the camera scrolls per frame.
    #[arg(long)]
    scroll_speed: Option<f32>,

    /// Frames between emotion captures.
    #[arg(long)]
    capture_interval: Option<u64>,

    /// Mood reported by the scripted camera. Repeat to cycle through several.
    #[arg(long = "mood")]
    moods: Vec<EmotionLabel>,

    /// Run without a camera so every mood read falls back to neutral.
    #[arg(long)]
    no_camera: bool,

    /// Print the final visible window as text.
    #[arg(long)]
    snapshot: bool,
}

impl Args {
    fn session_config(&self) -> Result<SessionConfig> {
        let mut config = match &self.config {
            Some(path) => SessionConfig::load(path)?,
            None => SessionConfig::default(),
        };
        if let Some(frames) = self.frames {
            config.frames = frames;
        }
        if let Some(scroll_speed) = self.scroll_speed {
            config.scroll_speed = scroll_speed;
        }
        if let Some(capture_interval) = self.capture_interval {
            config.capture_interval = capture_interval;
        }
        if !self.moods.is_empty() {
            config.moods = self.moods.clone();
        }
        if self.no_camera {
            config.camera = false;
        }
        config.validate()?;
        Ok(config)
    }
}

fn load_world(level: Option<&PathBuf>, config: &SessionConfig) -> Result<World> {
    let world_config = WorldConfig::new(config.viewport(), config.seed);
    let Some(path) = level else {
        let grid = LevelGrid::flat(
            FLAT_LEVEL_COLUMNS,
            config.viewport_rows,
            FLAT_LEVEL_GROUND_ROWS.min(config.viewport_rows),
        );
        return Ok(World::with_grid(grid, world_config));
    };

    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read level at {}", path.display()))?;
    let description: LevelDescription = serde_json::from_str(&contents)
        .with_context(|| format!("failed to parse level json at {}", path.display()))?;
    World::from_description(&description, world_config)
        .with_context(|| format!("failed to build level from {}", path.display()))
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "moodscroll=info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();
    let config = args.session_config()?;
    let world = load_world(args.level.as_ref(), &config)?;
    tracing::info!(
        length = query::level_length(&world),
        frames = config.frames,
        camera = config.camera,
        "starting session"
    );

    let vision = if config.camera {
        ScriptedVision::new(config.moods.clone())
    } else {
        ScriptedVision::detached()
    };
    let session = Rc::new(RefCell::new(Session::new(
        world,
        Extension::new(ExtensionConfig::new(config.spawn_every, SpawnTable::default())),
        EmotionSampler::new(vision, SamplerConfig::new(config.capture_interval)),
        config.scroll_speed,
    )));

    let scene = Scene::from_window(&query::visible_window(session.borrow().world()));
    let presentation = Presentation::new("Moodscroll", Color::SKY, config.viewport(), scene);
    let driver = Rc::clone(&session);
    HeadlessBackend::new(config.frames, args.snapshot).run(presentation, move |_, scene| {
        let mut session = driver.borrow_mut();
        session.step();
        *scene = Scene::from_window(&query::visible_window(session.world()));
    })?;

    println!("{}", session.borrow().stats());
    Ok(())
}
