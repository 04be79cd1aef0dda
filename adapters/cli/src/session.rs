//! Headless frame loop tying the world, the extension system, and the sampler together.

use std::{collections::BTreeMap, fmt};

use moodscroll_core::{Command, Event};
use moodscroll_system_emotion::{EmotionSampler, TickOutcome, Vision};
use moodscroll_system_extension::Extension;
use moodscroll_world::{self as world, query, World};

/// Owns every piece of simulation state for one run.
pub(crate) struct Session<V: Vision> {
    world: World,
    extension: Extension,
    sampler: EmotionSampler<V>,
    scroll_speed: f32,
    stats: SessionStats,
    events: Vec<Event>,
    commands: Vec<Command>,
}

impl<V: Vision> Session<V> {
    pub(crate) fn new(
        world: World,
        extension: Extension,
        sampler: EmotionSampler<V>,
        scroll_speed: f32,
    ) -> Self {
        let stats = SessionStats::new(query::level_length(&world));
        Self {
            world,
            extension,
            sampler,
            scroll_speed,
            stats,
            events: Vec::new(),
            commands: Vec::new(),
        }
    }

    pub(crate) fn world(&self) -> &World {
        &self.world
    }

    pub(crate) fn stats(&self) -> &SessionStats {
        &self.stats
    }

    /// Runs one frame: scroll, simulate, grow the level, then kick the sampler.
    pub(crate) fn step(&mut self) {
        self.events.clear();
        world::apply(
            &mut self.world,
            Command::AdvanceCamera {
                delta: self.scroll_speed,
            },
            &mut self.events,
        );
        world::apply(&mut self.world, Command::Tick, &mut self.events);

        self.extension
            .handle(&self.world, &self.sampler, &mut self.commands);
        for command in self.commands.drain(..) {
            world::apply(&mut self.world, command, &mut self.events);
        }

        if self.sampler.tick() == TickOutcome::Launched {
            self.stats.captures += 1;
        }
        self.stats.record(&self.events);
        self.stats.length = query::level_length(&self.world);
        self.stats.entities = query::entities(&self.world).len();
    }
}

/// Running totals reported when the session ends.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct SessionStats {
    pub(crate) frames: u64,
    pub(crate) initial_length: u32,
    pub(crate) length: u32,
    pub(crate) entities: usize,
    pub(crate) spawned: BTreeMap<String, usize>,
    pub(crate) rejected: usize,
    pub(crate) died: usize,
    pub(crate) captures: usize,
}

impl SessionStats {
    fn new(initial_length: u32) -> Self {
        Self {
            initial_length,
            length: initial_length,
            ..Self::default()
        }
    }

    fn record(&mut self, events: &[Event]) {
        for event in events {
            match event {
                Event::TimeAdvanced { frame } => self.frames = *frame,
                Event::EntitySpawned { kind, .. } => {
                    *self.spawned.entry(format!("{kind:?}")).or_default() += 1;
                }
                Event::SpawnRejected { .. } => self.rejected += 1,
                Event::EntityDied { .. } => self.died += 1,
                _ => {}
            }
        }
    }

    pub(crate) fn total_spawned(&self) -> usize {
        self.spawned.values().sum()
    }
}

impl fmt::Display for SessionStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "frames simulated: {}", self.frames)?;
        writeln!(
            f,
            "level length: {} columns (started at {})",
            self.length, self.initial_length
        )?;
        writeln!(f, "live entities: {}", self.entities)?;
        writeln!(
            f,
            "mood spawns: {} ({} rejected)",
            self.total_spawned(),
            self.rejected
        )?;
        for (kind, count) in &self.spawned {
            writeln!(f, "  {kind}: {count}")?;
        }
        writeln!(f, "entities lost: {}", self.died)?;
        write!(f, "emotion captures: {}", self.captures)
    }
}
