//! Ownership of live entities and the two-phase update/reap cycle.

use moodscroll_core::{EntityId, EntityKind, Event, Viewport};

use crate::{
    camera::Camera,
    entity::{Behavior, Entity, Heading, PatrolTrait, Physics},
    grid::LevelGrid,
};

/// Owns every live entity and drives their per-frame behaviour.
#[derive(Clone, Debug)]
pub struct EntityRegistry {
    entities: Vec<Entity>,
    next_id: u32,
    physics: Physics,
    patrol_speed: f32,
}

impl EntityRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new(physics: Physics, patrol_speed: f32) -> Self {
        Self {
            entities: Vec::new(),
            next_id: 0,
            physics,
            patrol_speed,
        }
    }

    /// Number of entities currently owned, including ones marked dead this frame.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Reports whether the registry owns no entities.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Iterator over the owned entities in spawn order.
    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.entities.iter()
    }

    /// Creates an entity anchored at the cell and returns its identifier.
    ///
    /// Patrolling kinds start walking in `heading`; other kinds ignore it.
    pub fn spawn(&mut self, kind: EntityKind, column: u32, row: u32, heading: Heading) -> EntityId {
        let id = EntityId::new(self.next_id);
        self.next_id = self.next_id.saturating_add(1);
        let behavior = if kind.patrols() {
            Behavior::Patrol(PatrolTrait::new(heading, self.patrol_speed))
        } else {
            Behavior::Static
        };
        self.entities
            .push(Entity::new(id, kind, column, row, behavior));
        id
    }

    /// Runs every entity's behaviour once, then removes the ones that died.
    ///
    /// Entities that come within one viewport of the right edge of the screen
    /// are activated first. Death only marks an entity during the pass; the
    /// collection is not shortened until every entity has been updated.
    /// Returns the number of reaped entities.
    pub fn update(
        &mut self,
        grid: &LevelGrid,
        camera: &Camera,
        viewport: Viewport,
        out_events: &mut Vec<Event>,
    ) -> usize {
        let activation_edge =
            camera.position().floor() as i64 + 2 * i64::from(viewport.columns());
        for entity in &mut self.entities {
            if !entity.is_active() && entity.column() <= activation_edge {
                entity.activate();
            }
            let was_alive = entity.is_alive();
            entity.update(grid, self.physics);
            if was_alive && !entity.is_alive() {
                out_events.push(Event::EntityDied { entity: entity.id() });
            }
        }

        self.reap(out_events)
    }

    fn reap(&mut self, out_events: &mut Vec<Event>) -> usize {
        let before = self.entities.len();
        self.entities.retain(Entity::is_alive);
        let count = before - self.entities.len();
        if count > 0 {
            tracing::debug!(count, remaining = self.entities.len(), "reaped dead entities");
            out_events.push(Event::EntitiesReaped { count });
        }
        count
    }
}
