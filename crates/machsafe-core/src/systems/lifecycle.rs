//! Deferred entity deletion.
//!
//! Systems can't despawn while iterating a query, so deletions are queued
//! and flushed by the engine once the tick's systems have run.

use crate::components::Terminating;
use hecs::{Entity, World};

/// Entities waiting to be despawned at the end of the tick
#[derive(Debug, Clone, Default)]
pub struct DeletionQueue {
    pending: Vec<Entity>,
}

impl DeletionQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `entity` as terminating and queue it.
    ///
    /// Returns false for entities that no longer exist or are already
    /// terminating, so nothing is ever deleted twice.
    pub fn queue_delete(&mut self, world: &mut World, entity: Entity) -> bool {
        if !world.contains(entity) || is_terminating(world, entity) {
            return false;
        }
        if world.insert_one(entity, Terminating).is_err() {
            return false;
        }
        self.pending.push(entity);
        true
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Despawn everything queued. Returns how many entities were removed.
    pub fn flush(&mut self, world: &mut World) -> usize {
        self.pending
            .drain(..)
            .filter(|entity| world.despawn(*entity).is_ok())
            .count()
    }
}

/// Entity is queued for deletion this tick.
pub fn is_terminating(world: &World, entity: Entity) -> bool {
    world.get::<&Terminating>(entity).is_ok()
}
