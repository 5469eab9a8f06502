//! Deferred gameplay events.
//!
//! Entities only ever *report* contacts here while they tick. The world drains
//! the queue at the start of the next tick and applies the consequences, so
//! nothing is damaged or destroyed while the entity pass is iterating.

use crate::entity::{EntityId, EntityType};
use crate::math::WorldCoordinate;
use std::collections::VecDeque;

/// Blast description. Queued like any other event but not resolved yet.
#[derive(Debug, Clone, PartialEq)]
pub struct Explosion {
    pub center: WorldCoordinate,
    pub power: i32,
    pub blast_radius: f64,
    pub min_damage: i32,
    pub hits: Vec<(EntityId, EntityType)>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    ProjectileHit {
        projectile: EntityId,
        target: EntityId,
    },
    Explosion(Explosion),
}

/// FIFO of pending events
#[derive(Debug, Default)]
pub struct EventQueue {
    pending: VecDeque<GameEvent>,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: GameEvent) {
        self.pending.push_back(event);
    }

    pub fn pop(&mut self) -> Option<GameEvent> {
        self.pending.pop_front()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &GameEvent> {
        self.pending.iter()
    }
}
