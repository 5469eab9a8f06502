//! Owning, insertion-ordered entity storage.
//!
//! Slots are `Option<Entity>` so an entity can be taken out while it ticks and
//! so destruction during a pass leaves a hole instead of shifting indices.
//! `compact` closes the holes once the pass is over.

use super::{Entity, EntityId};
use std::collections::HashMap;

#[derive(Debug, Default)]
pub struct EntityStore {
    slots: Vec<Option<Entity>>,
    index: HashMap<EntityId, usize>,
}

impl EntityStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entity: Entity) {
        self.index.insert(entity.id(), self.slots.len());
        self.slots.push(Some(entity));
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.get(id).is_some()
    }

    /// `None` for unknown ids and for the entity currently taken out
    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        let slot = *self.index.get(&id)?;
        self.slots.get(slot)?.as_ref()
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        let slot = *self.index.get(&id)?;
        self.slots.get_mut(slot)?.as_mut()
    }

    /// Number of slots, holes included
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    pub fn slot(&self, slot: usize) -> Option<&Entity> {
        self.slots.get(slot)?.as_ref()
    }

    pub(crate) fn take(&mut self, slot: usize) -> Option<Entity> {
        self.slots.get_mut(slot)?.take()
    }

    pub(crate) fn restore(&mut self, slot: usize, entity: Entity) {
        self.slots[slot] = Some(entity);
    }

    /// Removes the entity for good and forgets its id
    pub(crate) fn remove(&mut self, id: EntityId) -> Option<Entity> {
        let slot = self.index.remove(&id)?;
        self.slots.get_mut(slot)?.take()
    }

    /// Drops empty slots and rebuilds the id index
    pub(crate) fn compact(&mut self) {
        if self.slots.iter().all(Option::is_some) {
            return;
        }
        self.slots.retain(Option::is_some);
        self.index.clear();
        for (slot, entity) in self.slots.iter().enumerate() {
            if let Some(entity) = entity {
                self.index.insert(entity.id(), slot);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Live entities in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.slots.iter().flatten()
    }
}
