//! Capacity-bounded pools of consumable entities.
//!
//! Consumed entities are kept and handed out again on the next spawn of the
//! same kind instead of being reallocated. Every spawn and consume goes through
//! `&mut self`, so the active count moves together with the membership change.

use shared::{ConsumableKind, CoreError, EntityId, FoodState, Vec2};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq)]
pub struct ConsumableEntity {
    pub id: EntityId,
    pub kind: ConsumableKind,
    pub position: Vec2,
    pub active: bool,
}

impl ConsumableEntity {
    pub fn state(&self) -> FoodState {
        FoodState {
            id: self.id,
            kind: self.kind,
            position: self.position,
        }
    }
}

#[derive(Debug, Default)]
struct PoolSlot {
    capacity: usize,
    active_count: usize,
    free: Vec<EntityId>,
}

#[derive(Debug, Default)]
pub struct EntityPool {
    entities: Vec<ConsumableEntity>,
    slots: HashMap<ConsumableKind, PoolSlot>,
}

impl EntityPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares a kind with its maximum live population.
    pub fn register(&mut self, kind: ConsumableKind, capacity: usize) {
        self.slots.entry(kind).or_default().capacity = capacity;
    }

    pub fn capacity(&self, kind: ConsumableKind) -> usize {
        self.slots.get(&kind).map_or(0, |slot| slot.capacity)
    }

    pub fn active_count(&self, kind: ConsumableKind) -> usize {
        self.slots.get(&kind).map_or(0, |slot| slot.active_count)
    }

    /// Entities ever allocated, live or waiting for reuse.
    pub fn allocated(&self) -> usize {
        self.entities.len()
    }

    pub fn get(&self, id: EntityId) -> Option<&ConsumableEntity> {
        self.entities.get(id as usize)
    }

    pub fn active(&self) -> impl Iterator<Item = &ConsumableEntity> {
        self.entities.iter().filter(|entity| entity.active)
    }

    /// Activates one entity of `kind` at `position`, reusing a consumed one
    /// when available. Fails with `CapacityExceeded` and changes nothing when
    /// the kind is full or was never registered.
    pub fn spawn(&mut self, kind: ConsumableKind, position: Vec2) -> Result<EntityId, CoreError> {
        let slot = self.slots.entry(kind).or_default();
        if slot.active_count >= slot.capacity {
            return Err(CoreError::CapacityExceeded {
                kind,
                capacity: slot.capacity,
            });
        }

        let id = match slot.free.pop() {
            Some(id) => {
                let entity = &mut self.entities[id as usize];
                entity.position = position;
                entity.active = true;
                id
            }
            None => {
                let id = self.entities.len() as EntityId;
                self.entities.push(ConsumableEntity {
                    id,
                    kind,
                    position,
                    active: true,
                });
                id
            }
        };
        slot.active_count += 1;
        Ok(id)
    }

    /// Deactivates an entity and returns it to its pool for reuse.
    pub fn consume(&mut self, id: EntityId) -> Result<ConsumableEntity, CoreError> {
        let entity = self
            .entities
            .get_mut(id as usize)
            .filter(|entity| entity.active)
            .ok_or(CoreError::UnknownEntity { id })?;
        entity.active = false;

        let slot = self.slots.entry(entity.kind).or_default();
        slot.active_count -= 1;
        slot.free.push(id);
        Ok(entity.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pool(capacity: usize) -> EntityPool {
        let mut pool = EntityPool::new();
        pool.register(ConsumableKind::Food, capacity);
        pool
    }

    #[test]
    fn test_spawn_until_capacity() {
        let mut pool = pool(3);
        for _ in 0..3 {
            pool.spawn(ConsumableKind::Food, Vec2::ZERO).unwrap();
        }

        let result = pool.spawn(ConsumableKind::Food, Vec2::ZERO);
        assert_eq!(
            result,
            Err(CoreError::CapacityExceeded {
                kind: ConsumableKind::Food,
                capacity: 3,
            })
        );
        assert_eq!(pool.active_count(ConsumableKind::Food), 3);
        assert_eq!(pool.allocated(), 3);
    }

    #[test]
    fn test_unregistered_kind_has_no_room() {
        let mut pool = EntityPool::new();
        assert!(pool.spawn(ConsumableKind::Food, Vec2::ZERO).is_err());
        assert_eq!(pool.allocated(), 0);
    }

    #[test]
    fn test_consume_returns_entity_for_reuse() {
        let mut pool = pool(2);
        let first = pool.spawn(ConsumableKind::Food, Vec2::new(1.0, 1.0)).unwrap();
        pool.spawn(ConsumableKind::Food, Vec2::new(2.0, 2.0)).unwrap();

        let consumed = pool.consume(first).unwrap();
        assert!(!consumed.active);
        assert_eq!(pool.active_count(ConsumableKind::Food), 1);

        let reused = pool.spawn(ConsumableKind::Food, Vec2::new(3.0, 3.0)).unwrap();
        assert_eq!(reused, first);
        assert_eq!(pool.allocated(), 2);
        assert_eq!(pool.get(reused).unwrap().position, Vec2::new(3.0, 3.0));
    }

    #[test]
    fn test_double_consume_rejected() {
        let mut pool = pool(1);
        let id = pool.spawn(ConsumableKind::Food, Vec2::ZERO).unwrap();
        pool.consume(id).unwrap();

        assert_eq!(pool.consume(id), Err(CoreError::UnknownEntity { id }));
        assert_eq!(pool.active_count(ConsumableKind::Food), 0);
    }

    #[test]
    fn test_active_count_never_exceeds_capacity() {
        let mut pool = pool(5);
        let mut live = Vec::new();
        for step in 0..200u32 {
            if step % 3 == 2 {
                if let Some(id) = live.pop() {
                    pool.consume(id).unwrap();
                }
            } else if let Ok(id) = pool.spawn(ConsumableKind::Food, Vec2::ZERO) {
                live.push(id);
            }
            assert!(pool.active_count(ConsumableKind::Food) <= 5);
            assert_eq!(pool.active_count(ConsumableKind::Food), live.len());
        }
    }
}
