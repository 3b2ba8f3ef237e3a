use bevy_ecs::prelude::{Entity, Resource};
use rustc_hash::FxHashMap;

/// Id allocation and lookup for scene items.
///
/// Ids are handed out in increasing order and never reused, so a stale id
/// held by the host simply stops resolving once its item is gone.
#[derive(Resource, Debug, Default)]
pub struct ItemRegistry {
    next_id: u32,
    last_spawned: Option<u32>,
    entities: FxHashMap<u32, Entity>,
}

impl ItemRegistry {
    pub fn allocate(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub fn insert(&mut self, id: u32, entity: Entity) {
        self.entities.insert(id, entity);
        self.last_spawned = Some(id);
    }

    pub fn remove(&mut self, id: u32) -> Option<Entity> {
        self.entities.remove(&id)
    }

    pub fn get(&self, id: u32) -> Option<Entity> {
        self.entities.get(&id).copied()
    }

    /// Id of the most recently spawned item.
    pub fn last_spawned(&self) -> Option<u32> {
        self.last_spawned
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Forget every item; returns their entities.
    pub fn drain(&mut self) -> Vec<(u32, Entity)> {
        let mut items: Vec<_> = self.entities.drain().collect();
        items.sort_by_key(|(id, _)| *id);
        items
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_not_reused() {
        let mut registry = ItemRegistry::default();
        let a = registry.allocate();
        registry.insert(a, Entity::PLACEHOLDER);
        assert_eq!(registry.remove(a), Some(Entity::PLACEHOLDER));
        let b = registry.allocate();
        assert_ne!(a, b);
        assert_eq!(registry.get(a), None);
        assert_eq!(registry.last_spawned(), Some(a));
    }
}
