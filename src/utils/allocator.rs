use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Unique identifier with generation tracking to prevent stale references.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
pub struct GenerationalId {
    pub index: usize,
    pub generation: u32,
}

impl GenerationalId {
    pub fn new(index: usize, generation: u32) -> Self {
        Self { index, generation }
    }
}

/// Untyped slot identifier handed out by [`Arena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
pub struct EntityId(pub GenerationalId);

impl EntityId {
    pub fn new(index: usize, generation: u32) -> Self {
        Self(GenerationalId::new(index, generation))
    }

    pub fn index(&self) -> usize {
        self.0.index
    }

    pub fn generation(&self) -> u32 {
        self.0.generation
    }
}

/// Declares a typed, copyable handle wrapping an [`EntityId`].
macro_rules! scene_handle {
    ($(#[$meta:meta])* $name:ident, $kind:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
        pub struct $name(pub(crate) EntityId);

        impl $name {
            /// Human readable kind, used in error messages.
            pub const KIND: &'static str = $kind;

            pub fn entity(&self) -> EntityId {
                self.0
            }
        }

        impl From<EntityId> for $name {
            fn from(id: EntityId) -> Self {
                Self(id)
            }
        }
    };
}

scene_handle!(
    /// Handle to a rigid body owned by a scene.
    BodyId,
    "body"
);
scene_handle!(
    /// Handle to a kinematic joint owned by a scene.
    JointId,
    "joint"
);
scene_handle!(
    /// Handle to a spring-damper force element owned by a scene.
    SpringId,
    "spring"
);
scene_handle!(
    /// Handle to a 1-DOF shaft owned by a scene.
    ShaftId,
    "shaft"
);
scene_handle!(
    /// Handle to a shaft gear/planetary/coupling relation owned by a scene.
    RelationId,
    "shaft relation"
);

/// Generational arena that hands out stable IDs while preventing use-after-free.
#[derive(Debug, Clone)]
pub struct Arena<T> {
    items: Vec<Option<T>>,
    generations: Vec<u32>,
    free_list: VecDeque<usize>,
}

impl<T> Default for Arena<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Arena<T> {
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            generations: Vec::new(),
            free_list: VecDeque::new(),
        }
    }

    pub fn insert(&mut self, item: T) -> EntityId {
        if let Some(index) = self.free_list.pop_front() {
            let generation = self.generations[index];
            self.items[index] = Some(item);
            return EntityId::new(index, generation);
        }

        let index = self.items.len();
        self.items.push(Some(item));
        self.generations.push(0);
        EntityId::new(index, 0)
    }

    pub fn get(&self, id: EntityId) -> Option<&T> {
        if self.is_valid(id) {
            self.items.get(id.index()).and_then(|slot| slot.as_ref())
        } else {
            None
        }
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut T> {
        if self.is_valid(id) {
            self.items.get_mut(id.index()).and_then(|slot| slot.as_mut())
        } else {
            None
        }
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.get(id).is_some()
    }

    /// Removes the item; the slot's generation is bumped so old ids go stale.
    pub fn remove(&mut self, id: EntityId) -> Option<T> {
        if !self.is_valid(id) {
            return None;
        }
        let slot = self.items.get_mut(id.index())?;
        let item = slot.take();
        if item.is_some() {
            self.generations[id.index()] = self.generations[id.index()].wrapping_add(1);
            self.free_list.push_back(id.index());
        }
        item
    }

    pub fn iter(&self) -> impl Iterator<Item = (EntityId, &T)> + '_ {
        self.items.iter().enumerate().filter_map(|(index, slot)| {
            slot.as_ref()
                .map(|item| (EntityId::new(index, self.generations[index]), item))
        })
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (EntityId, &mut T)> + '_ {
        let generations = &self.generations;
        self.items
            .iter_mut()
            .enumerate()
            .filter_map(move |(index, slot)| {
                slot.as_mut()
                    .map(|item| (EntityId::new(index, generations[index]), item))
            })
    }

    pub fn ids(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.iter().map(|(id, _)| id)
    }

    pub fn len(&self) -> usize {
        self.items.iter().filter(|slot| slot.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn is_valid(&self, id: EntityId) -> bool {
        self.generations
            .get(id.index())
            .copied()
            .map(|gen| gen == id.generation())
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn removed_ids_go_stale_when_slot_is_reused() {
        let mut arena = Arena::new();
        let first = arena.insert("knuckle");
        assert_eq!(arena.remove(first), Some("knuckle"));

        let second = arena.insert("upright");
        assert_eq!(first.index(), second.index());
        assert_ne!(first.generation(), second.generation());
        assert!(arena.get(first).is_none());
        assert_eq!(arena.get(second), Some(&"upright"));
        assert!(arena.remove(first).is_none());
        assert_eq!(arena.len(), 1);
    }

    #[test]
    fn typed_handles_wrap_entity_ids() {
        let mut arena = Arena::new();
        let body = BodyId::from(arena.insert(1.0_f32));
        assert_eq!(BodyId::KIND, "body");
        assert!(arena.contains(body.entity()));
    }
}
