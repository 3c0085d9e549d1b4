use std::sync::{Arc, Mutex, RwLock};

use log::trace;

use crate::entity::runtime::EntityRuntime;

/// Generation-checked reference to an entity slot. A handle held across a
/// despawn resolves to `None` instead of aliasing whatever reuses the slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct EntityHandle {
    index: u32,
    generation: u32,
}

impl EntityHandle {
    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }
}

struct Slot {
    generation: u32,
    entity: Option<Arc<Mutex<EntityRuntime>>>,
}

/// Slot-map storage for the live entity tree. Each entity sits behind its
/// own mutex so tasks lock exactly the entity they work on.
pub struct EntityArena {
    slots: RwLock<Vec<Slot>>,
    free: Mutex<Vec<u32>>,
}

impl EntityArena {
    pub fn new() -> Self {
        EntityArena {
            slots: RwLock::new(Vec::new()),
            free: Mutex::new(Vec::new()),
        }
    }

    /// Insert an entity built by `build`, which receives the handle the
    /// entity will live under so it can store it on itself.
    pub fn insert(&self, build: impl FnOnce(EntityHandle) -> EntityRuntime) -> EntityHandle {
        let mut slots = self.slots.write().expect("arena slots poisoned");
        let index = self.free.lock().expect("arena free list poisoned").pop();
        match index {
            Some(index) => {
                let slot = &mut slots[index as usize];
                let handle = EntityHandle {
                    index,
                    generation: slot.generation,
                };
                slot.entity = Some(Arc::new(Mutex::new(build(handle))));
                handle
            }
            None => {
                let handle = EntityHandle {
                    index: slots.len() as u32,
                    generation: 0,
                };
                slots.push(Slot {
                    generation: 0,
                    entity: Some(Arc::new(Mutex::new(build(handle)))),
                });
                handle
            }
        }
    }

    /// Look up a live entity. Stale handles (slot freed or reused) yield
    /// `None`.
    pub fn resolve(&self, handle: EntityHandle) -> Option<Arc<Mutex<EntityRuntime>>> {
        let slots = self.slots.read().expect("arena slots poisoned");
        let slot = slots.get(handle.index as usize)?;
        if slot.generation != handle.generation {
            return None;
        }
        slot.entity.clone()
    }

    /// Free the slot and bump its generation, invalidating every
    /// outstanding copy of the handle. Returns the evicted entity so the
    /// caller can detach it from the tree.
    pub fn remove(&self, handle: EntityHandle) -> Option<Arc<Mutex<EntityRuntime>>> {
        let mut slots = self.slots.write().expect("arena slots poisoned");
        let slot = slots.get_mut(handle.index as usize)?;
        if slot.generation != handle.generation || slot.entity.is_none() {
            return None;
        }
        slot.generation = slot.generation.wrapping_add(1);
        let entity = slot.entity.take();
        self.free
            .lock()
            .expect("arena free list poisoned")
            .push(handle.index);
        trace!("arena slot {} freed, generation {}", handle.index, slot.generation);
        entity
    }

    pub fn len(&self) -> usize {
        let slots = self.slots.read().expect("arena slots poisoned");
        slots.iter().filter(|s| s.entity.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Pre-order depth-first traversal from `root`. Each live entity is
    /// visited exactly once; the child list is snapshotted before descent
    /// so the visitor may despawn or spawn children without invalidating
    /// the walk. Returns the first `Some` the visitor produces.
    pub fn apply_to_all<T>(
        &self,
        root: EntityHandle,
        visit: &mut dyn FnMut(&mut EntityRuntime) -> Option<T>,
    ) -> Option<T> {
        let mut stack = vec![root];
        while let Some(handle) = stack.pop() {
            let Some(entity) = self.resolve(handle) else {
                continue;
            };
            let children = {
                let mut entity = entity.lock().expect("entity mutex poisoned");
                if let Some(result) = visit(&mut entity) {
                    return Some(result);
                }
                entity.children.clone()
            };
            // Reverse so the first child is popped first, keeping the
            // visit order pre-order left to right.
            stack.extend(children.into_iter().rev());
        }
        None
    }
}

impl Default for EntityArena {
    fn default() -> Self {
        EntityArena::new()
    }
}
