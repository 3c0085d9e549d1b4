use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use glam::Vec3;

use crate::components::graphics::GraphicsComponent;
use crate::components::physics::{PhysicsComponent, PhysicsUpdate};
use crate::components::time::Time;
use crate::entity::arena::EntityArena;
use crate::tasks::{Task, TaskOutcome, TaskWork};

/// Steps the world once, then delivers poses and contact events to the
/// affected entities. Delivery uses `try_lock` per entity; entities that
/// are busy stay in the pending list and the task defers, without ever
/// re-stepping the world.
struct PhysicsStepWork {
    physics: Arc<Mutex<PhysicsComponent>>,
    arena: Arc<EntityArena>,
    time: Arc<Time>,
    stepped: AtomicBool,
    pending: Mutex<Vec<PhysicsUpdate>>,
}

impl TaskWork for PhysicsStepWork {
    fn execute(&self) -> TaskOutcome {
        if !self.stepped.load(Ordering::Acquire) {
            let Ok(mut physics) = self.physics.try_lock() else {
                return TaskOutcome::Deferred;
            };
            let updates = physics.step(self.time.frame_delta_ms());
            drop(physics);
            *self.pending.lock().expect("pending updates poisoned") = updates;
            self.stepped.store(true, Ordering::Release);
        }

        let mut pending = self.pending.lock().expect("pending updates poisoned");
        pending.retain(|update| {
            let Some(entity) = self.arena.resolve(update.entity) else {
                // Entity despawned mid-frame; its update is dropped.
                return false;
            };
            let Ok(mut entity) = entity.try_lock() else {
                return true;
            };
            if let Some((translation, orientation)) = update.new_pose {
                entity.transform.translation = translation;
                entity.transform.orientation = orientation;
            }
            entity.event_queue.extend(update.events.iter().cloned());
            false
        });
        if pending.is_empty() {
            TaskOutcome::Completed
        } else {
            TaskOutcome::Deferred
        }
    }
}

pub fn physics_step_task(
    physics: Arc<Mutex<PhysicsComponent>>,
    arena: Arc<EntityArena>,
    time: Arc<Time>,
) -> Arc<Task> {
    Task::new(
        "physics_step",
        PhysicsStepWork {
            physics,
            arena,
            time,
            stepped: AtomicBool::new(false),
            pending: Mutex::new(Vec::new()),
        },
    )
}

const DEBUG_COLOR: Vec3 = Vec3::new(0.0, 1.0, 0.0);

/// Pushes every collider's AABB into the debug overlay. Runs after the
/// step so the boxes match the frame's final poses.
struct PhysicsDebugDrawWork {
    physics: Arc<Mutex<PhysicsComponent>>,
    graphics: Arc<Mutex<GraphicsComponent>>,
}

impl TaskWork for PhysicsDebugDrawWork {
    fn execute(&self) -> TaskOutcome {
        let Ok(physics) = self.physics.try_lock() else {
            return TaskOutcome::Deferred;
        };
        let aabbs = physics.collider_aabbs();
        drop(physics);
        let Ok(mut graphics) = self.graphics.try_lock() else {
            return TaskOutcome::Deferred;
        };
        for (min, max) in aabbs {
            graphics.push_debug_box(min, max, DEBUG_COLOR);
        }
        TaskOutcome::Completed
    }
}

pub fn physics_debug_draw_task(
    physics: Arc<Mutex<PhysicsComponent>>,
    graphics: Arc<Mutex<GraphicsComponent>>,
) -> Arc<Task> {
    Task::new(
        "physics_debug_draw",
        PhysicsDebugDrawWork { physics, graphics },
    )
}
