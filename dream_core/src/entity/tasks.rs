//! Task constructors for the per-entity portion of the frame graph.
//!
//! Every work body follows the same contract: resolve the target handle
//! (a stale handle completes as a no-op), `try_lock` everything it needs
//! before mutating anything, and defer on contention. Mutation only
//! starts once all locks are held, so a deferred attempt retries from a
//! clean slate.

use std::sync::Arc;

use log::error;

use crate::components::script::ScriptEntry;
use crate::definitions::asset::AssetType;
use crate::entity::arena::EntityHandle;
use crate::entity::runtime::LifetimeStep;
use crate::project::ProjectContext;
use crate::tasks::{Task, TaskOutcome};

/// Advances the entity's lifecycle clock; the frame the deferral elapses
/// it also materializes the entity's assets.
pub fn lifetime_task(ctx: &ProjectContext, handle: EntityHandle) -> Arc<Task> {
    let arena = Arc::clone(&ctx.arena);
    let time = Arc::clone(&ctx.time);
    let audio = Arc::clone(&ctx.audio);
    let physics = Arc::clone(&ctx.physics);
    let project = Arc::clone(&ctx.definition);
    Task::new("entity_lifetime", move || {
        let Some(slot) = arena.resolve(handle) else {
            return TaskOutcome::Completed;
        };
        let Ok(mut entity) = slot.try_lock() else {
            return TaskOutcome::Deferred;
        };
        if entity.is_marked_deleted() {
            return TaskOutcome::Completed;
        }
        match entity.step_lifetime(time.frame_delta_ms()) {
            LifetimeStep::StillDeferred | LifetimeStep::Active => TaskOutcome::Completed,
            LifetimeStep::ReadyToLoad => {
                let Ok(mut audio) = audio.try_lock() else {
                    return TaskOutcome::Deferred;
                };
                let Ok(mut physics) = physics.try_lock() else {
                    return TaskOutcome::Deferred;
                };
                entity.load_assets(&project, &mut *audio, &mut *physics);
                TaskOutcome::Completed
            }
        }
    })
}

/// Per-frame update of the entity's non-script assets: animation, path
/// and scroller write the transform, audio emits marker events, and a
/// kinematic body is steered towards the transform.
pub fn asset_update_task(ctx: &ProjectContext, handle: EntityHandle) -> Arc<Task> {
    let arena = Arc::clone(&ctx.arena);
    let time = Arc::clone(&ctx.time);
    let audio = Arc::clone(&ctx.audio);
    let physics = Arc::clone(&ctx.physics);
    Task::new("entity_asset_update", move || {
        let Some(slot) = arena.resolve(handle) else {
            return TaskOutcome::Completed;
        };
        let Ok(mut entity) = slot.try_lock() else {
            return TaskOutcome::Deferred;
        };
        if !entity.is_loaded() || entity.is_marked_deleted() {
            return TaskOutcome::Completed;
        }

        // Acquire every lock this entity's assets will need up front so
        // a deferral never leaves a half-applied frame behind.
        let mut audio_guard = None;
        if entity.has_asset(AssetType::Audio) {
            match audio.try_lock() {
                Ok(guard) => audio_guard = Some(guard),
                Err(_) => return TaskOutcome::Deferred,
            }
        }
        let kinematic_body = entity
            .asset(AssetType::Physics)
            .and_then(|a| a.as_physics())
            .filter(|p| p.kinematic)
            .and_then(|p| p.body);
        let mut physics_guard = None;
        if kinematic_body.is_some() {
            match physics.try_lock() {
                Ok(guard) => physics_guard = Some(guard),
                Err(_) => return TaskOutcome::Deferred,
            }
        }
        let delta_ms = time.frame_delta_ms();
        let pose = match entity.asset_mut(AssetType::Animation) {
            Some(crate::assets::AssetRuntime::Animation(animation)) => animation.update(delta_ms),
            _ => None,
        };
        if let Some(pose) = pose {
            entity.transform.translation = pose.translation;
            entity.transform.orientation = pose.rotation;
            entity.transform.scale = pose.scale;
        }
        let path_position = match entity.asset_mut(AssetType::Path) {
            Some(crate::assets::AssetRuntime::Path(path)) => path.update(delta_ms),
            _ => None,
        };
        if let Some(position) = path_position {
            entity.transform.translation = position;
        }
        let scrolled = match entity.asset(AssetType::Scroller) {
            Some(crate::assets::AssetRuntime::Scroller(scroller)) => {
                Some(scroller.update(entity.transform.translation, delta_ms))
            }
            _ => None,
        };
        if let Some(position) = scrolled {
            entity.transform.translation = position;
        }
        if let Some(audio_guard) = audio_guard.as_deref() {
            let uuid = entity.uuid;
            let events = match entity
                .asset_mut(AssetType::Audio)
                .and_then(|a| a.as_audio_mut())
            {
                Some(audio_runtime) => audio_runtime.update(audio_guard, uuid),
                None => Vec::new(),
            };
            entity.event_queue.extend(events);
        }
        if let (Some(body), Some(physics_guard)) = (kinematic_body, physics_guard.as_deref_mut()) {
            physics_guard.set_kinematic_target(body, &entity.transform);
        }
        TaskOutcome::Completed
    })
}

/// Runs the script's on-init entry exactly once per entity.
pub fn script_init_task(ctx: &ProjectContext, handle: EntityHandle) -> Arc<Task> {
    let arena = Arc::clone(&ctx.arena);
    let script_backend = Arc::clone(&ctx.script);
    Task::new("script_on_init", move || {
        let Some(slot) = arena.resolve(handle) else {
            return TaskOutcome::Completed;
        };
        let Ok(mut entity) = slot.try_lock() else {
            return TaskOutcome::Deferred;
        };
        if !entity.is_loaded() || entity.is_marked_deleted() {
            return TaskOutcome::Completed;
        }
        let uuid = entity.uuid;
        let Some(script) = entity
            .asset_mut(AssetType::Script)
            .and_then(|a| a.as_script_mut())
        else {
            return TaskOutcome::Completed;
        };
        if script.initialised || !script.can_dispatch() {
            return TaskOutcome::Completed;
        }
        match script_backend.dispatch(&script.unit, uuid, ScriptEntry::Init) {
            Ok(()) => script.initialised = true,
            Err(e) => {
                error!("script '{}' on_init failed: {}", script.unit, e);
                script.errored = true;
            }
        }
        TaskOutcome::Completed
    })
}

/// Runs the script's on-update entry. Skipped until on-init has
/// succeeded and suppressed once the script has errored.
pub fn script_update_task(ctx: &ProjectContext, handle: EntityHandle) -> Arc<Task> {
    let arena = Arc::clone(&ctx.arena);
    let time = Arc::clone(&ctx.time);
    let script_backend = Arc::clone(&ctx.script);
    Task::new("script_on_update", move || {
        let Some(slot) = arena.resolve(handle) else {
            return TaskOutcome::Completed;
        };
        let Ok(mut entity) = slot.try_lock() else {
            return TaskOutcome::Deferred;
        };
        if !entity.is_loaded() || entity.is_marked_deleted() {
            return TaskOutcome::Completed;
        }
        let uuid = entity.uuid;
        let delta_ms = time.frame_delta_ms();
        let Some(script) = entity
            .asset_mut(AssetType::Script)
            .and_then(|a| a.as_script_mut())
        else {
            return TaskOutcome::Completed;
        };
        if !script.initialised || !script.can_dispatch() {
            return TaskOutcome::Completed;
        }
        if let Err(e) = script_backend.dispatch(&script.unit, uuid, ScriptEntry::Update { delta_ms })
        {
            error!("script '{}' on_update failed: {}", script.unit, e);
            script.errored = true;
        }
        TaskOutcome::Completed
    })
}

/// Drains the entity's event queue. Events are dispatched to the script
/// in arrival order; the queue is cleared even when the entity has no
/// script or dispatch is suppressed, so stale events never pile up.
pub fn script_event_task(ctx: &ProjectContext, handle: EntityHandle) -> Arc<Task> {
    let arena = Arc::clone(&ctx.arena);
    let script_backend = Arc::clone(&ctx.script);
    Task::new("script_on_event", move || {
        let Some(slot) = arena.resolve(handle) else {
            return TaskOutcome::Completed;
        };
        let Ok(mut entity) = slot.try_lock() else {
            return TaskOutcome::Deferred;
        };
        if !entity.is_loaded() || entity.is_marked_deleted() {
            entity.event_queue.clear();
            return TaskOutcome::Completed;
        }
        let events = entity.drain_events();
        let uuid = entity.uuid;
        let Some(script) = entity
            .asset_mut(AssetType::Script)
            .and_then(|a| a.as_script_mut())
        else {
            return TaskOutcome::Completed;
        };
        if !script.initialised || !script.can_dispatch() {
            return TaskOutcome::Completed;
        }
        for event in &events {
            if let Err(e) =
                script_backend.dispatch(&script.unit, uuid, ScriptEntry::Event { event })
            {
                error!("script '{}' on_event failed: {}", script.unit, e);
                script.errored = true;
                break;
            }
        }
        TaskOutcome::Completed
    })
}
