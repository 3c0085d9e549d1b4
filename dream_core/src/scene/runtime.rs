use std::sync::Arc;

use log::{error, info, trace};
use uuid::Uuid;

use crate::components::physics::tasks::{physics_debug_draw_task, physics_step_task};
use crate::components::script::ScriptEntry;
use crate::definitions::asset::{AssetParams, AssetType};
use crate::definitions::entity::EntityDefinition;
use crate::definitions::scene::SceneDefinition;
use crate::entity::arena::EntityHandle;
use crate::entity::runtime::EntityRuntime;
use crate::entity::tasks::{
    asset_update_task, lifetime_task, script_event_task, script_init_task, script_update_task,
};
use crate::error::{DreamError, Result};
use crate::project::ProjectContext;
use crate::tasks::{Task, TaskOutcome};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SceneState {
    NotLoaded,
    Loaded,
    Active,
    ToDestroy,
    Destroyed,
}

/// A live scene: the instantiated entity tree plus the per-frame task
/// graph built over it.
pub struct SceneRuntime {
    pub definition: Arc<SceneDefinition>,
    state: SceneState,
    root: Option<EntityHandle>,
    start_time_ms: i64,

    // Scene-level task slots, one outstanding instance of each.
    input_poll_task: Option<Arc<Task>>,
    input_execute_task: Option<Arc<Task>>,
    physics_task: Option<Arc<Task>>,
    debug_draw_task: Option<Arc<Task>>,
}

impl SceneRuntime {
    pub fn new(definition: Arc<SceneDefinition>) -> Self {
        SceneRuntime {
            definition,
            state: SceneState::NotLoaded,
            root: None,
            start_time_ms: 0,
            input_poll_task: None,
            input_execute_task: None,
            physics_task: None,
            debug_draw_task: None,
        }
    }

    pub fn state(&self) -> SceneState {
        self.state
    }

    pub fn root(&self) -> Option<EntityHandle> {
        self.root
    }

    /// Milliseconds since the scene was loaded.
    pub fn scene_time_ms(&self, ctx: &ProjectContext) -> i64 {
        ctx.time.current_frame_ms() - self.start_time_ms
    }

    /// Instantiate the definition tree and push scene settings into the
    /// components. Idempotent: a loaded scene stays loaded.
    pub fn load(&mut self, ctx: &ProjectContext) {
        if self.state != SceneState::NotLoaded {
            return;
        }
        ctx.physics
            .lock()
            .expect("physics mutex poisoned")
            .set_gravity(self.definition.gravity);
        {
            let mut graphics = ctx.graphics.lock().expect("graphics mutex poisoned");
            graphics.camera_transform = self.definition.camera_transform.clone();
            graphics.clear_color = self.definition.clear_color;
        }
        self.root = Some(instantiate_tree(ctx, &self.definition.root, None));
        self.start_time_ms = ctx.time.current_frame_ms();
        self.state = SceneState::Loaded;
        info!(
            "scene '{}' loaded with {} entities",
            self.definition.name,
            self.count_entities(ctx)
        );
    }

    /// Build and submit this frame's task graph.
    ///
    /// Shape: input poll → input execute → every entity's lifetime task →
    /// that entity's asset and script tasks → physics step (gated on all
    /// lifetime, asset and event tasks) → optional debug draw. Outstanding-task
    /// slots and the manager's fence make the call idempotent when a task
    /// from a previous frame is still in flight.
    pub fn create_scene_tasks(&mut self, ctx: &ProjectContext) {
        if self.state == SceneState::Loaded {
            self.state = SceneState::Active;
        }
        if self.state != SceneState::Active {
            return;
        }
        let Some(root) = self.root else {
            return;
        };
        ctx.task_manager.clear_fences();

        let mut lights = Vec::new();
        {
            let mut graphics = ctx.graphics.lock().expect("graphics mutex poisoned");
            graphics.begin_frame();
            graphics.camera_transform = self.definition.camera_transform.clone();
        }

        let poll = match &self.input_poll_task {
            Some(task) if !task.is_completed() => Arc::clone(task),
            _ => {
                let task = input_poll_task(ctx);
                self.input_poll_task = Some(Arc::clone(&task));
                task
            }
        };
        ctx.task_manager.push_task(&poll);

        let execute = match &self.input_execute_task {
            Some(task) if !task.is_completed() => Arc::clone(task),
            _ => {
                let task = input_execute_task(ctx, &self.definition);
                self.input_execute_task = Some(Arc::clone(&task));
                task
            }
        };
        execute.depends_on(&poll);
        ctx.task_manager.push_task(&execute);

        let mut step_gates = Vec::new();
        ctx.arena.apply_to_all(root, &mut |entity| {
            let lifetime = match &entity.lifetime_task {
                Some(task) if !task.is_completed() => Arc::clone(task),
                _ => {
                    let task = lifetime_task(ctx, entity.handle);
                    task.depends_on(&execute);
                    entity.lifetime_task = Some(Arc::clone(&task));
                    task
                }
            };
            ctx.task_manager.push_task(&lifetime);
            step_gates.push(Arc::clone(&lifetime));

            if entity.is_loaded() && !entity.is_marked_deleted() {
                let assets = match &entity.asset_update_task {
                    Some(task) if !task.is_completed() => Arc::clone(task),
                    _ => {
                        let task = asset_update_task(ctx, entity.handle);
                        task.depends_on(&lifetime);
                        entity.asset_update_task = Some(Arc::clone(&task));
                        task
                    }
                };
                ctx.task_manager.push_task(&assets);
                step_gates.push(Arc::clone(&assets));

                let script_gate = if entity.has_asset(AssetType::Script) {
                    let init = match &entity.script_init_task {
                        Some(task) if !task.is_completed() => Arc::clone(task),
                        _ => {
                            let task = script_init_task(ctx, entity.handle);
                            task.depends_on(&lifetime);
                            entity.script_init_task = Some(Arc::clone(&task));
                            task
                        }
                    };
                    ctx.task_manager.push_task(&init);
                    let update = match &entity.script_update_task {
                        Some(task) if !task.is_completed() => Arc::clone(task),
                        _ => {
                            let task = script_update_task(ctx, entity.handle);
                            task.depends_on(&init);
                            entity.script_update_task = Some(Arc::clone(&task));
                            task
                        }
                    };
                    ctx.task_manager.push_task(&update);
                    update
                } else {
                    Arc::clone(&lifetime)
                };

                let event = match &entity.script_event_task {
                    Some(task) if !task.is_completed() => Arc::clone(task),
                    _ => {
                        let task = script_event_task(ctx, entity.handle);
                        task.depends_on(&script_gate);
                        entity.script_event_task = Some(Arc::clone(&task));
                        task
                    }
                };
                ctx.task_manager.push_task(&event);
                // The step enqueues contact events; draining must come
                // first so a contact is always dispatched the next frame.
                step_gates.push(Arc::clone(&event));

                if !entity.hidden {
                    if let Some(light) = entity.asset(AssetType::Light).and_then(|a| a.as_light())
                    {
                        lights.push((entity.transform.translation, *light));
                    }
                }
            }
            None::<()>
        });

        {
            let mut graphics = ctx.graphics.lock().expect("graphics mutex poisoned");
            for (position, light) in &lights {
                graphics.push_light(*position, light);
            }
        }

        let step = match &self.physics_task {
            Some(task) if !task.is_completed() => Arc::clone(task),
            _ => {
                let task = physics_step_task(
                    Arc::clone(&ctx.physics),
                    Arc::clone(&ctx.arena),
                    Arc::clone(&ctx.time),
                );
                self.physics_task = Some(Arc::clone(&task));
                task
            }
        };
        for gate in &step_gates {
            step.depends_on(gate);
        }
        ctx.task_manager.push_task(&step);

        if self.definition.physics_debug {
            let draw = match &self.debug_draw_task {
                Some(task) if !task.is_completed() => Arc::clone(task),
                _ => {
                    let task = physics_debug_draw_task(
                        Arc::clone(&ctx.physics),
                        Arc::clone(&ctx.graphics),
                    );
                    self.debug_draw_task = Some(Arc::clone(&task));
                    task
                }
            };
            draw.depends_on(&step);
            ctx.task_manager.push_task(&draw);
        }
    }

    /// Sweep entities flagged deleted: detach each from its parent, expire
    /// every outstanding task in the subtree, pull physics bodies out of
    /// the world and free the arena slots. Handles held elsewhere go
    /// stale rather than dangling.
    pub fn collect_garbage(&mut self, ctx: &ProjectContext) {
        let Some(root) = self.root else {
            return;
        };
        let mut doomed = Vec::new();
        ctx.arena.apply_to_all(root, &mut |entity| {
            if entity.is_marked_deleted() {
                doomed.push(entity.handle);
            }
            None::<()>
        });

        for handle in doomed {
            // Nested flags inside an already-freed subtree resolve to
            // nothing and are skipped.
            let Some(slot) = ctx.arena.resolve(handle) else {
                continue;
            };
            let parent = slot.lock().expect("entity mutex poisoned").parent;
            match parent {
                Some(parent) => {
                    if let Some(parent) = ctx.arena.resolve(parent) {
                        parent
                            .lock()
                            .expect("entity mutex poisoned")
                            .children
                            .retain(|&child| child != handle);
                    }
                }
                None => self.root = None,
            }

            let mut subtree = Vec::new();
            ctx.arena.apply_to_all(handle, &mut |entity| {
                subtree.push(entity.handle);
                None::<()>
            });
            let mut physics = ctx.physics.lock().expect("physics mutex poisoned");
            for handle in subtree {
                if let Some(entity) = ctx.arena.resolve(handle) {
                    let mut entity = entity.lock().expect("entity mutex poisoned");
                    entity.expire_tasks();
                    if let Some(crate::assets::AssetRuntime::Physics(body)) =
                        entity.take_asset(AssetType::Physics)
                    {
                        if let Some(body) = body.body {
                            physics.remove_entity(body);
                        }
                    }
                    trace!("collected entity '{}'", entity.name);
                }
                ctx.arena.remove(handle);
            }
        }

        if self.state == SceneState::ToDestroy && self.root.is_none() {
            self.state = SceneState::Destroyed;
        }
    }

    /// Tear the scene down: the whole tree is flagged and collected.
    pub fn destroy(&mut self, ctx: &ProjectContext) {
        let Some(root) = self.root else {
            self.state = SceneState::Destroyed;
            return;
        };
        ctx.arena.apply_to_all(root, &mut |entity| {
            entity.mark_deleted();
            None::<()>
        });
        self.state = SceneState::ToDestroy;
        self.collect_garbage(ctx);
    }

    pub fn entity_by_uuid(&self, ctx: &ProjectContext, uuid: Uuid) -> Option<EntityHandle> {
        let root = self.root?;
        ctx.arena.apply_to_all(root, &mut |entity| {
            (entity.uuid == uuid).then_some(entity.handle)
        })
    }

    pub fn entity_by_name(&self, ctx: &ProjectContext, name: &str) -> Option<EntityHandle> {
        let root = self.root?;
        ctx.arena.apply_to_all(root, &mut |entity| {
            (entity.name == name).then_some(entity.handle)
        })
    }

    pub fn count_entities(&self, ctx: &ProjectContext) -> usize {
        let Some(root) = self.root else {
            return 0;
        };
        let mut count = 0;
        ctx.arena.apply_to_all(root, &mut |_| {
            count += 1;
            None::<()>
        });
        count
    }

    /// Spawn a live child of `parent` from a template definition in the
    /// scene tree, with fresh uuids throughout the copy.
    pub fn spawn_from_template(
        &mut self,
        ctx: &ProjectContext,
        parent: EntityHandle,
        template: Uuid,
    ) -> Result<EntityHandle> {
        let template = self
            .definition
            .root
            .find_by_uuid(template)
            .ok_or_else(|| {
                DreamError::Structural(format!("template entity {} not found", template))
            })?
            .duplicate();
        let Some(parent_slot) = ctx.arena.resolve(parent) else {
            return Err(DreamError::Structural(
                "spawn target parent no longer exists".to_string(),
            ));
        };
        let handle = instantiate_tree(ctx, &template, Some(parent));
        parent_slot
            .lock()
            .expect("entity mutex poisoned")
            .children
            .push(handle);
        Ok(handle)
    }

    /// Clone a live entity's definition subtree as a new sibling. The
    /// root has no parent to attach a sibling to, so duplicating it is a
    /// structural error.
    pub fn duplicate_entity(
        &mut self,
        ctx: &ProjectContext,
        target: EntityHandle,
    ) -> Result<EntityHandle> {
        let Some(slot) = ctx.arena.resolve(target) else {
            return Err(DreamError::Structural(
                "duplicate target no longer exists".to_string(),
            ));
        };
        let (parent, template) = {
            let entity = slot.lock().expect("entity mutex poisoned");
            (entity.parent, entity.definition.duplicate())
        };
        let Some(parent) = parent else {
            return Err(DreamError::Structural(
                "cannot duplicate the root entity".to_string(),
            ));
        };
        self.spawn_duplicate(ctx, parent, template)
    }

    fn spawn_duplicate(
        &mut self,
        ctx: &ProjectContext,
        parent: EntityHandle,
        template: EntityDefinition,
    ) -> Result<EntityHandle> {
        let Some(parent_slot) = ctx.arena.resolve(parent) else {
            return Err(DreamError::Structural(
                "duplicate parent no longer exists".to_string(),
            ));
        };
        let handle = instantiate_tree(ctx, &template, Some(parent));
        parent_slot
            .lock()
            .expect("entity mutex poisoned")
            .children
            .push(handle);
        Ok(handle)
    }
}

fn instantiate_tree(
    ctx: &ProjectContext,
    definition: &EntityDefinition,
    parent: Option<EntityHandle>,
) -> EntityHandle {
    let def = Arc::new(definition.clone());
    let handle = ctx
        .arena
        .insert(|handle| EntityRuntime::new(handle, Arc::clone(&def), parent));
    let mut children = Vec::with_capacity(definition.children.len());
    for child in &definition.children {
        children.push(instantiate_tree(ctx, child, Some(handle)));
    }
    if let Some(entity) = ctx.arena.resolve(handle) {
        entity.lock().expect("entity mutex poisoned").children = children;
    }
    handle
}

/// Snapshots device state so the whole frame observes one input frame.
fn input_poll_task(ctx: &ProjectContext) -> Arc<Task> {
    let input = Arc::clone(&ctx.input);
    Task::new("input_poll", move || {
        let Ok(mut input) = input.try_lock() else {
            return TaskOutcome::Deferred;
        };
        input.poll();
        TaskOutcome::Completed
    })
}

/// Dispatches the scene's input script against the polled snapshot.
fn input_execute_task(ctx: &ProjectContext, scene: &SceneDefinition) -> Arc<Task> {
    let script_backend = Arc::clone(&ctx.script);
    let scene_uuid = scene.uuid;
    let unit = scene.input_script.and_then(|uuid| {
        match ctx.definition.asset_definition_by_uuid(uuid).map(|def| &def.params) {
            Some(AssetParams::Script { unit }) => Some(unit.clone()),
            _ => {
                error!("scene input script {} is missing or not a script asset", uuid);
                None
            }
        }
    });
    Task::new("input_execute", move || {
        if let Some(unit) = &unit {
            if let Err(e) = script_backend.dispatch(unit, scene_uuid, ScriptEntry::Input) {
                error!("input script '{}' failed: {}", unit, e);
            }
        }
        TaskOutcome::Completed
    })
}
