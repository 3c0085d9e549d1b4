//! Top of the runtime stack: owns every subsystem and drives the
//! frame loop over the active scene.

use std::sync::{Arc, Mutex};

use glam::Vec3;
use log::info;
use uuid::Uuid;

use crate::components::audio::{AudioBackend, NullAudioBackend};
use crate::components::graphics::GraphicsComponent;
use crate::components::input::InputComponent;
use crate::components::physics::PhysicsComponent;
use crate::components::script::{NullScriptBackend, ScriptBackend};
use crate::components::time::Time;
use crate::definitions::project::ProjectDefinition;
use crate::entity::arena::EntityArena;
use crate::error::{DreamError, Result};
use crate::scene::SceneRuntime;
use crate::tasks::TaskManager;

/// Everything a task or a scene operation needs, passed explicitly.
/// All members are shared handles, so the context clones cheaply.
#[derive(Clone)]
pub struct ProjectContext {
    pub definition: Arc<ProjectDefinition>,
    pub time: Arc<Time>,
    pub arena: Arc<EntityArena>,
    pub task_manager: Arc<TaskManager>,
    pub physics: Arc<Mutex<PhysicsComponent>>,
    pub audio: Arc<Mutex<dyn AudioBackend>>,
    pub script: Arc<dyn ScriptBackend>,
    pub input: Arc<Mutex<InputComponent>>,
    pub graphics: Arc<Mutex<GraphicsComponent>>,
}

/// The running project: context plus the active scene. Subsystem
/// construction failure surfaces here and is fatal before the first
/// frame.
pub struct ProjectRuntime {
    context: ProjectContext,
    scene: Option<SceneRuntime>,
}

impl ProjectRuntime {
    pub fn new(
        definition: ProjectDefinition,
        audio: Arc<Mutex<dyn AudioBackend>>,
        script: Arc<dyn ScriptBackend>,
    ) -> Result<Self> {
        let task_manager = Arc::new(TaskManager::new()?);
        Ok(Self::assemble(definition, audio, script, task_manager))
    }

    /// Pool size pinned by the caller; used by tests that compare runs
    /// across worker counts.
    pub fn with_worker_count(
        definition: ProjectDefinition,
        audio: Arc<Mutex<dyn AudioBackend>>,
        script: Arc<dyn ScriptBackend>,
        workers: usize,
    ) -> Result<Self> {
        let task_manager = Arc::new(TaskManager::with_workers(workers)?);
        Ok(Self::assemble(definition, audio, script, task_manager))
    }

    /// Null audio and script backends, for tools and tests that run the
    /// engine without a window.
    pub fn headless(definition: ProjectDefinition) -> Result<Self> {
        ProjectRuntime::new(
            definition,
            Arc::new(Mutex::new(NullAudioBackend::default())),
            Arc::new(NullScriptBackend),
        )
    }

    fn assemble(
        definition: ProjectDefinition,
        audio: Arc<Mutex<dyn AudioBackend>>,
        script: Arc<dyn ScriptBackend>,
        task_manager: Arc<TaskManager>,
    ) -> Self {
        let context = ProjectContext {
            definition: Arc::new(definition),
            time: Arc::new(Time::new()),
            arena: Arc::new(EntityArena::new()),
            task_manager,
            physics: Arc::new(Mutex::new(PhysicsComponent::new(Vec3::new(0.0, -9.81, 0.0)))),
            audio,
            script,
            input: Arc::new(Mutex::new(InputComponent::new())),
            graphics: Arc::new(Mutex::new(GraphicsComponent::new())),
        };
        ProjectRuntime {
            context,
            scene: None,
        }
    }

    pub fn context(&self) -> &ProjectContext {
        &self.context
    }

    pub fn active_scene(&self) -> Option<&SceneRuntime> {
        self.scene.as_ref()
    }

    pub fn active_scene_mut(&mut self) -> Option<&mut SceneRuntime> {
        self.scene.as_mut()
    }

    pub fn load_startup_scene(&mut self) -> Result<()> {
        let uuid = self.context.definition.startup_scene()?.uuid;
        self.load_scene_by_uuid(uuid)
    }

    pub fn load_scene_by_uuid(&mut self, uuid: Uuid) -> Result<()> {
        let definition = self
            .context
            .definition
            .scene_by_uuid(uuid)
            .ok_or_else(|| DreamError::Structural(format!("scene {} not found", uuid)))?
            .clone();
        if let Some(mut previous) = self.scene.take() {
            previous.destroy(&self.context);
        }
        info!("switching to scene '{}'", definition.name);
        let mut scene = SceneRuntime::new(Arc::new(definition));
        scene.load(&self.context);
        self.scene = Some(scene);
        Ok(())
    }

    /// One frame: advance the clock, build and run the task graph to
    /// completion, then sweep deleted entities.
    pub fn update(&mut self, delta_ms: i64) {
        self.context.time.advance(delta_ms);
        if let Some(scene) = self.scene.as_mut() {
            scene.create_scene_tasks(&self.context);
            self.context.task_manager.wait_for_all();
            scene.collect_garbage(&self.context);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::script::RecordingScriptBackend;
    use crate::definitions::asset::{AssetDefinition, AssetParams, AssetType, CollisionShape};
    use crate::definitions::entity::EntityDefinition;
    use crate::definitions::scene::SceneDefinition;
    use crate::entity::event::Event;
    use rustc_hash::FxHashMap;

    fn script_asset(unit: &str) -> AssetDefinition {
        AssetDefinition {
            uuid: Uuid::new_v4(),
            name: format!("{unit} script"),
            params: AssetParams::Script {
                unit: unit.to_string(),
            },
        }
    }

    fn physics_asset(shape: CollisionShape, mass: f32) -> AssetDefinition {
        AssetDefinition {
            uuid: Uuid::new_v4(),
            name: "body".to_string(),
            params: AssetParams::Physics {
                shape,
                mass,
                restitution: 0.0,
                kinematic: false,
                character: false,
            },
        }
    }

    fn project_with_root(root: EntityDefinition, assets: Vec<AssetDefinition>) -> ProjectDefinition {
        let mut project = ProjectDefinition::new("Test Project");
        for asset in assets {
            project.add_asset(asset);
        }
        let mut scene = SceneDefinition::new("Main");
        scene.root = root;
        project.scenes.push(scene);
        project
    }

    fn recording_runtime(
        project: ProjectDefinition,
        workers: usize,
    ) -> (ProjectRuntime, Arc<RecordingScriptBackend>) {
        let backend = Arc::new(RecordingScriptBackend::new());
        let runtime = ProjectRuntime::with_worker_count(
            project,
            Arc::new(Mutex::new(NullAudioBackend::default())),
            Arc::clone(&backend) as Arc<dyn ScriptBackend>,
            workers,
        )
        .unwrap();
        (runtime, backend)
    }

    #[test]
    fn startup_scene_instantiates_the_whole_tree() {
        let mut root = EntityDefinition::new("Root");
        let mut platforms = EntityDefinition::new("Platforms");
        platforms.children.push(EntityDefinition::new("Platform 1"));
        platforms.children.push(EntityDefinition::new("Platform 2"));
        root.children.push(platforms);
        root.children.push(EntityDefinition::new("Player"));
        let project = project_with_root(root, Vec::new());

        let mut runtime = ProjectRuntime::headless(project).unwrap();
        runtime.load_startup_scene().unwrap();
        let ctx = runtime.context().clone();
        let scene = runtime.active_scene().unwrap();
        assert_eq!(scene.count_entities(&ctx), 5);
        assert!(scene.entity_by_name(&ctx, "Platform 2").is_some());
        assert!(scene.entity_by_name(&ctx, "Missing").is_none());
    }

    fn lifetimes_by_name(runtime: &ProjectRuntime) -> FxHashMap<String, i64> {
        let ctx = runtime.context();
        let root = runtime.active_scene().unwrap().root().unwrap();
        let mut lifetimes = FxHashMap::default();
        ctx.arena.apply_to_all(root, &mut |entity| {
            lifetimes.insert(entity.name.clone(), entity.object_lifetime);
            None::<()>
        });
        lifetimes
    }

    #[test]
    fn object_lifetime_is_independent_of_worker_count() {
        let build = || {
            let mut root = EntityDefinition::new("Root");
            let mut slow = EntityDefinition::new("Slow");
            slow.deferred_for = 50;
            let mut medium = EntityDefinition::new("Medium");
            medium.deferred_for = 20;
            medium.children.push(EntityDefinition::new("Nested"));
            root.children.push(slow);
            root.children.push(medium);
            root.children.push(EntityDefinition::new("Fast"));
            project_with_root(root, Vec::new())
        };

        let mut results = Vec::new();
        for workers in [1, 8] {
            let mut runtime = ProjectRuntime::with_worker_count(
                build(),
                Arc::new(Mutex::new(NullAudioBackend::default())),
                Arc::new(NullScriptBackend),
                workers,
            )
            .unwrap();
            runtime.load_startup_scene().unwrap();
            for _ in 0..6 {
                runtime.update(16);
            }
            results.push(lifetimes_by_name(&runtime));
        }
        assert_eq!(results[0], results[1]);
        // Sanity: the undeferred entity accumulated five active frames.
        assert_eq!(results[0]["Fast"], 5 * 16);
    }

    #[test]
    fn deferred_entity_loads_exactly_once_when_deferral_elapses() {
        let mut root = EntityDefinition::new("Root");
        let mut deferred = EntityDefinition::new("Deferred");
        deferred.deferred_for = 40;
        root.children.push(deferred);
        let project = project_with_root(root, Vec::new());

        let mut runtime = ProjectRuntime::headless(project).unwrap();
        runtime.load_startup_scene().unwrap();
        let ctx = runtime.context().clone();

        runtime.update(16);
        runtime.update(16);
        {
            let handle = runtime
                .active_scene()
                .unwrap()
                .entity_by_name(&ctx, "Deferred")
                .unwrap();
            let entity = ctx.arena.resolve(handle).unwrap();
            let entity = entity.lock().unwrap();
            assert!(!entity.is_loaded());
            assert_eq!(entity.deferred_for, 8);
        }
        // Third frame crosses zero: loads, but accumulates no lifetime yet.
        runtime.update(16);
        {
            let handle = runtime
                .active_scene()
                .unwrap()
                .entity_by_name(&ctx, "Deferred")
                .unwrap();
            let entity = ctx.arena.resolve(handle).unwrap();
            let entity = entity.lock().unwrap();
            assert!(entity.is_loaded());
            assert_eq!(entity.object_lifetime, 0);
        }
        runtime.update(16);
        let handle = runtime
            .active_scene()
            .unwrap()
            .entity_by_name(&ctx, "Deferred")
            .unwrap();
        let entity = ctx.arena.resolve(handle).unwrap();
        assert_eq!(entity.lock().unwrap().object_lifetime, 16);
    }

    #[test]
    fn script_initialises_once_before_updates_and_events_are_fifo() {
        let script = script_asset("player");
        let script_uuid = script.uuid;
        let mut root = EntityDefinition::new("Root");
        let mut player = EntityDefinition::new("Player");
        player.assets.insert(AssetType::Script, script_uuid);
        let player_uuid = player.uuid;
        root.children.push(player);
        let project = project_with_root(root, vec![script]);

        let (mut runtime, backend) = recording_runtime(project, 4);
        runtime.load_startup_scene().unwrap();
        let ctx = runtime.context().clone();

        runtime.update(16); // load frame
        runtime.update(16); // init + first update
        let calls = backend.calls_for(player_uuid);
        assert_eq!(calls[0].entry, "on_init");
        assert_eq!(calls[1].entry, "on_update");

        // Queue two events between frames; they dispatch in order after
        // the next update.
        let first_sender = Uuid::new_v4();
        let second_sender = Uuid::new_v4();
        {
            let handle = runtime
                .active_scene()
                .unwrap()
                .entity_by_uuid(&ctx, player_uuid)
                .unwrap();
            let entity = ctx.arena.resolve(handle).unwrap();
            let mut entity = entity.lock().unwrap();
            entity.queue_event(Event::new(first_sender));
            entity.queue_event(Event::new(second_sender));
        }
        runtime.update(16);

        let calls = backend.calls_for(player_uuid);
        let inits: Vec<_> = calls.iter().filter(|c| c.entry == "on_init").collect();
        assert_eq!(inits.len(), 1, "on_init must run exactly once");
        let events: Vec<_> = calls.iter().filter(|c| c.entry == "on_event").collect();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].event_sender, Some(first_sender));
        assert_eq!(events[1].event_sender, Some(second_sender));

        // Queue was cleared by the dispatch.
        let handle = runtime
            .active_scene()
            .unwrap()
            .entity_by_uuid(&ctx, player_uuid)
            .unwrap();
        let entity = ctx.arena.resolve(handle).unwrap();
        assert!(entity.lock().unwrap().event_queue.is_empty());
    }

    #[test]
    fn failing_script_is_suppressed_without_halting_the_entity() {
        let script = script_asset("broken");
        let mut root = EntityDefinition::new("Root");
        let mut cursed = EntityDefinition::new("Cursed");
        cursed.assets.insert(AssetType::Script, script.uuid);
        let cursed_uuid = cursed.uuid;
        root.children.push(cursed);
        let project = project_with_root(root, vec![script]);

        let (mut runtime, backend) = recording_runtime(project, 4);
        backend.fail_unit("broken");
        runtime.load_startup_scene().unwrap();
        let ctx = runtime.context().clone();

        for _ in 0..4 {
            runtime.update(16);
        }
        // No successful dispatch was ever recorded.
        assert!(backend.calls_for(cursed_uuid).is_empty());
        // Lifecycle kept running: loaded on frame one, active for three.
        let handle = runtime
            .active_scene()
            .unwrap()
            .entity_by_uuid(&ctx, cursed_uuid)
            .unwrap();
        let entity = ctx.arena.resolve(handle).unwrap();
        assert_eq!(entity.lock().unwrap().object_lifetime, 3 * 16);
    }

    #[test]
    fn event_queue_clears_even_when_a_handler_errors_mid_batch() {
        let script = script_asset("touchy");
        let mut root = EntityDefinition::new("Root");
        let mut target = EntityDefinition::new("Target");
        target.assets.insert(AssetType::Script, script.uuid);
        let target_uuid = target.uuid;
        root.children.push(target);
        let project = project_with_root(root, vec![script]);

        let (mut runtime, backend) = recording_runtime(project, 4);
        runtime.load_startup_scene().unwrap();
        let ctx = runtime.context().clone();

        // Let on_init and the first on_update go through, then make the
        // event handler start raising.
        runtime.update(16);
        runtime.update(16);
        backend.fail_entry("touchy", "on_event");

        let handle = runtime
            .active_scene()
            .unwrap()
            .entity_by_uuid(&ctx, target_uuid)
            .unwrap();
        {
            let entity = ctx.arena.resolve(handle).unwrap();
            let mut entity = entity.lock().unwrap();
            entity.queue_event(Event::new(Uuid::new_v4()));
            entity.queue_event(Event::new(Uuid::new_v4()));
            entity.queue_event(Event::new(Uuid::new_v4()));
        }
        runtime.update(16);

        // The first handler invocation raised; the batch is still gone.
        let entity = ctx.arena.resolve(handle).unwrap();
        assert!(entity.lock().unwrap().event_queue.is_empty());
        let calls = backend.calls_for(target_uuid);
        assert!(calls.iter().all(|c| c.entry != "on_event"));

        // The failure is sticky: later frames dispatch nothing more.
        let recorded = calls.len();
        runtime.update(16);
        runtime.update(16);
        assert_eq!(backend.calls_for(target_uuid).len(), recorded);
    }

    #[test]
    fn cleared_error_lets_a_reloaded_script_dispatch_again() {
        let script = script_asset("flaky");
        let mut root = EntityDefinition::new("Root");
        let mut target = EntityDefinition::new("Target");
        target.assets.insert(AssetType::Script, script.uuid);
        let target_uuid = target.uuid;
        root.children.push(target);
        let project = project_with_root(root, vec![script]);

        let (mut runtime, backend) = recording_runtime(project, 4);
        backend.fail_unit("flaky");
        runtime.load_startup_scene().unwrap();
        let ctx = runtime.context().clone();

        runtime.update(16);
        runtime.update(16);
        assert!(backend.calls_for(target_uuid).is_empty());

        // Reload: the unit works again and the sticky flag is cleared.
        backend.clear_failures();
        let handle = runtime
            .active_scene()
            .unwrap()
            .entity_by_uuid(&ctx, target_uuid)
            .unwrap();
        {
            let entity = ctx.arena.resolve(handle).unwrap();
            let mut entity = entity.lock().unwrap();
            let script = entity
                .asset_mut(AssetType::Script)
                .and_then(|a| a.as_script_mut())
                .unwrap();
            assert!(script.errored);
            script.clear_error();
        }

        runtime.update(16);
        runtime.update(16);
        let calls = backend.calls_for(target_uuid);
        assert_eq!(calls[0].entry, "on_init");
        assert!(calls[1..].iter().all(|c| c.entry == "on_update"));
    }

    #[test]
    fn contact_dispatch_timeline_is_identical_across_worker_counts() {
        let build = || {
            let script = script_asset("ball");
            let ball_body = physics_asset(CollisionShape::Sphere { radius: 0.5 }, 1.0);
            let floor_body = physics_asset(
                CollisionShape::StaticPlane {
                    normal: Vec3::new(0.0, 1.0, 0.0),
                },
                0.0,
            );
            let mut root = EntityDefinition::new("Root");
            let mut ball = EntityDefinition::new("Ball");
            ball.transform.translation = Vec3::new(0.0, 1.5, 0.0);
            // Stagger the loads so bodies enter the world in a fixed order.
            ball.deferred_for = 20;
            ball.assets.insert(AssetType::Script, script.uuid);
            ball.assets.insert(AssetType::Physics, ball_body.uuid);
            let mut floor = EntityDefinition::new("Floor");
            floor.assets.insert(AssetType::Physics, floor_body.uuid);
            root.children.push(ball);
            root.children.push(floor);
            project_with_root(root, vec![script, ball_body, floor_body])
        };

        // The contact fires during one frame's step and must dispatch on
        // the next, so the cumulative on_event count per frame is the
        // same no matter how the tasks are scheduled.
        let mut timelines = Vec::new();
        for workers in [1, 8] {
            let (mut runtime, backend) = recording_runtime(build(), workers);
            runtime.load_startup_scene().unwrap();
            let mut timeline = Vec::new();
            for _ in 0..120 {
                runtime.update(16);
                let dispatched = backend
                    .calls()
                    .iter()
                    .filter(|c| c.entry == "on_event")
                    .count();
                timeline.push(dispatched);
            }
            timelines.push(timeline);
        }
        assert_eq!(timelines[0], timelines[1]);
        assert!(
            *timelines[0].last().unwrap() > 0,
            "the fall must have produced a contact event"
        );
    }

    #[test]
    fn gc_frees_the_subtree_and_no_task_runs_on_it_again() {
        let script = script_asset("minion");
        let mut root = EntityDefinition::new("Root");
        let mut squad = EntityDefinition::new("Squad");
        squad.assets.insert(AssetType::Script, script.uuid);
        let squad_uuid = squad.uuid;
        squad.children.push(EntityDefinition::new("Member"));
        root.children.push(squad);
        let project = project_with_root(root, vec![script]);

        let (mut runtime, backend) = recording_runtime(project, 4);
        runtime.load_startup_scene().unwrap();
        let ctx = runtime.context().clone();

        runtime.update(16);
        runtime.update(16);

        let squad_handle = runtime
            .active_scene()
            .unwrap()
            .entity_by_uuid(&ctx, squad_uuid)
            .unwrap();
        let member_handle = runtime
            .active_scene()
            .unwrap()
            .entity_by_name(&ctx, "Member")
            .unwrap();
        {
            let entity = ctx.arena.resolve(squad_handle).unwrap();
            entity.lock().unwrap().mark_deleted();
        }

        // Run the third frame by hand so the outstanding task can be
        // inspected between graph execution and the sweep.
        ctx.time.advance(16);
        runtime.active_scene_mut().unwrap().create_scene_tasks(&ctx);
        ctx.task_manager.wait_for_all();
        let lifetime_task = {
            let entity = ctx.arena.resolve(squad_handle).unwrap();
            let entity = entity.lock().unwrap();
            Arc::clone(entity.lifetime_task.as_ref().unwrap())
        };
        runtime.active_scene_mut().unwrap().collect_garbage(&ctx);
        assert!(ctx.arena.resolve(squad_handle).is_none());
        assert!(ctx.arena.resolve(member_handle).is_none());
        assert!(lifetime_task.has_expired());
        assert_eq!(runtime.active_scene().unwrap().count_entities(&ctx), 1);

        let calls_after_sweep = backend.calls_for(squad_uuid).len();
        runtime.update(16);
        runtime.update(16);
        assert_eq!(backend.calls_for(squad_uuid).len(), calls_after_sweep);
    }

    #[test]
    fn input_script_runs_every_frame_against_the_scene() {
        let script = script_asset("hud");
        let script_uuid = script.uuid;
        let root = EntityDefinition::new("Root");
        let mut project = project_with_root(root, vec![script]);
        project.scenes[0].input_script = Some(script_uuid);
        let scene_uuid = project.scenes[0].uuid;

        let (mut runtime, backend) = recording_runtime(project, 2);
        runtime.load_startup_scene().unwrap();
        for _ in 0..3 {
            runtime.update(16);
        }
        let calls = backend.calls_for(scene_uuid);
        assert_eq!(calls.len(), 3);
        assert!(calls.iter().all(|c| c.entry == "on_input" && c.unit == "hud"));
    }

    #[test]
    fn template_spawn_and_duplicate_attach_fresh_entities() {
        let mut root = EntityDefinition::new("Root");
        let bullet = EntityDefinition::new("Bullet");
        let bullet_uuid = bullet.uuid;
        root.children.push(bullet);
        let project = project_with_root(root, Vec::new());

        let mut runtime = ProjectRuntime::headless(project).unwrap();
        runtime.load_startup_scene().unwrap();
        let ctx = runtime.context().clone();
        let root_handle = runtime.active_scene().unwrap().root().unwrap();

        let spawned = runtime
            .active_scene_mut()
            .unwrap()
            .spawn_from_template(&ctx, root_handle, bullet_uuid)
            .unwrap();
        {
            let entity = ctx.arena.resolve(spawned).unwrap();
            let entity = entity.lock().unwrap();
            assert_ne!(entity.uuid, bullet_uuid, "copy must not share the template uuid");
        }
        assert_eq!(runtime.active_scene().unwrap().count_entities(&ctx), 3);

        let err = runtime
            .active_scene_mut()
            .unwrap()
            .spawn_from_template(&ctx, root_handle, Uuid::new_v4())
            .unwrap_err();
        assert!(matches!(err, DreamError::Structural(_)));

        let duplicated = runtime
            .active_scene_mut()
            .unwrap()
            .duplicate_entity(&ctx, spawned)
            .unwrap();
        assert_eq!(runtime.active_scene().unwrap().count_entities(&ctx), 4);
        let entity = ctx.arena.resolve(duplicated).unwrap();
        assert_eq!(entity.lock().unwrap().parent, Some(root_handle));

        let err = runtime
            .active_scene_mut()
            .unwrap()
            .duplicate_entity(&ctx, root_handle)
            .unwrap_err();
        assert!(matches!(err, DreamError::Structural(_)));
    }

    #[test]
    fn at_most_one_lifetime_task_per_entity_is_in_flight() {
        let root = EntityDefinition::new("Root");
        let project = project_with_root(root, Vec::new());
        let mut runtime = ProjectRuntime::headless(project).unwrap();
        runtime.load_startup_scene().unwrap();
        let ctx = runtime.context().clone();
        runtime.update(16);

        // Plant an incomplete stand-in in the slot: graph construction
        // must reuse it instead of creating a second lifetime task.
        let root_handle = runtime.active_scene().unwrap().root().unwrap();
        let stand_in = crate::tasks::Task::noop("stand_in");
        {
            let entity = ctx.arena.resolve(root_handle).unwrap();
            entity.lock().unwrap().lifetime_task = Some(Arc::clone(&stand_in));
        }
        let lifetime_before = {
            let entity = ctx.arena.resolve(root_handle).unwrap();
            let lifetime = entity.lock().unwrap().object_lifetime;
            lifetime
        };
        runtime.update(16);
        let entity = ctx.arena.resolve(root_handle).unwrap();
        let entity = entity.lock().unwrap();
        // The stand-in ran instead of a fresh lifetime task.
        assert_eq!(entity.object_lifetime, lifetime_before);
        assert_eq!(
            entity.lifetime_task.as_ref().unwrap().id(),
            stand_in.id()
        );
    }

    #[test]
    fn scene_switch_destroys_the_previous_tree() {
        let mut project = project_with_root(EntityDefinition::new("Root A"), Vec::new());
        let mut second = SceneDefinition::new("Second");
        second.root = EntityDefinition::new("Root B");
        let second_uuid = second.uuid;
        project.scenes.push(second);

        let mut runtime = ProjectRuntime::headless(project).unwrap();
        runtime.load_startup_scene().unwrap();
        let ctx = runtime.context().clone();
        runtime.update(16);
        assert_eq!(ctx.arena.len(), 1);

        runtime.load_scene_by_uuid(second_uuid).unwrap();
        assert_eq!(ctx.arena.len(), 1, "old tree must be collected");
        let scene = runtime.active_scene().unwrap();
        assert!(scene.entity_by_name(&ctx, "Root B").is_some());
    }
}
