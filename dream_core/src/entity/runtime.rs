use std::sync::Arc;

use log::{debug, error};
use rustc_hash::FxHashMap;
use uuid::Uuid;

use crate::assets::{
    AnimationRuntime, AssetRuntime, AudioRuntime, LightRuntime, ModelRuntime, PathRuntime,
    PhysicsObjectRuntime, ScriptRuntime, ScrollerRuntime,
};
use crate::components::audio::AudioBackend;
use crate::components::physics::PhysicsComponent;
use crate::definitions::asset::{AssetParams, AssetType};
use crate::definitions::entity::EntityDefinition;
use crate::definitions::project::ProjectDefinition;
use crate::entity::arena::EntityHandle;
use crate::entity::bounding_box::BoundingBox;
use crate::entity::event::Event;
use crate::math::Transform;
use crate::tasks::Task;

/// What a lifetime step decided for the entity this frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LifetimeStep {
    /// Deferral has not elapsed; the entity stays dormant.
    StillDeferred,
    /// Deferral elapsed this frame; assets must be materialized now.
    ReadyToLoad,
    /// Loaded and running.
    Active,
}

const NO_ASSET: Option<AssetRuntime> = None;

/// A live scenegraph node. Always accessed through its arena slot's
/// mutex; tasks use `try_lock` and defer on contention.
pub struct EntityRuntime {
    pub uuid: Uuid,
    pub name: String,
    pub handle: EntityHandle,
    pub definition: Arc<EntityDefinition>,
    pub parent: Option<EntityHandle>,
    pub children: Vec<EntityHandle>,

    pub transform: Transform,
    pub initial_transform: Transform,
    pub bounding_box: BoundingBox,

    assets: [Option<AssetRuntime>; AssetType::COUNT],
    pub event_queue: Vec<Event>,
    /// Free-form state scripts attach to the entity.
    pub attributes: FxHashMap<String, String>,

    /// Milliseconds of deferral left before assets load.
    pub deferred_for: i64,
    /// Milliseconds this entity has been active.
    pub object_lifetime: i64,
    loaded: bool,
    deleted: bool,

    pub hidden: bool,
    pub always_draw: bool,
    pub font_text: Option<String>,
    pub font_color: Option<glam::Vec3>,
    pub font_scale: Option<f32>,

    // Outstanding per-frame tasks targeting this entity; used to enforce
    // at most one of each kind and to expire them on despawn.
    pub(crate) lifetime_task: Option<Arc<Task>>,
    pub(crate) script_init_task: Option<Arc<Task>>,
    pub(crate) script_update_task: Option<Arc<Task>>,
    pub(crate) script_event_task: Option<Arc<Task>>,
    pub(crate) asset_update_task: Option<Arc<Task>>,
}

impl EntityRuntime {
    pub fn new(
        handle: EntityHandle,
        definition: Arc<EntityDefinition>,
        parent: Option<EntityHandle>,
    ) -> Self {
        EntityRuntime {
            uuid: definition.uuid,
            name: definition.name.clone(),
            handle,
            parent,
            children: Vec::new(),
            transform: definition.transform.clone(),
            initial_transform: definition.transform.clone(),
            bounding_box: BoundingBox::unit(),
            assets: [NO_ASSET; AssetType::COUNT],
            event_queue: Vec::new(),
            attributes: FxHashMap::default(),
            deferred_for: definition.deferred_for,
            object_lifetime: 0,
            loaded: false,
            deleted: false,
            hidden: definition.hidden,
            always_draw: definition.always_draw,
            font_text: definition.font_text.clone(),
            font_color: definition.font_color,
            font_scale: definition.font_scale,
            lifetime_task: None,
            script_init_task: None,
            script_update_task: None,
            script_event_task: None,
            asset_update_task: None,
            definition,
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn is_marked_deleted(&self) -> bool {
        self.deleted
    }

    /// Flag for removal. The entity stays in the tree until the next
    /// garbage collection pass detaches it.
    pub fn mark_deleted(&mut self) {
        self.deleted = true;
    }

    pub fn asset(&self, kind: AssetType) -> Option<&AssetRuntime> {
        self.assets[kind.slot()].as_ref()
    }

    pub fn asset_mut(&mut self, kind: AssetType) -> Option<&mut AssetRuntime> {
        self.assets[kind.slot()].as_mut()
    }

    pub fn has_asset(&self, kind: AssetType) -> bool {
        self.assets[kind.slot()].is_some()
    }

    pub fn set_asset(&mut self, asset: AssetRuntime) {
        let slot = asset.asset_type().slot();
        self.assets[slot] = Some(asset);
    }

    pub fn take_asset(&mut self, kind: AssetType) -> Option<AssetRuntime> {
        self.assets[kind.slot()].take()
    }

    /// Attach or overwrite a free-form attribute. Scripts use these to
    /// persist state on the entity between dispatches.
    pub fn set_attribute(&mut self, key: &str, value: &str) {
        self.attributes.insert(key.to_string(), value.to_string());
    }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    pub fn queue_event(&mut self, event: Event) {
        self.event_queue.push(event);
    }

    /// Take the queued events in arrival order, leaving the queue empty.
    pub fn drain_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.event_queue)
    }

    /// Advance the lifecycle clock by one frame. The frame the deferral
    /// elapses reports [`LifetimeStep::ReadyToLoad`] and does not count
    /// towards `object_lifetime`; accumulation starts the frame after
    /// assets load.
    pub fn step_lifetime(&mut self, delta_ms: i64) -> LifetimeStep {
        if self.loaded {
            self.object_lifetime += delta_ms;
            return LifetimeStep::Active;
        }
        self.deferred_for -= delta_ms;
        if self.deferred_for <= 0 {
            self.deferred_for = 0;
            LifetimeStep::ReadyToLoad
        } else {
            LifetimeStep::StillDeferred
        }
    }

    /// Materialize every asset referenced by the definition. Runs exactly
    /// once per entity; failures are logged and the slot stays empty
    /// rather than halting the entity.
    pub fn load_assets(
        &mut self,
        project: &ProjectDefinition,
        audio: &mut dyn AudioBackend,
        physics: &mut PhysicsComponent,
    ) {
        if self.loaded {
            return;
        }
        let references: Vec<(AssetType, Uuid)> = self
            .definition
            .assets
            .iter()
            .map(|(&kind, &uuid)| (kind, uuid))
            .collect();
        for (kind, uuid) in references {
            let Some(def) = project.asset_definition_by_uuid(uuid) else {
                error!(
                    "entity '{}' references missing {} asset {}",
                    self.name, kind, uuid
                );
                continue;
            };
            match self.instantiate(&def.params.clone(), audio, physics) {
                Some(asset) => self.set_asset(asset),
                None => error!(
                    "entity '{}' failed to instantiate {} asset '{}'",
                    self.name, kind, def.name
                ),
            }
        }
        self.loaded = true;
        debug!("entity '{}' loaded {} asset(s)", self.name, self.definition.assets.len());
    }

    fn instantiate(
        &mut self,
        params: &AssetParams,
        audio: &mut dyn AudioBackend,
        physics: &mut PhysicsComponent,
    ) -> Option<AssetRuntime> {
        match params {
            AssetParams::Animation { keyframes, looping } => Some(AssetRuntime::Animation(
                AnimationRuntime::new(keyframes.clone(), *looping),
            )),
            AssetParams::Audio {
                path,
                volume,
                looping,
                markers,
            } => {
                let clip = match audio.load_clip(path) {
                    Ok(clip) => clip,
                    Err(e) => {
                        error!("audio clip '{}' failed to load: {}", path, e);
                        return None;
                    }
                };
                let mut runtime = AudioRuntime::new(clip, *volume, *looping, markers.clone());
                runtime.play(audio);
                Some(AssetRuntime::Audio(runtime))
            }
            AssetParams::Light { color, intensity } => {
                Some(AssetRuntime::Light(LightRuntime::new(*color, *intensity)))
            }
            AssetParams::Model { path } => Some(AssetRuntime::Model(ModelRuntime::new(path.clone()))),
            AssetParams::Path {
                control_points,
                speed,
                wrap,
            } => Some(AssetRuntime::Path(PathRuntime::new(
                control_points.clone(),
                *speed,
                *wrap,
            ))),
            AssetParams::Physics {
                shape,
                mass,
                restitution,
                kinematic,
                character,
            } => {
                let mut body =
                    PhysicsObjectRuntime::new(*shape, *mass, *restitution, *kinematic, *character);
                physics.add_entity(self.handle, self.uuid, &self.transform, &mut body);
                Some(AssetRuntime::Physics(body))
            }
            AssetParams::Script { unit } => {
                Some(AssetRuntime::Script(ScriptRuntime::new(unit.clone())))
            }
            AssetParams::Scroller {
                velocity,
                range_min,
                range_max,
            } => Some(AssetRuntime::Scroller(ScrollerRuntime::new(
                *velocity, *range_min, *range_max,
            ))),
        }
    }

    /// Invalidate every outstanding task targeting this entity so the
    /// executor completes them without touching the slot again.
    pub(crate) fn expire_tasks(&mut self) {
        for slot in [
            &mut self.lifetime_task,
            &mut self.script_init_task,
            &mut self.script_update_task,
            &mut self.script_event_task,
            &mut self.asset_update_task,
        ] {
            if let Some(task) = slot.take() {
                task.set_expired(true);
            }
        }
    }

    pub fn reset_transform(&mut self) {
        let initial = self.initial_transform.clone();
        self.transform.reset_to(&initial);
    }
}
