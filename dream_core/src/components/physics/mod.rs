//! Rigid body simulation behind one coarse lock, stepped once per frame
//! by a dedicated task after every entity's lifetime task has finished.

pub mod tasks;

use crossbeam::channel::{unbounded, Receiver, Sender};
use glam::{Quat, Vec3};
use log::{debug, trace};
use rapier3d::na;
use rapier3d::prelude::*;
use rustc_hash::FxHashMap;
use uuid::Uuid;

use crate::assets::PhysicsObjectRuntime;
use crate::definitions::asset::CollisionShape;
use crate::entity::arena::EntityHandle;
use crate::entity::event::Event;
use crate::math::Transform;

/// What the step produced for one entity: the body's new pose (dynamic
/// bodies only) and any contact events addressed to it.
pub struct PhysicsUpdate {
    pub entity: EntityHandle,
    pub new_pose: Option<(Vec3, Quat)>,
    pub events: Vec<Event>,
}

struct BodyInfo {
    entity: EntityHandle,
    uuid: Uuid,
    character: bool,
    dynamic: bool,
    collider: ColliderHandle,
}

/// Raw contact captured during a step, resolved to entities afterwards.
struct ContactSample {
    collider1: ColliderHandle,
    collider2: ColliderHandle,
    impulse: f32,
    point: Vec3,
}

struct ContactChannel {
    sender: Sender<ContactSample>,
}

impl EventHandler for ContactChannel {
    fn handle_collision_event(
        &self,
        _bodies: &RigidBodySet,
        colliders: &ColliderSet,
        event: CollisionEvent,
        contact_pair: Option<&ContactPair>,
    ) {
        // Edge-triggered: only the transition into contact produces an
        // event pair, Stopped transitions are ignored.
        let CollisionEvent::Started(h1, h2, _) = event else {
            return;
        };
        let mut impulse = 0.0f32;
        let mut point = Vec3::ZERO;
        if let Some(pair) = contact_pair {
            if let Some(collider1) = colliders.get(pair.collider1) {
                for manifold in &pair.manifolds {
                    for contact in &manifold.points {
                        if contact.data.impulse >= impulse {
                            impulse = contact.data.impulse;
                            let world = collider1.position() * contact.local_p1;
                            point = Vec3::new(world.x, world.y, world.z);
                        }
                    }
                }
            }
        }
        let _ = self.sender.send(ContactSample {
            collider1: h1,
            collider2: h2,
            impulse,
            point,
        });
    }
}

struct NoHooks;
impl PhysicsHooks for NoHooks {}

/// The Rapier world plus the bookkeeping that ties bodies back to
/// entities.
pub struct PhysicsComponent {
    pipeline: PhysicsPipeline,
    integration_parameters: IntegrationParameters,
    islands: IslandManager,
    broad_phase: BroadPhase,
    narrow_phase: NarrowPhase,
    bodies: RigidBodySet,
    colliders: ColliderSet,
    impulse_joints: ImpulseJointSet,
    multibody_joints: MultibodyJointSet,
    ccd_solver: CCDSolver,
    gravity: Vector<Real>,
    body_info: FxHashMap<RigidBodyHandle, BodyInfo>,
    collider_to_body: FxHashMap<ColliderHandle, RigidBodyHandle>,
    contact_tx: Sender<ContactSample>,
    contact_rx: Receiver<ContactSample>,
}

impl PhysicsComponent {
    pub fn new(gravity: Vec3) -> Self {
        let (contact_tx, contact_rx) = unbounded();
        PhysicsComponent {
            pipeline: PhysicsPipeline::new(),
            integration_parameters: IntegrationParameters::default(),
            islands: IslandManager::new(),
            broad_phase: BroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            gravity: vector![gravity.x, gravity.y, gravity.z],
            body_info: FxHashMap::default(),
            collider_to_body: FxHashMap::default(),
            contact_tx,
            contact_rx,
        }
    }

    pub fn set_gravity(&mut self, gravity: Vec3) {
        self.gravity = vector![gravity.x, gravity.y, gravity.z];
    }

    pub fn body_count(&self) -> usize {
        self.body_info.len()
    }

    /// Create the rigid body and collider for an entity's physics asset
    /// and record the association. Fills `physics.body`.
    pub fn add_entity(
        &mut self,
        entity: EntityHandle,
        uuid: Uuid,
        transform: &Transform,
        physics: &mut PhysicsObjectRuntime,
    ) {
        let position = to_isometry(transform.translation, transform.orientation);
        let fixed = matches!(physics.shape, CollisionShape::StaticPlane { .. })
            || (physics.mass <= 0.0 && !physics.kinematic);
        let builder = if fixed {
            RigidBodyBuilder::fixed()
        } else if physics.kinematic {
            RigidBodyBuilder::kinematic_position_based()
        } else {
            RigidBodyBuilder::dynamic().additional_mass(physics.mass)
        };
        let body = self.bodies.insert(builder.position(position).build());

        let collider = match physics.shape {
            CollisionShape::Sphere { radius } => ColliderBuilder::ball(radius),
            CollisionShape::Cuboid { half_extents } => {
                ColliderBuilder::cuboid(half_extents.x, half_extents.y, half_extents.z)
            }
            CollisionShape::StaticPlane { normal } => ColliderBuilder::halfspace(
                UnitVector::new_normalize(vector![normal.x, normal.y, normal.z]),
            ),
        }
        .restitution(physics.restitution)
        .density(0.0)
        .active_events(ActiveEvents::COLLISION_EVENTS)
        .build();
        let collider = self
            .colliders
            .insert_with_parent(collider, body, &mut self.bodies);

        self.body_info.insert(
            body,
            BodyInfo {
                entity,
                uuid,
                character: physics.character,
                dynamic: !fixed && !physics.kinematic,
                collider,
            },
        );
        self.collider_to_body.insert(collider, body);
        physics.body = Some(body);
        debug!("physics body added for entity {uuid}");
    }

    /// Remove an entity's body and collider; safe to call with a handle
    /// that was already removed.
    pub fn remove_entity(&mut self, body: RigidBodyHandle) {
        if let Some(info) = self.body_info.remove(&body) {
            self.collider_to_body.remove(&info.collider);
            self.bodies.remove(
                body,
                &mut self.islands,
                &mut self.colliders,
                &mut self.impulse_joints,
                &mut self.multibody_joints,
                true,
            );
            trace!("physics body removed for entity {}", info.uuid);
        }
    }

    /// Drive a kinematic body towards the entity's authored transform.
    pub fn set_kinematic_target(&mut self, body: RigidBodyHandle, transform: &Transform) {
        if let Some(body) = self.bodies.get_mut(body) {
            body.set_next_kinematic_translation(vector![
                transform.translation.x,
                transform.translation.y,
                transform.translation.z
            ]);
            let q = transform.orientation;
            let rotation = na::UnitQuaternion::from_quaternion(na::Quaternion::new(
                q.w, q.x, q.y, q.z,
            ));
            body.set_next_kinematic_rotation(rotation.scaled_axis());
        }
    }

    /// Advance the world by one frame and gather per-entity results:
    /// dynamic body poses plus a symmetric pair of contact events for
    /// every contact that started during this step.
    pub fn step(&mut self, delta_ms: i64) -> Vec<PhysicsUpdate> {
        self.integration_parameters.dt = delta_ms as f32 / 1000.0;
        let events = ContactChannel {
            sender: self.contact_tx.clone(),
        };
        self.pipeline.step(
            &self.gravity,
            &self.integration_parameters,
            &mut self.islands,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.bodies,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            &mut self.ccd_solver,
            &NoHooks,
            &events,
        );

        let mut updates: FxHashMap<EntityHandle, PhysicsUpdate> = FxHashMap::default();

        while let Ok(sample) = self.contact_rx.try_recv() {
            let info = |collider| {
                self.collider_to_body
                    .get(collider)
                    .and_then(|body| self.body_info.get(body))
            };
            let (Some(a), Some(b)) = (info(&sample.collider1), info(&sample.collider2)) else {
                continue;
            };
            let character = a.character || b.character;
            update_for(&mut updates, a.entity)
                .events
                .push(Event::collision(b.uuid, sample.impulse, sample.point, character));
            update_for(&mut updates, b.entity)
                .events
                .push(Event::collision(a.uuid, sample.impulse, sample.point, character));
        }

        for (handle, info) in &self.body_info {
            if !info.dynamic {
                continue;
            }
            if let Some(body) = self.bodies.get(*handle) {
                let position = body.position();
                let t = position.translation.vector;
                let r = position.rotation.quaternion();
                update_for(&mut updates, info.entity).new_pose = Some((
                    Vec3::new(t.x, t.y, t.z),
                    Quat::from_xyzw(r.i, r.j, r.k, r.w),
                ));
            }
        }

        updates.into_values().collect()
    }

    /// World-space AABB of every collider, for the debug overlay.
    pub fn collider_aabbs(&self) -> Vec<(Vec3, Vec3)> {
        self.colliders
            .iter()
            .map(|(_, collider)| {
                let aabb = collider.compute_aabb();
                (
                    Vec3::new(aabb.mins.x, aabb.mins.y, aabb.mins.z),
                    Vec3::new(aabb.maxs.x, aabb.maxs.y, aabb.maxs.z),
                )
            })
            .collect()
    }
}

fn update_for(
    updates: &mut FxHashMap<EntityHandle, PhysicsUpdate>,
    entity: EntityHandle,
) -> &mut PhysicsUpdate {
    updates.entry(entity).or_insert_with(|| PhysicsUpdate {
        entity,
        new_pose: None,
        events: Vec::new(),
    })
}

fn to_isometry(translation: Vec3, orientation: Quat) -> Isometry<Real> {
    Isometry::from_parts(
        Translation::new(translation.x, translation.y, translation.z),
        na::UnitQuaternion::from_quaternion(na::Quaternion::new(
            orientation.w,
            orientation.x,
            orientation.y,
            orientation.z,
        )),
    )
}
