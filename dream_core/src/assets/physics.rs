use rapier3d::prelude::RigidBodyHandle;

use crate::definitions::asset::CollisionShape;

/// Physical presence of an entity. The body handle is set when the
/// entity is registered with the physics world and cleared when it is
/// pulled back out during garbage collection.
pub struct PhysicsObjectRuntime {
    pub shape: CollisionShape,
    pub mass: f32,
    pub restitution: f32,
    pub kinematic: bool,
    /// Marks the player body; contact events against it are tagged so
    /// scripts can tell character touches from scenery.
    pub character: bool,
    pub body: Option<RigidBodyHandle>,
}

impl PhysicsObjectRuntime {
    pub fn new(
        shape: CollisionShape,
        mass: f32,
        restitution: f32,
        kinematic: bool,
        character: bool,
    ) -> Self {
        PhysicsObjectRuntime {
            shape,
            mass,
            restitution,
            kinematic,
            character,
            body: None,
        }
    }

    pub fn in_world(&self) -> bool {
        self.body.is_some()
    }
}
