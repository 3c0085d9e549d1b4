use glam::{Vec3, Vec4};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::definitions::entity::EntityDefinition;
use crate::math::Transform;

/// An authored scene: environment settings plus the root of the entity
/// definition tree.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct SceneDefinition {
    pub uuid: Uuid,
    pub name: String,
    #[serde(default)]
    pub camera_transform: Transform,
    #[serde(default = "default_gravity")]
    pub gravity: Vec3,
    #[serde(default)]
    pub clear_color: Vec4,
    #[serde(default)]
    pub physics_debug: bool,
    /// Script asset invoked by the per-frame input-execute task.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_script: Option<Uuid>,
    pub root: EntityDefinition,
}

fn default_gravity() -> Vec3 {
    Vec3::new(0.0, -9.81, 0.0)
}

impl SceneDefinition {
    pub fn new(name: &str) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            name: name.to_string(),
            camera_transform: Transform::default(),
            gravity: default_gravity(),
            clear_color: Vec4::ZERO,
            physics_debug: false,
            input_script: None,
            root: EntityDefinition::new("Root"),
        }
    }
}
