use glam::Vec3;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::definitions::asset::AssetType;
use crate::math::Transform;

/// One authored scenegraph node: the template a live entity is
/// instantiated from. Uuids are unique within a project; the child list
/// here is the authoritative tree shape.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct EntityDefinition {
    pub uuid: Uuid,
    pub name: String,
    #[serde(default)]
    pub transform: Transform,
    /// Milliseconds to wait after spawn before materializing assets.
    #[serde(default)]
    pub deferred_for: i64,
    /// AssetType -> AssetDefinition uuid instantiated on this node.
    #[serde(default)]
    pub assets: FxHashMap<AssetType, Uuid>,
    #[serde(default)]
    pub children: Vec<EntityDefinition>,
    #[serde(default)]
    pub hidden: bool,
    #[serde(default)]
    pub always_draw: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_color: Option<Vec3>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_scale: Option<f32>,
}

impl EntityDefinition {
    pub fn new(name: &str) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            name: name.to_string(),
            transform: Transform::default(),
            deferred_for: 0,
            assets: FxHashMap::default(),
            children: Vec::new(),
            hidden: false,
            always_draw: false,
            font_text: None,
            font_color: None,
            font_scale: None,
        }
    }

    /// Template copy with fresh uuids throughout the subtree. Used by the
    /// editor and by emitter-style duplication.
    pub fn duplicate(&self) -> EntityDefinition {
        let mut copy = self.clone();
        copy.refresh_uuids();
        copy.name = format!("{} Copy", self.name);
        copy
    }

    fn refresh_uuids(&mut self) {
        self.uuid = Uuid::new_v4();
        for child in &mut self.children {
            child.refresh_uuids();
        }
    }

    /// Pre-order search of this definition subtree.
    pub fn find_by_uuid(&self, uuid: Uuid) -> Option<&EntityDefinition> {
        if self.uuid == uuid {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find_by_uuid(uuid))
    }

    pub fn count_all(&self) -> usize {
        1 + self.children.iter().map(|c| c.count_all()).sum::<usize>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree() -> EntityDefinition {
        let mut root = EntityDefinition::new("Root");
        let mut a = EntityDefinition::new("A");
        a.children.push(EntityDefinition::new("A1"));
        root.children.push(a);
        root.children.push(EntityDefinition::new("B"));
        root
    }

    #[test]
    fn find_by_uuid_searches_subtree() {
        let root = tree();
        let target = root.children[0].children[0].uuid;
        let found = root.find_by_uuid(target).unwrap();
        assert_eq!(found.name, "A1");
        assert!(root.find_by_uuid(Uuid::new_v4()).is_none());
    }

    #[test]
    fn duplicate_assigns_fresh_uuids() {
        let root = tree();
        let copy = root.duplicate();
        assert_ne!(copy.uuid, root.uuid);
        assert_ne!(copy.children[0].uuid, root.children[0].uuid);
        assert_eq!(copy.count_all(), root.count_all());
    }

    #[test]
    fn definition_json_round_trip() {
        let mut root = tree();
        root.deferred_for = 250;
        root.assets.insert(AssetType::Script, Uuid::new_v4());
        let json = serde_json::to_string(&root).unwrap();
        let back: EntityDefinition = serde_json::from_str(&json).unwrap();
        assert_eq!(back, root);
    }
}
