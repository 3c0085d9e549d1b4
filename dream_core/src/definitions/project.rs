use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::definitions::asset::AssetDefinition;
use crate::definitions::scene::SceneDefinition;
use crate::error::{DreamError, Result};

/// The whole authored project: asset table plus scene list.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ProjectDefinition {
    pub uuid: Uuid,
    pub name: String,
    #[serde(default)]
    pub assets: Vec<AssetDefinition>,
    #[serde(default)]
    pub scenes: Vec<SceneDefinition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub startup_scene: Option<Uuid>,

    #[serde(skip)]
    asset_index: FxHashMap<Uuid, usize>,
}

impl ProjectDefinition {
    pub fn new(name: &str) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            name: name.to_string(),
            assets: Vec::new(),
            scenes: Vec::new(),
            startup_scene: None,
            asset_index: FxHashMap::default(),
        }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let mut def: ProjectDefinition = serde_json::from_str(json)?;
        def.rebuild_index();
        Ok(def)
    }

    /// Rebuild the uuid lookup table. Must be called after mutating
    /// `assets` directly; `from_json` does it automatically.
    pub fn rebuild_index(&mut self) {
        self.asset_index = self
            .assets
            .iter()
            .enumerate()
            .map(|(i, a)| (a.uuid, i))
            .collect();
    }

    pub fn add_asset(&mut self, def: AssetDefinition) {
        self.asset_index.insert(def.uuid, self.assets.len());
        self.assets.push(def);
    }

    pub fn asset_definition_by_uuid(&self, uuid: Uuid) -> Option<&AssetDefinition> {
        self.asset_index.get(&uuid).map(|&i| &self.assets[i])
    }

    pub fn scene_by_uuid(&self, uuid: Uuid) -> Option<&SceneDefinition> {
        self.scenes.iter().find(|s| s.uuid == uuid)
    }

    pub fn startup_scene(&self) -> Result<&SceneDefinition> {
        let uuid = self
            .startup_scene
            .or_else(|| self.scenes.first().map(|s| s.uuid))
            .ok_or_else(|| DreamError::Structural("project has no scenes".to_string()))?;
        self.scene_by_uuid(uuid)
            .ok_or_else(|| DreamError::Structural(format!("startup scene {} not found", uuid)))
    }
}
