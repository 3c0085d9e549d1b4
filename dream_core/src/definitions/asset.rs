use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The asset kinds an entity may carry, at most one of each.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum AssetType {
    Animation,
    Audio,
    Light,
    Model,
    Path,
    Physics,
    Script,
    Scroller,
}

impl AssetType {
    pub const COUNT: usize = 8;

    pub const ALL: [AssetType; Self::COUNT] = [
        AssetType::Animation,
        AssetType::Audio,
        AssetType::Light,
        AssetType::Model,
        AssetType::Path,
        AssetType::Physics,
        AssetType::Script,
        AssetType::Scroller,
    ];

    /// Index into the entity's fixed asset-slot array.
    pub fn slot(self) -> usize {
        match self {
            AssetType::Animation => 0,
            AssetType::Audio => 1,
            AssetType::Light => 2,
            AssetType::Model => 3,
            AssetType::Path => 4,
            AssetType::Physics => 5,
            AssetType::Script => 6,
            AssetType::Scroller => 7,
        }
    }
}

impl std::fmt::Display for AssetType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            AssetType::Animation => "animation",
            AssetType::Audio => "audio",
            AssetType::Light => "light",
            AssetType::Model => "model",
            AssetType::Path => "path",
            AssetType::Physics => "physics",
            AssetType::Script => "script",
            AssetType::Scroller => "scroller",
        };
        write!(f, "{}", name)
    }
}

/// One keyframe of a transform animation.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Keyframe {
    pub time_ms: i64,
    pub translation: Vec3,
    #[serde(default = "Quat::default")]
    pub rotation: Quat,
    #[serde(default = "default_scale")]
    pub scale: Vec3,
}

fn default_scale() -> Vec3 {
    Vec3::ONE
}

/// A named sample offset in an audio clip. Crossing it during playback
/// enqueues an event on the owning entity.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct AudioMarker {
    pub name: String,
    pub sample_offset: u64,
    #[serde(default)]
    pub repeat: bool,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
#[serde(rename_all = "snake_case", tag = "shape")]
pub enum CollisionShape {
    Sphere { radius: f32 },
    Cuboid { half_extents: Vec3 },
    StaticPlane { normal: Vec3 },
}

/// Kind-specific authored parameters, tagged by asset type in JSON.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum AssetParams {
    Animation {
        keyframes: Vec<Keyframe>,
        #[serde(default)]
        looping: bool,
    },
    Audio {
        path: String,
        #[serde(default = "default_volume")]
        volume: f32,
        #[serde(default)]
        looping: bool,
        #[serde(default)]
        markers: Vec<AudioMarker>,
    },
    Light {
        color: Vec3,
        intensity: f32,
    },
    Model {
        path: String,
    },
    Path {
        control_points: Vec<Vec3>,
        speed: f32,
        #[serde(default)]
        wrap: bool,
    },
    Physics {
        #[serde(flatten)]
        shape: CollisionShape,
        mass: f32,
        #[serde(default)]
        restitution: f32,
        #[serde(default)]
        kinematic: bool,
        /// Marks the player entity; contact events against it carry a
        /// `character` attribute.
        #[serde(default)]
        character: bool,
    },
    Script {
        /// Name of the compiled script unit the VM resolves entry points in.
        unit: String,
    },
    Scroller {
        velocity: Vec3,
        range_min: Vec3,
        range_max: Vec3,
    },
}

fn default_volume() -> f32 {
    1.0
}

impl AssetParams {
    pub fn asset_type(&self) -> AssetType {
        match self {
            AssetParams::Animation { .. } => AssetType::Animation,
            AssetParams::Audio { .. } => AssetType::Audio,
            AssetParams::Light { .. } => AssetType::Light,
            AssetParams::Model { .. } => AssetType::Model,
            AssetParams::Path { .. } => AssetType::Path,
            AssetParams::Physics { .. } => AssetType::Physics,
            AssetParams::Script { .. } => AssetType::Script,
            AssetParams::Scroller { .. } => AssetType::Scroller,
        }
    }
}

/// An authored asset, instantiated on entities by uuid reference.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct AssetDefinition {
    pub uuid: Uuid,
    pub name: String,
    #[serde(flatten)]
    pub params: AssetParams,
}

impl AssetDefinition {
    pub fn asset_type(&self) -> AssetType {
        self.params.asset_type()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn asset_definition_json_round_trip() {
        let def = AssetDefinition {
            uuid: Uuid::new_v4(),
            name: "Bounce".to_string(),
            params: AssetParams::Physics {
                shape: CollisionShape::Sphere { radius: 0.5 },
                mass: 2.0,
                restitution: 0.8,
                kinematic: false,
                character: true,
            },
        };
        let json = serde_json::to_string(&def).unwrap();
        let back: AssetDefinition = serde_json::from_str(&json).unwrap();
        assert_eq!(back, def);
        assert_eq!(back.asset_type(), AssetType::Physics);
    }

    #[test]
    fn audio_defaults_applied() {
        let json = r#"{
            "uuid": "7f1f35c5-93a1-4a3e-9a3b-2f6f5d1c0001",
            "name": "Theme",
            "type": "audio",
            "path": "audio/theme.ogg"
        }"#;
        let def: AssetDefinition = serde_json::from_str(json).unwrap();
        match def.params {
            AssetParams::Audio {
                volume,
                looping,
                ref markers,
                ..
            } => {
                assert_eq!(volume, 1.0);
                assert!(!looping);
                assert!(markers.is_empty());
            }
            _ => panic!("expected audio params"),
        }
    }

    #[test]
    fn slot_indices_are_dense_and_unique() {
        let mut seen = [false; AssetType::COUNT];
        for ty in AssetType::ALL {
            let idx = ty.slot();
            assert!(idx < AssetType::COUNT);
            assert!(!seen[idx]);
            seen[idx] = true;
        }
    }
}
