//! Live counterparts of authored assets. Instantiated onto entities when
//! their deferral elapses; each kind keeps only the state its per-frame
//! update needs.

pub mod animation;
pub mod audio;
pub mod light;
pub mod model;
pub mod path;
pub mod physics;
pub mod script;
pub mod scroller;

pub use animation::{AnimationPose, AnimationRuntime};
pub use audio::{AudioRuntime, PlaybackState};
pub use light::LightRuntime;
pub use model::ModelRuntime;
pub use path::PathRuntime;
pub use physics::PhysicsObjectRuntime;
pub use script::ScriptRuntime;
pub use scroller::ScrollerRuntime;

use crate::definitions::asset::AssetType;

/// Sum over the asset kinds an entity slot can hold. One enum rather
/// than trait objects: the set of kinds is closed and per-frame updates
/// match on it directly.
pub enum AssetRuntime {
    Animation(AnimationRuntime),
    Audio(AudioRuntime),
    Light(LightRuntime),
    Model(ModelRuntime),
    Path(PathRuntime),
    Physics(PhysicsObjectRuntime),
    Script(ScriptRuntime),
    Scroller(ScrollerRuntime),
}

impl AssetRuntime {
    pub fn asset_type(&self) -> AssetType {
        match self {
            AssetRuntime::Animation(_) => AssetType::Animation,
            AssetRuntime::Audio(_) => AssetType::Audio,
            AssetRuntime::Light(_) => AssetType::Light,
            AssetRuntime::Model(_) => AssetType::Model,
            AssetRuntime::Path(_) => AssetType::Path,
            AssetRuntime::Physics(_) => AssetType::Physics,
            AssetRuntime::Script(_) => AssetType::Script,
            AssetRuntime::Scroller(_) => AssetType::Scroller,
        }
    }

    pub fn as_physics(&self) -> Option<&PhysicsObjectRuntime> {
        match self {
            AssetRuntime::Physics(physics) => Some(physics),
            _ => None,
        }
    }

    pub fn as_physics_mut(&mut self) -> Option<&mut PhysicsObjectRuntime> {
        match self {
            AssetRuntime::Physics(physics) => Some(physics),
            _ => None,
        }
    }

    pub fn as_script(&self) -> Option<&ScriptRuntime> {
        match self {
            AssetRuntime::Script(script) => Some(script),
            _ => None,
        }
    }

    pub fn as_script_mut(&mut self) -> Option<&mut ScriptRuntime> {
        match self {
            AssetRuntime::Script(script) => Some(script),
            _ => None,
        }
    }

    pub fn as_audio_mut(&mut self) -> Option<&mut AudioRuntime> {
        match self {
            AssetRuntime::Audio(audio) => Some(audio),
            _ => None,
        }
    }

    pub fn as_light(&self) -> Option<&LightRuntime> {
        match self {
            AssetRuntime::Light(light) => Some(light),
            _ => None,
        }
    }
}
