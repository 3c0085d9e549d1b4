//! Static, JSON-backed descriptions of the authored scene graph and its
//! asset bindings. Read-only at runtime; the runtime tree in `entity` is
//! instantiated from these.

pub mod asset;
pub mod entity;
pub mod project;
pub mod scene;

pub use asset::{AssetDefinition, AssetParams, AssetType, AudioMarker, CollisionShape, Keyframe};
pub use entity::EntityDefinition;
pub use project::ProjectDefinition;
pub use scene::SceneDefinition;
