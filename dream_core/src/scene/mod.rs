pub mod runtime;

pub use runtime::{SceneRuntime, SceneState};
