//! Core runtime for the Dream engine: entity lifecycle, asset
//! instantiation, and the per-frame task graph that drives scripts,
//! physics and audio across a worker pool.
//!
//! The entry point is [`project::ProjectRuntime`]: construct it from a
//! [`definitions::project::ProjectDefinition`], load a scene, then call
//! [`project::ProjectRuntime::update`] once per frame.

pub mod assets;
pub mod components;
pub mod definitions;
pub mod entity;
pub mod error;
pub mod math;
pub mod project;
pub mod scene;
pub mod tasks;

pub use error::{DreamError, Result};
pub use project::{ProjectContext, ProjectRuntime};
pub use scene::{SceneRuntime, SceneState};

/// Install the process-wide logger, honoring `RUST_LOG` and defaulting
/// to `info`. Safe to call more than once.
pub fn init_logging() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .try_init();
}
