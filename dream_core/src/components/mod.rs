//! Engine subsystems shared by every scene: each lives behind its own
//! coarse lock inside the project context and is touched by tasks via
//! `try_lock`.

pub mod audio;
pub mod graphics;
pub mod input;
pub mod physics;
pub mod script;
pub mod time;

pub use audio::{AudioBackend, ClipHandle, NullAudioBackend};
pub use graphics::GraphicsComponent;
pub use input::InputComponent;
pub use physics::PhysicsComponent;
pub use script::{NullScriptBackend, RecordingScriptBackend, ScriptBackend, ScriptEntry};
pub use time::{Time, DELTA_MAX_MS};
