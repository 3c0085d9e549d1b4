pub mod arena;
pub mod bounding_box;
pub mod event;
pub mod runtime;
pub mod tasks;

pub use arena::{EntityArena, EntityHandle};
pub use bounding_box::BoundingBox;
pub use event::Event;
pub use runtime::{EntityRuntime, LifetimeStep};
