//! Dependency-gated, retriable units of per-frame work and the worker
//! pool that executes them.

pub mod manager;
pub mod task;

pub use manager::TaskManager;
pub use task::{Task, TaskId, TaskOutcome, TaskWork};
