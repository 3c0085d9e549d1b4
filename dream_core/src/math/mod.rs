pub mod transform;

pub use transform::{Transform, TransformType};
