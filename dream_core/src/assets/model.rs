use crate::entity::bounding_box::BoundingBox;

/// Reference to a mesh on disk plus the extent it contributes to the
/// owning entity. Mesh data itself lives with the renderer.
pub struct ModelRuntime {
    pub path: String,
    pub bounding_box: BoundingBox,
}

impl ModelRuntime {
    pub fn new(path: String) -> Self {
        ModelRuntime {
            path,
            // Placeholder extent until the renderer reports real bounds.
            bounding_box: BoundingBox::unit(),
        }
    }
}
