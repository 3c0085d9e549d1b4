use glam::Vec3;

/// A point light contributed to the frame's light list while its entity
/// is visible.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LightRuntime {
    pub color: Vec3,
    pub intensity: f32,
    pub enabled: bool,
}

impl LightRuntime {
    pub fn new(color: Vec3, intensity: f32) -> Self {
        LightRuntime {
            color,
            intensity,
            enabled: true,
        }
    }
}
