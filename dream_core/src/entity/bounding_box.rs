use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Axis-aligned bounds of an entity, used for debug drawing and cheap
/// containment queries.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct BoundingBox {
    pub min: Vec3,
    pub max: Vec3,
}

impl Default for BoundingBox {
    /// Inverted limits so the first `integrate` snaps to the real extent.
    fn default() -> Self {
        BoundingBox {
            min: Vec3::splat(f32::MAX),
            max: Vec3::splat(f32::MIN),
        }
    }
}

impl BoundingBox {
    pub fn from_extents(min: Vec3, max: Vec3) -> Self {
        BoundingBox { min, max }
    }

    pub fn unit() -> Self {
        BoundingBox {
            min: Vec3::splat(-0.5),
            max: Vec3::splat(0.5),
        }
    }

    pub fn integrate(&mut self, point: Vec3) {
        self.min = self.min.min(point);
        self.max = self.max.max(point);
    }

    pub fn merge(&mut self, other: &BoundingBox) {
        self.min = self.min.min(other.min);
        self.max = self.max.max(other.max);
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn half_extents(&self) -> Vec3 {
        (self.max - self.min) * 0.5
    }

    pub fn contains(&self, point: Vec3) -> bool {
        point.cmpge(self.min).all() && point.cmple(self.max).all()
    }
}
