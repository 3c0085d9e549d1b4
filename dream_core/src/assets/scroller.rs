use glam::Vec3;

/// Constant-velocity drift with per-axis wraparound, used for backdrop
/// layers that slide forever within a band.
pub struct ScrollerRuntime {
    velocity: Vec3,
    range_min: Vec3,
    range_max: Vec3,
}

impl ScrollerRuntime {
    pub fn new(velocity: Vec3, range_min: Vec3, range_max: Vec3) -> Self {
        ScrollerRuntime {
            velocity,
            range_min,
            range_max,
        }
    }

    pub fn velocity(&self) -> Vec3 {
        self.velocity
    }

    /// Advance `position` by one frame, wrapping each axis that leaves
    /// its range back to the opposite edge.
    pub fn update(&self, position: Vec3, delta_ms: i64) -> Vec3 {
        let mut next = position + self.velocity * (delta_ms as f32 / 1000.0);
        for axis in 0..3 {
            let span = self.range_max[axis] - self.range_min[axis];
            if span <= 0.0 {
                continue;
            }
            if next[axis] > self.range_max[axis] {
                next[axis] -= span;
            } else if next[axis] < self.range_min[axis] {
                next[axis] += span;
            }
        }
        next
    }
}
