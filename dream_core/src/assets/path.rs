use glam::Vec3;

/// Playback along an authored polyline at constant speed. `wrap` turns
/// the polyline into a closed loop; otherwise the follower parks at the
/// final control point.
pub struct PathRuntime {
    control_points: Vec<Vec3>,
    speed: f32,
    wrap: bool,
    distance: f32,
}

impl PathRuntime {
    pub fn new(control_points: Vec<Vec3>, speed: f32, wrap: bool) -> Self {
        PathRuntime {
            control_points,
            speed,
            wrap,
            distance: 0.0,
        }
    }

    pub fn total_length(&self) -> f32 {
        let mut length = self.segment_lengths().sum::<f32>();
        if self.wrap {
            if let (Some(first), Some(last)) =
                (self.control_points.first(), self.control_points.last())
            {
                length += last.distance(*first);
            }
        }
        length
    }

    fn segment_lengths(&self) -> impl Iterator<Item = f32> + '_ {
        self.control_points
            .windows(2)
            .map(|pair| pair[0].distance(pair[1]))
    }

    /// Advance along the path and return the follower's new position, or
    /// `None` for a path with no control points.
    pub fn update(&mut self, delta_ms: i64) -> Option<Vec3> {
        if self.control_points.is_empty() {
            return None;
        }
        if self.control_points.len() == 1 {
            return Some(self.control_points[0]);
        }
        let total = self.total_length();
        self.distance += self.speed * (delta_ms as f32 / 1000.0);
        if self.wrap {
            if total > 0.0 {
                self.distance %= total;
            }
        } else {
            self.distance = self.distance.min(total);
        }
        Some(self.position_at(self.distance))
    }

    fn position_at(&self, mut distance: f32) -> Vec3 {
        let n = self.control_points.len();
        let last_segment = if self.wrap { n } else { n - 1 };
        for i in 0..last_segment {
            let a = self.control_points[i];
            let b = self.control_points[(i + 1) % n];
            let segment = a.distance(b);
            if distance <= segment || segment <= 0.0 {
                let t = if segment > 0.0 { distance / segment } else { 0.0 };
                return a.lerp(b, t);
            }
            distance -= segment;
        }
        self.control_points[if self.wrap { 0 } else { n - 1 }]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square() -> Vec<Vec3> {
        vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(10.0, 0.0, 0.0),
            Vec3::new(10.0, 10.0, 0.0),
            Vec3::new(0.0, 10.0, 0.0),
        ]
    }

    #[test]
    fn follows_segments_at_constant_speed() {
        let mut path = PathRuntime::new(square(), 5.0, false);
        let pos = path.update(1000).unwrap();
        assert!((pos - Vec3::new(5.0, 0.0, 0.0)).length() < 1e-4);
        let pos = path.update(2000).unwrap();
        assert!((pos - Vec3::new(10.0, 5.0, 0.0)).length() < 1e-4);
    }

    #[test]
    fn non_wrapping_path_parks_at_the_end() {
        let mut path = PathRuntime::new(square(), 100.0, false);
        let pos = path.update(10_000).unwrap();
        assert!((pos - Vec3::new(0.0, 10.0, 0.0)).length() < 1e-4);
    }

    #[test]
    fn wrapping_path_closes_the_loop() {
        let mut path = PathRuntime::new(square(), 10.0, true);
        // 40 units total including the closing edge; 35 units in lands on
        // the closing segment halfway back to the start.
        let pos = path.update(3500).unwrap();
        assert!((pos - Vec3::new(0.0, 5.0, 0.0)).length() < 1e-4);
    }

    #[test]
    fn empty_path_yields_nothing() {
        let mut path = PathRuntime::new(Vec::new(), 1.0, true);
        assert!(path.update(16).is_none());
    }
}
