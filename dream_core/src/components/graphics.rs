use glam::{Mat4, Vec3, Vec4};

use crate::assets::LightRuntime;
use crate::math::Transform;

/// A light gathered from the scene for the current frame.
#[derive(Clone, Copy, Debug)]
pub struct FrameLight {
    pub position: Vec3,
    pub color: Vec3,
    pub intensity: f32,
}

/// A colored line segment for debug overlays.
#[derive(Clone, Copy, Debug)]
pub struct DebugLine {
    pub from: Vec3,
    pub to: Vec3,
    pub color: Vec3,
}

/// Frame-scoped draw state handed to the renderer: camera, light list
/// and the debug overlay queue. Rebuilt every frame by scene tasks.
pub struct GraphicsComponent {
    pub camera_transform: Transform,
    pub clear_color: Vec4,
    lights: Vec<FrameLight>,
    debug_lines: Vec<DebugLine>,
}

impl GraphicsComponent {
    pub fn new() -> Self {
        GraphicsComponent {
            camera_transform: Transform::default(),
            clear_color: Vec4::ZERO,
            lights: Vec::new(),
            debug_lines: Vec::new(),
        }
    }

    pub fn begin_frame(&mut self) {
        self.lights.clear();
        self.debug_lines.clear();
    }

    pub fn push_light(&mut self, position: Vec3, light: &LightRuntime) {
        if !light.enabled {
            return;
        }
        self.lights.push(FrameLight {
            position,
            color: light.color,
            intensity: light.intensity,
        });
    }

    pub fn lights(&self) -> &[FrameLight] {
        &self.lights
    }

    pub fn push_debug_line(&mut self, from: Vec3, to: Vec3, color: Vec3) {
        self.debug_lines.push(DebugLine { from, to, color });
    }

    /// Wireframe box between `min` and `max`, twelve edges.
    pub fn push_debug_box(&mut self, min: Vec3, max: Vec3, color: Vec3) {
        let corners = [
            Vec3::new(min.x, min.y, min.z),
            Vec3::new(max.x, min.y, min.z),
            Vec3::new(max.x, max.y, min.z),
            Vec3::new(min.x, max.y, min.z),
            Vec3::new(min.x, min.y, max.z),
            Vec3::new(max.x, min.y, max.z),
            Vec3::new(max.x, max.y, max.z),
            Vec3::new(min.x, max.y, max.z),
        ];
        const EDGES: [(usize, usize); 12] = [
            (0, 1),
            (1, 2),
            (2, 3),
            (3, 0),
            (4, 5),
            (5, 6),
            (6, 7),
            (7, 4),
            (0, 4),
            (1, 5),
            (2, 6),
            (3, 7),
        ];
        for (a, b) in EDGES {
            self.push_debug_line(corners[a], corners[b], color);
        }
    }

    pub fn debug_lines(&self) -> &[DebugLine] {
        &self.debug_lines
    }

    pub fn view_matrix(&self) -> Mat4 {
        self.camera_transform.matrix().inverse()
    }
}

impl Default for GraphicsComponent {
    fn default() -> Self {
        GraphicsComponent::new()
    }
}
