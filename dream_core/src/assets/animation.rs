use glam::{Quat, Vec3};
use log::warn;

use crate::definitions::asset::Keyframe;

/// Sampled pose an animation produces for one frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AnimationPose {
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

/// Keyframe animation playback over the owning entity's transform.
pub struct AnimationRuntime {
    keyframes: Vec<Keyframe>,
    looping: bool,
    elapsed_ms: i64,
    running: bool,
}

impl AnimationRuntime {
    pub fn new(mut keyframes: Vec<Keyframe>, looping: bool) -> Self {
        keyframes.sort_by_key(|k| k.time_ms);
        if keyframes.is_empty() {
            warn!("animation instantiated with no keyframes");
        }
        AnimationRuntime {
            keyframes,
            looping,
            elapsed_ms: 0,
            running: true,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn elapsed_ms(&self) -> i64 {
        self.elapsed_ms
    }

    pub fn restart(&mut self) {
        self.elapsed_ms = 0;
        self.running = true;
    }

    pub fn duration_ms(&self) -> i64 {
        self.keyframes.last().map(|k| k.time_ms).unwrap_or(0)
    }

    /// Advance playback and sample the pose. A finished non-looping
    /// animation keeps returning its final keyframe.
    pub fn update(&mut self, delta_ms: i64) -> Option<AnimationPose> {
        if self.keyframes.is_empty() {
            return None;
        }
        if self.running {
            self.elapsed_ms += delta_ms;
        }
        let duration = self.duration_ms();
        if self.elapsed_ms >= duration {
            if self.looping && duration > 0 {
                self.elapsed_ms %= duration;
            } else {
                self.elapsed_ms = duration;
                self.running = false;
            }
        }
        Some(self.sample(self.elapsed_ms))
    }

    fn sample(&self, at_ms: i64) -> AnimationPose {
        let mut prev = &self.keyframes[0];
        for frame in &self.keyframes {
            if frame.time_ms <= at_ms {
                prev = frame;
            } else {
                let span = (frame.time_ms - prev.time_ms) as f32;
                let t = if span > 0.0 {
                    (at_ms - prev.time_ms) as f32 / span
                } else {
                    0.0
                };
                return AnimationPose {
                    translation: prev.translation.lerp(frame.translation, t),
                    rotation: prev.rotation.slerp(frame.rotation, t),
                    scale: prev.scale.lerp(frame.scale, t),
                };
            }
        }
        AnimationPose {
            translation: prev.translation,
            rotation: prev.rotation,
            scale: prev.scale,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frames() -> Vec<Keyframe> {
        vec![
            Keyframe {
                time_ms: 0,
                translation: Vec3::ZERO,
                rotation: Quat::IDENTITY,
                scale: Vec3::ONE,
            },
            Keyframe {
                time_ms: 1000,
                translation: Vec3::new(10.0, 0.0, 0.0),
                rotation: Quat::IDENTITY,
                scale: Vec3::ONE,
            },
        ]
    }

    #[test]
    fn interpolates_between_keyframes() {
        let mut anim = AnimationRuntime::new(frames(), false);
        let pose = anim.update(500).unwrap();
        assert!((pose.translation.x - 5.0).abs() < 1e-4);
    }

    #[test]
    fn non_looping_clamps_and_stops() {
        let mut anim = AnimationRuntime::new(frames(), false);
        anim.update(1500).unwrap();
        assert!(!anim.is_running());
        let pose = anim.update(500).unwrap();
        assert_eq!(pose.translation, Vec3::new(10.0, 0.0, 0.0));
    }

    #[test]
    fn looping_wraps_elapsed_time() {
        let mut anim = AnimationRuntime::new(frames(), true);
        anim.update(1250).unwrap();
        assert!(anim.is_running());
        assert_eq!(anim.elapsed_ms(), 250);
    }

    #[test]
    fn empty_animation_yields_no_pose() {
        let mut anim = AnimationRuntime::new(Vec::new(), true);
        assert!(anim.update(16).is_none());
    }
}
