use glam::{Mat4, Quat, Vec3};
use serde::{Deserialize, Serialize};

/// How a transform combines with its parent when composing world matrices.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TransformType {
    /// Translation/orientation/scale are world-space values.
    #[default]
    Absolute,
    /// Values are relative to the parent's world transform.
    Offset,
}

/// Position/rotation/scale value object for scene entities.
///
/// The matrix form is always derived on demand from the three fields, so
/// no setter can leave a stale cached matrix behind.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    pub translation: Vec3,
    pub orientation: Quat,
    pub scale: Vec3,
    #[serde(default)]
    pub transform_type: TransformType,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            translation: Vec3::ZERO,
            orientation: Quat::IDENTITY,
            scale: Vec3::ONE,
            transform_type: TransformType::Absolute,
        }
    }
}

impl Transform {
    pub fn new(translation: Vec3, orientation: Quat, scale: Vec3) -> Self {
        Self {
            translation,
            orientation,
            scale,
            transform_type: TransformType::Absolute,
        }
    }

    pub fn from_translation(translation: Vec3) -> Self {
        Self {
            translation,
            ..Default::default()
        }
    }

    /// Derive the matrix form. Deterministic in the three fields.
    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.orientation, self.translation)
    }

    /// Compose this transform against a parent's world transform.
    ///
    /// `Absolute` transforms ignore the parent entirely; `Offset`
    /// transforms are applied in the parent's space. Pure function, so no
    /// lock is held on the parent while composing.
    pub fn relative_to(&self, parent_world: &Transform) -> Transform {
        match self.transform_type {
            TransformType::Absolute => *self,
            TransformType::Offset => Transform {
                translation: parent_world.translation
                    + (parent_world.orientation * (parent_world.scale * self.translation)),
                orientation: parent_world.orientation * self.orientation,
                scale: parent_world.scale * self.scale,
                transform_type: TransformType::Absolute,
            },
        }
    }

    pub fn set_translation(&mut self, translation: Vec3) {
        self.translation = translation;
    }

    pub fn set_orientation(&mut self, orientation: Quat) {
        self.orientation = orientation;
    }

    pub fn set_scale(&mut self, scale: Vec3) {
        self.scale = scale;
    }

    pub fn translate(&mut self, delta: Vec3) {
        self.translation += delta;
    }

    /// Restore the pre-mutation state captured at entity construction.
    pub fn reset_to(&mut self, initial: &Transform) {
        *self = *initial;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matrix_is_derived_from_fields() {
        let mut tx = Transform::from_translation(Vec3::new(1.0, 2.0, 3.0));
        let m = tx.matrix();
        assert_eq!(m.w_axis.truncate(), Vec3::new(1.0, 2.0, 3.0));

        // Mutating after reading the matrix must be reflected by the next
        // derivation: there is no cache to go stale.
        tx.set_translation(Vec3::new(4.0, 5.0, 6.0));
        let m2 = tx.matrix();
        assert_eq!(m2.w_axis.truncate(), Vec3::new(4.0, 5.0, 6.0));
    }

    #[test]
    fn offset_transform_composes_with_parent() {
        let parent = Transform::from_translation(Vec3::new(10.0, 0.0, 0.0));
        let mut child = Transform::from_translation(Vec3::new(1.0, 0.0, 0.0));
        child.transform_type = TransformType::Offset;

        let world = child.relative_to(&parent);
        assert_eq!(world.translation, Vec3::new(11.0, 0.0, 0.0));
        assert_eq!(world.transform_type, TransformType::Absolute);
    }

    #[test]
    fn absolute_transform_ignores_parent() {
        let parent = Transform::from_translation(Vec3::new(10.0, 0.0, 0.0));
        let child = Transform::from_translation(Vec3::new(1.0, 0.0, 0.0));
        let world = child.relative_to(&parent);
        assert_eq!(world.translation, Vec3::new(1.0, 0.0, 0.0));
    }

    #[test]
    fn reset_restores_initial() {
        let initial = Transform::from_translation(Vec3::new(1.0, 1.0, 1.0));
        let mut tx = initial;
        tx.translate(Vec3::new(5.0, 0.0, 0.0));
        assert_ne!(tx, initial);
        tx.reset_to(&initial);
        assert_eq!(tx, initial);
    }
}
