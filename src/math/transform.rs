use super::mat3::Mat3;
use super::mat4::Mat4;
use super::quat::Quat;
use super::vec3::Vec3;

/// World placement of an entity: a position and an orientation.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform {
    pub const IDENTITY: Self = Self {
        position: Vec3::ZERO,
        rotation: Quat::IDENTITY,
    };

    #[inline]
    pub const fn new(position: Vec3, rotation: Quat) -> Self {
        Self { position, rotation }
    }

    #[inline]
    pub const fn from_position(position: Vec3) -> Self {
        Self::new(position, Quat::IDENTITY)
    }

    #[inline]
    pub fn rotation_matrix(&self) -> Mat3 {
        self.rotation.to_mat3()
    }

    /// Homogeneous matrix form, the representation shape ray queries take.
    pub fn to_mat4(&self) -> Mat4 {
        Mat4::from_rotation_translation(self.rotation_matrix(), self.position)
    }

    #[inline]
    pub fn transform_point(&self, p: Vec3) -> Vec3 {
        self.rotation.rotate(p) + self.position
    }

    #[inline]
    pub fn transform_vector(&self, v: Vec3) -> Vec3 {
        self.rotation.rotate(v)
    }

    #[inline]
    pub fn inverse_transform_point(&self, p: Vec3) -> Vec3 {
        self.rotation.conjugate().rotate(p - self.position)
    }

    #[inline]
    pub fn inverse_transform_vector(&self, v: Vec3) -> Vec3 {
        self.rotation.conjugate().rotate(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn test_point_round_trip() {
        let t = Transform::new(
            Vec3::new(1.0, -2.0, 0.5),
            Quat::from_axis_angle(Vec3::Y, FRAC_PI_2),
        );
        let p = Vec3::new(3.0, 1.0, -1.0);
        let back = t.inverse_transform_point(t.transform_point(p));
        assert!((back - p).length() < 1e-5);
    }

    #[test]
    fn test_matrix_agrees_with_quaternion_path() {
        let t = Transform::new(
            Vec3::new(5.0, 0.0, 0.0),
            Quat::from_axis_angle(Vec3::Z, FRAC_PI_2),
        );
        let m = t.to_mat4();
        let p = Vec3::X;
        assert!((m.transform_point(p) - t.transform_point(p)).length() < 1e-5);
        assert!((m.transform_direction(p) - Vec3::Y).length() < 1e-5);
    }
}
