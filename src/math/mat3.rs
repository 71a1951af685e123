use std::ops::{Add, Mul};

use super::quat::Quat;
use super::vec3::Vec3;

/// A 3x3 matrix stored in row-major order.
///
/// Rotations, scales and inertia tensors. `m * v` treats `v` as a column
/// vector, so `(a * b) * v == a * (b * v)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mat3 {
    pub rows: [Vec3; 3],
}

impl Default for Mat3 {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Mat3 {
    pub const ZERO: Self = Self::from_rows(Vec3::ZERO, Vec3::ZERO, Vec3::ZERO);

    pub const IDENTITY: Self = Self::from_rows(Vec3::X, Vec3::Y, Vec3::Z);

    #[inline]
    pub const fn from_rows(r0: Vec3, r1: Vec3, r2: Vec3) -> Self {
        Self { rows: [r0, r1, r2] }
    }

    #[inline]
    pub fn from_diagonal(d: Vec3) -> Self {
        Self::from_rows(
            Vec3::new(d.x, 0.0, 0.0),
            Vec3::new(0.0, d.y, 0.0),
            Vec3::new(0.0, 0.0, d.z),
        )
    }

    /// Rotation matrix of a unit quaternion.
    pub fn from_quat(q: Quat) -> Self {
        let (x2, y2, z2) = (q.x + q.x, q.y + q.y, q.z + q.z);
        let (xx, yy, zz) = (q.x * x2, q.y * y2, q.z * z2);
        let (xy, xz, yz) = (q.x * y2, q.x * z2, q.y * z2);
        let (wx, wy, wz) = (q.w * x2, q.w * y2, q.w * z2);

        Self::from_rows(
            Vec3::new(1.0 - (yy + zz), xy - wz, xz + wy),
            Vec3::new(xy + wz, 1.0 - (xx + zz), yz - wx),
            Vec3::new(xz - wy, yz + wx, 1.0 - (xx + yy)),
        )
    }

    #[inline]
    pub fn row(&self, i: usize) -> Vec3 {
        self.rows[i]
    }

    #[inline]
    pub fn col(&self, j: usize) -> Vec3 {
        Vec3::new(self.rows[0][j], self.rows[1][j], self.rows[2][j])
    }

    #[inline]
    pub fn get(&self, i: usize, j: usize) -> f32 {
        self.rows[i][j]
    }

    pub fn transpose(&self) -> Self {
        Self::from_rows(self.col(0), self.col(1), self.col(2))
    }

    pub fn determinant(&self) -> f32 {
        self.rows[0].dot(self.rows[1].cross(self.rows[2]))
    }

    /// Inverse via the adjugate, `None` when (near) singular.
    pub fn try_inverse(&self) -> Option<Self> {
        let det = self.determinant();
        if det.abs() < 1e-12 {
            return None;
        }
        let [r0, r1, r2] = self.rows;
        // Columns of the inverse are the cross products of row pairs.
        let inv_t = Self::from_rows(r1.cross(r2), r2.cross(r0), r0.cross(r1));
        Some(inv_t.transpose().scale(1.0 / det))
    }

    /// Element-wise absolute value.
    pub fn abs(&self) -> Self {
        Self::from_rows(self.rows[0].abs(), self.rows[1].abs(), self.rows[2].abs())
    }

    pub fn scale(&self, s: f32) -> Self {
        Self::from_rows(self.rows[0] * s, self.rows[1] * s, self.rows[2] * s)
    }

    pub fn approx_eq(&self, other: &Self, epsilon: f32) -> bool {
        (0..3).all(|i| (self.rows[i] - other.rows[i]).abs().max_element() < epsilon)
    }
}

impl Mul for Mat3 {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self {
        let mut out = Self::ZERO;
        for i in 0..3 {
            for j in 0..3 {
                let mut acc = 0.0;
                for k in 0..3 {
                    acc += self.rows[i][k] * rhs.rows[k][j];
                }
                out.rows[i][j] = acc;
            }
        }
        out
    }
}

impl Mul<Vec3> for Mat3 {
    type Output = Vec3;

    #[inline]
    fn mul(self, v: Vec3) -> Vec3 {
        Vec3::new(self.rows[0].dot(v), self.rows[1].dot(v), self.rows[2].dot(v))
    }
}

impl Add for Mat3 {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::from_rows(
            self.rows[0] + rhs.rows[0],
            self.rows[1] + rhs.rows[1],
            self.rows[2] + rhs.rows[2],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    const EPSILON: f32 = 1e-5;

    #[test]
    fn test_row_major_product() {
        let a = Mat3::from_rows(
            Vec3::new(1.0, 2.0, 3.0),
            Vec3::new(4.0, 5.0, 6.0),
            Vec3::new(7.0, 8.0, 9.0),
        );
        let b = Mat3::from_diagonal(Vec3::new(1.0, 10.0, 100.0));
        let ab = a * b;
        assert_eq!(ab.row(0), Vec3::new(1.0, 20.0, 300.0));
        assert_eq!(ab.row(2), Vec3::new(7.0, 80.0, 900.0));

        // Non-commutative
        let ba = b * a;
        assert_eq!(ba.row(1), Vec3::new(40.0, 50.0, 60.0));
        assert!(!ab.approx_eq(&ba, EPSILON));
    }

    #[test]
    fn test_product_acts_like_composition() {
        let r = Quat::from_axis_angle(Vec3::Z, FRAC_PI_2).to_mat3();
        let s = Mat3::from_diagonal(Vec3::new(2.0, 1.0, 1.0));
        let v = Vec3::X;
        // Scale first, then rotate.
        let out = (r * s) * v;
        assert!((out - Vec3::new(0.0, 2.0, 0.0)).length() < EPSILON);
    }

    #[test]
    fn test_inverse() {
        let m = Mat3::from_rows(
            Vec3::new(2.0, 0.0, 1.0),
            Vec3::new(1.0, 3.0, 0.0),
            Vec3::new(0.0, 1.0, 4.0),
        );
        let inv = m.try_inverse().expect("invertible");
        assert!((m * inv).approx_eq(&Mat3::IDENTITY, EPSILON));
        assert!(Mat3::ZERO.try_inverse().is_none());
    }

    #[test]
    fn test_rotation_is_orthonormal() {
        let r = Quat::from_axis_angle(Vec3::new(1.0, 1.0, 0.0), 1.1).to_mat3();
        assert!((r * r.transpose()).approx_eq(&Mat3::IDENTITY, EPSILON));
        assert!((r.determinant() - 1.0).abs() < EPSILON);
    }
}
