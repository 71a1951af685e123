use std::ops::Mul;

use super::mat3::Mat3;
use super::vec3::Vec3;

/// A 4x4 homogeneous transform stored in row-major order.
///
/// Points are transformed with `w = 1`, directions with `w = 0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mat4 {
    pub m: [[f32; 4]; 4],
}

impl Default for Mat4 {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Mat4 {
    pub const IDENTITY: Self = Self {
        m: [
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ],
    };

    /// Affine transform applying `linear` then translating by `translation`.
    pub fn from_rotation_translation(linear: Mat3, translation: Vec3) -> Self {
        let mut out = Self::IDENTITY;
        for i in 0..3 {
            for j in 0..3 {
                out.m[i][j] = linear.get(i, j);
            }
            out.m[i][3] = translation[i];
        }
        out
    }

    pub fn from_translation(translation: Vec3) -> Self {
        Self::from_rotation_translation(Mat3::IDENTITY, translation)
    }

    /// Non-uniform scale about the origin.
    pub fn from_scale(scale: Vec3) -> Self {
        Self::from_rotation_translation(Mat3::from_diagonal(scale), Vec3::ZERO)
    }

    /// Upper-left 3x3 block (rotation and scale).
    pub fn linear(&self) -> Mat3 {
        Mat3::from_rows(
            Vec3::new(self.m[0][0], self.m[0][1], self.m[0][2]),
            Vec3::new(self.m[1][0], self.m[1][1], self.m[1][2]),
            Vec3::new(self.m[2][0], self.m[2][1], self.m[2][2]),
        )
    }

    pub fn translation(&self) -> Vec3 {
        Vec3::new(self.m[0][3], self.m[1][3], self.m[2][3])
    }

    pub fn transform_point(&self, p: Vec3) -> Vec3 {
        let [x, y, z, w] = self.apply([p.x, p.y, p.z, 1.0]);
        if w != 1.0 && w.abs() > f32::EPSILON {
            Vec3::new(x / w, y / w, z / w)
        } else {
            Vec3::new(x, y, z)
        }
    }

    /// Applies the linear part only. The result is not renormalized.
    pub fn transform_direction(&self, d: Vec3) -> Vec3 {
        let [x, y, z, _] = self.apply([d.x, d.y, d.z, 0.0]);
        Vec3::new(x, y, z)
    }

    fn apply(&self, v: [f32; 4]) -> [f32; 4] {
        let mut out = [0.0; 4];
        for (i, row) in self.m.iter().enumerate() {
            out[i] = row.iter().zip(v.iter()).map(|(a, b)| a * b).sum();
        }
        out
    }

    /// General inverse by Gauss-Jordan elimination with partial pivoting.
    pub fn try_inverse(&self) -> Option<Self> {
        let mut a = self.m;
        let mut inv = Self::IDENTITY.m;

        for col in 0..4 {
            let pivot = (col..4).max_by(|&r1, &r2| {
                a[r1][col].abs().total_cmp(&a[r2][col].abs())
            })?;
            if a[pivot][col].abs() < 1e-12 {
                return None;
            }
            a.swap(col, pivot);
            inv.swap(col, pivot);

            let scale = 1.0 / a[col][col];
            for j in 0..4 {
                a[col][j] *= scale;
                inv[col][j] *= scale;
            }

            for row in 0..4 {
                if row == col {
                    continue;
                }
                let factor = a[row][col];
                if factor == 0.0 {
                    continue;
                }
                for j in 0..4 {
                    a[row][j] -= factor * a[col][j];
                    inv[row][j] -= factor * inv[col][j];
                }
            }
        }

        Some(Self { m: inv })
    }

    pub fn approx_eq(&self, other: &Self, epsilon: f32) -> bool {
        self.m
            .iter()
            .flatten()
            .zip(other.m.iter().flatten())
            .all(|(a, b)| (a - b).abs() < epsilon)
    }
}

impl Mul for Mat4 {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self {
        let mut out = [[0.0; 4]; 4];
        for (i, out_row) in out.iter_mut().enumerate() {
            for (j, cell) in out_row.iter_mut().enumerate() {
                *cell = (0..4).map(|k| self.m[i][k] * rhs.m[k][j]).sum();
            }
        }
        Self { m: out }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Quat;

    const EPSILON: f32 = 1e-5;

    #[test]
    fn test_points_and_directions() {
        let t = Mat4::from_translation(Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(t.transform_point(Vec3::ZERO), Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(t.transform_direction(Vec3::X), Vec3::X);
    }

    #[test]
    fn test_inverse_round_trip() {
        let rot = Quat::from_axis_angle(Vec3::new(0.2, 1.0, 0.4), 0.9).to_mat3();
        let m = Mat4::from_rotation_translation(rot, Vec3::new(-4.0, 0.5, 7.0))
            * Mat4::from_scale(Vec3::new(2.0, 1.0, 0.5));
        let inv = m.try_inverse().expect("invertible");
        assert!((m * inv).approx_eq(&Mat4::IDENTITY, EPSILON));

        let p = Vec3::new(1.0, -2.0, 3.0);
        let back = inv.transform_point(m.transform_point(p));
        assert!((back - p).length() < 1e-4);
    }

    #[test]
    fn test_inverse_direction_needs_renormalizing() {
        let m = Mat4::from_scale(Vec3::splat(2.0));
        let inv = m.try_inverse().expect("invertible");
        let d = inv.transform_direction(Vec3::X);
        assert!((d.length() - 0.5).abs() < EPSILON);
        assert!((d.normalize() - Vec3::X).length() < EPSILON);
    }

    #[test]
    fn test_singular() {
        let m = Mat4::from_scale(Vec3::new(1.0, 0.0, 1.0));
        assert!(m.try_inverse().is_none());
    }
}
