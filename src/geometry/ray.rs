use crate::error::{SimError, SimResult};
use crate::math::Vec3;

/// A half-line with a unit-length direction.
///
/// The direction is normalized once at construction; every `Ray` in
/// existence has `|direction| == 1`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    origin: Vec3,
    direction: Vec3,
}

impl Ray {
    /// Builds a ray, normalizing `direction`.
    ///
    /// Fails for zero-length or non-finite directions.
    pub fn new(origin: Vec3, direction: Vec3) -> SimResult<Self> {
        let unit = direction
            .try_normalize()
            .ok_or(SimError::DegenerateDirection {
                x: direction.x,
                y: direction.y,
                z: direction.z,
            })?;
        Ok(Self {
            origin,
            direction: unit,
        })
    }

    #[inline]
    pub fn origin(&self) -> Vec3 {
        self.origin
    }

    #[inline]
    pub fn direction(&self) -> Vec3 {
        self.direction
    }

    /// Point at parametric distance `t`
    #[inline]
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }
}

/// Result of a ray query: where and how a ray met a surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    /// Distance from the ray origin to `point`
    pub distance: f32,
    pub point: Vec3,
    /// Unit surface normal at `point`, facing the incoming ray
    pub normal: Vec3,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_is_normalized() {
        let ray = Ray::new(Vec3::ZERO, Vec3::new(0.0, 0.0, 12.0)).unwrap();
        assert_eq!(ray.direction(), Vec3::Z);
        assert_eq!(ray.at(2.0), Vec3::new(0.0, 0.0, 2.0));
    }

    #[test]
    fn test_degenerate_direction() {
        assert!(matches!(
            Ray::new(Vec3::ONE, Vec3::ZERO),
            Err(SimError::DegenerateDirection { .. })
        ));
        assert!(Ray::new(Vec3::ONE, Vec3::new(f32::INFINITY, 0.0, 0.0)).is_err());
    }
}
