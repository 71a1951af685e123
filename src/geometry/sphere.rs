use std::f32::consts::PI;

use rand::{Rng, RngCore};

use crate::error::{SimError, SimResult};
use crate::math::{Vec3, EPSILON};

use super::ray::RayHit;
use super::shape::{ShapeGeometry, ShapeKind};

/// A sphere: a point core rounded by `radius`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sphere {
    radius: f32,
}

impl Sphere {
    pub fn new(radius: f32) -> SimResult<Self> {
        if !radius.is_finite() || radius <= 0.0 {
            return Err(SimError::invalid_shape(format!(
                "sphere radius must be finite and positive, got {radius}"
            )));
        }
        Ok(Self { radius })
    }

    #[inline]
    pub fn radius(&self) -> f32 {
        self.radius
    }
}

impl ShapeGeometry for Sphere {
    fn kind(&self) -> ShapeKind {
        ShapeKind::Sphere
    }

    fn rounding(&self) -> f32 {
        self.radius
    }

    fn num_verts(&self) -> usize {
        1
    }

    fn vert(&self, _i: usize) -> Vec3 {
        Vec3::ZERO
    }

    /// Only the near root is considered. A ray starting on or inside the
    /// sphere has a near root behind it and misses.
    fn local_ray_intersect(&self, origin: Vec3, direction: Vec3) -> Option<RayHit> {
        let a = direction.length_squared();
        let b = 2.0 * origin.dot(direction);
        let c = origin.length_squared() - self.radius * self.radius;

        let discriminant = b * b - 4.0 * a * c;
        if discriminant < EPSILON {
            return None;
        }

        let t0 = (-b - discriminant.sqrt()) / (2.0 * a);
        if t0 < EPSILON {
            return None;
        }

        let point = origin + direction * t0;
        Some(RayHit {
            distance: t0 * a.sqrt(),
            point,
            normal: point / self.radius,
        })
    }

    /// Open ball: the surface itself is outside
    fn contains_point(&self, point: Vec3) -> bool {
        point.length_squared() < self.radius * self.radius
    }

    fn signed_distance(&self, point: Vec3) -> f32 {
        point.length() - self.radius
    }

    fn support(&self, _direction: Vec3) -> Vec3 {
        Vec3::ZERO
    }

    fn random_point(&self, rng: &mut dyn RngCore) -> Vec3 {
        // Radius scaled by the cube root keeps the density uniform
        let u: f32 = rng.gen_range(0.0..1.0);
        Vec3::random_unit(rng) * (self.radius * u.cbrt())
    }

    fn volume(&self) -> Option<f32> {
        Some((4.0 / 3.0) * PI * self.radius * self.radius * self.radius)
    }

    fn unit_inertia(&self) -> Option<Vec3> {
        Some(Vec3::splat(0.4 * self.radius * self.radius))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::approx_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn unit_sphere() -> Sphere {
        Sphere::new(1.0).unwrap()
    }

    #[test]
    fn test_invalid_radius() {
        assert!(Sphere::new(0.0).is_err());
        assert!(Sphere::new(-1.0).is_err());
        assert!(Sphere::new(f32::NAN).is_err());
    }

    #[test]
    fn test_ray_hits_near_side() {
        let hit = unit_sphere()
            .local_ray_intersect(Vec3::new(0.0, 0.0, -5.0), Vec3::Z)
            .unwrap();

        assert!(approx_eq(hit.point.z, -1.0, 1e-5));
        assert!(approx_eq(hit.point.x, 0.0, 1e-5));
        assert!(approx_eq(hit.normal.z, -1.0, 1e-5));
        assert!(approx_eq(hit.distance, 4.0, 1e-5));
    }

    #[test]
    fn test_ray_from_inside_misses() {
        // The near root is negative, the exit point is never reported
        let sphere = unit_sphere();
        assert!(sphere.local_ray_intersect(Vec3::ZERO, Vec3::X).is_none());
        assert!(sphere
            .local_ray_intersect(Vec3::new(0.5, 0.0, 0.0), Vec3::X)
            .is_none());
    }

    #[test]
    fn test_ray_misses() {
        let sphere = unit_sphere();
        // Pointing away
        assert!(sphere
            .local_ray_intersect(Vec3::new(0.0, 0.0, -5.0), -Vec3::Z)
            .is_none());
        // Passing beside
        assert!(sphere
            .local_ray_intersect(Vec3::new(0.0, 2.0, -5.0), Vec3::Z)
            .is_none());
    }

    #[test]
    fn test_contains_open_boundary() {
        let r = 2.0;
        let sphere = Sphere::new(r).unwrap();
        let dir = Vec3::new(1.0, 1.0, 0.0).normalize();

        assert!(!sphere.contains_point(Vec3::new(r, 0.0, 0.0)));
        assert!(sphere.contains_point(dir * (r - 1e-3)));
        assert!(!sphere.contains_point(dir * (r + 1e-3)));
    }

    #[test]
    fn test_random_points_inside() {
        let sphere = Sphere::new(3.0).unwrap();
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..200 {
            let p = sphere.random_point(&mut rng);
            assert!(p.length() <= 3.0 + 1e-4);
        }
    }

    #[test]
    fn test_volume() {
        let v = Sphere::new(2.0).unwrap().volume().unwrap();
        assert!(approx_eq(v, 32.0 / 3.0 * PI, 1e-4));
    }
}
