use crate::math::{Mat3, Vec3};

use super::shape::Shape;

/// An axis-aligned bounding box defined by minimum and maximum points.
///
/// Infinite shapes produce boxes with infinite extents; [`Aabb::is_finite`]
/// tells them apart.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    /// Box covering all of space
    pub const INFINITE: Self = Self {
        min: Vec3::new(f32::NEG_INFINITY, f32::NEG_INFINITY, f32::NEG_INFINITY),
        max: Vec3::INFINITY,
    };

    #[inline]
    pub const fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    #[inline]
    pub fn from_center_half_extents(center: Vec3, half_extents: Vec3) -> Self {
        Self::new(center - half_extents, center + half_extents)
    }

    #[inline]
    pub fn center(self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    #[inline]
    pub fn half_extents(self) -> Vec3 {
        (self.max - self.min) * 0.5
    }

    #[inline]
    pub fn is_finite(self) -> bool {
        self.min.is_finite() && self.max.is_finite()
    }

    /// Surface area, the cost metric of the broad-phase tree
    #[inline]
    pub fn surface_area(self) -> f32 {
        let d = self.max - self.min;
        2.0 * (d.x * d.y + d.y * d.z + d.z * d.x)
    }

    /// Closed-interval overlap test on every axis
    #[inline]
    pub fn intersects(self, other: Self) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
            && self.min.z <= other.max.z
            && self.max.z >= other.min.z
    }

    #[inline]
    pub fn contains_aabb(self, other: Self) -> bool {
        self.min.x <= other.min.x
            && self.min.y <= other.min.y
            && self.min.z <= other.min.z
            && self.max.x >= other.max.x
            && self.max.y >= other.max.y
            && self.max.z >= other.max.z
    }

    #[inline]
    pub fn union(self, other: Self) -> Self {
        Self::new(self.min.min(other.min), self.max.max(other.max))
    }

    /// Grows the box by `margin` on every side
    #[inline]
    pub fn expand(self, margin: f32) -> Self {
        let m = Vec3::splat(margin);
        Self::new(self.min - m, self.max + m)
    }

    /// Slab test. Returns the entry and exit distances along a unit `direction`,
    /// entry clamped to zero when the origin starts inside.
    pub fn ray_intersection(self, origin: Vec3, direction: Vec3) -> Option<(f32, f32)> {
        let mut t_min = 0.0f32;
        let mut t_max = f32::INFINITY;

        for axis in 0..3 {
            let o = origin[axis];
            let d = direction[axis];
            if d.abs() < crate::math::EPSILON {
                if o < self.min[axis] || o > self.max[axis] {
                    return None;
                }
                continue;
            }
            let inv = 1.0 / d;
            let mut t0 = (self.min[axis] - o) * inv;
            let mut t1 = (self.max[axis] - o) * inv;
            if t0 > t1 {
                std::mem::swap(&mut t0, &mut t1);
            }
            t_min = t_min.max(t0);
            t_max = t_max.min(t1);
            if t_min > t_max {
                return None;
            }
        }

        Some((t_min, t_max))
    }
}

/// Half-extents of a shape's bounding box, centred on the owning entity.
///
/// [`LocalBounds::update`] only ever grows the box, so recomputation is
/// `reset` followed by `update`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LocalBounds {
    pub half_extents: Vec3,
}

impl LocalBounds {
    #[inline]
    pub fn reset(&mut self) {
        self.half_extents = Vec3::ZERO;
    }

    /// Expands the box to cover every vertex of `shape` rotated by
    /// `rotation`, padded by the shape's shell.
    pub fn update(&mut self, shape: &Shape, rotation: &Mat3) {
        if !shape.is_bounded() {
            self.half_extents = Vec3::INFINITY;
            return;
        }

        let shell = shape.shell();
        for v in shape.vertices() {
            let r = (*rotation * v).abs();
            for axis in 0..3 {
                self.half_extents[axis] = self.half_extents[axis].max(r[axis] + shell);
            }
        }
    }

    /// Recomputes from scratch.
    pub fn recompute(&mut self, shape: &Shape, rotation: &Mat3) {
        self.reset();
        self.update(shape, rotation);
    }

    #[inline]
    pub fn world_aabb(&self, center: Vec3) -> Aabb {
        if self.half_extents.is_finite() {
            Aabb::from_center_half_extents(center, self.half_extents)
        } else {
            Aabb::INFINITE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Quat;

    #[test]
    fn test_intersects() {
        let a = Aabb::new(Vec3::ZERO, Vec3::ONE);
        let b = Aabb::new(Vec3::splat(0.5), Vec3::splat(1.5));
        let c = Aabb::new(Vec3::new(2.0, 0.0, 0.0), Vec3::new(3.0, 1.0, 1.0));
        // Touching faces count as overlap.
        let d = Aabb::new(Vec3::new(1.0, 0.0, 0.0), Vec3::new(2.0, 1.0, 1.0));

        assert!(a.intersects(b));
        assert!(b.intersects(a));
        assert!(!a.intersects(c));
        assert!(a.intersects(d));
        assert!(Aabb::INFINITE.intersects(c));
    }

    #[test]
    fn test_union_and_expand() {
        let a = Aabb::new(Vec3::ZERO, Vec3::ONE);
        let b = Aabb::new(Vec3::splat(2.0), Vec3::splat(3.0));
        let u = a.union(b);
        assert_eq!(u, Aabb::new(Vec3::ZERO, Vec3::splat(3.0)));
        assert!(u.contains_aabb(a));

        let e = a.expand(0.5);
        assert_eq!(e.min, Vec3::splat(-0.5));
        assert_eq!(e.max, Vec3::splat(1.5));
    }

    #[test]
    fn test_surface_area() {
        let aabb = Aabb::new(Vec3::ZERO, Vec3::new(2.0, 3.0, 4.0));
        assert_eq!(aabb.surface_area(), 52.0);
    }

    #[test]
    fn test_ray_intersection() {
        let aabb = Aabb::new(Vec3::ZERO, Vec3::ONE);

        let (t0, t1) = aabb
            .ray_intersection(Vec3::new(-1.0, 0.5, 0.5), Vec3::X)
            .expect("hit");
        assert!((t0 - 1.0).abs() < 1e-6);
        assert!((t1 - 2.0).abs() < 1e-6);

        assert!(aabb.ray_intersection(Vec3::new(-1.0, 2.0, 0.5), Vec3::X).is_none());
        assert!(aabb.ray_intersection(Vec3::new(2.0, 0.5, 0.5), Vec3::X).is_none());

        // Axis-parallel ray inside the slab
        let inside = aabb.ray_intersection(Vec3::splat(0.5), Vec3::Y).expect("hit");
        assert_eq!(inside.0, 0.0);
    }

    #[test]
    fn test_sphere_bounds_include_shell() {
        let r = 1.5;
        let s = 0.25;
        let sphere = Shape::sphere(r).unwrap().with_margin(s).unwrap();
        let rotation = Quat::from_axis_angle(Vec3::new(1.0, 2.0, 3.0), 0.7).to_mat3();

        let mut bounds = LocalBounds::default();
        bounds.recompute(&sphere, &rotation);
        for axis in 0..3 {
            assert!((bounds.half_extents[axis] - (r + s)).abs() < 1e-5);
        }
    }

    #[test]
    fn test_update_is_idempotent() {
        let cube = Shape::cuboid(Vec3::new(1.0, 2.0, 0.5)).unwrap();
        let rotation = Quat::from_axis_angle(Vec3::Z, 0.4).to_mat3();

        let mut bounds = LocalBounds::default();
        bounds.recompute(&cube, &rotation);
        let first = bounds;
        bounds.update(&cube, &rotation);
        assert_eq!(bounds, first);
    }

    #[test]
    fn test_update_grows_without_reset() {
        let small = Shape::sphere(1.0).unwrap();
        let big = Shape::sphere(3.0).unwrap();

        let mut bounds = LocalBounds::default();
        bounds.update(&big, &Mat3::IDENTITY);
        bounds.update(&small, &Mat3::IDENTITY);
        assert_eq!(bounds.half_extents, Vec3::splat(3.0));

        bounds.recompute(&small, &Mat3::IDENTITY);
        assert_eq!(bounds.half_extents, Vec3::splat(1.0));
    }

    #[test]
    fn test_unbounded_shape() {
        let plane = Shape::plane(Vec3::Y, 0.0).unwrap();
        let mut bounds = LocalBounds::default();
        bounds.recompute(&plane, &Mat3::IDENTITY);
        assert!(!bounds.world_aabb(Vec3::ZERO).is_finite());
    }
}
