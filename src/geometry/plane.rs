use rand::{Rng, RngCore};

use crate::error::{SimError, SimResult};
use crate::math::{Vec3, EPSILON};

use super::ray::RayHit;
use super::shape::{ShapeGeometry, ShapeKind};

/// Which side of a plane something lies on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaneClass {
    Front,
    Behind,
    Intersect,
}

/// The half-space `dot(normal, p) <= offset`.
///
/// `normal` is unit length; the solid side is opposite the normal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    normal: Vec3,
    offset: f32,
}

impl Plane {
    /// Builds a plane, normalizing `normal` and scaling `offset` with it
    pub fn new(normal: Vec3, offset: f32) -> SimResult<Self> {
        let length = normal.length();
        if !offset.is_finite() || !normal.is_finite() || length < EPSILON {
            return Err(SimError::invalid_shape(format!(
                "plane needs a finite non-zero normal and finite offset, got {normal:?}, {offset}"
            )));
        }
        Ok(Self {
            normal: normal / length,
            offset: offset / length,
        })
    }

    #[inline]
    pub fn normal(&self) -> Vec3 {
        self.normal
    }

    #[inline]
    pub fn offset(&self) -> f32 {
        self.offset
    }

    /// Point of the plane closest to the local origin
    #[inline]
    pub fn center(&self) -> Vec3 {
        self.normal * self.offset
    }

    /// Signed height of `point` above the plane
    #[inline]
    pub fn distance(&self, point: Vec3) -> f32 {
        self.normal.dot(point) - self.offset
    }

    /// Classifies `center` against this plane when `normal` is parallel to
    /// ours. Non-parallel planes always intersect.
    pub fn fast_plane_intersect(&self, normal: Vec3, center: Vec3) -> PlaneClass {
        if self.normal.dot(normal).abs() < 1.0 - EPSILON {
            return PlaneClass::Intersect;
        }

        let height = self.normal.dot(center);
        if height > self.offset {
            PlaneClass::Front
        } else if height < self.offset {
            PlaneClass::Behind
        } else {
            PlaneClass::Intersect
        }
    }

    /// Two unit vectors spanning the plane
    fn tangents(&self) -> (Vec3, Vec3) {
        let u = self.normal.any_orthonormal();
        let v = self.normal.cross(u);
        (u, v)
    }

    fn hit(&self, origin: Vec3, direction: Vec3) -> Option<RayHit> {
        let denom = self.normal.dot(direction);
        if denom.abs() < EPSILON {
            return None;
        }

        let t = (self.offset - self.normal.dot(origin)) / denom;
        if t < EPSILON {
            return None;
        }

        Some(RayHit {
            distance: t,
            point: origin + direction * t,
            normal: if denom < 0.0 { self.normal } else { -self.normal },
        })
    }
}

impl ShapeGeometry for Plane {
    fn kind(&self) -> ShapeKind {
        ShapeKind::Plane
    }

    fn is_bounded(&self) -> bool {
        false
    }

    fn num_verts(&self) -> usize {
        0
    }

    fn vert(&self, _i: usize) -> Vec3 {
        self.center()
    }

    fn local_ray_intersect(&self, origin: Vec3, direction: Vec3) -> Option<RayHit> {
        self.hit(origin, direction)
    }

    fn contains_point(&self, point: Vec3) -> bool {
        self.distance(point) < 0.0
    }

    fn signed_distance(&self, point: Vec3) -> f32 {
        self.distance(point)
    }

    fn support(&self, _direction: Vec3) -> Vec3 {
        self.center()
    }

    /// Samples the unit patch around the plane's center
    fn random_point(&self, rng: &mut dyn RngCore) -> Vec3 {
        let (u, v) = self.tangents();
        let s: f32 = rng.gen_range(-1.0..=1.0);
        let t: f32 = rng.gen_range(-1.0..=1.0);
        self.center() + u * s + v * t
    }

    fn volume(&self) -> Option<f32> {
        None
    }

    fn unit_inertia(&self) -> Option<Vec3> {
        None
    }
}

/// A finite square patch of a plane, centred on `normal * offset`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaneShape {
    plane: Plane,
    half_size: f32,
    u: Vec3,
    v: Vec3,
}

impl PlaneShape {
    pub fn new(normal: Vec3, offset: f32, half_size: f32) -> SimResult<Self> {
        if !half_size.is_finite() || half_size <= 0.0 {
            return Err(SimError::invalid_shape(format!(
                "plane patch half size must be finite and positive, got {half_size}"
            )));
        }
        let plane = Plane::new(normal, offset)?;
        let (u, v) = plane.tangents();
        Ok(Self {
            plane,
            half_size,
            u,
            v,
        })
    }

    #[inline]
    pub fn plane(&self) -> &Plane {
        &self.plane
    }

    #[inline]
    pub fn half_size(&self) -> f32 {
        self.half_size
    }

    /// See [`Plane::fast_plane_intersect`]
    #[inline]
    pub fn fast_plane_intersect(&self, normal: Vec3, center: Vec3) -> PlaneClass {
        self.plane.fast_plane_intersect(normal, center)
    }

    /// In-plane coordinates of `point` relative to the patch center
    fn patch_coords(&self, point: Vec3) -> (f32, f32) {
        let rel = point - self.plane.center();
        (rel.dot(self.u), rel.dot(self.v))
    }

    /// Closest point of the patch to `point`
    pub fn closest_point(&self, point: Vec3) -> Vec3 {
        let h = self.half_size;
        let (s, t) = self.patch_coords(point);
        self.plane.center() + self.u * s.clamp(-h, h) + self.v * t.clamp(-h, h)
    }
}

impl ShapeGeometry for PlaneShape {
    fn kind(&self) -> ShapeKind {
        ShapeKind::PlaneShape
    }

    fn num_verts(&self) -> usize {
        4
    }

    fn vert(&self, i: usize) -> Vec3 {
        let h = self.half_size;
        let (s, t) = match i % 4 {
            0 => (-h, -h),
            1 => (h, -h),
            2 => (h, h),
            _ => (-h, h),
        };
        self.plane.center() + self.u * s + self.v * t
    }

    fn local_ray_intersect(&self, origin: Vec3, direction: Vec3) -> Option<RayHit> {
        let hit = self.plane.hit(origin, direction)?;
        let (s, t) = self.patch_coords(hit.point);
        if s.abs() > self.half_size || t.abs() > self.half_size {
            return None;
        }
        Some(hit)
    }

    /// A patch has no interior
    fn contains_point(&self, _point: Vec3) -> bool {
        false
    }

    /// Unsigned distance to the patch
    fn signed_distance(&self, point: Vec3) -> f32 {
        point.distance(self.closest_point(point))
    }

    fn random_point(&self, rng: &mut dyn RngCore) -> Vec3 {
        let h = self.half_size;
        let s: f32 = rng.gen_range(-h..=h);
        let t: f32 = rng.gen_range(-h..=h);
        self.plane.center() + self.u * s + self.v * t
    }

    fn volume(&self) -> Option<f32> {
        Some(0.0)
    }

    fn unit_inertia(&self) -> Option<Vec3> {
        None
    }
}
