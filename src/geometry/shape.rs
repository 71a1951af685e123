use rand::RngCore;

use crate::error::{SimError, SimResult};
use crate::math::{Mat3, Mat4, Vec3};

use super::plane::{Plane, PlaneShape};
use super::polytope::Polytope;
use super::ray::{Ray, RayHit};
use super::sphere::Sphere;

/// Discriminant of a shape variant, used to key pairwise handlers
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ShapeKind {
    Sphere,
    Plane,
    PlaneShape,
    Polytope,
}

/// Capabilities every shape variant provides.
///
/// All points and directions are in the shape's local frame.
pub trait ShapeGeometry {
    fn kind(&self) -> ShapeKind;

    /// Radius the geometry itself rounds its core by
    fn rounding(&self) -> f32 {
        0.0
    }

    /// False for shapes extending to infinity
    fn is_bounded(&self) -> bool {
        true
    }

    fn num_verts(&self) -> usize;

    /// Vertex `i` of the core, `i < num_verts()`
    fn vert(&self, i: usize) -> Vec3;

    /// Ray test against a unit `direction`.
    fn local_ray_intersect(&self, origin: Vec3, direction: Vec3) -> Option<RayHit>;

    fn contains_point(&self, point: Vec3) -> bool;

    /// Negative inside, positive outside. Exact for spheres and planes, a
    /// lower bound outside polytopes.
    fn signed_distance(&self, point: Vec3) -> f32;

    /// Farthest core point along `direction`
    fn support(&self, direction: Vec3) -> Vec3 {
        let mut best = Vec3::ZERO;
        let mut best_dot = f32::NEG_INFINITY;
        for i in 0..self.num_verts() {
            let v = self.vert(i);
            let d = v.dot(direction);
            if d > best_dot {
                best_dot = d;
                best = v;
            }
        }
        best
    }

    fn random_point(&self, rng: &mut dyn RngCore) -> Vec3;

    /// `None` for unbounded shapes
    fn volume(&self) -> Option<f32>;

    /// Diagonal of the inertia tensor for unit mass, `None` when the shape
    /// cannot carry mass
    fn unit_inertia(&self) -> Option<Vec3>;
}

/// The closed set of shape variants
#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    Sphere(Sphere),
    Plane(Plane),
    PlaneShape(PlaneShape),
    Polytope(Polytope),
}

/// A collision shape: a geometry variant plus a non-negative margin.
///
/// The shell is the geometry's own rounding plus the margin. The margin pads
/// bounding boxes; exact queries use the geometry alone.
#[derive(Debug, Clone, PartialEq)]
pub struct Shape {
    geometry: Geometry,
    margin: f32,
}

impl From<Geometry> for Shape {
    fn from(geometry: Geometry) -> Self {
        Self {
            geometry,
            margin: 0.0,
        }
    }
}

impl Shape {
    /// Creates a sphere shape
    pub fn sphere(radius: f32) -> SimResult<Self> {
        Ok(Geometry::Sphere(Sphere::new(radius)?).into())
    }

    /// Creates the half-space `dot(normal, p) <= offset`
    pub fn plane(normal: Vec3, offset: f32) -> SimResult<Self> {
        Ok(Geometry::Plane(Plane::new(normal, offset)?).into())
    }

    /// Creates a square plane patch centred on `normal * offset`
    pub fn plane_shape(normal: Vec3, offset: f32, half_size: f32) -> SimResult<Self> {
        Ok(Geometry::PlaneShape(PlaneShape::new(normal, offset, half_size)?).into())
    }

    /// Creates a convex polytope from vertices and face index lists
    pub fn polytope(vertices: Vec<Vec3>, faces: Vec<Vec<usize>>) -> SimResult<Self> {
        Ok(Geometry::Polytope(Polytope::new(vertices, faces)?).into())
    }

    /// Creates a box from half-extents
    pub fn cuboid(half_extents: Vec3) -> SimResult<Self> {
        Ok(Geometry::Polytope(Polytope::cuboid(half_extents)?).into())
    }

    /// Sets the bounding margin
    pub fn with_margin(mut self, margin: f32) -> SimResult<Self> {
        if !margin.is_finite() || margin < 0.0 {
            return Err(SimError::invalid_shape(format!(
                "margin must be finite and non-negative, got {margin}"
            )));
        }
        self.margin = margin;
        Ok(self)
    }

    #[inline]
    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    /// The variant as a trait object
    #[inline]
    pub fn as_dyn(&self) -> &dyn ShapeGeometry {
        match &self.geometry {
            Geometry::Sphere(s) => s,
            Geometry::Plane(p) => p,
            Geometry::PlaneShape(p) => p,
            Geometry::Polytope(p) => p,
        }
    }

    #[inline]
    pub fn kind(&self) -> ShapeKind {
        self.as_dyn().kind()
    }

    #[inline]
    pub fn margin(&self) -> f32 {
        self.margin
    }

    /// Rounding of the core by the geometry itself, margin excluded
    #[inline]
    pub fn rounding(&self) -> f32 {
        self.as_dyn().rounding()
    }

    /// Rounding plus margin, always `>= 0`
    #[inline]
    pub fn shell(&self) -> f32 {
        self.as_dyn().rounding() + self.margin
    }

    #[inline]
    pub fn is_bounded(&self) -> bool {
        self.as_dyn().is_bounded()
    }

    #[inline]
    pub fn num_verts(&self) -> usize {
        self.as_dyn().num_verts()
    }

    #[inline]
    pub fn vert(&self, i: usize) -> Vec3 {
        self.as_dyn().vert(i)
    }

    /// Core vertices in local space
    pub fn vertices(&self) -> impl Iterator<Item = Vec3> + '_ {
        let geometry = self.as_dyn();
        (0..geometry.num_verts()).map(move |i| geometry.vert(i))
    }

    #[inline]
    pub fn contains_point(&self, point: Vec3) -> bool {
        self.as_dyn().contains_point(point)
    }

    #[inline]
    pub fn signed_distance(&self, point: Vec3) -> f32 {
        self.as_dyn().signed_distance(point)
    }

    #[inline]
    pub fn support(&self, direction: Vec3) -> Vec3 {
        self.as_dyn().support(direction)
    }

    #[inline]
    pub fn random_point(&self, rng: &mut dyn RngCore) -> Vec3 {
        self.as_dyn().random_point(rng)
    }

    #[inline]
    pub fn volume(&self) -> Option<f32> {
        self.as_dyn().volume()
    }

    /// Inertia tensor about the local origin for the given mass
    pub fn inertia(&self, mass: f32) -> Option<Mat3> {
        self.as_dyn()
            .unit_inertia()
            .map(|diag| Mat3::from_diagonal(diag * mass))
    }

    /// Ray test in local space
    #[inline]
    pub fn local_ray_intersect(&self, ray: &Ray) -> Option<RayHit> {
        self.as_dyn()
            .local_ray_intersect(ray.origin(), ray.direction())
    }

    /// Ray test against the shape placed by `transform`.
    ///
    /// The ray is carried into local space through the inverse transform,
    /// and the hit is carried back. Distance is measured in world space.
    pub fn ray_intersect(&self, transform: &Mat4, ray: &Ray) -> Option<RayHit> {
        let inverse = transform.try_inverse()?;
        let origin = inverse.transform_point(ray.origin());
        let direction = inverse.transform_direction(ray.direction()).try_normalize()?;

        let local = self.as_dyn().local_ray_intersect(origin, direction)?;

        let point = transform.transform_point(local.point);
        // Normals transform with the inverse transpose
        let normal = (inverse.linear().transpose() * local.normal).try_normalize()?;
        Some(RayHit {
            distance: point.distance(ray.origin()),
            point,
            normal,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::{approx_eq, Quat, Transform};

    #[test]
    fn test_shell() {
        let sphere = Shape::sphere(2.0).unwrap();
        assert_eq!(sphere.shell(), 2.0);
        assert_eq!(sphere.with_margin(0.5).unwrap().shell(), 2.5);

        let cube = Shape::cuboid(Vec3::ONE).unwrap();
        assert_eq!(cube.shell(), 0.0);
        assert!(cube.with_margin(-1.0).is_err());
    }

    #[test]
    fn test_kinds() {
        assert_eq!(Shape::sphere(1.0).unwrap().kind(), ShapeKind::Sphere);
        assert_eq!(Shape::plane(Vec3::Y, 0.0).unwrap().kind(), ShapeKind::Plane);
        assert_eq!(
            Shape::plane_shape(Vec3::Y, 0.0, 1.0).unwrap().kind(),
            ShapeKind::PlaneShape
        );
        assert_eq!(Shape::cuboid(Vec3::ONE).unwrap().kind(), ShapeKind::Polytope);
    }

    #[test]
    fn test_transformed_sphere_ray() {
        let sphere = Shape::sphere(1.0).unwrap();
        let transform = Transform::new(
            Vec3::new(10.0, 0.0, 0.0),
            Quat::from_axis_angle(Vec3::Y, 1.0),
        );
        let ray = Ray::new(Vec3::ZERO, Vec3::X).unwrap();

        let hit = sphere.ray_intersect(&transform.to_mat4(), &ray).unwrap();
        assert!(approx_eq(hit.distance, 9.0, 1e-4));
        assert!(approx_eq(hit.point.x, 9.0, 1e-4));
        assert!(approx_eq(hit.normal.x, -1.0, 1e-4));
    }

    #[test]
    fn test_transformed_box_ray() {
        let cube = Shape::cuboid(Vec3::ONE).unwrap();
        let transform = Transform::new(
            Vec3::new(0.0, 5.0, 0.0),
            Quat::from_axis_angle(Vec3::Y, std::f32::consts::FRAC_PI_4),
        );
        let ray = Ray::new(Vec3::ZERO, Vec3::Y).unwrap();

        let hit = cube.ray_intersect(&transform.to_mat4(), &ray).unwrap();
        assert!(approx_eq(hit.distance, 4.0, 1e-4));
        assert!(approx_eq(hit.normal.y, -1.0, 1e-4));
    }

    #[test]
    fn test_inertia_scales_with_mass() {
        let sphere = Shape::sphere(1.0).unwrap();
        let inertia = sphere.inertia(5.0).unwrap();
        assert!(approx_eq(inertia.get(0, 0), 2.0, 1e-5));
        assert!(Shape::plane(Vec3::Y, 0.0).unwrap().inertia(1.0).is_none());
    }
}
