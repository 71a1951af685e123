//! Shapes, bounding volumes and rays.

mod aabb;
mod plane;
mod polytope;
mod ray;
mod shape;
mod sphere;

pub use aabb::{Aabb, LocalBounds};
pub use plane::{Plane, PlaneClass, PlaneShape};
pub use polytope::{FacePlane, Polytope};
pub use ray::{Ray, RayHit};
pub use shape::{Geometry, Shape, ShapeGeometry, ShapeKind};
pub use sphere::Sphere;
