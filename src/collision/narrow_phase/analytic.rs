//! Default pairwise handlers.
//!
//! Every handler takes shape A then shape B with their placements and
//! reports the contact with its normal pointing from A towards B.

use log::trace;

use crate::collision::contact::Contact;
use crate::geometry::{Geometry, PlaneClass, Shape};
use crate::math::{Transform, Vec3, EPSILON};

use super::epa::epa;
use super::gjk::{gjk, GjkResult, Placed};

/// Two spheres, from their centers and radii
pub fn sphere_sphere(a: &Shape, ta: &Transform, b: &Shape, tb: &Transform) -> Option<Contact> {
    let (ra, rb) = (a.rounding(), b.rounding());
    let delta = tb.position - ta.position;
    let distance = delta.length();
    if distance > ra + rb {
        return None;
    }

    let normal = if distance > EPSILON {
        delta / distance
    } else {
        Vec3::Y
    };
    Some(Contact::from_surface_points(
        ta.position + normal * ra,
        tb.position - normal * rb,
        normal,
        ra + rb - distance,
    ))
}

/// Sphere A against plane patch B through the closest point of the patch
pub fn sphere_plane_shape(
    a: &Shape,
    ta: &Transform,
    b: &Shape,
    tb: &Transform,
) -> Option<Contact> {
    let Geometry::PlaneShape(patch) = b.geometry() else {
        return None;
    };
    let radius = a.rounding();

    let center = tb.inverse_transform_point(ta.position);
    let closest = patch.closest_point(center);
    let offset = center - closest;
    let distance = offset.length();
    if distance > radius {
        return None;
    }

    // From the patch towards the sphere, local to B
    let away = if distance > EPSILON {
        offset / distance
    } else if patch.plane().distance(center) < 0.0 {
        -patch.plane().normal()
    } else {
        patch.plane().normal()
    };
    let normal = -tb.transform_vector(away);

    Some(Contact::from_surface_points(
        ta.position + normal * radius,
        tb.transform_point(closest),
        normal,
        radius - distance,
    ))
}

/// Infinite plane A against the vertices of B, each padded by B's rounding
pub fn plane_vertices(a: &Shape, ta: &Transform, b: &Shape, tb: &Transform) -> Option<Contact> {
    let Geometry::Plane(plane) = a.geometry() else {
        return None;
    };

    if let Geometry::PlaneShape(patch) = b.geometry() {
        let normal = ta.inverse_transform_vector(tb.transform_vector(patch.plane().normal()));
        let center = ta.inverse_transform_point(tb.transform_point(patch.plane().center()));
        if plane.fast_plane_intersect(normal, center) == PlaneClass::Front {
            return None;
        }
    }

    let rounding = b.rounding();
    let mut deepest: Option<(f32, Vec3)> = None;
    for v in b.vertices() {
        let local = ta.inverse_transform_point(tb.transform_point(v));
        let height = plane.distance(local) - rounding;
        if deepest.map_or(true, |(best, _)| height < best) {
            deepest = Some((height, local));
        }
    }

    let (height, vertex) = deepest?;
    if height > 0.0 {
        return None;
    }

    let depth = -height;
    let n = plane.normal();
    let surface_b = vertex - n * rounding;
    Some(Contact::new(
        depth,
        ta.transform_point(surface_b + n * (depth * 0.5)),
        ta.transform_vector(n),
    ))
}

/// Any two bounded convex shapes: GJK on the cores, EPA once they overlap
pub fn convex_convex(a: &Shape, ta: &Transform, b: &Shape, tb: &Transform) -> Option<Contact> {
    let placed_a = Placed::new(a, ta);
    let placed_b = Placed::new(b, tb);
    let (ra, rb) = (a.rounding(), b.rounding());

    match gjk(&placed_a, &placed_b) {
        GjkResult::Separated {
            closest_a,
            closest_b,
            distance,
        } => {
            if distance > ra + rb {
                return None;
            }
            let normal = (closest_b - closest_a)
                .try_normalize()
                .unwrap_or(Vec3::Y);
            Some(Contact::from_surface_points(
                closest_a + normal * ra,
                closest_b - normal * rb,
                normal,
                ra + rb - distance,
            ))
        }
        GjkResult::Overlapping(simplex) => match epa(&simplex, &placed_a, &placed_b) {
            Some(result) => Some(Contact::from_surface_points(
                result.point_a + result.normal * ra,
                result.point_b - result.normal * rb,
                result.normal,
                result.depth + ra + rb,
            )),
            None => {
                trace!("epa found no enclosing polytope, using center line");
                let normal = (tb.position - ta.position)
                    .try_normalize()
                    .unwrap_or(Vec3::Y);
                Some(Contact::new(
                    ra + rb,
                    (ta.position + tb.position) * 0.5,
                    normal,
                ))
            }
        },
    }
}

/// Sphere A strictly encloses sphere B
pub fn contains_sphere_sphere(a: &Shape, ta: &Transform, b: &Shape, tb: &Transform) -> bool {
    ta.position.distance(tb.position) + b.rounding() < a.rounding()
}

/// Every vertex of B, padded by B's rounding, lies strictly inside A
pub fn contains_vertices(a: &Shape, ta: &Transform, b: &Shape, tb: &Transform) -> bool {
    if !b.is_bounded() || b.num_verts() == 0 {
        return false;
    }
    let rounding = b.rounding();
    b.vertices().all(|v| {
        let local = ta.inverse_transform_point(tb.transform_point(v));
        a.signed_distance(local) + rounding < 0.0
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::{approx_eq, Quat};

    fn at(x: f32, y: f32, z: f32) -> Transform {
        Transform::from_position(Vec3::new(x, y, z))
    }

    #[test]
    fn test_sphere_sphere() {
        let s = Shape::sphere(1.0).unwrap();
        let contact = sphere_sphere(&s, &at(0.0, 0.0, 0.0), &s, &at(1.5, 0.0, 0.0)).unwrap();
        assert!(approx_eq(contact.depth, 0.5, 1e-6));
        assert_eq!(contact.normal, Vec3::X);
        assert!(approx_eq(contact.point.x, 0.75, 1e-6));

        assert!(sphere_sphere(&s, &at(0.0, 0.0, 0.0), &s, &at(2.5, 0.0, 0.0)).is_none());
        // Touching counts
        assert!(sphere_sphere(&s, &at(0.0, 0.0, 0.0), &s, &at(2.0, 0.0, 0.0)).is_some());
    }

    #[test]
    fn test_plane_sphere() {
        let ground = Shape::plane(Vec3::Y, 0.0).unwrap();
        let ball = Shape::sphere(1.0).unwrap();

        let contact = plane_vertices(&ground, &Transform::IDENTITY, &ball, &at(2.0, 0.8, 0.0)).unwrap();
        assert!(approx_eq(contact.depth, 0.2, 1e-6));
        assert_eq!(contact.normal, Vec3::Y);
        assert!(approx_eq(contact.point.y, -0.1, 1e-6));

        assert!(plane_vertices(&ground, &Transform::IDENTITY, &ball, &at(0.0, 1.2, 0.0)).is_none());
    }

    #[test]
    fn test_plane_polytope_rotated() {
        let ground = Shape::plane(Vec3::Y, 0.0).unwrap();
        let cube = Shape::cuboid(Vec3::ONE).unwrap();
        let tilted = Transform::new(
            Vec3::new(0.0, 1.2, 0.0),
            Quat::from_axis_angle(Vec3::Z, std::f32::consts::FRAC_PI_4),
        );

        // Lowest corner at 1.2 - sqrt(2)
        let contact = plane_vertices(&ground, &Transform::IDENTITY, &cube, &tilted).unwrap();
        assert!(approx_eq(contact.depth, 2.0f32.sqrt() - 1.2, 1e-5));
    }

    #[test]
    fn test_plane_patch_front_early_out() {
        let ground = Shape::plane(Vec3::Y, 0.0).unwrap();
        let patch = Shape::plane_shape(Vec3::Y, 0.0, 1.0).unwrap();

        assert!(plane_vertices(&ground, &Transform::IDENTITY, &patch, &at(0.0, 0.5, 0.0)).is_none());
        let contact =
            plane_vertices(&ground, &Transform::IDENTITY, &patch, &at(0.0, -0.5, 0.0)).unwrap();
        assert!(approx_eq(contact.depth, 0.5, 1e-6));
    }

    #[test]
    fn test_sphere_patch() {
        let ball = Shape::sphere(1.0).unwrap();
        let patch = Shape::plane_shape(Vec3::Y, 0.0, 2.0).unwrap();

        let contact = sphere_plane_shape(&ball, &at(0.5, 0.6, 0.0), &patch, &Transform::IDENTITY).unwrap();
        assert!(approx_eq(contact.depth, 0.4, 1e-6));
        assert!(approx_eq(contact.normal.y, -1.0, 1e-6));

        // Beside the patch edge
        assert!(sphere_plane_shape(&ball, &at(3.5, 0.0, 0.0), &patch, &Transform::IDENTITY).is_none());
    }

    #[test]
    fn test_convex_sphere_box() {
        let ball = Shape::sphere(0.5).unwrap();
        let cube = Shape::cuboid(Vec3::ONE).unwrap();

        let contact = convex_convex(&ball, &at(1.3, 0.0, 0.0), &cube, &Transform::IDENTITY).unwrap();
        assert!(approx_eq(contact.depth, 0.2, 1e-4));
        assert!(approx_eq(contact.normal.x, -1.0, 1e-4));

        assert!(convex_convex(&ball, &at(1.6, 0.0, 0.0), &cube, &Transform::IDENTITY).is_none());

        // Center inside the box
        let deep = convex_convex(&ball, &at(0.8, 0.0, 0.0), &cube, &Transform::IDENTITY).unwrap();
        assert!(approx_eq(deep.depth, 0.7, 1e-3));
        assert!(approx_eq(deep.normal.x, -1.0, 1e-3));
    }

    #[test]
    fn test_containment() {
        let big = Shape::sphere(3.0).unwrap();
        let small = Shape::sphere(1.0).unwrap();
        let cube = Shape::cuboid(Vec3::splat(0.5)).unwrap();
        let origin = Transform::IDENTITY;

        assert!(contains_sphere_sphere(&big, &origin, &small, &at(1.5, 0.0, 0.0)));
        assert!(!contains_sphere_sphere(&big, &origin, &small, &at(2.0, 0.0, 0.0)));
        assert!(!contains_sphere_sphere(&small, &origin, &big, &origin));

        assert!(contains_vertices(&big, &origin, &cube, &at(1.0, 0.0, 0.0)));
        assert!(!contains_vertices(&big, &origin, &cube, &at(2.8, 0.0, 0.0)));

        let box_container = Shape::cuboid(Vec3::splat(2.0)).unwrap();
        assert!(contains_vertices(&box_container, &origin, &small, &at(0.5, 0.0, 0.0)));
        assert!(!contains_vertices(&box_container, &origin, &small, &at(1.5, 0.0, 0.0)));

        let ground = Shape::plane(Vec3::Y, 0.0).unwrap();
        assert!(contains_vertices(&ground, &origin, &small, &at(0.0, -2.0, 0.0)));
        assert!(!contains_vertices(&big, &origin, &ground, &origin));
    }
}
